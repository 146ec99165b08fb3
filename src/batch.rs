//! Batch driver and collaborator boundaries.
//!
//! The cleanup core ends at "path in, path + count out". Everything around
//! it — the remote snapshot folder, the temperature reader, manual
//! correction of low-confidence readings, and the reading log — is modeled
//! as a trait the driver calls, so the inpainting pipeline never depends on
//! a network client, an OCR backend, or a database. Implementations live
//! with the deployment, not in this crate.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::engine::{default_output_path, is_supported_image, CleanupEngine};
use crate::error::Result;

/// One extracted value with its recognizer confidence.
#[derive(Debug, Clone, PartialEq)]
pub struct TemperatureReading {
    /// The recognized text, kept verbatim (parsing is out of scope).
    pub value: String,
    /// Recognizer confidence on a 0–100 scale.
    pub confidence: f32,
}

/// The minimum and maximum scale readings taken from one snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct TemperatureReadings {
    /// The scale minimum.
    pub min: TemperatureReading,
    /// The scale maximum.
    pub max: TemperatureReading,
}

impl TemperatureReadings {
    /// Whether either reading falls below the confidence threshold and
    /// should be confirmed manually.
    #[must_use]
    pub fn needs_confirmation(&self, threshold: f32) -> bool {
        self.min.confidence < threshold || self.max.confidence < threshold
    }
}

/// A remote folder of snapshot blobs.
pub trait SnapshotStore {
    /// Names of all blobs currently in the folder.
    fn list(&self) -> Result<Vec<String>>;
    /// Download the named blob to a local path.
    fn fetch(&self, name: &str, destination: &Path) -> Result<()>;
    /// Upload a local file under the given name, returning its URL.
    fn store(&self, source: &Path, name: &str) -> Result<String>;
}

/// Extracts temperature readings from the *original, uncleaned* snapshot.
pub trait TemperatureReader {
    /// Read the min/max scale values from the image at `image`.
    fn read(&self, image: &Path) -> Result<TemperatureReadings>;
}

/// Obtains corrected readings when recognition confidence is too low.
pub trait ConfirmationSource {
    /// Return confirmed (possibly corrected) readings for the snapshot.
    fn confirm(&self, image: &Path, readings: TemperatureReadings) -> Result<TemperatureReadings>;
}

/// An entry recorded for each cleaned snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadingLogEntry {
    /// Identifier of the capture location.
    pub location_id: String,
    /// Confirmed minimum reading.
    pub min: String,
    /// Confirmed maximum reading.
    pub max: String,
    /// URL of the uploaded cleaned snapshot.
    pub url: String,
}

/// The persistent log of processed snapshots.
pub trait ReadingLog {
    /// Whether an entry for this URL already exists.
    fn contains(&self, url: &str) -> Result<bool>;
    /// Append an entry.
    fn record(&self, entry: &ReadingLogEntry) -> Result<()>;
}

/// Outcome of one snapshot in a batch run.
#[derive(Debug)]
pub struct BatchOutcome {
    /// The remote blob name.
    pub name: String,
    /// What happened to it.
    pub status: BatchStatus,
    /// Human-readable detail.
    pub message: String,
}

/// Status of one snapshot in a batch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchStatus {
    /// Cleaned, uploaded, and logged.
    Cleaned {
        /// Pixels altered by the cleanup pipeline.
        changed: usize,
    },
    /// Nothing to do (already cleaned, or the cleaned blob already exists
    /// remotely).
    Skipped,
    /// A collaborator or the pipeline failed; the batch continued.
    Failed,
}

/// Drives the remote workflow: list, fetch, read temperatures, confirm,
/// clean, upload, log.
///
/// Failures are reported per snapshot and never abort the rest of the
/// batch. Snapshots whose names already carry the cleaned suffix, and
/// non-image blobs, are skipped.
pub struct BatchDriver<'a> {
    engine: &'a CleanupEngine,
    /// Readings below this confidence are sent to the confirmation source.
    pub confidence_threshold: f32,
    /// Local directory for fetched originals.
    pub download_dir: PathBuf,
    /// Local directory for cleaned outputs.
    pub processed_dir: PathBuf,
    /// Location identifier recorded with each log entry.
    pub location_id: String,
}

impl<'a> BatchDriver<'a> {
    /// Default confidence threshold below which readings are confirmed.
    pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 80.0;

    /// Create a driver with the default directories and threshold.
    #[must_use]
    pub fn new(engine: &'a CleanupEngine) -> Self {
        Self {
            engine,
            confidence_threshold: Self::DEFAULT_CONFIDENCE_THRESHOLD,
            download_dir: PathBuf::from("downloaded_images"),
            processed_dir: PathBuf::from("processed_images"),
            location_id: String::from("UNKNOWN"),
        }
    }

    /// Run the batch over every snapshot in the store.
    ///
    /// # Errors
    ///
    /// Returns an error only when the store listing itself fails or a local
    /// working directory cannot be created; per-snapshot failures become
    /// [`BatchStatus::Failed`] outcomes.
    pub fn run(
        &self,
        store: &dyn SnapshotStore,
        reader: &dyn TemperatureReader,
        confirmer: &dyn ConfirmationSource,
        log: &dyn ReadingLog,
    ) -> Result<Vec<BatchOutcome>> {
        fs::create_dir_all(&self.download_dir)?;
        fs::create_dir_all(&self.processed_dir)?;

        let remote_names = store.list()?;
        let mut outcomes = Vec::new();

        for name in &remote_names {
            if !is_supported_image(Path::new(name)) {
                continue;
            }
            if name.to_lowercase().contains("clean") {
                outcomes.push(BatchOutcome {
                    name: name.clone(),
                    status: BatchStatus::Skipped,
                    message: "already a cleaned snapshot".to_string(),
                });
                continue;
            }

            let outcome = self.process_one(name, &remote_names, store, reader, confirmer, log);
            outcomes.push(match outcome {
                Ok(o) => o,
                Err(e) => BatchOutcome {
                    name: name.clone(),
                    status: BatchStatus::Failed,
                    message: e.to_string(),
                },
            });
        }

        Ok(outcomes)
    }

    fn process_one(
        &self,
        name: &str,
        remote_names: &[String],
        store: &dyn SnapshotStore,
        reader: &dyn TemperatureReader,
        confirmer: &dyn ConfirmationSource,
        log: &dyn ReadingLog,
    ) -> Result<BatchOutcome> {
        let cleaned_name = default_output_path(Path::new(name))
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("{name}_clean"));

        if remote_names.iter().any(|n| n == &cleaned_name) {
            return Ok(BatchOutcome {
                name: name.to_string(),
                status: BatchStatus::Skipped,
                message: format!("{cleaned_name} already exists remotely"),
            });
        }

        let download_path = self.download_dir.join(name);
        if download_path.exists() {
            debug!(name, "already downloaded");
        } else {
            info!(name, "downloading");
            store.fetch(name, &download_path)?;
        }

        // Readings come from the original snapshot, before any inpainting.
        let mut readings = reader.read(&download_path)?;
        if readings.needs_confirmation(self.confidence_threshold) {
            info!(
                name,
                min_conf = readings.min.confidence,
                max_conf = readings.max.confidence,
                "low reading confidence, requesting confirmation"
            );
            readings = confirmer.confirm(&download_path, readings)?;
        }

        let cleaned_path = self.processed_dir.join(&cleaned_name);
        let result = self.engine.process_file(&download_path, &cleaned_path);
        if !result.success {
            return Ok(BatchOutcome {
                name: name.to_string(),
                status: BatchStatus::Failed,
                message: result.message,
            });
        }

        let url = store.store(&cleaned_path, &cleaned_name)?;

        if log.contains(&url)? {
            debug!(name, url, "log entry already present");
        } else {
            log.record(&ReadingLogEntry {
                location_id: self.location_id.clone(),
                min: readings.min.value,
                max: readings.max.value,
                url,
            })?;
        }

        Ok(BatchOutcome {
            name: name.to_string(),
            status: BatchStatus::Cleaned {
                changed: result.changed,
            },
            message: format!("uploaded as {cleaned_name}"),
        })
    }
}
