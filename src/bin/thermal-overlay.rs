use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;

use thermal_overlay_removal::{
    default_output_path, CleanupConfig, CleanupEngine, ProcessResult, Region,
};

#[derive(Parser)]
#[command(
    name = "thermal-overlay",
    about = "Remove fixed-position instrument overlays from thermal camera snapshots",
    version,
    after_help = "Simple usage: thermal-overlay <image>  (clean to {name}_clean.{ext})\n\n\
                  NOTE: The default overlay regions match the supported camera's\n\
                  nominal frame. Images with other dimensions are processed with\n\
                  the regions clipped to whatever fits."
)]
struct Cli {
    /// Input image file or directory
    input: String,

    /// Output file or directory (default: {name}_clean.{ext})
    #[arg(short, long)]
    output: Option<String>,

    /// White-detection tolerance (0-255)
    #[arg(short, long, default_value = "150")]
    tolerance: u8,

    /// Neighbor count for k-NN inpainting
    #[arg(short, long, default_value = "150")]
    neighbors: usize,

    /// Number of white-stage passes
    #[arg(long, default_value = "2")]
    passes: usize,

    /// Leave the temperature legend bar untouched
    #[arg(long)]
    no_bar: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all non-error output
    #[arg(short, long)]
    quiet: bool,
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if cli.passes == 0 {
        eprintln!("Error: --passes must be at least 1");
        process::exit(1);
    }
    if cli.neighbors == 0 {
        eprintln!("Error: --neighbors must be at least 1");
        process::exit(1);
    }

    let config = CleanupConfig {
        tolerance: cli.tolerance,
        neighbor_count: cli.neighbors,
        passes: cli.passes,
        smooth_bar: !cli.no_bar,
        ..CleanupConfig::default()
    };
    let engine = CleanupEngine::with_config(config);

    let input_path = Path::new(&cli.input);
    if !input_path.exists() {
        eprintln!("Error: Input path does not exist: {}", cli.input);
        process::exit(1);
    }

    if cli.verbose && !cli.quiet {
        let config = engine.config();
        eprintln!(
            "tolerance={}, neighbors={}, passes={}, bar smoothing {}",
            config.tolerance,
            config.neighbor_count,
            config.passes,
            if config.smooth_bar { "on" } else { "off" }
        );
        print_regions(config);
        eprintln!();
    }

    let results = if input_path.is_dir() {
        let output_dir = if let Some(o) = &cli.output {
            PathBuf::from(o)
        } else {
            eprintln!("Error: Output directory is required for batch processing");
            eprintln!("Usage: thermal-overlay <input_dir> -o <output_dir>");
            process::exit(1);
        };
        engine.process_directory(input_path, &output_dir)
    } else {
        let output_path = match &cli.output {
            Some(o) => PathBuf::from(o),
            None => default_output_path(input_path),
        };
        vec![engine.process_file(input_path, &output_path)]
    };

    let mut success_count = 0u32;
    let mut fail_count = 0u32;

    for r in &results {
        print_result(r, cli.quiet);
        if r.success {
            success_count += 1;
        } else {
            fail_count += 1;
        }
    }

    if results.len() > 1 && !cli.quiet {
        eprintln!();
        eprint!("[Summary] Cleaned: {success_count}");
        if fail_count > 0 {
            eprint!(", Failed: {fail_count}");
        }
        eprintln!(" (Total: {})", results.len());
    }

    if fail_count > 0 {
        process::exit(1);
    }
}

fn print_regions(config: &CleanupConfig) {
    let fmt = |r: &Region| format!("({}, {}) {}x{}", r.x, r.y, r.width, r.height);
    for region in &config.white_regions {
        eprintln!("  white region {}", fmt(region));
    }
    eprintln!("  green region {}", fmt(&config.green_region));
    eprintln!("  bar region   {}", fmt(&config.bar_region));
}

fn print_result(result: &ProcessResult, quiet: bool) {
    if quiet && result.success {
        return;
    }

    let filename = result.path.file_name().map_or_else(
        || result.path.display().to_string(),
        |f| f.to_string_lossy().to_string(),
    );

    if result.success {
        eprintln!("[OK] {filename} ({} pixels changed)", result.changed);
    } else {
        eprintln!("[FAIL] {filename}: {}", result.message);
    }
}
