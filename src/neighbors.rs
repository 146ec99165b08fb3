//! Spatial nearest-neighbor index over pixel coordinates.
//!
//! Built once per artifact-class pass from the genuine/outside coordinate
//! pool and queried repeatedly; the point set is immutable for the lifetime
//! of the index even though the colors stored at those coordinates may
//! change in the underlying image buffer.

use rstar::primitives::GeomWithData;
use rstar::RTree;

/// An R\*-tree entry: the pixel position as a float point, tagged with the
/// original integer coordinate.
type IndexedPixel = GeomWithData<[f64; 2], (u32, u32)>;

/// k-nearest-neighbor index over a fixed set of pixel coordinates.
///
/// Queries return coordinates by ascending Euclidean distance. For a fixed
/// point set the iteration order is deterministic, so repeated queries (and
/// repeated runs) produce identical results.
pub struct NeighborIndex {
    tree: RTree<IndexedPixel>,
    point_count: usize,
}

impl NeighborIndex {
    /// Build an index from a coordinate pool.
    ///
    /// Returns `None` for an empty pool — the "empty neighbor pool"
    /// condition, which callers must handle by skipping the affected pixels
    /// rather than failing.
    #[must_use]
    pub fn new(points: &[(u32, u32)]) -> Option<Self> {
        if points.is_empty() {
            return None;
        }
        let entries: Vec<IndexedPixel> = points
            .iter()
            .map(|&(x, y)| GeomWithData::new([f64::from(x), f64::from(y)], (x, y)))
            .collect();
        Some(Self {
            tree: RTree::bulk_load(entries),
            point_count: points.len(),
        })
    }

    /// Number of points in the pool. Always at least one.
    #[must_use]
    pub const fn point_count(&self) -> usize {
        self.point_count
    }

    /// The `min(k, point_count)` coordinates nearest to `point` by Euclidean
    /// pixel distance, closest first. Requesting `k = 0` yields an empty
    /// result.
    #[must_use]
    pub fn query(&self, point: (u32, u32), k: usize) -> Vec<(u32, u32)> {
        let query = [f64::from(point.0), f64::from(point.1)];
        self.tree
            .nearest_neighbor_iter(&query)
            .take(k.min(self.point_count))
            .map(|entry| entry.data)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_pool_yields_no_index() {
        assert!(NeighborIndex::new(&[]).is_none());
    }

    #[test]
    fn query_returns_nearest_point_first() {
        let pool = vec![(0, 0), (10, 0), (3, 4), (100, 100)];
        let index = NeighborIndex::new(&pool).unwrap();
        let nearest = index.query((2, 3), 1);
        assert_eq!(nearest, vec![(3, 4)]);
    }

    #[test]
    fn query_is_ordered_by_distance() {
        let pool = vec![(0, 0), (5, 0), (2, 0)];
        let index = NeighborIndex::new(&pool).unwrap();
        let result = index.query((0, 0), 3);
        assert_eq!(result, vec![(0, 0), (2, 0), (5, 0)]);
    }

    #[test]
    fn oversized_k_clamps_to_pool_size() {
        let pool = vec![(1, 1), (2, 2)];
        let index = NeighborIndex::new(&pool).unwrap();
        let result = index.query((0, 0), 150);
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn zero_k_yields_empty_result() {
        let index = NeighborIndex::new(&[(1, 1)]).unwrap();
        assert!(index.query((0, 0), 0).is_empty());
    }

    #[test]
    fn repeated_queries_are_deterministic() {
        // Includes distance ties; the tie-break only needs to be stable.
        let pool: Vec<(u32, u32)> = (0..20).flat_map(|y| (0..20).map(move |x| (x, y))).collect();
        let index = NeighborIndex::new(&pool).unwrap();
        let a = index.query((10, 10), 12);
        let b = index.query((10, 10), 12);
        assert_eq!(a, b);
    }
}
