//! Memoized point cloud to vertex buffer derivation

use caddy_core::{Result, SharedPointCloud, VertexBuffer};
use std::sync::Arc;

/// The last derivation, keyed on the identity of its source
#[derive(Debug)]
struct CacheEntry {
    source: SharedPointCloud,
    buffer: Option<Arc<VertexBuffer>>,
}

/// Turns point clouds into vertex buffers, rebuilding only when handed a
/// different point cloud handle.
///
/// The cache holds the source handle itself, so identity is never confused
/// by a freed allocation being reused.
#[derive(Debug, Default)]
pub struct GeometryBuilder {
    cache: Option<CacheEntry>,
    builds: u64,
}

impl GeometryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Vertex buffer for `cloud`.
    ///
    /// `None` and empty clouds yield `Ok(None)`. The same handle returns the
    /// cached buffer; any other handle drops the previous buffer and builds a
    /// new one. A malformed cloud clears the cache and reports
    /// `Error::InvalidPointCloudData`.
    pub fn build(&mut self, cloud: Option<&SharedPointCloud>) -> Result<Option<Arc<VertexBuffer>>> {
        let Some(cloud) = cloud else {
            self.release();
            return Ok(None);
        };

        if let Some(entry) = &self.cache {
            if Arc::ptr_eq(&entry.source, cloud) {
                return Ok(entry.buffer.clone());
            }
        }

        // Release the previous buffer before allocating the next one.
        self.release();

        let buffer = VertexBuffer::from_point_cloud(cloud)?.map(Arc::new);
        if let Some(buffer) = &buffer {
            self.builds += 1;
            log::debug!(
                "built vertex buffer: {} points, {} floats",
                buffer.point_count(),
                buffer.len()
            );
        }

        self.cache = Some(CacheEntry {
            source: Arc::clone(cloud),
            buffer: buffer.clone(),
        });
        Ok(buffer)
    }

    /// Whether `cloud` is the handle the cached buffer was built from
    pub fn is_current(&self, cloud: Option<&SharedPointCloud>) -> bool {
        match (&self.cache, cloud) {
            (Some(entry), Some(cloud)) => Arc::ptr_eq(&entry.source, cloud),
            (None, None) => true,
            _ => false,
        }
    }

    /// The buffer currently held, if any
    pub fn current(&self) -> Option<&Arc<VertexBuffer>> {
        self.cache.as_ref().and_then(|entry| entry.buffer.as_ref())
    }

    /// Number of buffers built so far
    pub fn build_count(&self) -> u64 {
        self.builds
    }

    /// Drop the cached buffer and its source handle
    pub fn release(&mut self) {
        if let Some(entry) = self.cache.take() {
            if entry.buffer.is_some() {
                log::debug!("released vertex buffer");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use caddy_core::{PointIssue, RawPointCloud};

    fn cloud(points: &[[f64; 3]]) -> SharedPointCloud {
        RawPointCloud::from_xyz(points.iter().copied()).into_shared()
    }

    #[test]
    fn test_absent_and_empty_yield_none() {
        let mut builder = GeometryBuilder::new();
        assert!(builder.build(None).unwrap().is_none());
        assert!(builder.build(Some(&RawPointCloud::new().into_shared())).unwrap().is_none());
        assert_eq!(builder.build_count(), 0);
    }

    #[test]
    fn test_length_is_three_per_point() {
        let mut builder = GeometryBuilder::new();
        for n in 0..40usize {
            let source: SharedPointCloud = (0..n)
                .map(|i| vec![i as f64, -(i as f64), 0.25])
                .collect::<RawPointCloud>()
                .into_shared();
            match builder.build(Some(&source)).unwrap() {
                Some(buffer) => assert_eq!(buffer.len(), 3 * n),
                None => assert_eq!(n, 0),
            }
        }
    }

    #[test]
    fn test_same_handle_returns_cached_buffer() {
        let mut builder = GeometryBuilder::new();
        let source = cloud(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]);

        let first = builder.build(Some(&source)).unwrap().unwrap();
        let second = builder.build(Some(&source)).unwrap().unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(builder.build_count(), 1);
        assert_eq!(first.as_slice(), &[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_new_handle_rebuilds_once_and_releases_old_buffer() {
        let mut builder = GeometryBuilder::new();
        let points = [[0.0, 0.0, 0.0], [1.0, 1.0, 1.0]];

        let old = Arc::downgrade(&builder.build(Some(&cloud(&points))).unwrap().unwrap());
        assert!(old.upgrade().is_some());

        // Equal contents, different handle.
        let replacement = cloud(&points);
        let new = builder.build(Some(&replacement)).unwrap().unwrap();

        assert_eq!(builder.build_count(), 2);
        assert!(old.upgrade().is_none());
        assert!(Arc::ptr_eq(builder.current().unwrap(), &new));

        assert!(builder.is_current(Some(&replacement)));
        builder.build(Some(&replacement)).unwrap();
        assert_eq!(builder.build_count(), 2);
    }

    #[test]
    fn test_malformed_cloud_produces_no_buffer() {
        let mut builder = GeometryBuilder::new();
        let built = builder.build(Some(&cloud(&[[0.0, 0.0, 0.0]]))).unwrap();
        let good = built.as_ref().map(Arc::downgrade).unwrap();
        drop(built);

        let bad = RawPointCloud::from_points(vec![vec![1.0, 2.0]]).into_shared();
        let err = builder.build(Some(&bad)).unwrap_err();

        assert_eq!(err.point_issue(), Some((0, PointIssue::WrongArity { found: 2 })));
        assert!(builder.current().is_none());
        assert!(good.upgrade().is_none());
        assert_eq!(builder.build_count(), 1);
    }

    #[test]
    fn test_source_is_not_mutated() {
        let mut builder = GeometryBuilder::new();
        let source = cloud(&[[0.5, 0.25, 0.125]]);
        let snapshot = (*source).clone();
        builder.build(Some(&source)).unwrap();
        assert_eq!(*source, snapshot);
    }

    #[test]
    fn test_release_drops_buffer() {
        let mut builder = GeometryBuilder::new();
        let built = builder.build(Some(&cloud(&[[1.0, 2.0, 3.0]]))).unwrap();
        let buffer = built.as_ref().map(Arc::downgrade).unwrap();
        drop(built);
        builder.release();
        builder.release();
        assert!(buffer.upgrade().is_none());
        assert!(builder.current().is_none());
    }
}
