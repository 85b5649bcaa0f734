//! Point cloud container and the shared handle passed to the viewer

use crate::point::RawPoint;
use serde::{Deserialize, Serialize};
use std::ops::Index;
use std::sync::Arc;

/// A generic point cloud container
///
/// Serializes as a bare array of points, matching the `pointCloud` field of
/// a classification result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PointCloud<T> {
    pub points: Vec<T>,
}

/// A point cloud exactly as received from the classifier, not yet validated
pub type RawPointCloud = PointCloud<RawPoint>;

/// Shared, immutable handle to a raw point cloud.
///
/// The viewer keys its derived geometry on the identity of this handle
/// (`Arc::ptr_eq`), not on the contents.
pub type SharedPointCloud = Arc<RawPointCloud>;

impl<T> PointCloud<T> {
    /// Create a new empty point cloud
    pub fn new() -> Self {
        Self { points: Vec::new() }
    }

    /// Create a point cloud from a vector of points
    pub fn from_points(points: Vec<T>) -> Self {
        Self { points }
    }

    /// Get the number of points in the cloud
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the point cloud is empty
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Get an iterator over the points
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.points.iter()
    }

    /// Wrap the cloud in a shared handle
    pub fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}

impl RawPointCloud {
    /// Build a raw cloud from well-formed coordinate triples
    pub fn from_xyz<I>(points: I) -> Self
    where
        I: IntoIterator<Item = [f64; 3]>,
    {
        points.into_iter().map(|p| p.to_vec()).collect()
    }
}

impl<T> Default for PointCloud<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Index<usize> for PointCloud<T> {
    type Output = T;

    fn index(&self, index: usize) -> &Self::Output {
        &self.points[index]
    }
}

impl<T> IntoIterator for PointCloud<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a PointCloud<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

impl<T> FromIterator<T> for PointCloud<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            points: Vec::from_iter(iter),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_cloud_deserializes_from_bare_array() {
        let cloud: RawPointCloud = serde_json::from_str("[[0,0,0],[1,2,3]]").unwrap();
        assert_eq!(cloud.len(), 2);
        assert_eq!(cloud[1], vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_ragged_points_survive_decoding() {
        // Arity is checked when geometry is built, not at decode time.
        let cloud: RawPointCloud = serde_json::from_str("[[1,2],[1,2,3,4]]").unwrap();
        assert_eq!(cloud[0].len(), 2);
        assert_eq!(cloud[1].len(), 4);
    }

    #[test]
    fn test_from_xyz() {
        let cloud = RawPointCloud::from_xyz([[0.0, 1.0, 2.0]]);
        assert_eq!(cloud.points, vec![vec![0.0, 1.0, 2.0]]);
    }

    #[test]
    fn test_shared_handles_compare_by_identity() {
        let a = RawPointCloud::from_xyz([[0.0, 0.0, 0.0]]).into_shared();
        let b = RawPointCloud::from_xyz([[0.0, 0.0, 0.0]]).into_shared();
        assert_eq!(a, b);
        assert!(!Arc::ptr_eq(&a, &b));
        assert!(Arc::ptr_eq(&a, &Arc::clone(&a)));
    }
}
