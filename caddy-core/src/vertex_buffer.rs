//! Flat, immutable vertex positions derived from a point cloud

use crate::error::Result;
use crate::point::{validate_point, Point3f};
use crate::point_cloud::RawPointCloud;

/// Contiguous `x, y, z` floats, three per point, ready for GPU upload.
///
/// Elements `3i..3i+2` hold point `i`. There is no way to mutate the
/// contents after construction; a new cloud means a new buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct VertexBuffer {
    data: Box<[f32]>,
}

impl VertexBuffer {
    /// Number of components per vertex
    pub const STRIDE: usize = 3;

    /// Derive a vertex buffer from a raw point cloud.
    ///
    /// Every point is checked before anything is allocated for the buffer.
    /// Returns `Ok(None)` for an empty cloud: there is no zero-length buffer.
    pub fn from_point_cloud(cloud: &RawPointCloud) -> Result<Option<Self>> {
        if cloud.is_empty() {
            return Ok(None);
        }

        let positions = cloud
            .iter()
            .enumerate()
            .map(|(index, point)| validate_point(index, point))
            .collect::<Result<Vec<[f32; 3]>>>()?;

        let data: Box<[f32]> = positions.into_iter().flatten().collect();
        Ok(Some(Self { data }))
    }

    /// Total number of floats (`3 × point_count`)
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Always false for a constructed buffer
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Number of points the buffer holds
    pub fn point_count(&self) -> usize {
        self.data.len() / Self::STRIDE
    }

    /// The flat float data
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// The data as raw bytes for GPU upload
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.data)
    }

    /// Position of point `index`
    pub fn point(&self, index: usize) -> Option<Point3f> {
        let start = index.checked_mul(Self::STRIDE)?;
        let xyz = self.data.get(start..start + Self::STRIDE)?;
        Some(Point3f::new(xyz[0], xyz[1], xyz[2]))
    }

    /// Iterate over point positions
    pub fn points(&self) -> impl Iterator<Item = Point3f> + '_ {
        self.data
            .chunks_exact(Self::STRIDE)
            .map(|xyz| Point3f::new(xyz[0], xyz[1], xyz[2]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PointIssue;

    #[test]
    fn test_flattens_in_point_order() {
        let cloud = RawPointCloud::from_xyz([[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]);
        let buffer = VertexBuffer::from_point_cloud(&cloud).unwrap().unwrap();

        assert_eq!(buffer.as_slice(), &[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]);
        assert_eq!(buffer.len(), 9);
        assert_eq!(buffer.point_count(), 3);
        assert_eq!(buffer.point(1), Some(Point3f::new(1.0, 0.0, 0.0)));
        assert_eq!(buffer.point(3), None);
        assert_eq!(buffer.as_bytes().len(), 9 * 4);
    }

    #[test]
    fn test_length_is_three_per_point() {
        for n in [1usize, 2, 17, 1024] {
            let cloud: RawPointCloud = (0..n).map(|i| vec![i as f64, 0.5, -1.0]).collect();
            let buffer = VertexBuffer::from_point_cloud(&cloud).unwrap().unwrap();
            assert_eq!(buffer.len(), 3 * n);
            assert_eq!(buffer.points().count(), n);
        }
    }

    #[test]
    fn test_empty_cloud_has_no_buffer() {
        assert!(VertexBuffer::from_point_cloud(&RawPointCloud::new()).unwrap().is_none());
    }

    #[test]
    fn test_first_bad_point_is_reported() {
        let cloud = RawPointCloud::from_points(vec![
            vec![0.0, 0.0, 0.0],
            vec![1.0, 2.0],
            vec![f64::NAN, 0.0, 0.0],
        ]);
        let err = VertexBuffer::from_point_cloud(&cloud).unwrap_err();
        assert_eq!(err.point_issue(), Some((1, PointIssue::WrongArity { found: 2 })));
    }
}
