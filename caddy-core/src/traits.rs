//! Core traits for CADDY

use crate::{point::Point3f, vertex_buffer::VertexBuffer};

/// Trait for drawable/renderable objects
pub trait Drawable {
    /// Get the axis-aligned bounding box of the object, or `None` if it has
    /// no points
    fn bounding_box(&self) -> Option<(Point3f, Point3f)>;

    /// Get the center point of the object
    fn center(&self) -> Option<Point3f> {
        let (min, max) = self.bounding_box()?;
        Some(nalgebra::center(&min, &max))
    }
}

fn bounds_of<I: IntoIterator<Item = Point3f>>(points: I) -> Option<(Point3f, Point3f)> {
    let mut points = points.into_iter();
    let first = points.next()?;
    let (mut min, mut max) = (first, first);

    for p in points {
        min.x = min.x.min(p.x);
        min.y = min.y.min(p.y);
        min.z = min.z.min(p.z);

        max.x = max.x.max(p.x);
        max.y = max.y.max(p.y);
        max.z = max.z.max(p.z);
    }

    Some((min, max))
}

impl Drawable for VertexBuffer {
    fn bounding_box(&self) -> Option<(Point3f, Point3f)> {
        bounds_of(self.points())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point_cloud::RawPointCloud;
    use approx::assert_relative_eq;

    #[test]
    fn test_vertex_buffer_bounds() {
        let cloud = RawPointCloud::from_xyz([[-1.0, 0.0, 2.0], [3.0, -4.0, 0.5], [0.0, 1.0, 1.0]]);
        let buffer = VertexBuffer::from_point_cloud(&cloud).unwrap().unwrap();

        let (min, max) = buffer.bounding_box().unwrap();
        assert_eq!(min, Point3f::new(-1.0, -4.0, 0.5));
        assert_eq!(max, Point3f::new(3.0, 1.0, 2.0));

        let center = buffer.center().unwrap();
        assert_relative_eq!(center.x, 1.0);
        assert_relative_eq!(center.y, -1.5);
        assert_relative_eq!(center.z, 1.25);
    }
}
