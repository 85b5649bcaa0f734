//! Point types and per-point validation

use crate::error::{Error, PointIssue, Result};
use nalgebra::{Point3, Vector3};

/// A 3D point with floating point coordinates
pub type Point3f = Point3<f32>;

/// A 3D vector with floating point components
pub type Vector3f = Vector3<f32>;

/// A point as delivered by the classifier: a list of numbers that should
/// hold exactly `x, y, z`.
pub type RawPoint = Vec<f64>;

/// Check that `components` is exactly three finite numbers that survive the
/// conversion to `f32`, and return them as vertex components.
///
/// `index` is the position of the point in its cloud and is only used for
/// the error report.
pub fn validate_point(index: usize, components: &[f64]) -> Result<[f32; 3]> {
    if components.len() != 3 {
        return Err(Error::InvalidPointCloudData {
            index,
            issue: PointIssue::WrongArity {
                found: components.len(),
            },
        });
    }

    let mut out = [0.0f32; 3];
    for (component, (&value, slot)) in components.iter().zip(out.iter_mut()).enumerate() {
        if !value.is_finite() {
            return Err(Error::InvalidPointCloudData {
                index,
                issue: PointIssue::NonFinite { component },
            });
        }
        let narrowed = value as f32;
        if !narrowed.is_finite() {
            return Err(Error::InvalidPointCloudData {
                index,
                issue: PointIssue::OutOfRange { component },
            });
        }
        *slot = narrowed;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_point() {
        assert_eq!(validate_point(0, &[1.0, -2.5, 3.0]).unwrap(), [1.0, -2.5, 3.0]);
    }

    #[test]
    fn test_wrong_arity() {
        let err = validate_point(7, &[1.0, 2.0]).unwrap_err();
        assert_eq!(err.point_issue(), Some((7, PointIssue::WrongArity { found: 2 })));

        let err = validate_point(0, &[1.0, 2.0, 3.0, 4.0]).unwrap_err();
        assert_eq!(err.point_issue(), Some((0, PointIssue::WrongArity { found: 4 })));
    }

    #[test]
    fn test_non_finite() {
        let err = validate_point(1, &[0.0, f64::NAN, 0.0]).unwrap_err();
        assert_eq!(err.point_issue(), Some((1, PointIssue::NonFinite { component: 1 })));

        let err = validate_point(1, &[0.0, 0.0, f64::NEG_INFINITY]).unwrap_err();
        assert_eq!(err.point_issue(), Some((1, PointIssue::NonFinite { component: 2 })));
    }

    #[test]
    fn test_out_of_f32_range() {
        let err = validate_point(3, &[1e300, 0.0, 0.0]).unwrap_err();
        assert_eq!(err.point_issue(), Some((3, PointIssue::OutOfRange { component: 0 })));
    }
}
