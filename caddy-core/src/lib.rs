//! Core data structures and traits for CADDY
//!
//! This crate holds the data that flows into the point cloud viewer:
//! the classification result handed over by the classifier, raw and
//! validated point clouds, and the flat vertex buffer derived from them.

pub mod point;
pub mod point_cloud;
pub mod vertex_buffer;
pub mod classification;
pub mod traits;
pub mod error;

pub use point::*;
pub use point_cloud::*;
pub use vertex_buffer::*;
pub use classification::*;
pub use traits::*;
pub use error::*;

/// Re-export commonly used types from nalgebra
pub use nalgebra::{Point3, Vector3, Matrix4};
