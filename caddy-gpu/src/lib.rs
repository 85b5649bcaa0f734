//! # CADDY GPU
//!
//! wgpu rendering for the CADDY point cloud viewer.
//!
//! Points are drawn as screen-facing quads, one instance per point, straight
//! from the flat `x, y, z` layout of [`caddy_core::VertexBuffer`]. Line
//! segments (the axes helper) share the same per-frame uniform.

pub mod device;
pub mod renderer;
pub mod shaders;

pub use device::GpuContext;
pub use renderer::{
    opengl_to_wgpu_matrix, LineVertex, PointCloudRenderer, PointParams, RenderConfig,
};
