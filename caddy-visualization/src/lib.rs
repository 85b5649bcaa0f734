//! Point cloud visualization for CADDY classification results
//!
//! A [`Viewer`] takes the point cloud of a classification result and keeps
//! an interactive 3D view of it:
//! - [`GeometryBuilder`] turns points into a flat vertex buffer, once per cloud
//! - [`SceneComposer`] wraps the buffer with lights, styling and axes
//! - [`InteractionController`] maps pointer, wheel and touch input to the camera
//! - [`RenderLoop`] presents one frame per display refresh while there is data
//!
//! Presentation and frame timing sit behind the [`Presenter`] and
//! [`FrameScheduler`] traits. [`run_viewer`] wires them to a winit window and
//! wgpu.

pub mod camera;
pub mod controls;
pub mod geometry;
pub mod render_loop;
pub mod renderer;
pub mod scene;
pub mod viewer;
pub mod window;

pub use camera::*;
pub use controls::*;
pub use geometry::*;
pub use render_loop::*;
pub use renderer::*;
pub use scene::*;
pub use viewer::*;
pub use window::*;

pub use caddy_gpu::RenderConfig;
