//! wgpu-backed [`Presenter`]

use crate::camera::Camera;
use crate::render_loop::Presenter;
use crate::scene::{AxesHelper, PointStyle, SceneNode};
use caddy_core::{Error, Result, VertexBuffer};
use caddy_gpu::{LineVertex, PointCloudRenderer, PointParams, RenderConfig};
use std::sync::{Arc, Weak};
use winit::window::Window;

/// Line vertices for the three axis segments
pub fn axes_vertices(axes: &AxesHelper) -> Vec<LineVertex> {
    axes.segments()
        .iter()
        .flat_map(|(from, to, color)| {
            let color = color.to_array();
            [
                LineVertex {
                    position: [from.x, from.y, from.z],
                    color,
                },
                LineVertex {
                    position: [to.x, to.y, to.z],
                    color,
                },
            ]
        })
        .collect()
}

impl From<PointStyle> for PointParams {
    fn from(style: PointStyle) -> Self {
        PointParams {
            size: style.size,
            color: style.color.to_array(),
            size_attenuation: style.size_attenuation,
        }
    }
}

/// Presents scenes through a [`PointCloudRenderer`].
///
/// The vertex buffer is uploaded once per scene; later frames reuse the GPU
/// copy until the viewer releases the geometry.
pub struct WgpuPresenter {
    renderer: Option<PointCloudRenderer>,
    uploaded: Option<Weak<VertexBuffer>>,
    axes_uploaded: bool,
}

impl WgpuPresenter {
    pub fn new(renderer: PointCloudRenderer) -> Self {
        Self {
            renderer: Some(renderer),
            uploaded: None,
            axes_uploaded: false,
        }
    }

    /// Create the GPU context for `window` and wrap it
    pub async fn for_window(window: Arc<Window>, config: RenderConfig) -> Result<Self> {
        Ok(Self::new(PointCloudRenderer::new(window, config).await?))
    }

    /// Resize the surface; ignored once released
    pub fn resize(&mut self, width: u32, height: u32) {
        if let Some(renderer) = self.renderer.as_mut() {
            renderer.resize(width, height);
        }
    }

    pub fn is_released(&self) -> bool {
        self.renderer.is_none()
    }

    fn is_uploaded(&self, buffer: &Arc<VertexBuffer>) -> bool {
        // The weak handle keeps the allocation, so the address cannot be reused.
        self.uploaded
            .as_ref()
            .is_some_and(|uploaded| std::ptr::eq(uploaded.as_ptr(), Arc::as_ptr(buffer)))
    }
}

impl Presenter for WgpuPresenter {
    fn present(&mut self, scene: Option<&SceneNode>, camera: &Camera) -> Result<()> {
        let buffer = scene.and_then(SceneNode::vertex_buffer);
        let needs_upload = buffer.is_some_and(|buffer| !self.is_uploaded(buffer));

        let Some(renderer) = self.renderer.as_mut() else {
            return Err(Error::Visualization("presentation context already released".to_string()));
        };

        match buffer {
            Some(buffer) if needs_upload => {
                renderer.set_points(buffer)?;
                self.uploaded = Some(Arc::downgrade(buffer));
                log::debug!("uploaded {} points to the GPU", buffer.point_count());
            }
            Some(_) => {}
            None => {
                renderer.clear_points();
                self.uploaded = None;
            }
        }

        match scene.and_then(SceneNode::axes) {
            Some(axes) if !self.axes_uploaded => {
                renderer.set_lines(&axes_vertices(axes));
                self.axes_uploaded = true;
            }
            Some(_) => {}
            None => {
                renderer.clear_lines();
                self.axes_uploaded = false;
            }
        }

        let style = scene
            .and_then(SceneNode::points)
            .map(|points| points.style)
            .unwrap_or_default();
        renderer.update_frame(camera.view_matrix(), camera.projection_matrix(), style.into());
        renderer.render()
    }

    fn release_geometry(&mut self) {
        if let Some(renderer) = self.renderer.as_mut() {
            renderer.clear_points();
            renderer.clear_lines();
        }
        self.uploaded = None;
        self.axes_uploaded = false;
    }

    fn release(&mut self) {
        self.release_geometry();
        if self.renderer.take().is_some() {
            log::debug!("released GPU context");
        }
    }
}
