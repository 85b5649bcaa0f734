//! Point cloud viewer: owns geometry, scene, camera and render loop

use crate::camera::Camera;
use crate::controls::{ControlsConfig, InputEvent, InteractionController};
use crate::geometry::GeometryBuilder;
use crate::render_loop::{FrameHandle, FrameScheduler, Presenter, RenderLoop};
use crate::scene::{SceneComposer, SceneConfig, SceneNode, PLACEHOLDER_TEXT};
use caddy_core::{ClassificationResult, Drawable, Result, SharedPointCloud, VertexBuffer};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Viewer configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub scene: SceneConfig,
    pub controls: ControlsConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerState {
    /// No geometry; the placeholder is shown
    Empty,
    /// Geometry is built and frames are being presented
    Rendering,
    /// Torn down; terminal
    Disposed,
}

/// An interactive point cloud viewer.
///
/// Starts `Empty`. A non-empty point cloud moves it to `Rendering`; an empty,
/// absent or malformed one moves it back to `Empty` after releasing the old
/// geometry. [`dispose`](Self::dispose), also run on drop, is terminal.
pub struct Viewer<P: Presenter, S: FrameScheduler> {
    state: ViewerState,
    geometry: GeometryBuilder,
    composer: SceneComposer,
    scene: Option<SceneNode>,
    camera: Camera,
    controls: InteractionController,
    render_loop: RenderLoop<P, S>,
}

impl<P: Presenter, S: FrameScheduler> Viewer<P, S> {
    pub fn new(config: ViewerConfig, presenter: P, scheduler: S) -> Self {
        let composer = SceneComposer::new(config.scene);
        let camera = composer.default_camera(1.0);
        Self {
            state: ViewerState::Empty,
            geometry: GeometryBuilder::new(),
            composer,
            scene: None,
            camera,
            controls: InteractionController::new(config.controls),
            render_loop: RenderLoop::new(presenter, scheduler),
        }
    }

    pub fn state(&self) -> ViewerState {
        self.state
    }

    /// Placeholder text while there is no geometry to show
    pub fn placeholder(&self) -> Option<&'static str> {
        (self.state == ViewerState::Empty).then_some(PLACEHOLDER_TEXT)
    }

    /// Feed the point cloud of a classification result
    pub fn load_result(&mut self, result: &ClassificationResult) -> Result<ViewerState> {
        self.set_point_cloud(result.point_cloud.as_ref())
    }

    /// Replace the displayed point cloud.
    ///
    /// Geometry and scene are rebuilt only when `cloud` is a different
    /// handle from the previous call. The new scene is in place before this
    /// returns, so the next frame never sees a partial update.
    pub fn set_point_cloud(&mut self, cloud: Option<&SharedPointCloud>) -> Result<ViewerState> {
        if self.state == ViewerState::Disposed {
            log::warn!("point cloud supplied to a disposed viewer; ignoring");
            return Ok(ViewerState::Disposed);
        }

        // Drop the old scene first so the old buffer is gone before the
        // next one is allocated.
        if !self.geometry.is_current(cloud) {
            self.clear_scene();
        }

        let buffer = match self.geometry.build(cloud) {
            Ok(buffer) => buffer,
            Err(e) => {
                self.clear_scene();
                self.enter_empty();
                return Err(e);
            }
        };

        if self.scene.is_none() {
            self.scene = self.composer.compose(buffer).into_scene();
        }

        if self.scene.is_some() {
            if self.state != ViewerState::Rendering {
                log::debug!("viewer: empty -> rendering");
            }
            self.state = ViewerState::Rendering;
            self.render_loop.start();
        } else {
            self.enter_empty();
        }
        Ok(self.state)
    }

    /// Route an input event to the camera. Returns true when it moved.
    ///
    /// Input never reaches the geometry or the scene.
    pub fn handle_input(&mut self, event: &InputEvent) -> bool {
        if self.state == ViewerState::Disposed {
            return false;
        }
        self.controls.handle(&mut self.camera, event)
    }

    /// Viewport size changed
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        self.handle_input(&InputEvent::Resize { width, height })
    }

    /// Put the camera back where it started, keeping the aspect ratio
    pub fn reset_camera(&mut self) {
        if self.state == ViewerState::Disposed {
            return;
        }
        self.camera = self.composer.default_camera(self.camera.aspect_ratio);
    }

    /// Aim the camera at the bounds of the current geometry
    pub fn fit_camera_to_data(&mut self) -> bool {
        let Some((min, max)) = self.vertex_buffer().and_then(|b| b.bounding_box()) else {
            return false;
        };
        self.camera.focus_on(min, max);
        true
    }

    /// Host callback for a fired frame
    pub fn on_frame(&mut self, handle: FrameHandle) -> bool {
        self.render_loop.on_frame(handle, self.scene.as_ref(), &self.camera)
    }

    /// Present a single frame with no scene while `Empty`, so the host's
    /// surface shows the cleared background behind the placeholder.
    /// Returns false in any other state.
    pub fn present_placeholder(&mut self) -> bool {
        if self.state != ViewerState::Empty {
            return false;
        }
        self.render_loop.present_once(None, &self.camera)
    }

    /// Release everything: the vertex buffer, then the scene, then the
    /// presentation context. Safe to call more than once.
    pub fn dispose(&mut self) {
        if self.state == ViewerState::Disposed {
            return;
        }
        self.geometry.release();
        self.render_loop.release_geometry();
        self.scene = None;
        self.render_loop.stop();
        self.state = ViewerState::Disposed;
        log::debug!("viewer disposed");
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn scene(&self) -> Option<&SceneNode> {
        self.scene.as_ref()
    }

    pub fn vertex_buffer(&self) -> Option<&Arc<VertexBuffer>> {
        self.geometry.current()
    }

    /// Number of vertex buffers built over the viewer's life
    pub fn rebuild_count(&self) -> u64 {
        self.geometry.build_count()
    }

    pub fn render_loop(&self) -> &RenderLoop<P, S> {
        &self.render_loop
    }

    pub fn presenter_mut(&mut self) -> Option<&mut P> {
        self.render_loop.presenter_mut()
    }

    pub fn scheduler(&self) -> &S {
        self.render_loop.scheduler()
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        self.render_loop.scheduler_mut()
    }

    fn clear_scene(&mut self) {
        if self.scene.take().is_some() {
            self.render_loop.release_geometry();
        }
    }

    fn enter_empty(&mut self) {
        if self.state == ViewerState::Rendering {
            log::debug!("viewer: rendering -> empty");
        }
        self.state = ViewerState::Empty;
        self.render_loop.pause();
    }
}

impl<P: Presenter, S: FrameScheduler> Drop for Viewer<P, S> {
    fn drop(&mut self) {
        self.dispose();
    }
}
