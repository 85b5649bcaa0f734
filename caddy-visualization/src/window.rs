//! Desktop host: a winit window driving a [`Viewer`]

use crate::controls::{InputEvent, Modifiers, PointerButton};
use crate::render_loop::{FrameHandle, FrameScheduler};
use crate::renderer::WgpuPresenter;
use crate::viewer::{Viewer, ViewerConfig, ViewerState};
use caddy_core::{Error, Result, SharedPointCloud};
use caddy_gpu::RenderConfig;
use std::collections::HashMap;
use std::sync::Arc;
use winit::{
    dpi::PhysicalSize,
    event::{ElementState, Event, MouseButton, MouseScrollDelta, Touch, TouchPhase, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    keyboard::Key,
    window::{Window, WindowBuilder},
};

/// Pixel scroll that counts as one wheel step
const PIXELS_PER_WHEEL_STEP: f32 = 100.0;

/// Window setup for [`run_viewer`]
#[derive(Debug, Clone)]
pub struct WindowOptions {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub render: RenderConfig,
}

impl Default for WindowOptions {
    fn default() -> Self {
        Self {
            title: "CADDY Viewer".to_string(),
            width: 1200,
            height: 800,
            render: RenderConfig::default(),
        }
    }
}

/// Frame scheduler backed by window redraw requests.
///
/// A redraw request cannot be withdrawn, so cancelling only forgets the
/// handle and the resulting redraw finds nothing to fire.
pub struct WindowScheduler {
    window: Arc<Window>,
    next_id: u64,
    pending: Option<FrameHandle>,
}

impl WindowScheduler {
    pub fn new(window: Arc<Window>) -> Self {
        Self {
            window,
            next_id: 0,
            pending: None,
        }
    }

    /// The frame due on this redraw, if one is still wanted
    pub fn take_pending(&mut self) -> Option<FrameHandle> {
        self.pending.take()
    }
}

impl FrameScheduler for WindowScheduler {
    fn request_frame(&mut self) -> FrameHandle {
        self.next_id += 1;
        let handle = FrameHandle::new(self.next_id);
        self.pending = Some(handle);
        self.window.request_redraw();
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        if self.pending == Some(handle) {
            self.pending = None;
        }
    }
}

/// Turns raw touch points into one-finger orbit drags and two-finger pinches
#[derive(Debug, Default)]
pub struct TouchTracker {
    touches: HashMap<u64, [f32; 2]>,
    pinch_distance: Option<f32>,
}

impl TouchTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of fingers down
    pub fn active(&self) -> usize {
        self.touches.len()
    }

    pub fn handle(&mut self, id: u64, phase: TouchPhase, position: [f32; 2]) -> Vec<InputEvent> {
        let mut events = Vec::new();
        match phase {
            TouchPhase::Started => {
                self.touches.insert(id, position);
                match self.touches.len() {
                    1 => events.push(InputEvent::PointerDown {
                        button: PointerButton::Primary,
                        position,
                        modifiers: Modifiers::default(),
                    }),
                    2 => {
                        events.push(InputEvent::PointerUp {
                            button: PointerButton::Primary,
                        });
                        self.pinch_distance = self.spread();
                    }
                    _ => {}
                }
            }
            TouchPhase::Moved => {
                let Some(last) = self.touches.get_mut(&id) else {
                    return events;
                };
                *last = position;
                match self.touches.len() {
                    1 => events.push(InputEvent::PointerMove { position }),
                    2 => {
                        let spread = self.spread();
                        if let (Some(before), Some(after)) = (self.pinch_distance, spread) {
                            if before > 0.0 && after > 0.0 {
                                events.push(InputEvent::Pinch { scale: after / before });
                            }
                        }
                        self.pinch_distance = spread;
                    }
                    _ => {}
                }
            }
            TouchPhase::Ended | TouchPhase::Cancelled => {
                if self.touches.remove(&id).is_none() {
                    return events;
                }
                match self.touches.len() {
                    0 => events.push(InputEvent::PointerUp {
                        button: PointerButton::Primary,
                    }),
                    // The finger left behind after a pinch picks up the drag.
                    1 => {
                        if let Some(&position) = self.touches.values().next() {
                            events.push(InputEvent::PointerDown {
                                button: PointerButton::Primary,
                                position,
                                modifiers: Modifiers::default(),
                            });
                        }
                    }
                    _ => {}
                }
                if self.touches.len() < 2 {
                    self.pinch_distance = None;
                }
            }
        }
        events
    }

    fn spread(&self) -> Option<f32> {
        if self.touches.len() != 2 {
            return None;
        }
        let mut points = self.touches.values();
        let (a, b) = (points.next()?, points.next()?);
        Some(((a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2)).sqrt())
    }
}

fn pointer_button(button: MouseButton) -> Option<PointerButton> {
    match button {
        MouseButton::Left => Some(PointerButton::Primary),
        MouseButton::Right => Some(PointerButton::Secondary),
        MouseButton::Middle => Some(PointerButton::Middle),
        _ => None,
    }
}

/// Wheel steps for a scroll delta; positive zooms in
pub fn wheel_steps(delta: MouseScrollDelta) -> f32 {
    match delta {
        MouseScrollDelta::LineDelta(_, y) => y,
        MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / PIXELS_PER_WHEEL_STEP,
    }
}

fn window_title(base: &str, state: ViewerState, placeholder: Option<&str>) -> String {
    match (state, placeholder) {
        (ViewerState::Empty, Some(text)) => format!("{} - {}", base, text),
        _ => base.to_string(),
    }
}

/// Open a window showing `cloud` and run until it is closed.
///
/// Malformed point data is reported before the event loop starts.
pub fn run_viewer(
    cloud: Option<SharedPointCloud>,
    config: ViewerConfig,
    options: WindowOptions,
) -> Result<()> {
    let event_loop = EventLoop::new()
        .map_err(|e| Error::Visualization(format!("Failed to create event loop: {}", e)))?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(options.title.as_str())
            .with_inner_size(PhysicalSize::new(options.width, options.height))
            .build(&event_loop)
            .map_err(|e| Error::Visualization(format!("Failed to create window: {}", e)))?,
    );

    let presenter = pollster::block_on(WgpuPresenter::for_window(window.clone(), options.render))?;
    let mut viewer = Viewer::new(config, presenter, WindowScheduler::new(window.clone()));

    let size = window.inner_size();
    viewer.resize(size.width, size.height);
    let state = viewer.set_point_cloud(cloud.as_ref())?;
    window.set_title(&window_title(&options.title, state, viewer.placeholder()));
    log::info!("viewer ready ({:?}), press R to reset the camera, F to fit the data", state);
    if state == ViewerState::Empty {
        window.request_redraw();
    }

    let mut cursor = [0.0f32; 2];
    let mut modifiers = Modifiers::default();
    let mut touches = TouchTracker::new();

    event_loop
        .run(move |event, target| {
            target.set_control_flow(ControlFlow::Wait);

            let Event::WindowEvent { event, .. } = event else {
                return;
            };

            match event {
                WindowEvent::CloseRequested => {
                    viewer.dispose();
                    target.exit();
                }
                WindowEvent::Resized(new_size) => {
                    if let Some(presenter) = viewer.presenter_mut() {
                        presenter.resize(new_size.width, new_size.height);
                    }
                    viewer.resize(new_size.width, new_size.height);
                    if viewer.state() == ViewerState::Empty {
                        window.request_redraw();
                    }
                }
                WindowEvent::ModifiersChanged(state) => {
                    let state = state.state();
                    modifiers = Modifiers {
                        shift: state.shift_key(),
                        ctrl: state.control_key(),
                        meta: state.super_key(),
                    };
                }
                WindowEvent::MouseInput { state, button, .. } => {
                    let Some(button) = pointer_button(button) else {
                        return;
                    };
                    let input = match state {
                        ElementState::Pressed => InputEvent::PointerDown {
                            button,
                            position: cursor,
                            modifiers,
                        },
                        ElementState::Released => InputEvent::PointerUp { button },
                    };
                    viewer.handle_input(&input);
                }
                WindowEvent::CursorMoved { position, .. } => {
                    cursor = [position.x as f32, position.y as f32];
                    viewer.handle_input(&InputEvent::PointerMove { position: cursor });
                }
                WindowEvent::MouseWheel { delta, .. } => {
                    viewer.handle_input(&InputEvent::Wheel {
                        delta: wheel_steps(delta),
                    });
                }
                WindowEvent::TouchpadMagnify { delta, .. } => {
                    viewer.handle_input(&InputEvent::Pinch {
                        scale: 1.0 + delta as f32,
                    });
                }
                WindowEvent::Touch(Touch {
                    id, phase, location, ..
                }) => {
                    for input in touches.handle(id, phase, [location.x as f32, location.y as f32]) {
                        viewer.handle_input(&input);
                    }
                }
                WindowEvent::KeyboardInput { event, .. } => {
                    if event.state != ElementState::Pressed {
                        return;
                    }
                    if let Key::Character(c) = &event.logical_key {
                        match c.as_str() {
                            "r" | "R" => viewer.reset_camera(),
                            "f" | "F" => {
                                viewer.fit_camera_to_data();
                            }
                            _ => {}
                        }
                    }
                }
                WindowEvent::RedrawRequested => {
                    if let Some(handle) = viewer.scheduler_mut().take_pending() {
                        viewer.on_frame(handle);
                    } else {
                        viewer.present_placeholder();
                    }
                }
                _ => {}
            }
        })
        .map_err(|e| Error::Visualization(format!("Event loop error: {}", e)))
}
