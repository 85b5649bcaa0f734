//! Pointer, wheel and touch input mapped onto camera orbit, pan and dolly

use crate::camera::Camera;
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

/// Base zoom factor per wheel step at `zoom_speed == 1`
const ZOOM_STEP: f32 = 0.95;

/// Tuning for the interaction controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlsConfig {
    pub enable_rotate: bool,
    pub enable_pan: bool,
    pub enable_zoom: bool,
    pub rotate_speed: f32,
    pub pan_speed: f32,
    pub zoom_speed: f32,
    /// Closest allowed camera distance; `None` leaves zoom unbounded
    pub min_distance: Option<f32>,
    /// Farthest allowed camera distance; `None` leaves zoom unbounded
    pub max_distance: Option<f32>,
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            enable_rotate: true,
            enable_pan: true,
            enable_zoom: true,
            rotate_speed: 1.0,
            pan_speed: 1.0,
            zoom_speed: 1.0,
            min_distance: None,
            max_distance: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
}

/// Keyboard modifiers held when a drag starts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub meta: bool,
}

impl Modifiers {
    pub fn any(&self) -> bool {
        self.shift || self.ctrl || self.meta
    }
}

/// Host-independent input events, positions in physical pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    PointerDown {
        button: PointerButton,
        position: [f32; 2],
        modifiers: Modifiers,
    },
    PointerMove {
        position: [f32; 2],
    },
    PointerUp {
        button: PointerButton,
    },
    /// Scroll amount in wheel steps; positive scrolls away from the user
    /// and zooms in
    Wheel {
        delta: f32,
    },
    /// Relative pinch scale since the last event; above 1 zooms in
    Pinch {
        scale: f32,
    },
    Resize {
        width: u32,
        height: u32,
    },
}

/// What a drag is currently doing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragMode {
    Orbit,
    Pan,
    Dolly,
}

#[derive(Debug, Clone, Copy)]
struct Drag {
    mode: DragMode,
    button: PointerButton,
    last: [f32; 2],
}

/// Turns [`InputEvent`]s into camera motion.
///
/// Primary drag orbits, secondary drag or primary drag with a modifier pans,
/// middle drag dollies, wheel and pinch zoom. Drags update the camera on
/// every move event.
#[derive(Debug, Clone)]
pub struct InteractionController {
    config: ControlsConfig,
    viewport: [f32; 2],
    drag: Option<Drag>,
}

impl InteractionController {
    pub fn new(config: ControlsConfig) -> Self {
        Self {
            config,
            viewport: [1.0, 1.0],
            drag: None,
        }
    }

    pub fn config(&self) -> &ControlsConfig {
        &self.config
    }

    /// The drag in progress, if any
    pub fn drag_mode(&self) -> Option<DragMode> {
        self.drag.map(|d| d.mode)
    }

    /// Apply one input event. Returns true when the camera changed.
    pub fn handle(&mut self, camera: &mut Camera, event: &InputEvent) -> bool {
        match *event {
            InputEvent::PointerDown {
                button,
                position,
                modifiers,
            } => {
                self.drag = self.mode_for(button, modifiers).map(|mode| Drag {
                    mode,
                    button,
                    last: position,
                });
                false
            }
            InputEvent::PointerMove { position } => {
                let Some(drag) = self.drag.as_mut() else {
                    return false;
                };
                let dx = position[0] - drag.last[0];
                let dy = position[1] - drag.last[1];
                drag.last = position;
                let mode = drag.mode;
                self.drag_by(camera, mode, dx, dy)
            }
            InputEvent::PointerUp { button } => {
                if self.drag.is_some_and(|d| d.button == button) {
                    self.drag = None;
                }
                false
            }
            InputEvent::Wheel { delta } => {
                if !self.config.enable_zoom || delta == 0.0 {
                    return false;
                }
                let step = ZOOM_STEP.powf(self.config.zoom_speed * delta.abs());
                let scale = if delta > 0.0 { step } else { 1.0 / step };
                self.zoom(camera, scale)
            }
            InputEvent::Pinch { scale } => {
                if !self.config.enable_zoom || !(scale > 0.0) || scale == 1.0 {
                    return false;
                }
                self.zoom(camera, 1.0 / scale)
            }
            InputEvent::Resize { width, height } => {
                if width == 0 || height == 0 {
                    return false;
                }
                self.viewport = [width as f32, height as f32];
                camera.aspect_ratio = width as f32 / height as f32;
                true
            }
        }
    }

    fn mode_for(&self, button: PointerButton, modifiers: Modifiers) -> Option<DragMode> {
        let mode = match button {
            PointerButton::Primary if modifiers.any() => DragMode::Pan,
            PointerButton::Primary => DragMode::Orbit,
            PointerButton::Secondary => DragMode::Pan,
            PointerButton::Middle => DragMode::Dolly,
        };
        let enabled = match mode {
            DragMode::Orbit => self.config.enable_rotate,
            DragMode::Pan => self.config.enable_pan,
            DragMode::Dolly => self.config.enable_zoom,
        };
        enabled.then_some(mode)
    }

    fn drag_by(&self, camera: &mut Camera, mode: DragMode, dx: f32, dy: f32) -> bool {
        if dx == 0.0 && dy == 0.0 {
            return false;
        }
        let height = self.viewport[1];
        match mode {
            DragMode::Orbit => {
                // A drag across the full viewport height is one full turn.
                let speed = 2.0 * PI * self.config.rotate_speed / height;
                camera.orbit(dx * speed, dy * speed)
            }
            DragMode::Pan => camera.pan(
                dx * self.config.pan_speed,
                dy * self.config.pan_speed,
                height,
            ),
            DragMode::Dolly => {
                if dy == 0.0 {
                    return false;
                }
                let step = ZOOM_STEP.powf(self.config.zoom_speed);
                // Dragging down dollies out.
                let scale = if dy > 0.0 { 1.0 / step } else { step };
                self.zoom(camera, scale)
            }
        }
    }

    fn zoom(&self, camera: &mut Camera, scale: f32) -> bool {
        let mut distance = camera.distance() * scale;
        if let Some(min) = self.config.min_distance {
            distance = distance.max(min);
        }
        if let Some(max) = self.config.max_distance {
            distance = distance.min(max);
        }
        camera.set_distance(distance)
    }
}

impl Default for InteractionController {
    fn default() -> Self {
        Self::new(ControlsConfig::default())
    }
}
