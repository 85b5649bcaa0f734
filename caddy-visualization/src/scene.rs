//! Scene graph construction: lights, the point geometry node and the axes helper

use crate::camera::{Camera, CameraConfig};
use caddy_core::{Point3f, VertexBuffer};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Text shown in place of the canvas when there is nothing to draw
pub const PLACEHOLDER_TEXT: &str = "No point cloud data available";

/// Linear RGB color with components in `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const WHITE: Color = Color::new(1.0, 1.0, 1.0);
    pub const RED: Color = Color::new(1.0, 0.0, 0.0);
    pub const GREEN: Color = Color::new(0.0, 1.0, 0.0);
    pub const BLUE: Color = Color::new(0.0, 0.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Build a color from a `0xRRGGBB` literal
    pub fn from_hex(hex: u32) -> Self {
        let channel = |shift: u32| ((hex >> shift) & 0xff) as f32 / 255.0;
        Self::new(channel(16), channel(8), channel(0))
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }
}

/// How points are drawn
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PointStyle {
    /// World-space size when attenuated, pixel size otherwise
    pub size: f32,
    pub color: Color,
    /// Shrink points with distance from the camera
    pub size_attenuation: bool,
}

impl Default for PointStyle {
    fn default() -> Self {
        Self {
            size: 0.01,
            color: Color::from_hex(0x3498db),
            size_attenuation: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Light {
    Ambient {
        color: Color,
        intensity: f32,
    },
    Point {
        color: Color,
        intensity: f32,
        position: Point3f,
    },
}

/// Geometry plus the style it is drawn with
#[derive(Debug, Clone)]
pub struct PointsNode {
    pub buffer: Arc<VertexBuffer>,
    pub style: PointStyle,
}

/// Three colored lines from the origin along +X, +Y and +Z
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxesHelper {
    pub size: f32,
}

impl AxesHelper {
    /// Line segments as `(start, end, color)`
    pub fn segments(&self) -> [(Point3f, Point3f, Color); 3] {
        let origin = Point3f::origin();
        [
            (origin, Point3f::new(self.size, 0.0, 0.0), Color::RED),
            (origin, Point3f::new(0.0, self.size, 0.0), Color::GREEN),
            (origin, Point3f::new(0.0, 0.0, self.size), Color::BLUE),
        ]
    }
}

#[derive(Debug, Clone)]
pub enum NodeKind {
    Group,
    Light(Light),
    Points(PointsNode),
    Axes(AxesHelper),
}

/// A node in the scene graph. Built once per vertex buffer and then held
/// as owned state.
#[derive(Debug, Clone)]
pub struct SceneNode {
    name: String,
    kind: NodeKind,
    children: Vec<SceneNode>,
}

impl SceneNode {
    pub fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            children: Vec::new(),
        }
    }

    pub fn group(name: impl Into<String>) -> Self {
        Self::new(name, NodeKind::Group)
    }

    /// Attach a child node
    pub fn add_child(&mut self, child: SceneNode) -> &mut Self {
        self.children.push(child);
        self
    }

    /// Builder form of [`add_child`](Self::add_child)
    pub fn with_child(mut self, child: SceneNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn children(&self) -> &[SceneNode] {
        &self.children
    }

    /// Depth-first iteration over this node and all descendants
    pub fn iter(&self) -> SceneIter<'_> {
        SceneIter { stack: vec![self] }
    }

    /// Look up a node by name
    pub fn find(&self, name: &str) -> Option<&SceneNode> {
        self.iter().find(|node| node.name == name)
    }

    /// The first points node in the graph
    pub fn points(&self) -> Option<&PointsNode> {
        self.iter().find_map(|node| match &node.kind {
            NodeKind::Points(points) => Some(points),
            _ => None,
        })
    }

    /// The vertex buffer drawn by this scene
    pub fn vertex_buffer(&self) -> Option<&Arc<VertexBuffer>> {
        self.points().map(|p| &p.buffer)
    }

    pub fn lights(&self) -> impl Iterator<Item = &Light> + '_ {
        self.iter().filter_map(|node| match &node.kind {
            NodeKind::Light(light) => Some(light),
            _ => None,
        })
    }

    pub fn axes(&self) -> Option<&AxesHelper> {
        self.iter().find_map(|node| match &node.kind {
            NodeKind::Axes(axes) => Some(axes),
            _ => None,
        })
    }
}

pub struct SceneIter<'a> {
    stack: Vec<&'a SceneNode>,
}

impl<'a> Iterator for SceneIter<'a> {
    type Item = &'a SceneNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

/// Fixed, non-interactive parts of the scene
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub ambient_intensity: f32,
    pub point_light_position: [f32; 3],
    pub point_light_intensity: f32,
    pub point_style: PointStyle,
    pub show_axes: bool,
    pub axes_size: f32,
    pub camera: CameraConfig,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            ambient_intensity: 0.5,
            point_light_position: [10.0, 10.0, 10.0],
            point_light_intensity: 1.0,
            point_style: PointStyle::default(),
            show_axes: true,
            axes_size: 1.0,
            camera: CameraConfig::default(),
        }
    }
}

/// Result of composing a scene
#[derive(Debug, Clone)]
pub enum SceneContent {
    /// Nothing to draw; show [`PLACEHOLDER_TEXT`] instead of a canvas
    Placeholder,
    Scene(SceneNode),
}

impl SceneContent {
    pub fn into_scene(self) -> Option<SceneNode> {
        match self {
            SceneContent::Scene(node) => Some(node),
            SceneContent::Placeholder => None,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, SceneContent::Placeholder)
    }
}

/// Wraps a vertex buffer into a lit scene graph
#[derive(Debug, Clone, Default)]
pub struct SceneComposer {
    config: SceneConfig,
}

impl SceneComposer {
    pub fn new(config: SceneConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    /// Build the scene for `buffer`, or the placeholder marker without one
    pub fn compose(&self, buffer: Option<Arc<VertexBuffer>>) -> SceneContent {
        let Some(buffer) = buffer else {
            return SceneContent::Placeholder;
        };

        let config = &self.config;
        let mut root = SceneNode::group("scene");
        root.add_child(SceneNode::new(
            "ambient_light",
            NodeKind::Light(Light::Ambient {
                color: Color::WHITE,
                intensity: config.ambient_intensity,
            }),
        ))
        .add_child(SceneNode::new(
            "point_light",
            NodeKind::Light(Light::Point {
                color: Color::WHITE,
                intensity: config.point_light_intensity,
                position: Point3f::from(config.point_light_position),
            }),
        ))
        .add_child(SceneNode::new(
            "point_cloud",
            NodeKind::Points(PointsNode {
                buffer,
                style: config.point_style,
            }),
        ));

        if config.show_axes {
            root.add_child(SceneNode::new(
                "axes",
                NodeKind::Axes(AxesHelper {
                    size: config.axes_size,
                }),
            ));
        }

        SceneContent::Scene(root)
    }

    /// The camera every viewer starts from
    pub fn default_camera(&self, aspect_ratio: f32) -> Camera {
        Camera::from_config(&self.config.camera, aspect_ratio)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use caddy_core::RawPointCloud;

    fn buffer(points: &[[f64; 3]]) -> Arc<VertexBuffer> {
        let cloud = RawPointCloud::from_xyz(points.iter().copied());
        Arc::new(VertexBuffer::from_point_cloud(&cloud).unwrap().unwrap())
    }

    #[test]
    fn test_no_buffer_gives_placeholder() {
        let composer = SceneComposer::default();
        assert!(composer.compose(None).is_placeholder());
        assert!(composer.compose(None).into_scene().is_none());
    }

    #[test]
    fn test_scene_holds_buffer_style_and_lights() {
        let composer = SceneComposer::default();
        let buffer = buffer(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]]);
        let scene = composer.compose(Some(buffer.clone())).into_scene().unwrap();

        assert!(Arc::ptr_eq(scene.vertex_buffer().unwrap(), &buffer));

        let style = scene.points().unwrap().style;
        assert_relative_eq!(style.size, 0.01);
        assert!(style.size_attenuation);
        assert_eq!(style.color, Color::from_hex(0x3498db));

        let lights: Vec<_> = scene.lights().collect();
        assert_eq!(lights.len(), 2);
        assert!(matches!(lights[0], Light::Ambient { intensity, .. } if *intensity == 0.5));
        assert!(matches!(
            lights[1],
            Light::Point { position, .. } if *position == Point3f::new(10.0, 10.0, 10.0)
        ));

        assert_eq!(scene.axes(), Some(&AxesHelper { size: 1.0 }));
    }

    #[test]
    fn test_graph_traversal_order() {
        let scene = SceneComposer::default()
            .compose(Some(buffer(&[[0.0, 0.0, 0.0]])))
            .into_scene()
            .unwrap();
        let names: Vec<_> = scene.iter().map(|n| n.name()).collect();
        assert_eq!(names, ["scene", "ambient_light", "point_light", "point_cloud", "axes"]);
        assert!(scene.find("point_light").is_some());
        assert!(scene.find("missing").is_none());
    }

    #[test]
    fn test_axes_can_be_disabled() {
        let composer = SceneComposer::new(SceneConfig {
            show_axes: false,
            ..SceneConfig::default()
        });
        let scene = composer.compose(Some(buffer(&[[0.0, 0.0, 0.0]]))).into_scene().unwrap();
        assert!(scene.axes().is_none());
        assert_eq!(scene.children().len(), 3);
    }

    #[test]
    fn test_default_camera_sees_unit_cube() {
        let camera = SceneComposer::default().default_camera(1.0);
        assert_eq!(camera.position, Point3f::new(0.0, 0.0, 2.0));
        for x in [-0.5, 0.5] {
            for y in [-0.5, 0.5] {
                for z in [-0.5, 0.5] {
                    assert!(camera.sees(&Point3f::new(x, y, z)), "({x}, {y}, {z}) out of view");
                }
            }
        }
    }

    #[test]
    fn test_hex_color() {
        let c = Color::from_hex(0x3498db);
        assert_relative_eq!(c.r, 0x34 as f32 / 255.0);
        assert_relative_eq!(c.g, 0x98 as f32 / 255.0);
        assert_relative_eq!(c.b, 0xdb as f32 / 255.0);
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config: SceneConfig = serde_json::from_str(r#"{"show_axes": false}"#).unwrap();
        assert!(!config.show_axes);
        assert_eq!(config.camera, CameraConfig::default());
        assert_eq!(config.point_style, PointStyle::default());
    }
}
