//! Drive a viewer through its whole lifecycle without a window.
//!
//! Frames are fired by hand and presented to a logger, which makes the
//! memoization and teardown order visible with `RUST_LOG=debug`.

use anyhow::{bail, Result};
use caddy_core::{Error, RawPointCloud, SharedPointCloud};
use caddy_visualization::{
    Camera, InputEvent, ManualScheduler, Modifiers, PointerButton, Presenter, SceneNode, Viewer,
    ViewerConfig,
};

/// Presenter that logs what it would draw
struct LogPresenter;

impl Presenter for LogPresenter {
    fn present(&mut self, scene: Option<&SceneNode>, camera: &Camera) -> caddy_core::Result<()> {
        let points = scene.and_then(SceneNode::vertex_buffer).map_or(0, |b| b.point_count());
        log::info!(
            "frame: {} points, camera at ({:.2}, {:.2}, {:.2})",
            points,
            camera.position.x,
            camera.position.y,
            camera.position.z
        );
        Ok(())
    }

    fn release_geometry(&mut self) {
        log::info!("presenter: geometry released");
    }

    fn release(&mut self) {
        log::info!("presenter: context released");
    }
}

type HeadlessViewer = Viewer<LogPresenter, ManualScheduler>;

/// Fire the frames due on one simulated display refresh
fn refresh(viewer: &mut HeadlessViewer) -> usize {
    let due = viewer.scheduler_mut().take_due();
    due.into_iter().filter(|h| viewer.on_frame(*h)).count()
}

/// Points on the surface of a cube of side 1 centered at the origin
fn cube_surface(steps: i32) -> SharedPointCloud {
    let half = steps / 2;
    let scale = 1.0 / steps as f64;
    let mut points = Vec::new();
    for x in -half..=half {
        for y in -half..=half {
            for z in -half..=half {
                if [x, y, z].iter().any(|c| c.abs() == half) {
                    points.push([x as f64 * scale, y as f64 * scale, z as f64 * scale]);
                }
            }
        }
    }
    RawPointCloud::from_xyz(points).into_shared()
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut viewer = Viewer::new(ViewerConfig::default(), LogPresenter, ManualScheduler::new());

    let state = viewer.set_point_cloud(None)?;
    log::info!("no data: {:?}, showing {:?}", state, viewer.placeholder());
    refresh(&mut viewer);

    let cube = cube_surface(10);
    let state = viewer.set_point_cloud(Some(&cube))?;
    log::info!("cube: {:?}, {} points", state, cube.len());
    for _ in 0..3 {
        refresh(&mut viewer);
    }

    viewer.set_point_cloud(Some(&cube))?;
    log::info!("same cloud again, vertex buffers built: {}", viewer.rebuild_count());

    viewer.resize(1200, 800);
    viewer.handle_input(&InputEvent::PointerDown {
        button: PointerButton::Primary,
        position: [600.0, 400.0],
        modifiers: Modifiers::default(),
    });
    viewer.handle_input(&InputEvent::PointerMove { position: [700.0, 380.0] });
    viewer.handle_input(&InputEvent::PointerUp {
        button: PointerButton::Primary,
    });
    viewer.handle_input(&InputEvent::Wheel { delta: 3.0 });
    refresh(&mut viewer);

    let broken =
        RawPointCloud::from_points(vec![vec![0.0, 0.0, 0.0], vec![1.0, f64::INFINITY, 0.0]])
            .into_shared();
    match viewer.set_point_cloud(Some(&broken)) {
        Err(e @ Error::InvalidPointCloudData { .. }) => {
            log::warn!("rejected: {}; viewer is {:?}", e, viewer.state())
        }
        Err(e) => return Err(e.into()),
        Ok(state) => bail!("malformed cloud was accepted ({:?})", state),
    }

    viewer.set_point_cloud(Some(&cube_surface(6)))?;
    refresh(&mut viewer);
    log::info!("vertex buffers built: {}", viewer.rebuild_count());

    viewer.dispose();
    viewer.dispose();
    log::info!("disposed; frames presented after dispose: {}", refresh(&mut viewer));
    Ok(())
}
