//! Frame scheduling and presentation

use crate::camera::Camera;
use crate::scene::SceneNode;
use caddy_core::Result;

/// Identifies one requested frame callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(u64);

impl FrameHandle {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(self) -> u64 {
        self.0
    }
}

/// The host's display-refresh callback source.
///
/// Each requested frame fires at most once, on the next refresh tick, and
/// the host then calls back into [`RenderLoop::on_frame`] with its handle.
pub trait FrameScheduler {
    fn request_frame(&mut self) -> FrameHandle;
    fn cancel_frame(&mut self, handle: FrameHandle);
}

/// Something that can turn a scene and a camera into an image
pub trait Presenter {
    /// Draw one frame. `scene` is `None` when there is nothing to draw.
    fn present(&mut self, scene: Option<&SceneNode>, camera: &Camera) -> Result<()>;

    /// Drop any GPU copy of the current geometry
    fn release_geometry(&mut self);

    /// Tear down the presentation context
    fn release(&mut self);
}

/// Scheduler for hosts that drive frames by hand, such as headless runs and
/// tests. Requested frames queue up until [`take_due`](Self::take_due).
#[derive(Debug, Default)]
pub struct ManualScheduler {
    next_id: u64,
    queued: Vec<FrameHandle>,
    cancelled: usize,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames requested and not yet fired or cancelled
    pub fn pending(&self) -> &[FrameHandle] {
        &self.queued
    }

    /// Number of frames cancelled so far
    pub fn cancelled(&self) -> usize {
        self.cancelled
    }

    /// Hand out the frames due on this tick
    pub fn take_due(&mut self) -> Vec<FrameHandle> {
        std::mem::take(&mut self.queued)
    }
}

impl FrameScheduler for ManualScheduler {
    fn request_frame(&mut self) -> FrameHandle {
        self.next_id += 1;
        let handle = FrameHandle::new(self.next_id);
        self.queued.push(handle);
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        let before = self.queued.len();
        self.queued.retain(|h| *h != handle);
        self.cancelled += before - self.queued.len();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Context alive, no frame scheduled
    Idle,
    /// A frame is scheduled and each presented frame schedules the next
    Running,
    /// Context released; the loop never runs again
    Stopped,
}

/// Presents one frame per display refresh while running
pub struct RenderLoop<P: Presenter, S: FrameScheduler> {
    presenter: Option<P>,
    scheduler: S,
    pending: Option<FrameHandle>,
    state: LoopState,
    frames: u64,
}

impl<P: Presenter, S: FrameScheduler> RenderLoop<P, S> {
    pub fn new(presenter: P, scheduler: S) -> Self {
        Self {
            presenter: Some(presenter),
            scheduler,
            pending: None,
            state: LoopState::Idle,
            frames: 0,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Frames presented so far
    pub fn frames_presented(&self) -> u64 {
        self.frames
    }

    /// The frame currently scheduled, if any
    pub fn pending_frame(&self) -> Option<FrameHandle> {
        self.pending
    }

    pub fn presenter(&self) -> Option<&P> {
        self.presenter.as_ref()
    }

    pub fn presenter_mut(&mut self) -> Option<&mut P> {
        self.presenter.as_mut()
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    /// Begin presenting. No-op when already running or stopped.
    pub fn start(&mut self) {
        match self.state {
            LoopState::Idle => {
                self.state = LoopState::Running;
                self.schedule();
            }
            LoopState::Running => {}
            LoopState::Stopped => log::warn!("render loop already stopped; not restarting"),
        }
    }

    /// Cancel the scheduled frame and keep the context for a later `start`
    pub fn pause(&mut self) {
        if self.state == LoopState::Running {
            self.cancel_pending();
            self.state = LoopState::Idle;
        }
    }

    /// Cancel the scheduled frame and release the presentation context.
    /// Calling it again does nothing.
    pub fn stop(&mut self) {
        if self.state == LoopState::Stopped {
            return;
        }
        self.cancel_pending();
        self.state = LoopState::Stopped;
        if let Some(mut presenter) = self.presenter.take() {
            presenter.release();
            log::debug!("released presentation context after {} frames", self.frames);
        }
    }

    /// Ask the presenter to drop its copy of the geometry
    pub fn release_geometry(&mut self) {
        if let Some(presenter) = self.presenter.as_mut() {
            presenter.release_geometry();
        }
    }

    /// Handle a fired frame callback.
    ///
    /// Callbacks for frames that were cancelled, already fired or that
    /// arrive after `stop` are ignored. Returns true when a frame was
    /// presented.
    pub fn on_frame(
        &mut self,
        handle: FrameHandle,
        scene: Option<&SceneNode>,
        camera: &Camera,
    ) -> bool {
        if self.pending != Some(handle) {
            log::warn!("ignoring stale frame callback {}", handle.id());
            return false;
        }
        self.pending = None;

        let Some(presenter) = self.presenter.as_mut() else {
            return false;
        };
        let presented = match presenter.present(scene, camera) {
            Ok(()) => {
                self.frames += 1;
                true
            }
            Err(e) => {
                log::error!("failed to present frame: {}", e);
                false
            }
        };

        if self.state == LoopState::Running {
            self.schedule();
        }
        presented
    }

    /// Present one frame outside the loop, without scheduling another.
    /// Does nothing once stopped.
    pub fn present_once(&mut self, scene: Option<&SceneNode>, camera: &Camera) -> bool {
        let Some(presenter) = self.presenter.as_mut() else {
            return false;
        };
        match presenter.present(scene, camera) {
            Ok(()) => true,
            Err(e) => {
                log::error!("failed to present frame: {}", e);
                false
            }
        }
    }

    fn schedule(&mut self) {
        if self.pending.is_none() {
            self.pending = Some(self.scheduler.request_frame());
        }
    }

    fn cancel_pending(&mut self) {
        if let Some(handle) = self.pending.take() {
            self.scheduler.cancel_frame(handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use caddy_core::Error;
    use std::cell::RefCell;
    use std::rc::Rc;

    type Log = Rc<RefCell<Vec<&'static str>>>;

    #[derive(Default)]
    struct CountingPresenter {
        log: Log,
        fail: bool,
    }

    impl Presenter for CountingPresenter {
        fn present(&mut self, _scene: Option<&SceneNode>, _camera: &Camera) -> Result<()> {
            self.log.borrow_mut().push("present");
            if self.fail {
                return Err(Error::Gpu("surface lost".into()));
            }
            Ok(())
        }

        fn release_geometry(&mut self) {
            self.log.borrow_mut().push("release_geometry");
        }

        fn release(&mut self) {
            self.log.borrow_mut().push("release");
        }
    }

    fn render_loop() -> (RenderLoop<CountingPresenter, ManualScheduler>, Log) {
        let presenter = CountingPresenter::default();
        let log = presenter.log.clone();
        (RenderLoop::new(presenter, ManualScheduler::new()), log)
    }

    fn tick(render_loop: &mut RenderLoop<CountingPresenter, ManualScheduler>) -> usize {
        let camera = Camera::default();
        let due = render_loop.scheduler_mut().take_due();
        due.into_iter()
            .filter(|h| render_loop.on_frame(*h, None, &camera))
            .count()
    }

    #[test]
    fn test_one_frame_per_tick_while_running() {
        let (mut render_loop, _) = render_loop();
        assert_eq!(tick(&mut render_loop), 0);

        render_loop.start();
        render_loop.start();
        assert_eq!(render_loop.scheduler().pending().len(), 1);

        for _ in 0..3 {
            assert_eq!(tick(&mut render_loop), 1);
        }
        assert_eq!(render_loop.frames_presented(), 3);
        assert_eq!(render_loop.scheduler().pending().len(), 1);
    }

    #[test]
    fn test_pause_cancels_and_keeps_context() {
        let (mut render_loop, log) = render_loop();
        render_loop.start();
        render_loop.pause();

        assert_eq!(render_loop.state(), LoopState::Idle);
        assert!(render_loop.scheduler().pending().is_empty());
        assert_eq!(render_loop.scheduler().cancelled(), 1);
        assert!(render_loop.presenter().is_some());

        render_loop.start();
        assert_eq!(tick(&mut render_loop), 1);
        assert_eq!(*log.borrow(), ["present"]);
    }

    #[test]
    fn test_stop_releases_context_once() {
        let (mut render_loop, log) = render_loop();
        render_loop.start();
        render_loop.stop();
        render_loop.stop();

        assert_eq!(render_loop.state(), LoopState::Stopped);
        assert!(render_loop.presenter().is_none());
        assert!(render_loop.scheduler().pending().is_empty());
        assert_eq!(*log.borrow(), ["release"]);

        render_loop.start();
        assert!(render_loop.scheduler().pending().is_empty());
    }

    #[test]
    fn test_stale_callback_is_ignored() {
        let (mut render_loop, log) = render_loop();
        let camera = Camera::default();
        render_loop.start();
        let handle = render_loop.pending_frame().unwrap();
        render_loop.stop();

        assert!(!render_loop.on_frame(handle, None, &camera));
        assert!(!render_loop.on_frame(FrameHandle::new(999), None, &camera));
        assert_eq!(*log.borrow(), ["release"]);
    }

    #[test]
    fn test_present_once_does_not_schedule() {
        let (mut render_loop, log) = render_loop();
        let camera = Camera::default();

        assert!(render_loop.present_once(None, &camera));
        assert!(render_loop.scheduler().pending().is_empty());
        assert_eq!(render_loop.state(), LoopState::Idle);

        render_loop.stop();
        assert!(!render_loop.present_once(None, &camera));
        assert_eq!(*log.borrow(), ["present", "release"]);
    }

    #[test]
    fn test_presenter_error_keeps_loop_alive() {
        let presenter = CountingPresenter {
            fail: true,
            ..CountingPresenter::default()
        };
        let mut render_loop = RenderLoop::new(presenter, ManualScheduler::new());
        render_loop.start();
        assert_eq!(tick(&mut render_loop), 0);
        assert_eq!(render_loop.frames_presented(), 0);
        assert_eq!(render_loop.scheduler().pending().len(), 1);
    }
}
