use glam::Vec2;

use crate::pointer::PointerState;
use crate::surface::Viewport;
use crate::types::{SMOOTHING_FACTOR, TIME_STEP};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Running,
    Stopped,
}

/// Monotonic animation time, advanced by a fixed step and never reset.
///
/// Accumulates in `f64`; an `f32` sum stops moving once the step falls under
/// half an ulp (around t = 2^18). Narrowed only when written to the uniforms.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AnimationClock {
    time: f64,
}

impl AnimationClock {
    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn advance(&mut self) -> f64 {
        self.time += TIME_STEP;
        self.time
    }
}

/// Per-frame values uploaded to the lens shader.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameParams {
    pub mouse: Vec2,
    pub resolution: Viewport,
    pub time: f64,
}

/// What a tick needs from the presentation side.
pub trait FrameTarget {
    type Error;

    /// Arranges for another tick to follow this one.
    fn schedule_next(&mut self);
    /// Drawable size as of the most recent resize.
    fn resolution(&self) -> Viewport;
    fn has_texture(&self) -> bool;
    fn push_params(&mut self, params: &FrameParams);
    fn draw(&mut self) -> Result<(), Self::Error>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The loop is not running; nothing happened.
    Skipped,
    Drawn,
}

/// Drives the smoother, the clock and the target once per display refresh.
#[derive(Debug)]
pub struct FrameLoop {
    state: LoopState,
    pointer: PointerState,
    clock: AnimationClock,
}

impl Default for FrameLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameLoop {
    pub fn new() -> Self {
        Self {
            state: LoopState::Idle,
            pointer: PointerState::default(),
            clock: AnimationClock::default(),
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn pointer(&self) -> &PointerState {
        &self.pointer
    }

    pub fn clock(&self) -> AnimationClock {
        self.clock
    }

    /// Moves `Idle` to `Running`. Returns false if the loop already left `Idle`.
    pub fn start(&mut self) -> bool {
        if self.state != LoopState::Idle {
            return false;
        }
        self.state = LoopState::Running;
        true
    }

    pub fn stop(&mut self) {
        self.state = LoopState::Stopped;
    }

    /// Records a pointer observation; only the next tick moves the lens.
    pub fn stage_pointer(&mut self, target: Vec2) {
        self.pointer.stage(target);
    }

    pub fn tick<T: FrameTarget>(&mut self, target: &mut T) -> Result<TickOutcome, T::Error> {
        if self.state != LoopState::Running {
            return Ok(TickOutcome::Skipped);
        }

        target.schedule_next();
        let mouse = self.pointer.ease(SMOOTHING_FACTOR);

        if target.has_texture() {
            let time = self.clock.advance();
            let params = FrameParams {
                mouse,
                resolution: target.resolution(),
                time,
            };
            target.push_params(&params);
        }

        target.draw()?;
        Ok(TickOutcome::Drawn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Schedule,
        Push(FrameParams),
        Draw,
    }

    struct RecordingTarget {
        calls: Vec<Call>,
        viewport: Viewport,
        texture: bool,
        fail_draw: bool,
    }

    impl RecordingTarget {
        fn new(texture: bool) -> Self {
            Self {
                calls: Vec::new(),
                viewport: Viewport::new(800, 600),
                texture,
                fail_draw: false,
            }
        }

        fn pushes(&self) -> Vec<FrameParams> {
            self.calls
                .iter()
                .filter_map(|call| match call {
                    Call::Push(params) => Some(*params),
                    _ => None,
                })
                .collect()
        }
    }

    impl FrameTarget for RecordingTarget {
        type Error = &'static str;

        fn schedule_next(&mut self) {
            self.calls.push(Call::Schedule);
        }

        fn resolution(&self) -> Viewport {
            self.viewport
        }

        fn has_texture(&self) -> bool {
            self.texture
        }

        fn push_params(&mut self, params: &FrameParams) {
            self.calls.push(Call::Push(*params));
        }

        fn draw(&mut self) -> Result<(), Self::Error> {
            self.calls.push(Call::Draw);
            if self.fail_draw {
                Err("surface lost")
            } else {
                Ok(())
            }
        }
    }

    fn running() -> FrameLoop {
        let mut frame_loop = FrameLoop::new();
        assert!(frame_loop.start());
        frame_loop
    }

    #[test]
    fn starts_only_once() {
        let mut frame_loop = FrameLoop::new();
        assert_eq!(frame_loop.state(), LoopState::Idle);
        assert!(frame_loop.start());
        assert!(!frame_loop.start());
        frame_loop.stop();
        assert!(!frame_loop.start());
        assert_eq!(frame_loop.state(), LoopState::Stopped);
    }

    #[test]
    fn idle_and_stopped_loops_ignore_ticks() {
        let mut target = RecordingTarget::new(true);
        let mut frame_loop = FrameLoop::new();
        assert_eq!(frame_loop.tick(&mut target), Ok(TickOutcome::Skipped));

        frame_loop.start();
        frame_loop.stop();
        assert_eq!(frame_loop.tick(&mut target), Ok(TickOutcome::Skipped));
        assert!(target.calls.is_empty());
    }

    #[test]
    fn tick_schedules_then_pushes_then_draws() {
        let mut target = RecordingTarget::new(true);
        let mut frame_loop = running();
        frame_loop.tick(&mut target).unwrap();

        assert_eq!(target.calls.len(), 3);
        assert_eq!(target.calls[0], Call::Schedule);
        assert!(matches!(target.calls[1], Call::Push(_)));
        assert_eq!(target.calls[2], Call::Draw);
    }

    #[test]
    fn missing_texture_still_draws_but_never_pushes() {
        let mut target = RecordingTarget::new(false);
        let mut frame_loop = running();
        for _ in 0..5 {
            frame_loop.tick(&mut target).unwrap();
        }
        assert!(target.pushes().is_empty());
        assert_eq!(
            target.calls.iter().filter(|call| **call == Call::Draw).count(),
            5
        );
        assert_eq!(frame_loop.clock().time(), 0.0);
    }

    #[test]
    fn pointer_eases_even_without_texture() {
        let mut target = RecordingTarget::new(false);
        let mut frame_loop = running();
        frame_loop.stage_pointer(Vec2::new(1.5, 0.5));
        frame_loop.tick(&mut target).unwrap();
        assert!((frame_loop.pointer().current().x - 0.6).abs() < 1e-6);
    }

    #[test]
    fn pushed_mouse_is_the_eased_position() {
        let mut target = RecordingTarget::new(true);
        let mut frame_loop = running();
        frame_loop.stage_pointer(Vec2::new(1.5, 0.5));
        frame_loop.tick(&mut target).unwrap();

        let pushed = target.pushes()[0];
        assert!((pushed.mouse.x - 0.6).abs() < 1e-6);
        assert!((pushed.mouse.y - 0.5).abs() < 1e-6);
        assert!((pushed.time - TIME_STEP).abs() < 1e-9);
    }

    #[test]
    fn resize_is_visible_to_the_next_push() {
        let mut target = RecordingTarget::new(true);
        let mut frame_loop = running();
        frame_loop.tick(&mut target).unwrap();

        target.viewport = Viewport::new(1920, 1080);
        frame_loop.tick(&mut target).unwrap();

        let pushes = target.pushes();
        assert_eq!(pushes[0].resolution, Viewport::new(800, 600));
        assert_eq!(pushes[1].resolution, Viewport::new(1920, 1080));
    }

    #[test]
    fn clock_is_monotonic_across_pushes() {
        let mut target = RecordingTarget::new(true);
        let mut frame_loop = running();
        for _ in 0..50 {
            frame_loop.tick(&mut target).unwrap();
        }
        let times: Vec<f64> = target.pushes().iter().map(|params| params.time).collect();
        assert_eq!(times.len(), 50);
        assert!(times.windows(2).all(|pair| pair[1] > pair[0]));
    }

    #[test]
    fn failed_asset_leaves_loop_ticking_without_texture() {
        use std::time::{Duration, Instant};

        use crate::assets::AssetBootstrap;

        let dir = tempfile::tempdir().unwrap();
        let mut bootstrap =
            AssetBootstrap::spawn(dir.path().join("missing.png"), || {}).unwrap();
        let mut target = RecordingTarget::new(false);
        let mut frame_loop = running();

        let deadline = Instant::now() + Duration::from_secs(10);
        let mut failures = 0;
        let mut ticks_after_failure = 0;
        while ticks_after_failure < 20 {
            assert!(Instant::now() < deadline, "asset bootstrap never finished");
            match bootstrap.poll() {
                Some(Ok(_)) => target.texture = true,
                Some(Err(_)) => failures += 1,
                None => {}
            }
            assert_eq!(frame_loop.tick(&mut target), Ok(TickOutcome::Drawn));
            if failures > 0 {
                ticks_after_failure += 1;
            } else {
                std::thread::sleep(Duration::from_millis(1));
            }
        }

        assert_eq!(failures, 1);
        assert!(!target.texture);
        assert!(bootstrap.poll().is_none());
        assert!(target.pushes().is_empty());
        assert_eq!(frame_loop.clock().time(), 0.0);
        assert_eq!(frame_loop.state(), LoopState::Running);
    }

    #[test]
    fn clock_keeps_increasing_past_f32_precision() {
        let mut clock = AnimationClock {
            time: f64::from(1u32 << 18),
        };
        let mut previous = clock.time();
        for _ in 0..1_000 {
            let now = clock.advance();
            assert!(now > previous, "clock stalled at {previous}");
            previous = now;
        }
        assert!((previous - (f64::from(1u32 << 18) + 10.0)).abs() < 1e-6);
    }

    #[test]
    fn draw_errors_propagate_after_scheduling() {
        let mut target = RecordingTarget::new(true);
        target.fail_draw = true;
        let mut frame_loop = running();
        assert_eq!(frame_loop.tick(&mut target), Err("surface lost"));
        assert_eq!(target.calls[0], Call::Schedule);
        assert_eq!(frame_loop.state(), LoopState::Running);
    }
}
