use std::time::Instant;

use crate::device::WgpuBackend;
use crate::input::{EventQueue, InputEvent, InputState, Key};
use crate::render::{NativeApi, RenderDevice};
use crate::time::{FrameClock, WaitEstimator};

use super::app::{App, AppCtx};
use super::settings::LoopSettings;
use super::surface::{Posed2D, Posed3D};

/// Drives one [`App`] one frame at a time.
///
/// The controller owns the app's loop state (timers, input snapshot, posed
/// surfaces). The host supplies the render device and the events collected
/// since the previous frame.
pub struct LoopController<A: NativeApi = WgpuBackend> {
    app: Box<dyn App<A>>,
    ctx: AppCtx,
    input: InputState,

    clock: FrameClock,
    waiter: WaitEstimator,
    last_wait: Instant,

    posed3d: Vec<Posed3D<A>>,
    posed2d: Vec<Posed2D<A>>,

    initialized: bool,
    frames: u64,
}

impl<A: NativeApi> LoopController<A> {
    pub fn new(app: Box<dyn App<A>>, settings: LoopSettings) -> Self {
        Self {
            app,
            ctx: AppCtx::new(settings),
            input: InputState::default(),
            clock: FrameClock::new(),
            waiter: WaitEstimator::new(),
            last_wait: Instant::now(),
            posed3d: Vec::new(),
            posed2d: Vec::new(),
            initialized: false,
            frames: 0,
        }
    }

    /// Runs `on_init`. On error the loop is ended with exit code 1.
    pub fn init(&mut self, rd: &mut RenderDevice<A>) -> anyhow::Result<()> {
        debug_assert!(!self.initialized, "loop initialized twice");

        if let Err(e) = self.app.on_init(rd, &mut self.ctx) {
            self.ctx.set_exit_code(1);
            return Err(e.context("app initialization failed"));
        }

        self.initialized = true;
        self.clock.reset();
        self.last_wait = Instant::now();
        log::debug!("app loop initialized ({:.1} fps target)", self.ctx.settings.frame_rate());
        Ok(())
    }

    #[inline]
    pub fn ctx(&self) -> &AppCtx {
        &self.ctx
    }

    #[inline]
    pub fn ctx_mut(&mut self) -> &mut AppCtx {
        &mut self.ctx
    }

    #[inline]
    pub fn input(&self) -> &InputState {
        &self.input
    }

    /// Rendered frames so far.
    #[inline]
    pub fn frames(&self) -> u64 {
        self.frames
    }

    #[inline]
    pub fn ended(&self) -> bool {
        self.ctx.ended()
    }

    #[inline]
    pub fn exit_code(&self) -> Option<i32> {
        self.ctx.exit_code()
    }

    pub fn end_program(&mut self, code: i32) {
        self.ctx.set_exit_code(code);
    }

    pub fn resize(&mut self, rd: &mut RenderDevice<A>, width: u32, height: u32) {
        self.app.on_resize(rd, width, height);
    }

    /// Runs one frame: input, network, AI and simulation (repeated per the
    /// render period), then pose, wait and graphics.
    pub fn one_frame(&mut self, rd: &mut RenderDevice<A>, events: &mut EventQueue, has_focus: bool) {
        debug_assert!(self.initialized, "one_frame before init");

        for _ in 0..self.ctx.settings.render_period.max(1) {
            let time_step = self.clock.tick().dt;

            self.process_events(events);
            self.app.on_after_events(&mut self.ctx);
            self.app.on_user_input(&self.input, &mut self.ctx);

            self.app.on_network();
            self.app.on_ai();

            self.simulate(time_step);
        }

        self.posed3d.clear();
        self.posed2d.clear();
        self.app.on_pose(&mut self.posed3d, &mut self.posed2d);

        self.wait(has_focus);

        rd.begin_frame();
        rd.push_state();
        self.app.on_graphics(rd, &self.posed3d, &self.posed2d);
        rd.pop_state();
        rd.end_frame();

        self.frames += 1;
        if let Some(code) = self.ctx.exit_code() {
            log::debug!("app loop ended with code {code} after {} frames", self.frames);
        }
    }

    /// Runs `on_cleanup`. Safe to call more than once.
    pub fn cleanup(&mut self, rd: &mut RenderDevice<A>) {
        if !self.initialized {
            return;
        }
        self.initialized = false;
        self.posed3d.clear();
        self.posed2d.clear();
        self.app.on_cleanup(rd);
    }

    fn process_events(&mut self, events: &mut EventQueue) {
        self.input.begin_tick();

        while let Some(ev) = events.pop() {
            let consumed = self.app.on_event(&ev, &mut self.ctx);

            if !consumed {
                match &ev {
                    InputEvent::Quit => self.ctx.set_exit_code(0),
                    InputEvent::KeyDown(sym) if sym.key == Key::Escape && self.ctx.settings.quit_on_escape => {
                        self.ctx.set_exit_code(0);
                    }
                    _ => {}
                }
            }

            // Releases always reach the input state so nothing stays held.
            let release = matches!(ev, InputEvent::MouseButtonUp { .. } | InputEvent::KeyUp(_));
            if !consumed || release {
                self.input.apply_event(&ev);
            }
        }
    }

    fn simulate(&mut self, time_step: f64) {
        let settings = &self.ctx.settings;

        let mut rdt = time_step;
        let mut sdt = settings.sim_time_step.resolve(time_step, settings.frame_duration) * settings.sim_time_scale;
        let mut idt = settings.frame_duration;

        self.app.on_before_simulation(&mut rdt, &mut sdt, &mut idt);
        self.app.on_simulation(rdt, sdt, idt);
        self.app.on_after_simulation(rdt, sdt, idt);

        self.ctx.advance(rdt, sdt);
    }

    fn wait(&mut self, has_focus: bool) {
        let now_after_loop = Instant::now();
        let cumulative = now_after_loop.saturating_duration_since(self.last_wait).as_secs_f64();

        let duration = self.ctx.settings.target_duration(has_focus);
        let desired = (duration - cumulative).max(0.0);
        self.app.on_wait(self.waiter.sleep_time(desired));

        self.last_wait = Instant::now();
        let actual = self.last_wait.saturating_duration_since(now_after_loop).as_secs_f64();
        self.waiter.record(desired, actual);
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::time::Duration;

    use super::*;
    use crate::core::surface::Surface;
    use crate::input::{KeySym, Modifiers, MouseButton};
    use crate::render::test_support::{device, drain};
    use crate::render::{NativeCall, RecordingApi};
    use crate::time::SimTimeStep;

    type Log = Rc<RefCell<Vec<String>>>;

    /// Records every callback it receives.
    struct Probe {
        log: Log,
        consume: Option<InputEvent>,
        waits: Rc<RefCell<Vec<Duration>>>,
        fail_init: bool,
    }

    impl Probe {
        fn new(log: &Log) -> Self {
            Self { log: log.clone(), consume: None, waits: Rc::default(), fail_init: false }
        }

        fn push(&self, s: impl Into<String>) {
            self.log.borrow_mut().push(s.into());
        }
    }

    struct Triangle;

    impl Surface<RecordingApi> for Triangle {
        fn name(&self) -> &str {
            "triangle"
        }

        fn render(&self, rd: &mut RenderDevice<RecordingApi>) {
            rd.send_sequential_indices(crate::render::PrimitiveType::Triangles, 0, 3);
        }
    }

    impl App<RecordingApi> for Probe {
        fn on_init(&mut self, _rd: &mut RenderDevice<RecordingApi>, _ctx: &mut AppCtx) -> anyhow::Result<()> {
            self.push("init");
            if self.fail_init {
                anyhow::bail!("missing asset");
            }
            Ok(())
        }

        fn on_event(&mut self, event: &InputEvent, _ctx: &mut AppCtx) -> bool {
            self.push(format!("event {event:?}"));
            self.consume.as_ref() == Some(event)
        }

        fn on_after_events(&mut self, _ctx: &mut AppCtx) {
            self.push("after_events");
        }

        fn on_user_input(&mut self, _input: &InputState, _ctx: &mut AppCtx) {
            self.push("user_input");
        }

        fn on_network(&mut self) {
            self.push("network");
        }

        fn on_ai(&mut self) {
            self.push("ai");
        }

        fn on_before_simulation(&mut self, _rdt: &mut f64, sdt: &mut f64, _idt: &mut f64) {
            self.push("before_sim");
            *sdt *= 2.0;
        }

        fn on_simulation(&mut self, _rdt: f64, sdt: f64, idt: f64) {
            self.push(format!("sim {sdt:.3} {idt:.3}"));
        }

        fn on_after_simulation(&mut self, _rdt: f64, _sdt: f64, _idt: f64) {
            self.push("after_sim");
        }

        fn on_pose(&mut self, posed3d: &mut Vec<Posed3D<RecordingApi>>, _posed2d: &mut Vec<Posed2D<RecordingApi>>) {
            self.push("pose");
            posed3d.push(Rc::new(Triangle));
        }

        fn on_wait(&mut self, t: Duration) {
            self.push("wait");
            self.waits.borrow_mut().push(t);
        }

        fn on_graphics(
            &mut self,
            rd: &mut RenderDevice<RecordingApi>,
            posed3d: &[Posed3D<RecordingApi>],
            _posed2d: &[Posed2D<RecordingApi>],
        ) {
            self.push(format!("graphics {} in_frame={}", posed3d.len(), rd.in_frame()));
            self.on_graphics_3d(rd, posed3d);
        }

        fn on_cleanup(&mut self, _rd: &mut RenderDevice<RecordingApi>) {
            self.push("cleanup");
        }
    }

    fn fixed_settings() -> LoopSettings {
        LoopSettings { sim_time_step: SimTimeStep::Fixed(0.1), ..LoopSettings::default() }
    }

    fn started(app: Probe, settings: LoopSettings) -> (LoopController<RecordingApi>, RenderDevice<RecordingApi>) {
        let mut rd = device();
        let mut lc = LoopController::new(Box::new(app), settings);
        lc.init(&mut rd).expect("init");
        (lc, rd)
    }

    fn key_down(key: Key) -> InputEvent {
        InputEvent::KeyDown(KeySym { key, modifiers: Modifiers::default(), unicode: 0, scancode: 0 })
    }

    fn key_up(key: Key) -> InputEvent {
        InputEvent::KeyUp(KeySym { key, modifiers: Modifiers::default(), unicode: 0, scancode: 0 })
    }

    // ── ordering ──────────────────────────────────────────────────────────

    #[test]
    fn callbacks_run_in_frame_order() {
        let log = Log::default();
        let (mut lc, mut rd) = started(Probe::new(&log), fixed_settings());
        log.borrow_mut().clear();

        let mut q = EventQueue::default();
        q.push(InputEvent::CharInput('a'));
        lc.one_frame(&mut rd, &mut q, true);

        assert_eq!(
            *log.borrow(),
            vec![
                "event CharInput('a')",
                "after_events",
                "user_input",
                "network",
                "ai",
                "before_sim",
                "sim 0.200 0.017",
                "after_sim",
                "pose",
                "wait",
                "graphics 1 in_frame=true",
            ]
        );
        assert!(q.is_empty());
        assert!(!rd.in_frame());
        assert_eq!(rd.stack_depth(), 0);
        assert_eq!(lc.frames(), 1);
    }

    #[test]
    fn render_period_repeats_everything_before_pose() {
        let log = Log::default();
        let settings = LoopSettings { render_period: 3, ..fixed_settings() };
        let (mut lc, mut rd) = started(Probe::new(&log), settings);
        log.borrow_mut().clear();

        lc.one_frame(&mut rd, &mut EventQueue::default(), true);

        let log = log.borrow();
        assert_eq!(log.iter().filter(|s| *s == "ai").count(), 3);
        assert_eq!(log.iter().filter(|s| *s == "pose").count(), 1);
        assert_eq!(log.iter().filter(|s| s.starts_with("graphics")).count(), 1);
    }

    #[test]
    fn zero_render_period_acts_as_one() {
        let log = Log::default();
        let settings = LoopSettings { render_period: 0, ..fixed_settings() };
        let (mut lc, mut rd) = started(Probe::new(&log), settings);
        log.borrow_mut().clear();

        lc.one_frame(&mut rd, &mut EventQueue::default(), true);
        assert_eq!(log.borrow().iter().filter(|s| *s == "ai").count(), 1);
    }

    // ── time ──────────────────────────────────────────────────────────────

    #[test]
    fn sim_time_accumulates_scaled_adjusted_steps() {
        let log = Log::default();
        let settings = LoopSettings { sim_time_scale: 0.5, ..fixed_settings() };
        let (mut lc, mut rd) = started(Probe::new(&log), settings);

        for _ in 0..4 {
            lc.one_frame(&mut rd, &mut EventQueue::default(), true);
        }

        // 0.1 * 0.5, doubled by on_before_simulation.
        assert!((lc.ctx().previous_sim_step() - 0.1).abs() < 1e-12);
        assert!((lc.ctx().sim_time() - 0.4).abs() < 1e-9);
        assert!(lc.ctx().real_time() > 0.0);
    }

    #[test]
    fn match_real_time_target_uses_frame_duration() {
        let log = Log::default();
        let mut settings = LoopSettings::default();
        settings.set_frame_rate(30.0);
        let (mut lc, mut rd) = started(Probe::new(&log), settings);

        lc.one_frame(&mut rd, &mut EventQueue::default(), true);
        assert!((lc.ctx().sim_time() - 2.0 / 30.0).abs() < 1e-9);
    }

    #[test]
    fn wait_targets_frame_duration() {
        let log = Log::default();
        let app = Probe::new(&log);
        let waits = app.waits.clone();
        let (mut lc, mut rd) = started(app, fixed_settings());

        lc.one_frame(&mut rd, &mut EventQueue::default(), true);
        lc.one_frame(&mut rd, &mut EventQueue::default(), false);

        let waits = waits.borrow();
        assert!(waits[0].as_secs_f64() <= 1.0 / 60.0);
        // Unfocused windows throttle to the background rate.
        assert!(waits[1].as_secs_f64() > 1.0 / 60.0);
    }

    // ── events ────────────────────────────────────────────────────────────

    #[test]
    fn unconsumed_escape_ends_program() {
        let log = Log::default();
        let (mut lc, mut rd) = started(Probe::new(&log), fixed_settings());

        let mut q = EventQueue::default();
        q.push(key_down(Key::Escape));
        lc.one_frame(&mut rd, &mut q, true);

        assert!(lc.ended());
        assert_eq!(lc.exit_code(), Some(0));
    }

    #[test]
    fn escape_ignored_when_disabled_or_consumed() {
        let log = Log::default();
        let settings = LoopSettings { quit_on_escape: false, ..fixed_settings() };
        let (mut lc, mut rd) = started(Probe::new(&log), settings);
        let mut q = EventQueue::default();
        q.push(key_down(Key::Escape));
        lc.one_frame(&mut rd, &mut q, true);
        assert!(!lc.ended());

        let mut app = Probe::new(&log);
        app.consume = Some(key_down(Key::Escape));
        let (mut lc, mut rd) = started(app, fixed_settings());
        q.push(key_down(Key::Escape));
        lc.one_frame(&mut rd, &mut q, true);
        assert!(!lc.ended());
        // Consumed presses are hidden from the input state.
        assert!(!lc.input().key_down(Key::Escape));
    }

    #[test]
    fn quit_event_ends_with_zero() {
        let log = Log::default();
        let (mut lc, mut rd) = started(Probe::new(&log), fixed_settings());
        let mut q = EventQueue::default();
        q.push(InputEvent::Quit);
        lc.one_frame(&mut rd, &mut q, true);
        assert_eq!(lc.exit_code(), Some(0));

        // The frame still renders.
        assert_eq!(lc.frames(), 1);
    }

    #[test]
    fn consumed_releases_still_reach_input_state() {
        let log = Log::default();
        let mut app = Probe::new(&log);
        app.consume = Some(key_up(Key::A));
        let (mut lc, mut rd) = started(app, fixed_settings());

        let mut q = EventQueue::default();
        q.push(key_down(Key::A));
        q.push(InputEvent::MouseButtonDown { button: MouseButton::Left, x: 1.0, y: 1.0 });
        lc.one_frame(&mut rd, &mut q, true);
        assert!(lc.input().key_down(Key::A));
        assert!(lc.input().button_down(MouseButton::Left));

        q.push(key_up(Key::A));
        lc.one_frame(&mut rd, &mut q, true);
        assert!(!lc.input().key_down(Key::A));
    }

    #[test]
    fn end_program_sets_code() {
        let log = Log::default();
        let (mut lc, _rd) = started(Probe::new(&log), fixed_settings());
        lc.end_program(3);
        assert_eq!(lc.exit_code(), Some(3));
    }

    // ── graphics ──────────────────────────────────────────────────────────

    #[test]
    fn graphics_draws_posed_surfaces_inside_frame() {
        let log = Log::default();
        let (mut lc, mut rd) = started(Probe::new(&log), fixed_settings());
        drain(&mut rd);

        lc.one_frame(&mut rd, &mut EventQueue::default(), true);
        let calls = drain(&mut rd);
        assert!(calls.iter().any(|c| matches!(c, NativeCall::DrawArrays { count: 3, .. })));
        assert_eq!(rd.stats().triangles, 1);
        // Automatic swapping defers the present to the next frame.
        assert!(rd.swap_pending());
        assert!(!calls.contains(&NativeCall::SwapBuffers));

        lc.one_frame(&mut rd, &mut EventQueue::default(), true);
        assert_eq!(drain(&mut rd).iter().filter(|c| **c == NativeCall::SwapBuffers).count(), 1);
    }

    // ── lifecycle ─────────────────────────────────────────────────────────

    #[test]
    fn failed_init_ends_with_one() {
        let log = Log::default();
        let mut app = Probe::new(&log);
        app.fail_init = true;

        let mut rd = device();
        let mut lc = LoopController::new(Box::new(app), fixed_settings());
        let err = lc.init(&mut rd).unwrap_err();
        assert!(format!("{err:#}").contains("missing asset"));
        assert_eq!(lc.exit_code(), Some(1));

        // Never initialized, so no cleanup callback.
        lc.cleanup(&mut rd);
        assert!(!log.borrow().iter().any(|s| s == "cleanup"));
    }

    #[test]
    fn cleanup_runs_once() {
        let log = Log::default();
        let (mut lc, mut rd) = started(Probe::new(&log), fixed_settings());
        lc.cleanup(&mut rd);
        lc.cleanup(&mut rd);
        assert_eq!(log.borrow().iter().filter(|s| *s == "cleanup").count(), 1);
    }
}
