use std::time::Duration;

use crate::device::WgpuBackend;
use crate::input::{InputEvent, InputState};
use crate::render::{NativeApi, RenderDevice};
use crate::time::{RealTime, SimTime};

use super::settings::LoopSettings;
use super::surface::{Posed2D, Posed3D, sort_and_render_2d};

/// Loop-owned state an app may inspect and steer from its callbacks.
#[derive(Debug, Clone, Default)]
pub struct AppCtx {
    pub settings: LoopSettings,

    exit_code: Option<i32>,
    real_time: RealTime,
    sim_time: SimTime,
    previous_real_step: RealTime,
    previous_sim_step: SimTime,
}

impl AppCtx {
    pub fn new(settings: LoopSettings) -> Self {
        Self { settings, ..Self::default() }
    }

    /// Ends the loop after the current frame with exit code `code`.
    pub fn set_exit_code(&mut self, code: i32) {
        self.exit_code = Some(code);
    }

    /// Ends the loop after the current frame with exit code 0.
    pub fn end_program(&mut self) {
        self.set_exit_code(0);
    }

    #[inline]
    pub fn exit_code(&self) -> Option<i32> {
        self.exit_code
    }

    #[inline]
    pub fn ended(&self) -> bool {
        self.exit_code.is_some()
    }

    /// Accumulated real time of all simulation steps.
    #[inline]
    pub fn real_time(&self) -> RealTime {
        self.real_time
    }

    /// Accumulated simulation time.
    #[inline]
    pub fn sim_time(&self) -> SimTime {
        self.sim_time
    }

    #[inline]
    pub fn previous_real_step(&self) -> RealTime {
        self.previous_real_step
    }

    #[inline]
    pub fn previous_sim_step(&self) -> SimTime {
        self.previous_sim_step
    }

    pub fn set_real_time(&mut self, t: RealTime) {
        self.real_time = t;
    }

    pub fn set_sim_time(&mut self, t: SimTime) {
        self.sim_time = t;
    }

    pub(super) fn advance(&mut self, rdt: RealTime, sdt: SimTime) {
        self.previous_real_step = rdt;
        self.previous_sim_step = sdt;
        self.real_time += rdt;
        self.sim_time += sdt;
    }
}

/// Application contract driven by [`LoopController`](super::LoopController).
///
/// Every callback has a default. Per frame the controller calls, in order:
/// events, `on_after_events`, `on_user_input`, `on_network`, `on_ai`, the three
/// simulation callbacks (all repeated `render_period` times), `on_pose`,
/// `on_wait` and `on_graphics`.
pub trait App<A: NativeApi = WgpuBackend> {
    /// Loads resources. Errors end the loop before the first frame.
    fn on_init(&mut self, rd: &mut RenderDevice<A>, ctx: &mut AppCtx) -> anyhow::Result<()> {
        let _ = (rd, ctx);
        Ok(())
    }

    /// The render surface changed size.
    fn on_resize(&mut self, rd: &mut RenderDevice<A>, width: u32, height: u32) {
        let _ = (rd, width, height);
    }

    /// Returns `true` to consume the event. Unconsumed `Quit` and Escape end the loop.
    fn on_event(&mut self, event: &InputEvent, ctx: &mut AppCtx) -> bool {
        let _ = (event, ctx);
        false
    }

    fn on_after_events(&mut self, ctx: &mut AppCtx) {
        let _ = ctx;
    }

    fn on_user_input(&mut self, input: &InputState, ctx: &mut AppCtx) {
        let _ = (input, ctx);
    }

    fn on_network(&mut self) {}

    fn on_ai(&mut self) {}

    /// May adjust the steps before they are applied.
    fn on_before_simulation(&mut self, rdt: &mut RealTime, sdt: &mut SimTime, idt: &mut SimTime) {
        let _ = (rdt, sdt, idt);
    }

    /// `rdt` is the real step, `sdt` the simulation step and `idt` the ideal
    /// (target) step.
    fn on_simulation(&mut self, rdt: RealTime, sdt: SimTime, idt: SimTime) {
        let _ = (rdt, sdt, idt);
    }

    fn on_after_simulation(&mut self, rdt: RealTime, sdt: SimTime, idt: SimTime) {
        let _ = (rdt, sdt, idt);
    }

    /// Appends what should be drawn this frame.
    fn on_pose(&mut self, posed3d: &mut Vec<Posed3D<A>>, posed2d: &mut Vec<Posed2D<A>>) {
        let _ = (posed3d, posed2d);
    }

    /// Idles until the next frame is due.
    fn on_wait(&mut self, t: Duration) {
        if !t.is_zero() {
            std::thread::sleep(t);
        }
    }

    /// Draws the frame. The default renders the 3D surfaces with the current
    /// camera, then the 2D surfaces in window pixel space.
    fn on_graphics(&mut self, rd: &mut RenderDevice<A>, posed3d: &[Posed3D<A>], posed2d: &[Posed2D<A>]) {
        rd.push_state();
        self.on_graphics_3d(rd, posed3d);
        rd.pop_state();

        rd.push_2d_full();
        self.on_graphics_2d(rd, posed2d);
        rd.pop_2d();
    }

    fn on_graphics_3d(&mut self, rd: &mut RenderDevice<A>, posed3d: &[Posed3D<A>]) {
        for s in posed3d {
            s.render(rd);
        }
    }

    fn on_graphics_2d(&mut self, rd: &mut RenderDevice<A>, posed2d: &[Posed2D<A>]) {
        sort_and_render_2d(rd, posed2d);
    }

    /// Releases resources after the last frame.
    fn on_cleanup(&mut self, rd: &mut RenderDevice<A>) {
        let _ = rd;
    }
}
