use crate::time::{BACKGROUND_FRAME_RATE, RealTime, SimTimeStep};

/// Pacing and simulation settings of one app loop.
#[derive(Debug, Clone, PartialEq)]
pub struct LoopSettings {
    /// Wall-clock target duration of one frame, in seconds.
    pub frame_duration: RealTime,

    /// Frame rate while the window is unfocused. `None` keeps full speed.
    pub background_frame_rate: Option<f64>,

    pub sim_time_step: SimTimeStep,

    /// Multiplier applied to every simulation step.
    pub sim_time_scale: f64,

    /// Simulation and input iterations per rendered frame. Values below 1 act as 1.
    pub render_period: u32,

    /// An unconsumed Escape press ends the program with exit code 0.
    pub quit_on_escape: bool,
}

impl LoopSettings {
    /// Sets the target frame duration from a frame rate.
    pub fn set_frame_rate(&mut self, fps: f64) {
        debug_assert!(fps > 0.0, "frame rate must be positive");
        if fps > 0.0 {
            self.frame_duration = 1.0 / fps;
        }
    }

    #[inline]
    pub fn frame_rate(&self) -> f64 {
        1.0 / self.frame_duration
    }

    /// Target frame duration, throttled when the window is in the background.
    pub fn target_duration(&self, has_focus: bool) -> RealTime {
        match self.background_frame_rate {
            Some(fps) if !has_focus && fps > 0.0 => 1.0 / fps,
            _ => self.frame_duration,
        }
    }
}

impl Default for LoopSettings {
    fn default() -> Self {
        Self {
            frame_duration: 1.0 / 60.0,
            background_frame_rate: Some(BACKGROUND_FRAME_RATE),
            sim_time_step: SimTimeStep::MatchRealTimeTarget,
            sim_time_scale: 1.0,
            render_period: 1,
            quit_on_escape: true,
        }
    }
}
