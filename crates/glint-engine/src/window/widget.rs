use std::path::PathBuf;

use winit::dpi::LogicalSize;
use winit::event::WindowEvent;

use crate::core::{App, LoopController, LoopSettings};
use crate::device::WgpuBackend;
use crate::input::{ButtonMask, EventQueue, EventTranslator, InputEvent, JoystickState, Joysticks};
use crate::render::{NativeApi, RenderDevice};

/// Window attributes of one widget.
#[derive(Debug, Clone)]
pub struct WidgetConfig {
    pub title: String,
    pub size: LogicalSize<f64>,
    pub min_size: Option<LogicalSize<f64>>,
    pub resizable: bool,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            title: "glint".to_string(),
            size: LogicalSize::new(800.0, 600.0),
            min_size: None,
            resizable: true,
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum Lifecycle {
    Created,
    Initialized,
    Terminated,
}

/// A render surface as the engine sees a window: size, focus, mouse, dropped
/// files, joysticks and a caption, plus the app it drives once per tick.
///
/// Call order is `initialize` once, `update` per tick, `terminate` once.
/// Anything else panics.
pub struct SurfaceWidget<A: NativeApi = WgpuBackend> {
    config: WidgetConfig,
    caption: String,
    caption_changed: bool,

    translator: EventTranslator,
    events: EventQueue,
    joysticks: Joysticks,

    app: Option<LoopController<A>>,
    exit_code: Option<i32>,

    size: (u32, u32),
    reported_focus: bool,
    lifecycle: Lifecycle,
}

impl<A: NativeApi> SurfaceWidget<A> {
    pub fn new(config: WidgetConfig) -> Self {
        Self {
            caption: config.title.clone(),
            caption_changed: false,
            config,
            translator: EventTranslator::new(),
            events: EventQueue::default(),
            joysticks: Joysticks::default(),
            app: None,
            exit_code: None,
            size: (0, 0),
            reported_focus: false,
            lifecycle: Lifecycle::Created,
        }
    }

    #[inline]
    pub fn config(&self) -> &WidgetConfig {
        &self.config
    }

    /// Attaches the app this widget drives. Must precede `initialize`.
    pub fn push_app(&mut self, app: Box<dyn App<A>>, settings: LoopSettings) {
        assert_eq!(self.lifecycle, Lifecycle::Created, "push_app after initialize");
        self.app = Some(LoopController::new(app, settings));
    }

    /// Opens joysticks and initializes the pushed app on `rd`. Automatic
    /// swapping is turned off: `update` presents explicitly.
    pub fn initialize(&mut self, rd: &mut RenderDevice<A>, width: u32, height: u32) -> anyhow::Result<()> {
        assert_eq!(self.lifecycle, Lifecycle::Created, "SurfaceWidget::initialize called twice");
        self.lifecycle = Lifecycle::Initialized;
        self.size = (width, height);
        self.joysticks = Joysticks::open();

        if let Some(app) = self.app.as_mut() {
            rd.set_swap_buffers_automatically(false);
            if let Err(e) = app.init(rd) {
                self.exit_code = app.exit_code();
                return Err(e);
            }
            app.resize(rd, width, height);
        }
        log::info!("widget '{}' initialized ({width}x{height})", self.caption);
        Ok(())
    }

    /// Feeds a window event through the translator.
    pub fn handle_window_event(&mut self, event: &WindowEvent) {
        self.translator.translate(event, &mut self.events);
    }

    /// Records the new surface size and forwards it to the app.
    pub fn resize(&mut self, rd: &mut RenderDevice<A>, width: u32, height: u32) {
        if self.size == (width, height) {
            return;
        }
        self.size = (width, height);
        if let Some(app) = self.app.as_mut() {
            app.resize(rd, width, height);
        }
    }

    /// Runs one frame of the app on `rd`, which must already target this
    /// widget's surface, and presents it. Returns `false` once the app ended.
    pub fn update(&mut self, rd: &mut RenderDevice<A>) -> bool {
        assert_eq!(
            self.lifecycle,
            Lifecycle::Initialized,
            "SurfaceWidget::update requires an initialized, unterminated widget"
        );
        self.joysticks.poll();

        let has_focus = self.translator.has_focus();
        if has_focus != self.reported_focus {
            self.reported_focus = has_focus;
            self.events.push(InputEvent::Focus { has_focus });
        }

        let Some(app) = self.app.as_mut() else {
            self.events.clear();
            return false;
        };
        if app.ended() {
            return false;
        }

        rd.set_swap_buffers_automatically(false);
        app.one_frame(rd, &mut self.events, has_focus);
        rd.swap_buffers();

        if let Some(code) = app.exit_code() {
            self.exit_code = Some(code);
            return false;
        }
        true
    }

    /// Cleans up and detaches the app.
    pub fn pop_app(&mut self, rd: &mut RenderDevice<A>) -> Option<LoopController<A>> {
        let mut app = self.app.take()?;
        app.cleanup(rd);
        if self.exit_code.is_none() {
            self.exit_code = app.exit_code();
        }
        Some(app)
    }

    /// Pops the app and closes joysticks.
    pub fn terminate(&mut self, rd: &mut RenderDevice<A>) {
        assert_eq!(
            self.lifecycle,
            Lifecycle::Initialized,
            "SurfaceWidget::terminate requires an initialized, unterminated widget"
        );
        self.pop_app(rd);
        self.joysticks.close();
        self.events.clear();
        self.lifecycle = Lifecycle::Terminated;
        log::info!("widget '{}' terminated", self.caption);
    }

    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.lifecycle == Lifecycle::Initialized
    }

    /// Code the app ended with, once it has.
    #[inline]
    pub fn exit_code(&self) -> Option<i32> {
        self.exit_code
    }

    // ── window-like interface ─────────────────────────────────────────────

    #[inline]
    pub fn width(&self) -> u32 {
        self.size.0
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.size.1
    }

    #[inline]
    pub fn has_focus(&self) -> bool {
        self.translator.has_focus()
    }

    pub fn relative_mouse_state(&self) -> ((f32, f32), ButtonMask) {
        self.translator.relative_mouse_state()
    }

    pub fn dropped_files(&self) -> &[PathBuf] {
        self.translator.dropped_files()
    }

    pub fn joystick_count(&self) -> usize {
        self.joysticks.count()
    }

    pub fn joystick_name(&self, index: usize) -> Option<String> {
        self.joysticks.name(index)
    }

    pub fn joystick_state(&self, index: usize) -> Option<JoystickState> {
        self.joysticks.state(index)
    }

    #[inline]
    pub fn caption(&self) -> &str {
        &self.caption
    }

    pub fn set_caption(&mut self, caption: impl Into<String>) {
        let caption = caption.into();
        if caption != self.caption {
            self.caption = caption;
            self.caption_changed = true;
        }
    }

    /// The caption, if it changed since the last call.
    pub fn take_caption_change(&mut self) -> Option<&str> {
        std::mem::take(&mut self.caption_changed).then_some(self.caption.as_str())
    }
}
