use anyhow::{Context, Result};
use ouroboros::self_referencing;
use std::collections::HashMap;
use std::time::{Duration, Instant};

use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::core::{App, LoopSettings};
use crate::device::{GpuContext, GpuInit, SurfaceErrorAction, WgpuBackend};
use crate::render::RenderDevice;

use super::context::{RenderSurface, make_current};
use super::widget::{SurfaceWidget, WidgetConfig};

/// Interval at which every widget is updated.
pub const DEFAULT_TICK: Duration = Duration::from_millis(15);

/// Runtime configuration shared by all windows.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub gpu: GpuInit,
    pub tick: Duration,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self { gpu: GpuInit::default(), tick: DEFAULT_TICK }
    }
}

/// One window to open: its widget attributes and the app it drives.
pub struct WindowSpec {
    pub widget: WidgetConfig,
    pub app: Box<dyn App>,
    pub settings: LoopSettings,
}

impl WindowSpec {
    pub fn new(widget: WidgetConfig, app: impl App + 'static, settings: LoopSettings) -> Self {
        Self { widget, app: Box::new(app), settings }
    }
}

/// Entry point for the runtime.
pub struct Runtime;

impl Runtime {
    /// Opens every window, drives them until all have closed and returns the
    /// exit code: the first non-zero app code, else 0.
    pub fn run(config: RuntimeConfig, windows: Vec<WindowSpec>) -> Result<i32> {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut host = Host::new(config, windows);

        event_loop
            .run_app(&mut host)
            .context("winit event loop terminated with error")?;

        host.finish()
    }
}

#[self_referencing]
struct WindowEntry {
    widget: SurfaceWidget,

    window: Window,

    #[borrows(window)]
    #[covariant]
    surface: RenderSurface<'this>,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum Outcome {
    Running,
    Ended,
    Lost,
}

struct Host {
    config: RuntimeConfig,
    pending: Vec<WindowSpec>,

    gpu: Option<GpuContext>,
    rd: Option<RenderDevice<WgpuBackend>>,

    windows: HashMap<WindowId, WindowEntry>,
    order: Vec<WindowId>,
    next_tick: Instant,

    exit_code: Option<i32>,
    failure: Option<anyhow::Error>,
}

impl Host {
    fn new(config: RuntimeConfig, pending: Vec<WindowSpec>) -> Self {
        Self {
            config,
            pending,
            gpu: None,
            rd: None,
            windows: HashMap::new(),
            order: Vec::new(),
            next_tick: Instant::now(),
            exit_code: None,
            failure: None,
        }
    }

    fn create_window_entry(&mut self, event_loop: &ActiveEventLoop, spec: WindowSpec) -> Result<()> {
        let WindowSpec { widget: config, app, settings } = spec;

        let mut attrs = Window::default_attributes()
            .with_title(config.title.clone())
            .with_inner_size(config.size)
            .with_resizable(config.resizable);
        if let Some(min) = config.min_size {
            attrs = attrs.with_min_inner_size(min);
        }

        let window = event_loop.create_window(attrs).context("failed to create window")?;
        let id = window.id();

        let instance = match &self.gpu {
            Some(gpu) => gpu.instance().clone(),
            None => GpuContext::create_instance(),
        };
        let gpu_slot = &mut self.gpu;
        let gpu_init = &self.config.gpu;

        let mut widget = SurfaceWidget::new(config);
        widget.push_app(app, settings);

        let mut entry = WindowEntryTryBuilder {
            widget,
            window,
            surface_builder: |window| build_surface(window, &instance, gpu_slot, gpu_init),
        }
        .try_build()?;

        let gpu = self.gpu.as_ref().context("GPU context missing after surface creation")?;
        let size = entry.borrow_surface().size();
        let rd = self
            .rd
            .get_or_insert_with(|| RenderDevice::new(WgpuBackend::new(gpu), size.width, size.height));

        let init = entry.with_widget_mut(|widget| widget.initialize(rd, size.width, size.height));
        if let Err(e) = init {
            log::error!("{e:#}");
            entry.with_widget_mut(|widget| widget.terminate(rd));
            let code = entry.borrow_widget().exit_code().unwrap_or(1);
            self.record_exit(code);
            return Ok(());
        }

        self.windows.insert(id, entry);
        self.order.push(id);
        Ok(())
    }

    fn close_window(&mut self, id: WindowId) {
        let Some(mut entry) = self.windows.remove(&id) else {
            return;
        };
        self.order.retain(|w| *w != id);

        if let Some(rd) = self.rd.as_mut() {
            entry.with_widget_mut(|widget| {
                if widget.is_initialized() {
                    widget.terminate(rd);
                }
            });
        }
        let code = entry.borrow_widget().exit_code().unwrap_or(0);
        log::info!("window closed with code {code}");
        self.record_exit(code);
    }

    fn record_exit(&mut self, code: i32) {
        if self.exit_code.is_none_or(|c| c == 0) {
            self.exit_code = Some(code);
        }
    }

    /// Updates every widget once, in creation order.
    fn tick(&mut self) {
        let (Some(gpu), Some(rd)) = (self.gpu.as_ref(), self.rd.as_mut()) else {
            return;
        };

        let mut finished = Vec::new();
        for id in &self.order {
            let Some(entry) = self.windows.get_mut(id) else {
                continue;
            };
            let outcome = entry.with_mut(|fields| {
                let outcome = match make_current(rd, gpu, fields.surface) {
                    Ok(mut current) => {
                        if fields.widget.update(&mut current) {
                            Outcome::Running
                        } else {
                            Outcome::Ended
                        }
                    }
                    Err(SurfaceErrorAction::Fatal) => {
                        log::error!("window surface lost; closing '{}'", fields.widget.caption());
                        Outcome::Lost
                    }
                    Err(_) => Outcome::Running,
                };
                if let Some(caption) = fields.widget.take_caption_change() {
                    fields.window.set_title(caption);
                }
                outcome
            });
            if outcome != Outcome::Running {
                finished.push((*id, outcome));
            }
        }

        for (id, outcome) in finished {
            if outcome == Outcome::Lost {
                self.record_exit(1);
            }
            self.close_window(id);
        }
    }

    fn resize(&mut self, id: WindowId, size: winit::dpi::PhysicalSize<u32>) {
        let (Some(gpu), Some(rd), Some(entry)) = (self.gpu.as_ref(), self.rd.as_mut(), self.windows.get_mut(&id))
        else {
            return;
        };
        entry.with_mut(|fields| {
            fields.surface.update(gpu, size);
            fields.widget.resize(rd, size.width, size.height);
        });
    }

    fn shutdown(&mut self) {
        let ids: Vec<_> = self.order.clone();
        for id in ids {
            self.close_window(id);
        }
        if let Some(mut rd) = self.rd.take() {
            rd.cleanup();
        }
    }

    fn finish(mut self) -> Result<i32> {
        self.shutdown();
        match self.failure.take() {
            Some(e) => Err(e),
            None => Ok(self.exit_code.unwrap_or(0)),
        }
    }
}

/// Creates the surface for `window`, creating the shared GPU context on first
/// use so the adapter is compatible with it.
fn build_surface<'w>(
    window: &'w Window,
    instance: &wgpu::Instance,
    gpu_slot: &mut Option<GpuContext>,
    init: &GpuInit,
) -> Result<RenderSurface<'w>> {
    let surface = instance.create_surface(window).context("failed to create surface")?;
    if gpu_slot.is_none() {
        *gpu_slot = Some(GpuContext::new_blocking(instance.clone(), Some(&surface), init.clone())?);
    }
    let gpu = gpu_slot.as_ref().context("GPU context missing")?;
    RenderSurface::new(gpu, surface, window.inner_size())
}

impl ApplicationHandler for Host {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.pending.is_empty() {
            return;
        }

        for spec in std::mem::take(&mut self.pending) {
            if let Err(e) = self.create_window_entry(event_loop, spec) {
                log::error!("failed to create window: {e:#}");
                self.failure = Some(e);
                break;
            }
        }

        if self.failure.is_some() || self.windows.is_empty() {
            self.shutdown();
            event_loop.exit();
            return;
        }
        self.next_tick = Instant::now();
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if !self.pending.is_empty() {
            return;
        }

        let now = Instant::now();
        if now >= self.next_tick {
            self.tick();
            self.next_tick = now + self.config.tick;
        }

        if self.windows.is_empty() {
            self.shutdown();
            event_loop.exit();
            return;
        }
        event_loop.set_control_flow(ControlFlow::WaitUntil(self.next_tick));
    }

    fn window_event(&mut self, _event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        match &event {
            WindowEvent::Resized(size) => self.resize(window_id, *size),
            WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(entry) = self.windows.get(&window_id) {
                    let size = entry.with_window(|w| w.inner_size());
                    self.resize(window_id, size);
                }
            }
            _ => {}
        }

        if let Some(entry) = self.windows.get_mut(&window_id) {
            entry.with_widget_mut(|widget| widget.handle_window_event(&event));
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.shutdown();
    }
}
