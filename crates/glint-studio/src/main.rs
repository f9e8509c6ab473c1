//! Glint studio: the starter and pixel shader demos, each in its own window,
//! sharing one GPU context and render device.

mod manipulator;
mod mesh;
mod pixel_shader;
mod shading;
mod starter;

use anyhow::Result;
use glint_engine::core::LoopSettings;
use glint_engine::logging::{LoggingConfig, init_logging};
use glint_engine::window::{Runtime, RuntimeConfig, WidgetConfig, WindowSpec};
use winit::dpi::LogicalSize;

use pixel_shader::PixelShaderApp;
use starter::StarterApp;

fn windows() -> Vec<WindowSpec> {
    let starter_size = LogicalSize::new(800.0, 800.0);
    let starter = WidgetConfig {
        title: "Starter".to_string(),
        size: starter_size,
        min_size: Some(starter_size),
        resizable: true,
    };

    let shader_size = LogicalSize::new(pixel_shader::SIZE as f64, pixel_shader::SIZE as f64);
    let pixel_shader = WidgetConfig {
        title: pixel_shader::TITLE.to_string(),
        size: shader_size,
        min_size: Some(shader_size),
        resizable: false,
    };

    vec![
        WindowSpec::new(starter, StarterApp::new(), LoopSettings::default()),
        WindowSpec::new(pixel_shader, PixelShaderApp::new(), LoopSettings::default()),
    ]
}

fn run() -> Result<i32> {
    init_logging(LoggingConfig::default());

    let config = RuntimeConfig {
        gpu: glint_engine::device::GpuInit {
            present_mode: wgpu::PresentMode::AutoNoVsync,
            ..Default::default()
        },
        ..Default::default()
    };
    Runtime::run(config, windows())
}

fn main() {
    let code = match run() {
        Ok(code) => code,
        Err(e) => {
            log::error!("{e:#}");
            eprintln!("glint-studio: {e:#}");
            1
        }
    };
    std::process::exit(code);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_layout() {
        let specs = windows();
        assert_eq!(specs.len(), 2);

        assert_eq!(specs[0].widget.min_size, Some(LogicalSize::new(800.0, 800.0)));
        assert!(specs[0].widget.resizable);

        assert_eq!(specs[1].widget.title, "Pixel Shader Demo");
        assert_eq!(specs[1].widget.size, LogicalSize::new(400.0, 400.0));
        assert!(!specs[1].widget.resizable);
    }
}
