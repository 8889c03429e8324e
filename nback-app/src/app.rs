use std::path::PathBuf;
use std::sync::Arc;

use ab_glyph::FontVec;
use anyhow::Result;
use log::{error, info};
use nback_render::TaskRenderer;
use nback_task::{TaskDriver, TaskKey};
use nback_timing::HighPrecisionTimer;
use pixels::{Pixels, SurfaceTexture};
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Fullscreen, Window, WindowId},
};

/// Winit front end: fullscreen window, pixels surface, and the pump that
/// feeds frames and key presses to the task driver.
pub struct App {
    window: Option<Arc<Window>>,
    pixels: Option<Pixels<'static>>,
    driver: TaskDriver<HighPrecisionTimer>,
    renderer: Option<TaskRenderer>,
    font: Option<FontVec>,
    asset_root: PathBuf,
    should_exit: bool,
}

impl App {
    pub fn new(driver: TaskDriver<HighPrecisionTimer>, font: FontVec, asset_root: PathBuf) -> Self {
        Self {
            window: None,
            pixels: None,
            driver,
            renderer: None,
            font: Some(font),
            asset_root,
            should_exit: false,
        }
    }

    pub fn run(mut self) -> Result<()> {
        let event_loop = EventLoop::new()?;
        info!("platform {} / {}", std::env::consts::OS, std::env::consts::ARCH);
        event_loop.run_app(&mut self)?;
        Ok(())
    }

    fn create_window_and_surface(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let primary_monitor = event_loop
            .primary_monitor()
            .or_else(|| event_loop.available_monitors().next())
            .ok_or_else(|| anyhow::anyhow!("No monitor available"))?;

        let window_attributes = Window::default_attributes()
            .with_title("N-back")
            .with_fullscreen(Some(Fullscreen::Borderless(Some(primary_monitor))))
            .with_resizable(false);

        let window = Arc::new(event_loop.create_window(window_attributes)?);
        let physical_size = window.inner_size();
        info!(
            "display {}x{} @ scale {:.2}",
            physical_size.width,
            physical_size.height,
            window.scale_factor()
        );

        let surface_texture =
            SurfaceTexture::new(physical_size.width, physical_size.height, window.clone());
        self.pixels = Some(Pixels::new(
            physical_size.width,
            physical_size.height,
            surface_texture,
        )?);

        let font = self
            .font
            .take()
            .ok_or_else(|| anyhow::anyhow!("font already consumed"))?;
        self.renderer = Some(TaskRenderer::new(
            physical_size.width,
            physical_size.height,
            font,
            self.asset_root.clone(),
        )?);

        window.set_cursor_visible(false);
        window.request_redraw();
        self.window = Some(window);

        Ok(())
    }

    fn render_and_update(&mut self) -> Result<()> {
        if let (Some(pixels), Some(renderer)) = (self.pixels.as_mut(), self.renderer.as_mut()) {
            renderer.render(&self.driver.display(), pixels.frame_mut())?;
            pixels.render()?;
        }
        self.driver.update()?;
        self.driver.pace();
        Ok(())
    }

    fn handle_input(&mut self, key: PhysicalKey, event_loop: &ActiveEventLoop) {
        let PhysicalKey::Code(code) = key else {
            return;
        };
        let task_key = match code {
            KeyCode::Digit1 | KeyCode::Numpad1 => Some(TaskKey::Digit1),
            KeyCode::Digit2 | KeyCode::Numpad2 => Some(TaskKey::Digit2),
            KeyCode::Digit3 | KeyCode::Numpad3 => Some(TaskKey::Digit3),
            KeyCode::Digit4 | KeyCode::Numpad4 => Some(TaskKey::Digit4),
            KeyCode::Space => Some(TaskKey::Space),
            KeyCode::NumpadAdd | KeyCode::Equal => Some(TaskKey::Plus),
            KeyCode::Escape => {
                self.abort_and_exit(event_loop);
                None
            }
            _ => None,
        };
        if let Some(task_key) = task_key {
            self.driver.handle_key(task_key);
        }
    }

    fn handle_resize(&mut self, new_size: PhysicalSize<u32>) {
        if let Some(pixels) = &mut self.pixels {
            if let Err(e) = pixels.resize_surface(new_size.width, new_size.height) {
                error!("failed to resize surface: {e}");
            }
            if let Err(e) = pixels.resize_buffer(new_size.width, new_size.height) {
                error!("failed to resize buffer: {e}");
            }
        }
        if let Some(renderer) = &mut self.renderer {
            if let Err(e) = renderer.resize(new_size.width, new_size.height) {
                error!("failed to resize canvas: {e}");
            }
        }
    }

    /// Escape / window close: persist what was collected, then leave.
    fn abort_and_exit(&mut self, event_loop: &ActiveEventLoop) {
        if let Err(e) = self.driver.abort() {
            error!("failed to persist partial results: {e:#}");
        }
        self.exit(event_loop);
    }

    fn exit(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.set_cursor_visible(true);
        }
        self.should_exit = true;
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(e) = self.create_window_and_surface(event_loop) {
                error!("failed to create window and surface: {e:#}");
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => self.abort_and_exit(event_loop),
            WindowEvent::RedrawRequested => {
                if let Err(e) = self.render_and_update() {
                    error!("frame failed: {e:#}");
                    self.exit(event_loop);
                    return;
                }
                if self.driver.is_done() {
                    info!("run finished");
                    self.exit(event_loop);
                    return;
                }
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            WindowEvent::KeyboardInput { event, .. } if event.state.is_pressed() => {
                self.handle_input(event.physical_key, event_loop);
            }
            WindowEvent::Resized(size) => self.handle_resize(size),
            WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(window) = &self.window {
                    self.handle_resize(window.inner_size());
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.should_exit {
            event_loop.exit();
        }
    }
}
