use anyhow::Result;
use clap::Parser;
use glam::EulerRot;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{DeviceEvent, ElementState, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{CursorGrabMode, Window, WindowId};
use westward_common::InstanceSlot;
use westward_input::capture::{capture_device_event, capture_window_event};
use westward_input::DeviceQueue;
use westward_runtime::{RuntimeConfig, Session};

#[derive(Parser)]
#[command(name = "westward-desktop", about = "Westward desktop shell")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Runtime config (YAML)
    #[arg(long)]
    config: Option<PathBuf>,
}

const STATUS_INTERVAL: Duration = Duration::from_millis(500);

struct DesktopApp {
    session: Session,
    device: DeviceQueue,
    window: Option<Window>,
    pointer_captured: bool,
    last_frame: Instant,
    last_status: Instant,
}

impl DesktopApp {
    fn new(session: Session) -> Self {
        let now = Instant::now();
        Self {
            device: session.device(),
            session,
            window: None,
            pointer_captured: false,
            last_frame: now,
            last_status: now,
        }
    }

    fn set_pointer_capture(&mut self, captured: bool) {
        let Some(window) = &self.window else {
            return;
        };
        self.pointer_captured = captured;
        let mode = if captured {
            CursorGrabMode::Locked
        } else {
            CursorGrabMode::None
        };
        if let Err(e) = window
            .set_cursor_grab(mode)
            .or_else(|_| window.set_cursor_grab(CursorGrabMode::Confined))
        {
            tracing::warn!("cursor grab unavailable: {e}");
        }
        window.set_cursor_visible(!captured);
    }

    fn update(&mut self, dt: f32) {
        let report = self.session.frame(dt);
        if self.last_status.elapsed() < STATUS_INTERVAL {
            return;
        }
        self.last_status = Instant::now();

        let controller = self.session.controller();
        let position = self.session.body().position();
        let (yaw, _, _) = controller.rotation().to_euler(EulerRot::YXZ);
        tracing::debug!(
            ?position,
            yaw = yaw.to_degrees(),
            pitch = controller.pitch(),
            grounded = report.grounded,
            "actor"
        );
        if let Some(window) = &self.window {
            window.set_title(&format!(
                "Westward  pos ({:.1}, {:.1}, {:.1})  yaw {:.0}  pitch {:.0}",
                position.x,
                position.y,
                position.z,
                yaw.to_degrees(),
                controller.pitch()
            ));
        }
    }
}

impl ApplicationHandler for DesktopApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attrs = Window::default_attributes()
            .with_title("Westward")
            .with_inner_size(PhysicalSize::new(1280u32, 720));
        match event_loop.create_window(attrs) {
            Ok(window) => {
                tracing::info!("window created; right click to capture the pointer");
                self.window = Some(window);
                self.last_frame = Instant::now();
            }
            Err(e) => {
                tracing::error!("failed to create window: {e}");
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if let Some(input) = capture_window_event(&event) {
            self.device.push(input);
        }

        match event {
            WindowEvent::CloseRequested => {
                self.session.shutdown();
                event_loop.exit();
            }
            WindowEvent::MouseInput {
                button: MouseButton::Right,
                state: ElementState::Pressed,
                ..
            } => {
                self.set_pointer_capture(!self.pointer_captured);
            }
            WindowEvent::Focused(false) => {
                self.set_pointer_capture(false);
            }
            WindowEvent::RedrawRequested => {
                let now = Instant::now();
                let dt = (now - self.last_frame).as_secs_f32();
                self.last_frame = now;
                self.update(dt);
            }
            _ => {}
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: winit::event::DeviceId,
        event: DeviceEvent,
    ) {
        if !self.pointer_captured {
            return;
        }
        if let Some(input) = capture_device_event(&event) {
            self.device.push(input);
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    tracing::info!("westward-desktop starting");

    let config = match &cli.config {
        Some(path) => RuntimeConfig::load(path)?,
        None => RuntimeConfig::default(),
    };
    let bindings = Rc::new(config.load_bindings()?);
    let mut slot = InstanceSlot::new("input dispatcher");
    let session = Session::new(config, bindings, &mut slot)?;

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = DesktopApp::new(session);
    event_loop.run_app(&mut app)?;

    Ok(())
}
