use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::path::PathBuf;
use std::sync::Arc;
use winit::{
    event::{DeviceEvent, ElementState, Event, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::WindowBuilder,
};

mod core;
mod engine;
mod game;

use engine::clock::TickClock;
use engine::input::{InputCatalog, InputManager, InputOracle};
use engine::net::LoopbackTransport;
use game::control::targets::{LoggingProgram, PulseCounter};
use game::control::{ActionTarget, ControlSession, Controller};

/// Settings used when no file is given
const DEFAULT_SETTINGS: &str = "[ControlModuleMod]\nInput=c.jump c.movement\nState=1\nRepeat=0.25\n";

#[derive(Parser, Debug)]
#[command(name = "control-module", about = "Bind input combinations to actions")]
struct Args {
    /// CustomData text to load into the demo block
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Run the demo block as a client; fires replicate to a local authority
    #[arg(long)]
    client: bool,

    /// Entity id of the demo block
    #[arg(long, default_value_t = 1)]
    entity_id: u64,

    /// Drive a pulse target instead of a program
    #[arg(long)]
    pulse: bool,

    /// Display name of the demo block, may carry legacy settings
    #[arg(long, default_value = "Control Module")]
    name: String,
}

/// Everything the event loop drives
struct App {
    clock: TickClock,
    input: InputManager,
    gamepads: Option<gilrs::Gilrs>,
    local: ControlSession,
    /// Present when the local session is a client
    authority: Option<ControlSession>,
    transport: LoopbackTransport,
    controller: Controller,
    entity_id: u64,
    saved_custom_data: String,
}

impl App {
    fn new(args: &Args) -> Result<Self> {
        let custom_data = match &args.settings {
            Some(path) => std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?,
            None => DEFAULT_SETTINGS.to_string(),
        };

        let catalog = Arc::new(InputCatalog::standard());
        info!("Input catalog has {} entries", catalog.len());

        let target = |pulse: bool| -> Box<dyn ActionTarget> {
            if pulse {
                Box::new(PulseCounter::new())
            } else {
                Box::new(LoggingProgram::new())
            }
        };

        let mut local = ControlSession::new(Arc::clone(&catalog), !args.client);
        let block = local.create_block(args.entity_id, &args.name, &custom_data, target(args.pulse));
        if let Some(reason) = block.fail_reason() {
            log::warn!("Demo block settings invalid: {}", reason);
        }
        let saved_custom_data = block.custom_data().to_string();

        let authority = if args.client {
            let mut authority = ControlSession::new(catalog, true);
            authority.create_block(args.entity_id, &args.name, &custom_data, target(args.pulse));
            Some(authority)
        } else {
            None
        };

        let gamepads = match gilrs::Gilrs::new() {
            Ok(gilrs) => Some(gilrs),
            Err(e) => {
                log::warn!("Gamepad support unavailable: {}", e);
                None
            }
        };

        let app = Self {
            clock: TickClock::new(),
            input: InputManager::default(),
            gamepads,
            local,
            authority,
            transport: LoopbackTransport::new(),
            controller: Controller::new("Pilot Seat"),
            entity_id: args.entity_id,
            saved_custom_data,
        };

        if let Some(block) = app.local.block(app.entity_id) {
            info!(
                "Block {} '{}' ({:?} target, {}) monitors: {}",
                block.entity_id(),
                block.display_name(),
                block.target_kind(),
                if app.local.is_authority() { "authority" } else { "client" },
                block.friendly_string(app.input.bindings())
            );
        }

        Ok(app)
    }

    fn handle_window_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state == ElementState::Pressed && !event.repeat {
                    match event.physical_key {
                        PhysicalKey::Code(KeyCode::Escape) => {
                            let in_menu = !self.input.state().in_menu();
                            self.input.set_in_menu(in_menu);
                            info!("Menu {}", if in_menu { "opened" } else { "closed" });
                        }
                        PhysicalKey::Code(KeyCode::Pause) => self.clock.toggle_pause(),
                        _ => {}
                    }
                }
                self.input.process_keyboard_event(event);
            }
            WindowEvent::MouseInput { state, button, .. } => {
                self.input.process_mouse_button(*button, *state);
            }
            WindowEvent::MouseWheel { delta, .. } => {
                self.input.process_mouse_wheel(*delta);
            }
            WindowEvent::Focused(false) => {
                // Keys released while unfocused never reach us
                self.input.reset_all();
            }
            _ => {}
        }
    }

    fn poll_gamepads(&mut self) {
        if let Some(gilrs) = &mut self.gamepads {
            while let Some(gilrs::Event { event, .. }) = gilrs.next_event() {
                self.input.process_gamepad_event(&event);
            }
        }
    }

    /// Run as many ticks as the frame time allows
    fn run_frame(&mut self) {
        self.poll_gamepads();

        let ticks = self.clock.begin_frame();
        for _ in 0..ticks {
            self.step();
        }
    }

    fn step(&mut self) {
        let now = self.clock.step();

        self.input.begin_tick();
        self.local.tick(
            now,
            self.input.state(),
            Some(&self.controller),
            &mut self.transport,
        );

        if let Some(authority) = self.authority.as_mut() {
            for message in self.transport.drain() {
                authority.receive(&message);
            }
        }
        self.input.end_tick();

        self.report_saves();
    }

    fn report_saves(&mut self) {
        let Some(block) = self.local.block(self.entity_id) else {
            return;
        };
        if block.custom_data() != self.saved_custom_data {
            self.saved_custom_data = block.custom_data().to_string();
            info!("Block {} CustomData now:\n{}", self.entity_id, self.saved_custom_data);
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logger
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    info!(
        "Starting control module demo ({})",
        if args.client { "client" } else { "authority" }
    );

    let mut app = App::new(&args)?;

    // Create event loop and window
    let event_loop = EventLoop::new()?;
    let window = WindowBuilder::new()
        .with_title("Control Module")
        .with_inner_size(winit::dpi::LogicalSize::new(640, 360))
        .build(&event_loop)?;

    info!("Window created, Escape toggles the menu, Pause pauses the clock");

    event_loop
        .run(move |event, elwt| {
            elwt.set_control_flow(ControlFlow::Poll);

            match event {
                Event::WindowEvent {
                    event: WindowEvent::CloseRequested,
                    ..
                } => {
                    info!("Close requested, shutting down...");
                    elwt.exit();
                }
                Event::WindowEvent { event, .. } => app.handle_window_event(&event),
                Event::DeviceEvent {
                    event: DeviceEvent::MouseMotion { delta },
                    ..
                } => app.input.process_mouse_motion(delta.0, delta.1),
                Event::AboutToWait => {
                    app.run_frame();
                    window.request_redraw();
                }
                _ => {}
            }
        })
        .map_err(|e| anyhow::anyhow!("Event loop error: {}", e))?;

    Ok(())
}
