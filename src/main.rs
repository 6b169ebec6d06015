use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseButton,
    MouseEvent, MouseEventKind,
};
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{execute, terminal};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Rect;
use serde_json::json;
use tracing::{Level, info};

use call_overlay::bridge::{
    BridgeCommand, BridgeReply, METHOD_SHOW_OVERLAY_WITH_DATA, StartCommand,
};
use call_overlay::gesture::{TouchAction, TouchEvent};
use call_overlay::log_buffer::{LogHandle, set_global_log};
use call_overlay::sim::{SIM_DENSITY, SharedSim, SimState, TerminalPlatform, sim_config, view};
use call_overlay::store::{JsonFileStore, KeyValueStore, MemoryStore};
use call_overlay::tracing_sub::{init_default, parse_level};
use call_overlay::window::ScreenMetrics;
use call_overlay::{Controller, ControllerHandle, OverlayConfig, OverlayPayload};

const CALLERS: [&str; 3] = ["+15551234567", "+442071838750", "+61255501234"];

#[derive(Parser, Debug)]
#[command(
    name = "call-overlay",
    version = env!("CARGO_PKG_VERSION"),
    about = "Drive the call overlay controller from a terminal"
)]
struct SimArgs {
    /// JSON config file; missing fields take their defaults.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// JSON file to persist the current call number in. In-memory if unset.
    #[arg(long, value_name = "PATH")]
    store: Option<PathBuf>,

    /// Override the touch slop, in dp.
    #[arg(long = "slop-dp", value_name = "DP")]
    slop_dp: Option<f32>,

    /// Override the overlay width as a fraction of the screen width.
    #[arg(long = "width-fraction", value_name = "FRACTION")]
    width_fraction: Option<f32>,

    #[arg(long = "log-level", value_name = "LEVEL", default_value = "debug")]
    log_level: String,
}

impl SimArgs {
    fn overlay_config(&self) -> io::Result<OverlayConfig> {
        let mut config = match &self.config {
            Some(path) => OverlayConfig::load(path).map_err(io::Error::other)?,
            None => sim_config(),
        };
        if let Some(slop) = self.slop_dp {
            config.touch_slop_dp = slop;
        }
        if let Some(fraction) = self.width_fraction {
            config.width_fraction = Some(fraction);
        }
        config.validate().map_err(io::Error::other)?;
        Ok(config)
    }

    fn store(&self) -> io::Result<Arc<dyn KeyValueStore>> {
        Ok(match &self.store {
            Some(path) => Arc::new(JsonFileStore::open(path).map_err(io::Error::other)?),
            None => Arc::new(MemoryStore::new()),
        })
    }
}

fn main() -> io::Result<()> {
    let args = SimArgs::parse();
    let level = parse_level(&args.log_level).unwrap_or(Level::DEBUG);
    let log = LogHandle::default();
    set_global_log(log.clone());
    init_default(level);

    let config = args.overlay_config()?;
    let store = args.store()?;

    let (cols, rows) = terminal::size()?;
    let (screen, _) = view::split(Rect::new(0, 0, cols, rows));
    let shared = SharedSim::new(SimState::new(screen_metrics(screen)));
    let platform_state = shared.clone();
    let controller = Controller::spawn(config, store, move |_handle| {
        TerminalPlatform::new(platform_state)
    })
    .map_err(io::Error::other)?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    terminal::enable_raw_mode()?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut host = Host::new(controller.handle(), shared);
    let result = host.run(&mut terminal, &log);

    terminal::disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableMouseCapture,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;

    controller.shutdown();
    result
}

fn screen_metrics(screen: Rect) -> ScreenMetrics {
    ScreenMetrics {
        width_px: screen.width as u32,
        height_px: screen.height as u32,
        density: SIM_DENSITY,
        status_bar_px: 1,
    }
}

struct Host {
    controller: ControllerHandle,
    shared: SharedSim,
    call_label: &'static str,
    caller: usize,
    touch_active: bool,
    height: Option<i64>,
}

impl Host {
    fn new(controller: ControllerHandle, shared: SharedSim) -> Self {
        Self {
            controller,
            shared,
            call_label: "IDLE",
            caller: 0,
            touch_active: false,
            height: None,
        }
    }

    fn run(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
        log: &LogHandle,
    ) -> io::Result<()> {
        loop {
            self.answer_pre_start();

            let area = terminal.get_frame().area();
            let (screen, panel) = view::split(area);
            self.shared.lock().screen = screen_metrics(screen);
            let log_lines = log.tail(panel.height.saturating_sub(2) as usize);
            terminal.draw(|frame| {
                let state = self.shared.lock();
                view::render(frame, &state, self.call_label, &log_lines);
            })?;

            if !event::poll(Duration::from_millis(16))? {
                continue;
            }
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if !self.on_key(key.code) {
                        return Ok(());
                    }
                }
                Event::Mouse(mouse) => self.on_mouse(mouse, screen),
                _ => {}
            }
        }
    }

    /// A freshly started renderer pulls whatever was pushed before it was
    /// listening.
    fn answer_pre_start(&mut self) {
        let pending = std::mem::take(&mut self.shared.lock().pre_start_pending);
        if !pending {
            return;
        }
        let reply = self.controller.bridge_call(BridgeCommand::GetPreStartData);
        if let BridgeReply::Value(value) = reply
            && let Some(payload) = OverlayPayload::from_value(value)
        {
            let mut state = self.shared.lock();
            if state.payload.is_none() {
                state.payload = Some(payload);
            }
        }
    }

    fn current_caller(&self) -> &'static str {
        CALLERS[self.caller % CALLERS.len()]
    }

    /// Returns `false` to quit.
    fn on_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char('q') => return false,
            KeyCode::Char('r') => {
                self.caller += 1;
                self.call_label = "RINGING";
                self.controller
                    .call_state_changed("RINGING", Some(self.current_caller()));
            }
            KeyCode::Char('a') => {
                self.call_label = "OFFHOOK";
                self.controller.call_state_changed("OFFHOOK", None);
            }
            KeyCode::Char('d') => {
                self.caller += 1;
                self.call_label = "OFFHOOK";
                self.controller
                    .call_state_changed("OFFHOOK", Some(self.current_caller()));
            }
            KeyCode::Char('i') => {
                self.call_label = "IDLE";
                self.controller.call_state_changed("IDLE", None);
            }
            KeyCode::Char('l') => {
                let number = self.controller.bridge_call(BridgeCommand::GetNativeNumber);
                let number = number
                    .value()
                    .and_then(|v| v.as_str())
                    .unwrap_or(self.current_caller())
                    .to_string();
                let lookup = OverlayPayload::from_value(json!({
                    "number": number,
                    "status": self.call_label,
                    "isPersonal": self.caller % 2 == 0,
                    "name": "Acme Support",
                }));
                self.controller
                    .post_bridge(BridgeCommand::UpdateLookupResult(lookup));
            }
            KeyCode::Char('s') => self.controller.start_command(StartCommand {
                command: Some(METHOD_SHOW_OVERLAY_WITH_DATA.to_string()),
                ..StartCommand::default()
            }),
            KeyCode::Char('b') => self.controller.boot(),
            KeyCode::Char('+') => {
                self.height = Some(self.height.unwrap_or(5) + 1);
                self.controller
                    .post_bridge(BridgeCommand::UpdateHeight(self.height));
            }
            KeyCode::Char('-') => {
                self.height = self.height.map(|h| h - 1).filter(|h| *h > 0);
                self.controller
                    .post_bridge(BridgeCommand::UpdateHeight(self.height));
            }
            KeyCode::Char('p') => {
                let mut state = self.shared.lock();
                state.overlay_denied = !state.overlay_denied;
                info!(denied = state.overlay_denied, "overlay permission toggled");
            }
            KeyCode::Char('x') => {
                self.shared.lock().overlay = None;
                info!("overlay removed behind the controller's back");
            }
            _ => {}
        }
        true
    }

    fn on_mouse(&mut self, mouse: MouseEvent, screen: Rect) {
        let action = match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => TouchAction::Down,
            MouseEventKind::Drag(MouseButton::Left) => TouchAction::Move,
            MouseEventKind::Up(MouseButton::Left) => TouchAction::Up,
            _ => return,
        };
        let Some(rect) = view::overlay_rect(&self.shared.lock(), screen) else {
            self.touch_active = false;
            return;
        };

        let (col, row) = (mouse.column, mouse.row);
        if action == TouchAction::Down {
            let inside = col >= rect.x && col < rect.right() && row >= rect.y && row < rect.bottom();
            if !inside {
                return;
            }
            self.touch_active = true;
        } else if !self.touch_active {
            return;
        }
        if action == TouchAction::Up {
            self.touch_active = false;
        }

        let raw_x = col.saturating_sub(screen.x) as f32;
        let raw_y = row.saturating_sub(screen.y) as f32;
        let x = col as f32 - rect.x as f32;
        let y = row as f32 - rect.y as f32;
        self.controller
            .touch(TouchEvent::new(action, x, y, raw_x, raw_y));
    }
}
