use std::fs;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use serde::Deserialize;
use serde_json::json;
use tracing::{Level, info};

use call_overlay::bridge::{BridgeCall, BridgeCommand, StartCommand};
use call_overlay::gesture::TouchEvent;
use call_overlay::platform::headless::HeadlessPlatform;
use call_overlay::store::MemoryStore;
use call_overlay::tracing_sub::{init_default, parse_level};
use call_overlay::window::ScreenMetrics;
use call_overlay::{Controller, ControllerHandle, OverlayConfig};

#[derive(Parser, Debug)]
#[command(
    name = "call-replay",
    version = env!("CARGO_PKG_VERSION"),
    about = "Replay a JSON-lines call script against a headless overlay controller"
)]
struct ReplayCli {
    /// Script to replay. Reads stdin when omitted or `-`.
    #[arg(value_name = "SCRIPT")]
    script: Option<PathBuf>,

    /// JSON config file; missing fields take their defaults.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Screen density (px per dp) reported by the headless platform.
    #[arg(long, value_name = "RATIO")]
    density: Option<f32>,

    /// Only print bridge replies, not the platform journal.
    #[arg(long = "replies-only")]
    replies_only: bool,

    #[arg(long = "log-level", value_name = "LEVEL", default_value = "warn")]
    log_level: String,
}

/// One line of a replay script.
#[derive(Debug, Deserialize, PartialEq)]
#[serde(tag = "step", rename_all = "camelCase")]
enum Step {
    Signal {
        state: String,
        #[serde(default)]
        number: Option<String>,
    },
    Start(StartCommand),
    Bridge(BridgeCall),
    Touch(TouchEvent),
    Boot,
}

/// Blank lines and lines starting with `#` are skipped.
fn parse_script(reader: impl BufRead) -> io::Result<Vec<Step>> {
    let mut steps = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let step = serde_json::from_str(line).map_err(|err| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("line {}: {err}", index + 1),
            )
        })?;
        steps.push(step);
    }
    Ok(steps)
}

fn read_script(path: Option<&PathBuf>) -> io::Result<Vec<Step>> {
    match path {
        Some(path) if path.as_os_str() != "-" => {
            parse_script(BufReader::new(fs::File::open(path)?))
        }
        _ => {
            let mut input = String::new();
            io::stdin().read_to_string(&mut input)?;
            parse_script(input.as_bytes())
        }
    }
}

fn run_step(handle: &ControllerHandle, step: Step, out: &mut impl Write) -> io::Result<()> {
    match step {
        Step::Signal { state, number } => handle.call_state_changed(&state, number.as_deref()),
        Step::Start(start) => handle.start_command(start),
        Step::Bridge(call) => {
            let method = call.method.clone();
            let reply = handle.bridge_call(BridgeCommand::from_call(call));
            writeln!(out, "{}", json!({ "method": method, "reply": reply.to_json() }))?;
        }
        Step::Touch(event) => handle.touch(event),
        Step::Boot => handle.boot(),
    }
    Ok(())
}

fn main() -> io::Result<()> {
    let cli = ReplayCli::parse();
    init_default(parse_level(&cli.log_level).unwrap_or(Level::WARN));

    let config = match &cli.config {
        Some(path) => OverlayConfig::load(path).map_err(io::Error::other)?,
        None => OverlayConfig::default(),
    };
    let steps = read_script(cli.script.as_ref())?;

    let mut metrics = ScreenMetrics::default();
    if let Some(density) = cli.density {
        metrics.density = density;
    }
    let platform = HeadlessPlatform::new().with_metrics(metrics);
    let journal = platform.journal();
    let controller = Controller::spawn(config, Arc::new(MemoryStore::new()), move |_| platform)
        .map_err(io::Error::other)?;
    let handle = controller.handle();

    let stdout = io::stdout();
    let mut out = stdout.lock();
    info!(steps = steps.len(), "replaying script");
    for step in steps {
        run_step(&handle, step, &mut out)?;
    }
    controller.shutdown();

    if !cli.replies_only {
        for event in journal.events() {
            let line = serde_json::to_string(&event).map_err(io::Error::other)?;
            writeln!(out, "{line}")?;
        }
    }
    out.flush()
}
