//! gesture-replay - run a scripted input sequence through the recognizers
//!
//! Reads a TOML script of timestamped raw events, replays it against an
//! in-memory surface on a virtual clock and prints every recognized gesture.
//!
//! ```toml
//! [click]
//! double_clicked = true
//!
//! [[events]]
//! at = 0
//! kind = "pointer-down"
//! x = 10.0
//! y = 10.0
//!
//! [[events]]
//! at = 80
//! kind = "pointer-up"
//! x = 10.0
//! y = 10.0
//! ```

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use flick_gestures::gestures::RecognizerId;
use flick_gestures::input::{MouseButton, PointerEvent, TouchEvent, TouchPoint};
use flick_gestures::{
    ClickConfig, Error, EventTarget, GestureEvent, GestureHost, GestureKind, GestureProfile,
    InputEvent, ManualScheduler, RawEventKind, SwipeConfig, SwipeDirection,
};

#[derive(Parser, Debug)]
#[command(name = "gesture-replay")]
#[command(about = "Replay a scripted input sequence through Flick's gesture recognizers", long_about = None)]
struct Args {
    /// Replay script (TOML)
    script: PathBuf,

    /// Gesture profile used for recognizers the script does not configure
    #[arg(short, long)]
    profile: Option<PathBuf>,

    /// Print gestures as JSON lines
    #[arg(short, long)]
    json: bool,

    /// Enable verbose debug output
    #[arg(short, long)]
    debug: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum Target {
    #[default]
    Surface,
    Document,
}

#[derive(Debug, Deserialize)]
struct ScriptEvent {
    /// Milliseconds since the start of the replay
    at: u64,
    #[serde(default)]
    target: Target,
    kind: String,
    #[serde(default)]
    x: f64,
    #[serde(default)]
    y: f64,
    button: Option<String>,
    /// Contacts still on the surface after this event
    touches: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Script {
    click: Option<ClickConfig>,
    swipe: Option<SwipeConfig>,
    events: Vec<ScriptEvent>,
}

impl Script {
    fn parse(contents: &str) -> flick_gestures::Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    fn load(path: &Path) -> flick_gestures::Result<Self> {
        Self::parse(&fs::read_to_string(path)?)
    }

    fn profile(&self) -> GestureProfile {
        GestureProfile {
            click: self.click.clone(),
            swipe: self.swipe.clone(),
        }
    }
}

/// One recognized gesture, as printed
#[derive(Debug, Clone, PartialEq, Serialize)]
struct Record {
    at: u64,
    kind: GestureKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    direction: Option<SwipeDirection>,
    recognizer: RecognizerId,
    x: Option<f64>,
    y: Option<f64>,
}

impl Record {
    fn line(&self) -> String {
        match self.direction {
            Some(direction) => format!("{} {} {}", self.at, self.kind, direction),
            None => format!("{} {}", self.at, self.kind),
        }
    }
}

/// Build the raw event a script entry describes
fn raw_event(index: usize, entry: &ScriptEvent) -> flick_gestures::Result<(RawEventKind, InputEvent)> {
    let kind: RawEventKind = entry
        .kind
        .parse()
        .map_err(|e| Error::Script(format!("event {}: {}", index, e)))?;

    if !kind.is_touch() {
        let button = match &entry.button {
            Some(name) => name
                .parse()
                .map_err(|e| Error::Script(format!("event {}: {}", index, e)))?,
            None => MouseButton::Left,
        };
        return Ok((kind, PointerEvent::new((entry.x, entry.y), button).into()));
    }

    let lifting = matches!(kind, RawEventKind::TouchEnd | RawEventKind::TouchCancel);
    let remaining = entry.touches.unwrap_or(if lifting { 0 } else { 1 });
    if !lifting && remaining == 0 {
        return Err(Error::Script(format!("event {}: {} needs at least one touch point", index, kind)));
    }

    // Extra contacts sit to the right of the primary one
    let primary = TouchPoint::new(0, (entry.x, entry.y));
    let touches = (0..remaining)
        .map(|i| TouchPoint::new(i as i32, (entry.x + 40.0 * i as f64, entry.y)))
        .collect();
    Ok((kind, TouchEvent::new(touches, vec![primary]).into()))
}

/// Replay `script` with the recognizers in `profile`
fn replay(script: &Script, profile: &GestureProfile) -> flick_gestures::Result<Vec<Record>> {
    let events = script
        .events
        .iter()
        .enumerate()
        .map(|(index, entry)| raw_event(index, entry).map(|raw| (entry, raw)))
        .collect::<flick_gestures::Result<Vec<_>>>()?;

    if let Some(index) = script.events.windows(2).position(|w| w[1].at < w[0].at) {
        return Err(Error::Script(format!("event {} goes back in time", index + 1)));
    }

    let surface = Rc::new(EventTarget::new());
    let document = Rc::new(EventTarget::new());
    let scheduler = Rc::new(ManualScheduler::new());
    let host = GestureHost::new(document.clone(), scheduler.clone());
    let records = Rc::new(RefCell::new(Vec::new()));

    let recorder = || {
        let records = records.clone();
        let scheduler = scheduler.clone();
        move |gesture: &GestureEvent| {
            let position = gesture.event.position();
            records.borrow_mut().push(Record {
                at: scheduler.now().as_millis() as u64,
                kind: gesture.kind,
                direction: gesture.direction,
                recognizer: gesture.recognizer,
                x: position.map(|p| p.x),
                y: position.map(|p| p.y),
            });
        }
    };

    // Long enough for any pending timer to resolve after the last event
    let mut settle = Duration::ZERO;
    if let Some(config) = &profile.click {
        settle = config.double_clicked_time.max(config.long_clicked_time);
        let handle = host.recognize_click(&surface, recorder(), config.clone());
        info!(recognizer = %handle.id(), "click recognizer attached");
    }
    if let Some(config) = &profile.swipe {
        let handle = host.recognize_swipe(&surface, recorder(), config.clone());
        info!(recognizer = %handle.id(), "swipe recognizer attached");
    }

    for (entry, (kind, event)) in events {
        scheduler.advance_to(Duration::from_millis(entry.at));
        let prevented = match entry.target {
            Target::Surface => surface.emit(kind, &event),
            Target::Document => document.emit(kind, &event),
        };
        debug!(at = entry.at, ?entry.target, %kind, prevented, "replayed");
    }
    scheduler.advance(settle);

    let records = records.borrow().clone();
    Ok(records)
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Quiet by default, verbose with --debug
    let default_filter = if args.debug {
        "debug"
    } else {
        "warn,flick_gestures=info"
    };
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let script = Script::load(&args.script)
        .with_context(|| format!("failed to load script {:?}", args.script))?;

    let fallback = match &args.profile {
        Some(path) => GestureProfile::load(path)
            .with_context(|| format!("failed to load profile {:?}", path))?,
        None => GestureProfile::load_or_default(),
    };
    let profile = script.profile().or(fallback);
    if profile.is_empty() {
        warn!("No recognizers configured, nothing will be recognized");
    }

    let records = replay(&script, &profile)?;
    for record in &records {
        if args.json {
            println!("{}", serde_json::to_string(record)?);
        } else {
            println!("{}", record.line());
        }
    }
    info!(events = script.events.len(), gestures = records.len(), "replay finished");
    Ok(())
}
