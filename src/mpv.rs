//! `MediaElement` backed by an external mpv process driven over its JSON IPC socket.
//!
//! mpv is spawned lazily on the first `play`, so a feed of many items only
//! runs a process for the ones that were actually played. Commands issued
//! before that are folded into the spawn arguments. A background task owns
//! the socket: it forwards queued commands and turns mpv's event lines into
//! `MediaEvent`s, which the UI loop drains with `poll_events`.

use anyhow::{Context, Result, anyhow};
use serde_json::{Value, json};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::{
  io::BufReader as TokioBufReader,
  io::{AsyncBufReadExt, AsyncWriteExt},
  net::UnixStream,
  process::{Child as TokioChild, Command},
  sync::mpsc,
  task::JoinHandle,
};
use tracing::{debug, info, warn};

use crate::constants::constants;
use crate::media::{Fullscreen, MediaElement, MediaEvent, SeekTarget};

static NEXT_SOCKET: AtomicU64 = AtomicU64::new(0);

pub struct MpvMedia {
  url: String,
  audio_only: bool,
  socket_path: PathBuf,
  child: Option<TokioChild>,
  ipc_handle: Option<JoinHandle<()>>,
  cmd_tx: Option<mpsc::UnboundedSender<String>>,
  events_rx: Option<mpsc::UnboundedReceiver<MediaEvent>>,
  /// Events raised locally (spawn failures) ahead of anything from mpv.
  local_events: VecDeque<MediaEvent>,
  // Desired state before the process exists.
  volume: f32,
  muted: bool,
  start_secs: f64,
  fullscreen: bool,
}

impl MpvMedia {
  pub fn new(url: impl Into<String>, audio_only: bool) -> Self {
    let seq = NEXT_SOCKET.fetch_add(1, Ordering::Relaxed);
    let socket_path =
      std::env::temp_dir().join(format!("{}-{}-{}.sock", constants().mpv_socket_prefix, std::process::id(), seq));
    Self {
      url: url.into(),
      audio_only,
      socket_path,
      child: None,
      ipc_handle: None,
      cmd_tx: None,
      events_rx: None,
      local_events: VecDeque::new(),
      volume: constants().default_volume,
      muted: false,
      start_secs: 0.0,
      fullscreen: false,
    }
  }

  pub fn is_running(&self) -> bool {
    self.child.is_some()
  }

  /// Drain every event received since the last call.
  pub fn poll_events(&mut self) -> Vec<MediaEvent> {
    let mut events: Vec<MediaEvent> = self.local_events.drain(..).collect();
    if let Some(rx) = &mut self.events_rx {
      while let Ok(event) = rx.try_recv() {
        events.push(event);
      }
    }
    events
  }

  fn spawn(&mut self) -> Result<()> {
    let socket_str = self.socket_path.to_str().context("Temp dir path is not valid UTF-8")?.to_string();
    // Remove stale socket if it exists from a previous crash.
    let _ = std::fs::remove_file(&self.socket_path);

    let mut cmd = Command::new("mpv");
    cmd.args(spawn_args(&socket_str, self.audio_only, self.volume, self.muted, self.start_secs, self.fullscreen));
    cmd.arg(&self.url);
    cmd.stdin(Stdio::null());
    // Output is never drained; a full pipe would block mpv.
    cmd.stdout(Stdio::null());
    cmd.stderr(Stdio::null());
    cmd.kill_on_drop(true);

    let child = cmd.spawn().map_err(|e| {
      if e.kind() == std::io::ErrorKind::NotFound {
        anyhow!("mpv not found. Install it with: brew install mpv (macOS) or apt install mpv (Linux)")
      } else {
        anyhow!(e).context("Failed to spawn mpv process")
      }
    })?;

    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let handle = tokio::spawn(run_ipc(self.socket_path.clone(), cmd_rx, events_tx));

    info!(url = %self.url, socket = %socket_str, "mpv: spawned");
    self.child = Some(child);
    self.ipc_handle = Some(handle);
    self.cmd_tx = Some(cmd_tx);
    self.events_rx = Some(events_rx);
    Ok(())
  }

  /// Queue a command if the process is up. Returns `false` otherwise.
  fn send(&mut self, args: Value) -> bool {
    let Some(tx) = &self.cmd_tx else { return false };
    if tx.send(ipc_command(args)).is_err() {
      debug!("mpv: ipc task gone, dropping command");
    }
    true
  }
}

impl MediaElement for MpvMedia {
  fn play(&mut self) {
    if self.child.is_none() {
      if let Err(e) = self.spawn() {
        warn!(err = %e, "mpv: spawn failed");
        self.local_events.push_back(MediaEvent::Error(e.to_string()));
      }
      return;
    }
    self.send(json!(["set_property", "pause", false]));
  }

  fn pause(&mut self) {
    self.send(json!(["set_property", "pause", true]));
  }

  fn seek_to(&mut self, target: SeekTarget) {
    if self.send(seek_args(target)) {
      return;
    }
    // Only an absolute position can be honoured before the duration is known.
    if let SeekTarget::Seconds(secs) = target {
      self.start_secs = secs.max(0.0);
    }
  }

  fn set_volume(&mut self, volume: f32) {
    self.volume = volume.clamp(0.0, 1.0);
    self.send(json!(["set_property", "volume", mpv_volume(self.volume)]));
  }

  fn set_muted(&mut self, muted: bool) {
    self.muted = muted;
    self.send(json!(["set_property", "mute", muted]));
  }
}

impl Fullscreen for MpvMedia {
  fn set_fullscreen(&mut self, fullscreen: bool) -> Result<()> {
    if self.audio_only {
      return Err(anyhow!("Fullscreen is not available in audio-only mode"));
    }
    self.fullscreen = fullscreen;
    self.send(json!(["set_property", "fullscreen", fullscreen]));
    Ok(())
  }
}

impl Drop for MpvMedia {
  fn drop(&mut self) {
    if let Some(handle) = self.ipc_handle.take() {
      handle.abort();
    }
    if let Some(mut child) = self.child.take() {
      let _ = child.start_kill();
    }
    let _ = std::fs::remove_file(&self.socket_path);
  }
}

// --- IPC ---

fn spawn_args(socket: &str, audio_only: bool, volume: f32, muted: bool, start_secs: f64, fullscreen: bool) -> Vec<String> {
  let mut args = vec![
    format!("--input-ipc-server={}", socket),
    // Stay on the last frame at EOF so a replay is just seek + unpause.
    "--keep-open=yes".to_string(),
    "--really-quiet".to_string(),
    format!("--volume={}", mpv_volume(volume)),
    format!("--mute={}", if muted { "yes" } else { "no" }),
  ];
  if start_secs > 0.0 {
    args.push(format!("--start={}", start_secs));
  }
  if audio_only {
    args.push("--no-video".to_string());
  } else if fullscreen {
    args.push("--fullscreen".to_string());
  }
  args
}

fn mpv_volume(volume: f32) -> f64 {
  (volume as f64 * 100.0).round()
}

fn seek_args(target: SeekTarget) -> Value {
  match target {
    SeekTarget::Fraction(f) => json!(["seek", f.clamp(0.0, 1.0) * 100.0, "absolute-percent"]),
    SeekTarget::Seconds(s) => json!(["seek", s.max(0.0), "absolute"]),
  }
}

fn ipc_command(args: Value) -> String {
  format!("{}\n", json!({ "command": args }))
}

const OBSERVED_PROPERTIES: [&str; 4] = ["time-pos", "duration", "paused-for-cache", "eof-reached"];

async fn connect(socket: &Path) -> Result<UnixStream> {
  let c = constants();
  for _ in 0..c.mpv_connect_attempts {
    match UnixStream::connect(socket).await {
      Ok(stream) => return Ok(stream),
      Err(_) => tokio::time::sleep(Duration::from_millis(c.mpv_connect_interval_ms)).await,
    }
  }
  Err(anyhow!("mpv IPC socket never came up at {}", socket.display()))
}

async fn run_ipc(
  socket: PathBuf,
  mut cmd_rx: mpsc::UnboundedReceiver<String>,
  events_tx: mpsc::UnboundedSender<MediaEvent>,
) {
  let stream = match connect(&socket).await {
    Ok(stream) => stream,
    Err(e) => {
      warn!(err = %e, "mpv: ipc connect failed");
      let _ = events_tx.send(MediaEvent::Error(e.to_string()));
      return;
    }
  };
  let (read, mut write) = stream.into_split();
  let mut lines = TokioBufReader::new(read).lines();

  for (id, name) in OBSERVED_PROPERTIES.iter().enumerate() {
    let line = ipc_command(json!(["observe_property", id + 1, name]));
    if let Err(e) = write.write_all(line.as_bytes()).await {
      warn!(err = %e, "mpv: observe_property failed");
      return;
    }
  }

  let mut decoder = EventDecoder::default();
  loop {
    tokio::select! {
      cmd = cmd_rx.recv() => {
        let Some(cmd) = cmd else { break };
        if let Err(e) = write.write_all(cmd.as_bytes()).await {
          warn!(err = %e, "mpv: ipc write failed");
          break;
        }
      }
      line = lines.next_line() => match line {
        Ok(Some(line)) => {
          if let Some(event) = decoder.decode(&line)
            && events_tx.send(event).is_err()
          {
            break;
          }
        }
        Ok(None) => {
          debug!("mpv: ipc socket closed");
          break;
        }
        Err(e) => {
          warn!(err = %e, "mpv: ipc read failed");
          break;
        }
      }
    }
  }
}

/// Turns mpv IPC lines into `MediaEvent`s. Remembers the duration so
/// `time-pos` updates can carry a played fraction.
#[derive(Debug, Default)]
struct EventDecoder {
  duration: Option<f64>,
}

impl EventDecoder {
  fn decode(&mut self, line: &str) -> Option<MediaEvent> {
    let val: Value = serde_json::from_str(line).ok()?;
    match val.get("event")?.as_str()? {
      "property-change" => {
        let data = val.get("data");
        match val.get("name")?.as_str()? {
          "time-pos" => {
            let secs = data?.as_f64()?;
            let fraction = match self.duration {
              Some(d) if d > 0.0 => (secs / d).clamp(0.0, 1.0),
              _ => 0.0,
            };
            Some(MediaEvent::Progress { played_fraction: fraction, played_seconds: secs })
          }
          "duration" => {
            let secs = data?.as_f64()?;
            self.duration = Some(secs);
            Some(MediaEvent::DurationKnown(secs))
          }
          "paused-for-cache" => Some(MediaEvent::Buffering(data?.as_bool()?)),
          "eof-reached" => data?.as_bool()?.then_some(MediaEvent::Ended),
          _ => None,
        }
      }
      "file-loaded" => Some(MediaEvent::Ready),
      "end-file" => match val.get("reason").and_then(|v| v.as_str()) {
        Some("eof") => Some(MediaEvent::Ended),
        Some("error") => {
          let reason = val.get("file_error").and_then(|v| v.as_str()).unwrap_or("playback failed");
          Some(MediaEvent::Error(reason.to_string()))
        }
        _ => None,
      },
      _ => None,
    }
  }
}
