//! Diagnostics sender: ships light index metrics to `ljos-telemetry` over UDP.
//!
//! Enabled by the `diagnostics` feature flag. Create a [`DiagSender`] once and
//! call [`DiagSender::send`] after each build; it throttles itself to 10 Hz,
//! serializes a JSON snapshot and sends it to `127.0.0.1:9110`. Sends are
//! fire-and-forget: nothing listening is not an error.
//!
//! [`init_logger`] installs an `env_logger`-backed logger that also keeps the
//! most recent records in a ring buffer, so they show up in the viewer's Logs
//! tab.

use std::collections::VecDeque;
use std::net::UdpSocket;
use std::sync::{Mutex, OnceLock};
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::tiled::{BuildStats, LutCounters, TileOrigin, TiledLightIndex};

/// Where the telemetry viewer listens.
pub const TELEMETRY_ADDR: &str = "127.0.0.1:9110";

/// Snapshots list per-tile counts only for grids up to this many tiles
/// (a 4K target is 8160 tiles).
const MAX_SNAPSHOT_TILES: usize = 16_384;

const SEND_INTERVAL: Duration = Duration::from_millis(100);

/// Largest datagram we send. Below both the IPv4 UDP payload limit and the
/// viewer's receive buffer.
const MAX_DATAGRAM: usize = 60_000;

/// Log records forwarded per snapshot.
const LOGS_PER_SNAPSHOT: usize = 50;

// ── DiagSender ───────────────────────────────────────────────────────────

/// Owns the outbound UDP socket and throttling state.
pub struct DiagSender {
    socket: UdpSocket,
    last_send: Option<Instant>,
}

impl DiagSender {
    /// Bind an ephemeral port and connect it to the viewer's address.
    pub fn new() -> Option<Self> {
        let socket = UdpSocket::bind("127.0.0.1:0").ok()?;
        socket.connect(TELEMETRY_ADDR).ok()?;
        socket.set_nonblocking(true).ok()?;
        Some(Self {
            socket,
            last_send: None,
        })
    }

    /// Send a snapshot of `index` unless one went out less than 100 ms ago.
    /// Returns whether a datagram was sent.
    pub fn send(&mut self, index: &TiledLightIndex, elapsed_secs: f32) -> bool {
        let now = Instant::now();
        if self
            .last_send
            .is_some_and(|last| now.duration_since(last) < SEND_INTERVAL)
        {
            return false;
        }
        self.last_send = Some(now);

        let logs = drain_captured_logs(LOGS_PER_SNAPSHOT);
        let snapshot = LutSnapshot::new(index, elapsed_secs, logs);
        match snapshot.into_datagram() {
            Some(json) => self.socket.send(&json).is_ok(),
            None => false,
        }
    }
}

// ── Snapshot types (wire format) ────────────────────────────────────────

#[derive(Serialize)]
struct LutSnapshot {
    elapsed_secs: f32,
    stats: BuildStats,
    counters: LutCounters,
    capacity: CapacitySnapshot,
    #[serde(skip_serializing_if = "Option::is_none")]
    grid: Option<[u32; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    origin: Option<TileOrigin>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tile_counts: Option<Vec<u32>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    logs: Vec<LogEntrySnapshot>,
}

#[derive(Serialize)]
struct CapacitySnapshot {
    max_lights: usize,
    max_lights_per_tile: u32,
    index_capacity: usize,
    cell_capacity: usize,
    table_width: usize,
    table_height: usize,
}

#[derive(Serialize)]
struct LogEntrySnapshot {
    level: String,
    target: String,
    message: String,
    timestamp_secs: f32,
}

impl LutSnapshot {
    fn new(index: &TiledLightIndex, elapsed_secs: f32, logs: Vec<LogEntrySnapshot>) -> Self {
        let layout = index.layout();
        let grid = index.grid();
        let tile_counts = (grid.is_some() && index.tile_counts().len() <= MAX_SNAPSHOT_TILES)
            .then(|| index.tile_counts().to_vec());
        Self {
            elapsed_secs,
            stats: *index.last_stats(),
            counters: *index.counters(),
            capacity: CapacitySnapshot {
                max_lights: layout.max_lights(),
                max_lights_per_tile: index.config().max_lights_per_tile,
                index_capacity: layout.index_capacity(),
                cell_capacity: layout.cell_capacity(),
                table_width: layout.width(),
                table_height: layout.height(),
            },
            grid: grid.map(|g| [g.width, g.height]),
            origin: grid.map(|g| g.origin),
            tile_counts,
            logs,
        }
    }

    /// Serialize, shedding per-tile counts and then logs until the JSON fits
    /// in one datagram.
    fn into_datagram(mut self) -> Option<Vec<u8>> {
        let json = serde_json::to_vec(&self).ok()?;
        if json.len() <= MAX_DATAGRAM {
            return Some(json);
        }
        if self.tile_counts.take().is_some() {
            log::debug!("Snapshot is {} bytes, dropping per-tile counts", json.len());
            return self.into_datagram();
        }
        if !self.logs.is_empty() {
            self.logs.clear();
            return self.into_datagram();
        }
        None
    }
}

// ── Log Capture ──────────────────────────────────────────────────────────

const LOG_RING_CAPACITY: usize = 500;

struct CapturedLog {
    level: log::Level,
    target: String,
    message: String,
    timestamp_secs: f32,
}

static LOG_RING: Mutex<VecDeque<CapturedLog>> = Mutex::new(VecDeque::new());
static LOG_START: OnceLock<Instant> = OnceLock::new();

/// Captures records into the ring buffer and forwards them to env_logger for
/// stderr output.
struct DiagLogger {
    inner: env_logger::Logger,
}

impl log::Log for DiagLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        self.inner.enabled(metadata) || metadata.level() <= log::Level::Info
    }

    fn log(&self, record: &log::Record) {
        if self.inner.enabled(record.metadata()) {
            self.inner.log(record);
        }
        if record.level() > log::Level::Info && !self.inner.enabled(record.metadata()) {
            return;
        }

        let entry = CapturedLog {
            level: record.level(),
            target: record.target().to_string(),
            message: record.args().to_string(),
            timestamp_secs: LOG_START.get().map_or(0.0, |s| s.elapsed().as_secs_f32()),
        };
        if let Ok(mut ring) = LOG_RING.lock() {
            if ring.len() == LOG_RING_CAPACITY {
                ring.pop_front();
            }
            ring.push_back(entry);
        }
    }

    fn flush(&self) {
        self.inner.flush();
    }
}

static DIAG_LOGGER: OnceLock<DiagLogger> = OnceLock::new();

/// Install the capturing logger. Honors `RUST_LOG` for stderr output and
/// always captures `info` and above for the viewer.
///
/// Call this early (before any log messages) to capture everything.
pub fn init_logger() {
    LOG_START.get_or_init(Instant::now);

    let inner = env_logger::Builder::new().parse_default_env().build();
    let max_level = inner.filter();
    let logger = DIAG_LOGGER.get_or_init(|| DiagLogger { inner });

    if log::set_logger(logger).is_err() {
        eprintln!("[ljos] Warning: a logger is already set. Log capture disabled.");
        return;
    }
    log::set_max_level(max_level.max(log::LevelFilter::Info));
}

fn drain_captured_logs(max: usize) -> Vec<LogEntrySnapshot> {
    let Ok(mut ring) = LOG_RING.lock() else {
        return Vec::new();
    };
    let n = ring.len().min(max);
    ring.drain(..n)
        .map(|e| LogEntrySnapshot {
            level: e.level.to_string(),
            target: e.target,
            message: e.message,
            timestamp_secs: e.timestamp_secs,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prelude::*;

    fn built_index() -> TiledLightIndex {
        let mut index = TiledLightIndex::new(LutConfig::default()).unwrap();
        let eye = Transform::from_xyz(0.0, 0.0, 10.0).looking_at(Vec3::ZERO, Vec3::Y);
        let camera = Camera::perspective(&eye, 60.0, 0.1, 100.0, Viewport::new(320, 240));
        index
            .build(&[Light::directional(Vec3::NEG_Y)], &camera)
            .unwrap();
        index
    }

    #[test]
    fn snapshot_carries_grid_and_tile_counts() {
        let index = built_index();
        let snapshot = LutSnapshot::new(&index, 1.5, Vec::new());
        let json: serde_json::Value = serde_json::to_value(&snapshot).unwrap();

        assert_eq!(json["grid"], serde_json::json!([10, 8]));
        assert_eq!(json["tile_counts"].as_array().unwrap().len(), 80);
        assert_eq!(json["stats"]["lights_stored"], 1);
        assert_eq!(json["counters"]["builds"], 1);
        assert_eq!(json["capacity"]["table_height"], 256);
        assert!(json.get("logs").is_none(), "empty logs are omitted");
    }

    #[test]
    fn oversized_snapshot_sheds_tile_counts_first() {
        let index = built_index();
        let logs = (0..LOGS_PER_SNAPSHOT)
            .map(|i| LogEntrySnapshot {
                level: "INFO".into(),
                target: "ljos::tiled".into(),
                message: format!("message {i}"),
                timestamp_secs: i as f32,
            })
            .collect();
        let mut snapshot = LutSnapshot::new(&index, 0.0, logs);
        snapshot.tile_counts = Some(vec![128; MAX_SNAPSHOT_TILES]);

        let json = snapshot.into_datagram().unwrap();
        assert!(json.len() <= MAX_DATAGRAM);
        let value: serde_json::Value = serde_json::from_slice(&json).unwrap();
        assert!(value.get("tile_counts").is_none());
        assert_eq!(value["logs"].as_array().unwrap().len(), LOGS_PER_SNAPSHOT);
        assert_eq!(value["grid"], serde_json::json!([10, 8]));
    }

    #[test]
    fn small_snapshot_fits_unchanged() {
        let index = built_index();
        let json = LutSnapshot::new(&index, 0.0, Vec::new()).into_datagram().unwrap();
        let value: serde_json::Value = serde_json::from_slice(&json).unwrap();
        assert_eq!(value["tile_counts"].as_array().unwrap().len(), 80);
        assert_eq!(value["origin"], "TopLeft");
    }

    #[test]
    fn unbuilt_index_has_no_grid() {
        let index = TiledLightIndex::new(LutConfig::default()).unwrap();
        let json = serde_json::to_value(LutSnapshot::new(&index, 0.0, Vec::new())).unwrap();
        assert!(json.get("grid").is_none());
        assert!(json.get("tile_counts").is_none());
    }

    #[test]
    fn sender_throttles_to_ten_hertz() {
        let Some(mut sender) = DiagSender::new() else {
            return;
        };
        let index = built_index();
        sender.last_send = Some(Instant::now());
        assert!(!sender.send(&index, 0.0));
    }
}
