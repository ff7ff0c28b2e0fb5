//! `replay` command: run recorded fixes through the monitor.
//!
//! Fixes are read from a JSON-lines file, one `{lat, lng, timestamp_ms,
//! device_id?}` object per line. Time is driven by the fixes themselves
//! through a manual clock, so periodic reports can be injected at the
//! configured interval in replay time instead of wall-clock time.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use geowatch::app::{AppConfig, AppSinks, GeowatchApp};
use geowatch::clock::{Clock, ManualClock};
use geowatch::coord::{Coordinate, TimestampMs};
use geowatch::geofence::Geofence;
use geowatch::monitor::MonitorHandle;
use geowatch::telemetry::MetricsSnapshot;
use geowatch::tracker::{ContainmentStatus, DeviceId, Fix};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::common::{load_config, load_geofences, StatusArg};
use crate::error::CliError;

/// Device id used for lines without one.
pub const DEFAULT_DEVICE_ID: &str = "replay-device";

/// Arguments for the replay command.
pub struct ReplayArgs {
    pub geofences: PathBuf,
    pub fixes: PathBuf,
    pub device: Option<String>,
    pub seed: Option<StatusArg>,
    pub ticks: bool,
    pub interval_secs: Option<u64>,
}

/// One line of the fixes file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FixRecord {
    pub lat: f64,
    pub lng: f64,
    #[serde(alias = "timestamp")]
    pub timestamp_ms: TimestampMs,
    #[serde(default, alias = "deviceId")]
    pub device_id: Option<String>,
}

/// Everything a replay needs besides the sinks.
#[derive(Debug, Clone)]
pub struct ReplayPlan {
    pub geofences: Vec<Geofence>,
    pub fixes: Vec<FixRecord>,
    pub default_device: DeviceId,
    pub seed: Option<ContainmentStatus>,
    /// Inject a report tick every interval of replay time.
    pub inject_ticks: bool,
    pub config: AppConfig,
}

/// What a replay did.
#[derive(Debug, Clone)]
pub struct ReplaySummary {
    pub fixes_replayed: usize,
    pub ticks_injected: usize,
    pub interrupted: bool,
    pub metrics: MetricsSnapshot,
}

/// Run the replay command.
pub fn run(args: ReplayArgs) -> Result<(), CliError> {
    let file_config = load_config();
    let mut config = AppConfig::from_config_file(&file_config);
    if let Some(secs) = args.interval_secs {
        config.monitor = config
            .monitor
            .with_report_interval(Duration::from_secs(secs.max(1)));
    }

    let geofences = load_geofences(&args.geofences)?;
    let (fixes, skipped) = read_fixes(&args.fixes)?;
    println!(
        "Loaded {} fix(es) from {} ({} line(s) skipped)",
        fixes.len(),
        args.fixes.display(),
        skipped
    );

    let plan = ReplayPlan {
        geofences,
        fixes,
        default_device: args.device.unwrap_or_else(|| DEFAULT_DEVICE_ID.to_string()),
        seed: args.seed.map(ContainmentStatus::from),
        inject_ticks: args.ticks,
        config,
    };

    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    ctrlc::set_handler(move || {
        println!();
        println!("Received shutdown signal, stopping replay...");
        signal_token.cancel();
    })
    .map_err(|e| CliError::Config(format!("Failed to set signal handler: {}", e)))?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| CliError::Runtime(e.to_string()))?;

    let summary = runtime.block_on(replay(plan, AppSinks::tracing(), cancel))?;
    print_summary(&summary);
    Ok(())
}

/// Read and parse a fixes file.
fn read_fixes(path: &Path) -> Result<(Vec<FixRecord>, usize), CliError> {
    let contents = std::fs::read_to_string(path).map_err(|source| CliError::Input {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_fix_lines(&contents))
}

/// Parse JSON lines, skipping blanks, `#` comments and malformed lines.
///
/// Returns the records and the number of malformed lines.
pub fn parse_fix_lines(contents: &str) -> (Vec<FixRecord>, usize) {
    let mut records = Vec::new();
    let mut skipped = 0;

    for (index, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match serde_json::from_str::<FixRecord>(line) {
            Ok(record) if record.lat.is_finite() && record.lng.is_finite() => records.push(record),
            Ok(_) => {
                skipped += 1;
                warn!(line = index + 1, "Skipping fix with non-finite coordinate");
            }
            Err(e) => {
                skipped += 1;
                warn!(line = index + 1, error = %e, "Skipping malformed fix");
            }
        }
    }
    (records, skipped)
}

/// Drive a monitor with the plan's fixes.
pub async fn replay(
    plan: ReplayPlan,
    sinks: AppSinks,
    cancel: CancellationToken,
) -> Result<ReplaySummary, CliError> {
    let start_ms = plan.fixes.first().map_or(0, |fix| fix.timestamp_ms);
    let interval_ms = (plan.config.monitor.report_interval.as_millis() as i64).max(1);

    let clock = Arc::new(ManualClock::new(start_ms));
    let app = GeowatchApp::start_with_clock(
        plan.config.clone(),
        sinks,
        Arc::clone(&clock) as Arc<dyn Clock>,
    )?;
    let handle = app.handle().clone();
    handle.replace_geofences(plan.geofences).await?;

    info!(
        fixes = plan.fixes.len(),
        inject_ticks = plan.inject_ticks,
        interval_ms,
        "Replay starting"
    );

    let mut next_tick = plan.inject_ticks.then_some(start_ms + interval_ms);
    let mut seeded: HashSet<DeviceId> = HashSet::new();
    let mut fixes_replayed = 0;
    let mut ticks_injected = 0;
    let mut interrupted = false;

    for record in plan.fixes {
        if cancel.is_cancelled() {
            interrupted = true;
            info!(fixes_replayed, "Replay interrupted");
            break;
        }

        if let Some(next) = next_tick.as_mut() {
            while *next <= record.timestamp_ms {
                clock.set(*next);
                handle.tick_all().await?;
                // Ticks read the clock when processed; wait before moving it.
                barrier(&handle).await?;
                ticks_injected += 1;
                *next += interval_ms;
            }
        }

        let device_id = record
            .device_id
            .clone()
            .unwrap_or_else(|| plan.default_device.clone());

        if let Some(status) = plan.seed {
            if seeded.insert(device_id.clone()) {
                handle.seed(device_id.clone(), status).await?;
            }
        }

        debug!(device_id = %device_id, timestamp_ms = record.timestamp_ms, "Replaying fix");
        clock.set(record.timestamp_ms);
        let fix = Fix::new(Coordinate::new(record.lat, record.lng), record.timestamp_ms);
        handle.record_fix(device_id, fix).await?;
        // Fixes are evaluated at the clock's time as well.
        barrier(&handle).await?;
        fixes_replayed += 1;
    }

    barrier(&handle).await?;
    let metrics = app.shutdown().await;

    Ok(ReplaySummary {
        fixes_replayed,
        ticks_injected,
        interrupted,
        metrics,
    })
}

/// Returns once the daemon has processed every command sent before it.
async fn barrier(handle: &MonitorHandle) -> Result<(), CliError> {
    handle.device_state(String::new()).await?;
    Ok(())
}

fn print_summary(summary: &ReplaySummary) {
    let metrics = &summary.metrics;
    println!();
    if summary.interrupted {
        println!("Replay interrupted");
    } else {
        println!("Replay complete");
    }
    println!("  Fixes replayed:   {}", summary.fixes_replayed);
    println!("  Ticks injected:   {}", summary.ticks_injected);
    println!("  Exits detected:   {}", metrics.exits_detected);
    println!("  Status reports:   {}", metrics.status_reports);
    println!("  Skipped reports:  {}", metrics.ticks_skipped);
    println!(
        "  Sink writes:      {} delivered, {} failed ({:.0}%)",
        metrics.sink_deliveries,
        metrics.sink_failures,
        metrics.delivery_ratio() * 100.0
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use geowatch::coord::Polygon;
    use geowatch::sink::{AlertSink, MemoryAlertSink, MemoryStateSink, StateSink};

    fn square() -> Geofence {
        Geofence::new(
            "yard",
            Polygon::from_lng_lat(&[[0.0, 0.0], [0.0, 10.0], [10.0, 10.0], [10.0, 0.0]]),
        )
    }

    fn record(lng: f64, lat: f64, timestamp_ms: TimestampMs) -> FixRecord {
        FixRecord {
            lat,
            lng,
            timestamp_ms,
            device_id: None,
        }
    }

    fn plan(fixes: Vec<FixRecord>) -> ReplayPlan {
        ReplayPlan {
            geofences: vec![square()],
            fixes,
            default_device: DEFAULT_DEVICE_ID.to_string(),
            seed: None,
            inject_ticks: false,
            config: AppConfig::default(),
        }
    }

    fn memory_sinks() -> (Arc<MemoryStateSink>, Arc<MemoryAlertSink>, AppSinks) {
        let state = Arc::new(MemoryStateSink::new());
        let alerts = Arc::new(MemoryAlertSink::new());
        let sinks = AppSinks::new(
            Arc::clone(&state) as Arc<dyn StateSink>,
            Arc::clone(&alerts) as Arc<dyn AlertSink>,
        );
        (state, alerts, sinks)
    }

    mod parsing {
        use super::*;

        #[test]
        fn test_parses_lines_and_counts_bad_ones() {
            let contents = r#"
# recorded on site
{"lat": 5.0, "lng": 5.0, "timestamp_ms": 100}
{"lat": 5.0, "lng": 15.0, "timestamp": 200, "deviceId": "truck-7"}
not json
{"lat": 5.0}
"#;
            let (records, skipped) = parse_fix_lines(contents);
            assert_eq!(records.len(), 2);
            assert_eq!(skipped, 2);
            assert_eq!(records[1].timestamp_ms, 200);
            assert_eq!(records[1].device_id.as_deref(), Some("truck-7"));
        }

        #[test]
        fn test_read_fixes_from_file() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("fixes.jsonl");
            std::fs::write(&path, "{\"lat\": 1, \"lng\": 2, \"timestamp_ms\": 3}\n").unwrap();

            let (records, skipped) = read_fixes(&path).unwrap();
            assert_eq!(records, vec![record(2.0, 1.0, 3)]);
            assert_eq!(skipped, 0);

            assert!(matches!(
                read_fixes(&dir.path().join("missing.jsonl")),
                Err(CliError::Input { .. })
            ));
        }
    }

    mod replaying {
        use super::*;

        #[tokio::test]
        async fn test_replay_emits_one_exit() {
            let (_, alerts, sinks) = memory_sinks();
            let fixes = vec![record(5.0, 5.0, 0), record(15.0, 5.0, 10), record(15.0, 5.0, 20)];

            let summary = replay(plan(fixes), sinks, CancellationToken::new())
                .await
                .unwrap();

            assert_eq!(summary.fixes_replayed, 3);
            assert_eq!(summary.metrics.exits_detected, 1);
            assert_eq!(alerts.alerts()[0].timestamp_ms, 10);
        }

        #[tokio::test]
        async fn test_ticks_injected_in_replay_time() {
            let (state, _, sinks) = memory_sinks();
            let mut plan = plan(vec![record(5.0, 5.0, 0), record(5.0, 5.0, 250_000)]);
            plan.inject_ticks = true;

            let summary = replay(plan, sinks, CancellationToken::new())
                .await
                .unwrap();

            // Default interval is 120 s: ticks at 120 s and 240 s.
            assert_eq!(summary.ticks_injected, 2);
            assert_eq!(summary.metrics.status_reports, 4);
            assert_eq!(state.write_count(), 4);
        }

        #[tokio::test]
        async fn test_seed_applies_before_first_fix() {
            let (_, alerts, sinks) = memory_sinks();
            let mut plan = plan(vec![record(15.0, 5.0, 0)]);
            plan.seed = Some(ContainmentStatus::Inside);

            replay(plan, sinks, CancellationToken::new()).await.unwrap();
            assert_eq!(alerts.len(), 1);
        }

        #[tokio::test]
        async fn test_cancelled_replay_stops_early() {
            let (_, _, sinks) = memory_sinks();
            let cancel = CancellationToken::new();
            cancel.cancel();

            let summary = replay(plan(vec![record(5.0, 5.0, 0)]), sinks, cancel)
                .await
                .unwrap();
            assert!(summary.interrupted);
            assert_eq!(summary.fixes_replayed, 0);
        }
    }
}
