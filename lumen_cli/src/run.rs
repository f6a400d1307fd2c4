//! Command bodies: wire the config into gateways, stores and the poller.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use eyre::WrapErr;
use lumen_config::{Config, GatewayKind};
use lumen_core::transport_error::map_transport_error;
use lumen_core::{BaselineCache, BaselineCfg, CoreError, Poller, RunOutcome, RunParams};
use lumen_gateway::{
    AlertFileNotifier, CsvHistoryStore, FixtureGateway, JsonlSink, LogNotifier, SimulatedGateway,
};
use lumen_traits::{HistoryStore, LightControl, Notifier, StateSink, Transport};

use crate::cli::json_mode;
use crate::error_fmt::ConfigError;

pub fn build_transport(cfg: &Config) -> eyre::Result<Box<dyn Transport>> {
    match cfg.gateway.kind {
        GatewayKind::Fixture => {
            let dir = cfg.gateway.fixture_dir.clone().ok_or_else(|| {
                ConfigError("gateway.fixture_dir is required for the fixture gateway".into())
            })?;
            tracing::info!(dir = %dir.display(), "using fixture gateway");
            Ok(Box::new(FixtureGateway::new(dir)))
        }
        GatewayKind::Simulated => {
            let mut sim = SimulatedGateway::new();
            for g in &cfg.gateway.groups {
                let lights = g
                    .devices
                    .iter()
                    .map(|d| {
                        (
                            d.id,
                            LightControl {
                                power: d.power,
                                dimmer: d.dimmer,
                                color: d.color.clone(),
                            },
                        )
                    })
                    .collect();
                sim.add_group(g.id, &g.name, lights);
            }
            tracing::info!(groups = cfg.gateway.groups.len(), "using simulated gateway");
            Ok(Box::new(sim))
        }
    }
}

fn open_history(cfg: &Config) -> eyre::Result<Arc<CsvHistoryStore>> {
    let store = CsvHistoryStore::open(&cfg.storage.history_csv, &cfg.storage.baseline_csv)
        .wrap_err("open history store")?;
    Ok(Arc::new(store))
}

fn build_notifier(cfg: &Config) -> Arc<dyn Notifier> {
    match &cfg.notify.alert_file {
        Some(path) => Arc::new(AlertFileNotifier::new(path)),
        None => Arc::new(LogNotifier),
    }
}

pub fn run_poll(
    cfg: &Config,
    max_ticks: Option<u64>,
    interval_ms: Option<u64>,
    shutdown: Arc<AtomicBool>,
) -> eyre::Result<RunOutcome> {
    let history = open_history(cfg)?;
    let history_sink: Arc<dyn StateSink> = history.clone();
    let mut sinks = vec![history_sink];
    if let Some(path) = &cfg.storage.jsonl {
        sinks.push(Arc::new(JsonlSink::open(path).wrap_err("open document sink")?));
    }

    let cache = Arc::new(BaselineCache::load(history.as_ref())?);
    tracing::info!(entries = cache.snapshot().len(), "baseline table loaded");

    let mut poller = Poller::builder()
        .with_transport(build_transport(cfg)?)
        .with_notifier(build_notifier(cfg))
        .with_sinks(sinks)
        .with_baselines(cache)
        .with_fanout((&cfg.fanout).into())
        .with_resilience((&cfg.resilience).into())
        .build()?;

    let mut params = RunParams {
        poll: (&cfg.poll).into(),
        baseline: (&cfg.baseline).into(),
        max_ticks,
    };
    if let Some(ms) = interval_ms {
        params.poll.interval = Duration::from_millis(ms);
    }

    let store: Arc<dyn HistoryStore> = history;
    let outcome = lumen_core::run(&mut poller, params, Some(store), shutdown)?;
    let ticks = match outcome {
        RunOutcome::Stopped { ticks } | RunOutcome::TicksExhausted { ticks } => ticks,
    };
    if json_mode() {
        let stopped = matches!(outcome, RunOutcome::Stopped { .. });
        println!(
            "{}",
            serde_json::json!({ "ticks": ticks, "stopped": stopped })
        );
    } else {
        println!("poll loop finished after {ticks} ticks");
    }
    Ok(outcome)
}

pub fn rebuild(cfg: &Config) -> eyre::Result<()> {
    let history = open_history(cfg)?;
    let cache = BaselineCache::load(history.as_ref())?;
    let bcfg: BaselineCfg = (&cfg.baseline).into();
    let report = lumen_core::rebuild_now(history.as_ref(), &cache, &bcfg, chrono::Utc::now())?;
    if json_mode() {
        println!(
            "{}",
            serde_json::json!({
                "samples": report.samples,
                "buckets": report.buckets,
                "inserted": report.inserted,
                "updated": report.updated,
                "unchanged": report.unchanged,
                "failed": report.failed,
            })
        );
    } else {
        println!(
            "rebuild complete: {} samples, {} buckets ({} inserted, {} updated, {} unchanged, {} failed)",
            report.samples,
            report.buckets,
            report.inserted,
            report.updated,
            report.unchanged,
            report.failed
        );
    }
    Ok(())
}

pub fn baselines(cfg: &Config) -> eyre::Result<()> {
    let history = open_history(cfg)?;
    let entries = BaselineCache::load(history.as_ref())?.snapshot().entries();
    if json_mode() {
        for e in &entries {
            println!("{}", serde_json::to_string(e)?);
        }
        return Ok(());
    }
    if entries.is_empty() {
        println!("no baselines yet");
        return Ok(());
    }
    println!("{:<24} {:>4} {:>5}", "group", "hour", "value");
    for e in &entries {
        println!("{:<24} {:>4} {:>5}", e.group, e.hour, e.value);
    }
    Ok(())
}

/// One enumeration of the gateway. Nothing is persisted or corrected.
pub fn self_check(cfg: &Config) -> eyre::Result<()> {
    let mut transport = build_transport(cfg)?;
    let to_core = |e: lumen_traits::BoxError| CoreError::Transport(map_transport_error(e.as_ref()));

    let ids = transport.list_group_ids().map_err(to_core)?;
    let mut lights = 0usize;
    for id in &ids {
        let group = transport.group(*id).map_err(to_core)?;
        for dev in &group.device_ids {
            if transport.device(*dev).map_err(to_core)?.light.is_some() {
                lights += 1;
            }
        }
        tracing::debug!(group = %group.name, devices = group.device_ids.len(), "group reachable");
    }

    if json_mode() {
        println!(
            "{}",
            serde_json::json!({ "ok": true, "groups": ids.len(), "lights": lights })
        );
    } else {
        println!("self-check ok: {} groups, {lights} lights", ids.len());
    }
    Ok(())
}
