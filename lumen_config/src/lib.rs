#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema for the gateway poller.
//!
//! - `Config` and its sections are deserialized from TOML and validated.
//! - Every section except `[storage]` has defaults, so a minimal file only
//!   names where history and baselines live.
use serde::Deserialize;
use serde::de::Deserializer;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GatewayKind {
    /// Payload files on disk, re-read on every request.
    #[default]
    Fixture,
    /// In-memory scene described under `[[gateway.groups]]`.
    Simulated,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Gateway {
    pub kind: GatewayKind,
    pub fixture_dir: Option<PathBuf>,
    pub groups: Vec<SimGroup>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SimGroup {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub devices: Vec<SimDevice>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SimDevice {
    pub id: u32,
    /// Accepts `true`/`false` or the gateway's `1`/`0`.
    #[serde(deserialize_with = "de_power")]
    pub power: bool,
    pub dimmer: u8,
    #[serde(default = "default_color")]
    pub color: String,
}

fn default_color() -> String {
    "f1e0b5".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PowerToml {
    Flag(bool),
    Int(i64),
}

fn de_power<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    match PowerToml::deserialize(deserializer)? {
        PowerToml::Flag(b) => Ok(b),
        PowerToml::Int(0) => Ok(false),
        PowerToml::Int(1) => Ok(true),
        PowerToml::Int(other) => Err(serde::de::Error::custom(format!(
            "power must be 0, 1, true or false, got {other}"
        ))),
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Poll {
    /// Delay between the end of one poll cycle and the start of the next.
    pub interval_ms: u64,
}

impl Default for Poll {
    fn default() -> Self {
        Self {
            interval_ms: 10_000,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Fanout {
    /// How long a poll cycle waits for sink writes before moving on.
    pub deadline_ms: u64,
}

impl Default for Fanout {
    fn default() -> Self {
        Self { deadline_ms: 4_000 }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Resilience {
    /// Consecutive transport failures that trigger the alert-and-stop escalation.
    pub failure_threshold: u32,
}

impl Default for Resilience {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Baseline {
    pub enabled: bool,
    pub lookback_days: u32,
    pub percentile: f64,
    pub rebuild_interval_s: u64,
}

impl Default for Baseline {
    fn default() -> Self {
        Self {
            enabled: true,
            lookback_days: 14,
            percentile: 85.0,
            rebuild_interval_s: 24 * 60 * 60,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Storage {
    /// Event rows (one line per light per persisted snapshot).
    pub history_csv: PathBuf,
    /// Baseline table `group,hour,value`.
    pub baseline_csv: PathBuf,
    /// Optional document sink, one JSON document per snapshot.
    #[serde(default)]
    pub jsonl: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Notify {
    /// Append alerts to this file in addition to the log.
    pub alert_file: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub gateway: Gateway,
    #[serde(default)]
    pub poll: Poll,
    #[serde(default)]
    pub fanout: Fanout,
    #[serde(default)]
    pub resilience: Resilience,
    #[serde(default)]
    pub baseline: Baseline,
    pub storage: Storage,
    #[serde(default)]
    pub notify: Notify,
    #[serde(default)]
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

/// Read, parse and validate a config file. Relative paths inside the file are
/// resolved against the file's directory.
pub fn load_file(path: &Path) -> eyre::Result<Config> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| eyre::eyre!("read config {}: {}", path.display(), e))?;
    let mut cfg =
        load_toml(&text).map_err(|e| eyre::eyre!("parse config {}: {}", path.display(), e))?;
    if let Some(base) = path.parent() {
        cfg.resolve_relative_to(base);
    }
    cfg.validate()?;
    Ok(cfg)
}

fn rebase(base: &Path, p: &mut PathBuf) {
    if p.is_relative() {
        *p = base.join(&*p);
    }
}

impl Config {
    /// Make every relative path in the config relative to `base`.
    pub fn resolve_relative_to(&mut self, base: &Path) {
        rebase(base, &mut self.storage.history_csv);
        rebase(base, &mut self.storage.baseline_csv);
        if let Some(p) = self.storage.jsonl.as_mut() {
            rebase(base, p);
        }
        if let Some(p) = self.gateway.fixture_dir.as_mut() {
            rebase(base, p);
        }
        if let Some(p) = self.notify.alert_file.as_mut() {
            rebase(base, p);
        }
    }

    pub fn validate(&self) -> eyre::Result<()> {
        // Gateway
        match self.gateway.kind {
            GatewayKind::Fixture => {
                if self.gateway.fixture_dir.is_none() {
                    eyre::bail!("gateway.fixture_dir is required when gateway.kind = \"fixture\"");
                }
            }
            GatewayKind::Simulated => {
                if self.gateway.groups.is_empty() {
                    eyre::bail!(
                        "gateway.groups must list at least one group when gateway.kind = \"simulated\""
                    );
                }
            }
        }
        let mut group_ids = HashSet::new();
        let mut device_ids = HashSet::new();
        for g in &self.gateway.groups {
            if !group_ids.insert(g.id) {
                eyre::bail!("gateway.groups has duplicate group id {}", g.id);
            }
            if g.name.trim().is_empty() {
                eyre::bail!("gateway.groups[{}].name must not be empty", g.id);
            }
            for d in &g.devices {
                if !device_ids.insert(d.id) {
                    eyre::bail!("gateway.groups has duplicate device id {}", d.id);
                }
            }
        }

        // Poll
        if self.poll.interval_ms < 10 {
            eyre::bail!("poll.interval_ms must be >= 10");
        }
        if self.poll.interval_ms > 60 * 60 * 1000 {
            eyre::bail!("poll.interval_ms is unreasonably large (>1h)");
        }

        // Fan-out
        if self.fanout.deadline_ms == 0 {
            eyre::bail!("fanout.deadline_ms must be >= 1");
        }

        // Resilience
        if self.resilience.failure_threshold == 0 {
            eyre::bail!("resilience.failure_threshold must be >= 1");
        }

        // Baseline
        if self.baseline.lookback_days == 0 || self.baseline.lookback_days > 365 {
            eyre::bail!("baseline.lookback_days must be in [1, 365]");
        }
        if !(self.baseline.percentile > 0.0 && self.baseline.percentile < 100.0) {
            eyre::bail!("baseline.percentile must be in (0.0, 100.0)");
        }
        if self.baseline.rebuild_interval_s == 0 {
            eyre::bail!("baseline.rebuild_interval_s must be >= 1");
        }

        // Logging
        if let Some(r) = self.logging.rotation.as_deref()
            && !matches!(r, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly");
        }

        Ok(())
    }
}
