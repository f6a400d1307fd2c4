#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

pub const KITCHEN_GROUP: &str =
    r#"{"9001":"Kitchen","9003":131073,"9018":{"15002":{"9003":[65537,65540]}}}"#;
pub const KITCHEN_BULB: &str =
    r#"{"9001":"Bulb","9003":65537,"3311":[{"5850":1,"5851":200,"5706":"f1e0b5"}]}"#;
pub const REMOTE: &str = r#"{"9001":"Remote","9003":65540}"#;

/// Fixture gateway with one group holding a bulb and a remote.
pub fn write_fixture(dir: &Path) -> PathBuf {
    let fx = dir.join("gateway");
    fs::create_dir_all(&fx).unwrap();
    fs::write(fx.join("groups.json"), "[131073]").unwrap();
    fs::write(fx.join("group_131073.json"), KITCHEN_GROUP).unwrap();
    fs::write(fx.join("device_65537.json"), KITCHEN_BULB).unwrap();
    fs::write(fx.join("device_65540.json"), REMOTE).unwrap();
    fx
}

/// Config pointing at `write_fixture`'s layout; `extra` is appended verbatim.
pub fn write_config(dir: &Path, extra: &str) -> PathBuf {
    write_fixture(dir);
    let toml = format!(
        r#"
[gateway]
kind = "fixture"
fixture_dir = "gateway"

[poll]
interval_ms = 10

[storage]
history_csv = "data/history.csv"
baseline_csv = "data/baselines.csv"
{extra}
"#
    );
    let path = dir.join("lumen.toml");
    fs::write(&path, toml).unwrap();
    path
}
