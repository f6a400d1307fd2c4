//! Human-readable error descriptions and structured JSON error formatting.

use lumen_core::error::{BuildError, CoreError, TransportError};
use thiserror::Error;

/// The config file could not be read, parsed or validated.
#[derive(Debug, Error)]
#[error("invalid configuration: {0}")]
pub struct ConfigError(pub String);

impl ConfigError {
    pub fn from_report(report: &eyre::Report) -> Self {
        Self(format!("{report:#}"))
    }
}

fn transport_hint(t: &TransportError) -> &'static str {
    match t {
        TransportError::Timeout => {
            "Likely causes: The gateway is offline, overloaded, or the fixture directory holds an OFFLINE marker.\nHow to fix: Check the gateway's power and network, or remove the marker file."
        }
        TransportError::Unreachable(_) => {
            "Likely causes: Wrong gateway.fixture_dir or the gateway address changed.\nHow to fix: Point the config at the right gateway and rerun `lumen self-check`."
        }
        TransportError::Payload(_) => {
            "Likely causes: The gateway answered with JSON the poller does not understand (wrong firmware or a hand-edited fixture).\nHow to fix: Inspect the payload files or upgrade the gateway firmware."
        }
        TransportError::Other(_) => {
            "Likely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
        }
    }
}

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    if let Some(ce) = err.downcast_ref::<ConfigError>() {
        return format!(
            "What happened: {ce}.\nLikely causes: Missing [storage] paths, a missing gateway.fixture_dir, or out-of-range values in the TOML.\nHow to fix: Edit the config file (see etc/lumen.toml for a sample), then rerun."
        );
    }

    // Typed matches first
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingTransport => {
                "What happened: No gateway transport was provided to the poller.\nLikely causes: The gateway section of the config could not be turned into a transport.\nHow to fix: Set gateway.kind and its matching settings.".to_string()
            }
            BuildError::MissingNotifier => {
                "What happened: No notifier was provided to the poller.\nLikely causes: The alert channel failed to initialize.\nHow to fix: Check [notify] in the config.".to_string()
            }
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun."
            ),
        };
    }

    if let Some(ce) = err.downcast_ref::<CoreError>() {
        return match ce {
            CoreError::Escalated {
                failures,
                last_error,
            } => format!(
                "What happened: The gateway failed {failures} times in a row ({last_error}); the alert was sent and polling stopped.\n{}",
                transport_hint(last_error)
            ),
            CoreError::Transport(t) => {
                format!("What happened: {t}.\n{}", transport_hint(t))
            }
            CoreError::Store(msg) => format!(
                "What happened: The history store failed ({msg}).\nLikely causes: Missing permissions or a corrupted CSV under [storage].\nHow to fix: Check the files named in [storage]; remove a corrupted baseline table to rebuild it."
            ),
            other => format!(
                "What happened: {other}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
            ),
        };
    }

    // Generic fallback
    let msg = err.to_string();
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable exit codes: 3 escalation, 4 invalid configuration, 1 anything else.
/// Usage errors exit with 2 from clap before any of this runs.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    if matches!(
        err.downcast_ref::<CoreError>(),
        Some(CoreError::Escalated { .. })
    ) {
        return 3;
    }
    if err.downcast_ref::<ConfigError>().is_some()
        || matches!(
            err.downcast_ref::<BuildError>(),
            Some(BuildError::InvalidConfig(_))
        )
    {
        return 4;
    }
    1
}

fn reason_name(err: &eyre::Report) -> &'static str {
    if err.downcast_ref::<ConfigError>().is_some() {
        return "InvalidConfig";
    }
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::InvalidConfig(_) => "InvalidConfig",
            BuildError::MissingTransport | BuildError::MissingNotifier => "Build",
        };
    }
    match err.downcast_ref::<CoreError>() {
        Some(CoreError::Escalated { .. }) => "Escalated",
        Some(CoreError::Transport(_)) => "Transport",
        Some(CoreError::Store(_)) => "Store",
        _ => "Error",
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;

    if let Some(CoreError::Escalated {
        failures,
        last_error,
    }) = err.downcast_ref::<CoreError>()
    {
        return json!({
            "reason": "Escalated",
            "details": { "failures": failures, "last_error": last_error.to_string() },
            "message": humanize(err),
        })
        .to_string();
    }

    json!({ "reason": reason_name(err), "message": humanize(err) }).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escalation_maps_to_exit_3_and_json_details() {
        let err = eyre::Report::new(CoreError::Escalated {
            failures: 5,
            last_error: TransportError::Timeout,
        });
        assert_eq!(exit_code_for_error(&err), 3);
        let v: serde_json::Value = serde_json::from_str(&format_error_json(&err)).unwrap();
        assert_eq!(v["reason"], "Escalated");
        assert_eq!(v["details"]["failures"], 5);
        assert!(v["message"].as_str().unwrap().contains("5 times"));
    }

    #[test]
    fn config_errors_map_to_exit_4() {
        let err = eyre::Report::new(ConfigError("poll.interval_ms must be >= 10".into()));
        assert_eq!(exit_code_for_error(&err), 4);
        assert!(humanize(&err).contains("poll.interval_ms"));
        let err = eyre::Report::new(BuildError::InvalidConfig("sink names must be unique"));
        assert_eq!(exit_code_for_error(&err), 4);
    }

    #[test]
    fn unknown_errors_are_generic() {
        let err = eyre::eyre!("boom");
        assert_eq!(exit_code_for_error(&err), 1);
        assert!(humanize(&err).starts_with("Something went wrong."));
        let v: serde_json::Value = serde_json::from_str(&format_error_json(&err)).unwrap();
        assert_eq!(v["reason"], "Error");
    }
}
