//! Maps `Box<dyn Error>` from trait boundaries to typed core errors.
//!
//! The traits in `lumen_traits` use `Box<dyn Error + Send + Sync>` so any
//! gateway or store can plug in; this module converts those to
//! `TransportError` / `SinkError`, with an optional feature-gated path for
//! `lumen_gateway::GatewayError` downcasting.

use crate::error::{SinkError, TransportError};

/// Map a transport-boundary error to a typed `TransportError`.
///
/// Attempts to downcast known gateway error types first, then falls back
/// to string-based heuristics.
pub fn map_transport_error(e: &(dyn std::error::Error + 'static)) -> TransportError {
    #[cfg(feature = "gateway-errors")]
    {
        use lumen_gateway::error::GatewayError;
        if let Some(gw) = e.downcast_ref::<GatewayError>() {
            return match gw {
                GatewayError::Timeout => TransportError::Timeout,
                GatewayError::Unreachable(m) => TransportError::Unreachable(m.clone()),
                GatewayError::Payload(p) => TransportError::Payload(p.to_string()),
                other => TransportError::Other(other.to_string()),
            };
        }
    }

    // Fallback: string-based detection
    let s = e.to_string();
    let lower = s.to_lowercase();
    if lower.contains("timeout") || lower.contains("timed out") {
        TransportError::Timeout
    } else {
        TransportError::Other(s)
    }
}

/// Attach the sink name to a store-boundary error.
pub fn map_sink_error(sink: &str, e: &(dyn std::error::Error + 'static)) -> SinkError {
    SinkError {
        sink: sink.to_string(),
        message: e.to_string(),
    }
}
