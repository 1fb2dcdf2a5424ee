//! Current time as epoch seconds, optionally shifted.
//!
//! Request: `timezone:<utc|local>[,offset_seconds:<int>]`.
//! Reply: `200 <seconds>` where seconds carries microsecond precision.
//! For `local` the local wall clock is read as if it were UTC.

use crate::handler::{RequestHandler, Response, parse_pairs, pair_value};

use chrono::{Local, Utc};
use log::warn;

const MICROS_PER_SECOND: i64 = 1_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Zone {
    Utc,
    Local,
}

#[derive(Debug, Default)]
pub struct TimeHandler;

impl TimeHandler {
    pub fn new() -> Self {
        Self
    }

    fn now_micros(zone: Zone) -> i64 {
        match zone {
            Zone::Utc => Utc::now().timestamp_micros(),
            Zone::Local => Local::now().naive_local().and_utc().timestamp_micros(),
        }
    }

    /// Epoch seconds for the request, or `None` if it is invalid.
    fn resolve(request: &str) -> Option<f64> {
        let pairs = parse_pairs(request)
            .map_err(|e| warn!("Rejected time request: {e}"))
            .ok()?;

        let zone = match pair_value(&pairs, "timezone") {
            Some("utc") => Zone::Utc,
            Some("local") => Zone::Local,
            other => {
                warn!("Rejected time request: unsupported timezone {other:?}");
                return None;
            }
        };

        let offset_seconds = match pair_value(&pairs, "offset_seconds") {
            Some(raw) => raw
                .trim()
                .parse::<i64>()
                .map_err(|e| warn!("Rejected time request: offset_seconds '{raw}': {e}"))
                .ok()?,
            None => 0,
        };

        let total_micros = offset_seconds
            .checked_mul(MICROS_PER_SECOND)
            .and_then(|offset| Self::now_micros(zone).checked_add(offset))?;
        if total_micros < 0 {
            warn!("Rejected time request: result is before the epoch");
            return None;
        }

        Some(total_micros as f64 / MICROS_PER_SECOND as f64)
    }
}

impl RequestHandler for TimeHandler {
    fn receive(&self, request: &str) -> Response {
        match Self::resolve(request) {
            Some(seconds) => Response::ok_with(format_seconds(seconds)),
            None => Response::bad_request(),
        }
    }
}

/// Seconds with a fractional part always present (`1700003600.0`, `1700003600.25`).
pub(crate) fn format_seconds(seconds: f64) -> String {
    let text = seconds.to_string();
    if text.contains('.') {
        text
    } else {
        format!("{text}.0")
    }
}
