//! Inbound detach-request validation.
//!
//! Rendered content can ask for a detach out-of-band, carrying a
//! serialized candidate. The payload is untrusted: required fields are
//! checked one by one, junk numbers are refused, and the locator is
//! canonicalized before the candidate enters the same admission
//! pipeline as spontaneous detection.

use floatplay_core::identity::{canonicalize_locator, is_primary_player};
use floatplay_core::types::{Candidate, FloatplayError, MediaKind, Rect, SurfaceId};

/// Validate a `detach` request payload into a candidate and its source
/// surface.
pub fn parse_detach_request(
    params: &serde_json::Value,
) -> Result<(SurfaceId, Candidate), FloatplayError> {
    let surface = params
        .get("surface")
        .and_then(serde_json::Value::as_str)
        .ok_or(FloatplayError::MissingField("surface"))?;
    if surface.is_empty() {
        return Err(FloatplayError::InvalidCandidate("empty surface id".into()));
    }

    let raw = params
        .get("candidate")
        .ok_or(FloatplayError::MissingField("candidate"))?;

    let locator = raw
        .get("locator")
        .and_then(serde_json::Value::as_str)
        .ok_or(FloatplayError::MissingField("locator"))?;
    if locator.is_empty() {
        return Err(FloatplayError::InvalidCandidate("empty locator".into()));
    }

    let title = raw
        .get("title")
        .and_then(serde_json::Value::as_str)
        .unwrap_or_default()
        .to_string();

    let position = finite_seconds(raw, "position")?;
    let duration = finite_seconds(raw, "duration")?;

    let rect = match raw.get("rect") {
        Some(value) => serde_json::from_value::<Rect>(value.clone())
            .map_err(|e| FloatplayError::InvalidCandidate(format!("bad rect: {e}")))?,
        None => Rect::default(),
    };
    if rect.width < 0.0 || rect.height < 0.0 {
        return Err(FloatplayError::InvalidCandidate(
            "negative rect dimensions".into(),
        ));
    }

    let kind = match raw.get("kind").and_then(serde_json::Value::as_str) {
        Some(s) => s.parse::<MediaKind>()?,
        None => MediaKind::Native,
    };

    let locator = canonicalize_locator(locator);
    let candidate = Candidate {
        surface: SurfaceId::new(surface),
        primary_player: is_primary_player(&locator),
        locator,
        title,
        position,
        duration,
        rect,
        visible: bool_field(raw, "visible", true),
        playing: bool_field(raw, "playing", false),
        ready: bool_field(raw, "ready", true),
        kind,
    };

    Ok((SurfaceId::new(surface), candidate))
}

fn finite_seconds(raw: &serde_json::Value, field: &'static str) -> Result<f64, FloatplayError> {
    match raw.get(field) {
        None => Ok(0.0),
        Some(value) => {
            let seconds = value
                .as_f64()
                .ok_or_else(|| FloatplayError::InvalidCandidate(format!("{field} not a number")))?;
            if !seconds.is_finite() || seconds < 0.0 {
                return Err(FloatplayError::InvalidCandidate(format!(
                    "{field} out of range: {seconds}"
                )));
            }
            Ok(seconds)
        }
    }
}

fn bool_field(raw: &serde_json::Value, field: &str, default: bool) -> bool {
    raw.get(field)
        .and_then(serde_json::Value::as_bool)
        .unwrap_or(default)
}

// ─── Tests ────────────────────────────────────────────────────────
