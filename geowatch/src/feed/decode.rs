//! Lenient JSON → [`Geofence`] decoding.

use serde_json::{Map, Value};
use tracing::debug;

use crate::coord::{Coordinate, Polygon, TimestampMs};
use crate::geofence::Geofence;

use super::FeedError;

/// Parse a feed payload from JSON text.
///
/// `null` (an empty remote node) decodes to no geofences. Any other
/// top-level value that is not an object or array is an error.
pub fn parse_geofences(json: &str) -> Result<Vec<Geofence>, FeedError> {
    let value: Value = serde_json::from_str(json)?;
    match value {
        Value::Object(_) | Value::Array(_) => Ok(decode_geofences(&value)),
        Value::Null => Ok(Vec::new()),
        other => Err(FeedError::Shape(json_kind(&other))),
    }
}

/// Decode every usable geofence record in `value`.
///
/// Objects are treated as `id → record` maps and arrays as record lists
/// (the index is the fallback id). Unusable records are skipped.
pub fn decode_geofences(value: &Value) -> Vec<Geofence> {
    let geofences: Vec<Geofence> = match value {
        Value::Object(records) => records
            .iter()
            .filter_map(|(key, record)| decode_geofence(Some(key), record))
            .collect(),
        Value::Array(records) => records
            .iter()
            .enumerate()
            .filter_map(|(index, record)| decode_geofence(Some(&index.to_string()), record))
            .collect(),
        _ => Vec::new(),
    };
    debug!(count = geofences.len(), "Decoded geofence feed");
    geofences
}

/// Decode a single record.
///
/// `fallback_id` is used when the record carries no `id` of its own.
/// Returns `None` if the record is not an object or has no usable id.
pub fn decode_geofence(fallback_id: Option<&str>, record: &Value) -> Option<Geofence> {
    let Value::Object(fields) = record else {
        debug!(key = ?fallback_id, "Skipping non-object geofence record");
        return None;
    };

    let id = fields
        .get("id")
        .and_then(string_like)
        .or_else(|| fallback_id.map(str::to_string));
    let Some(id) = id else {
        debug!("Skipping geofence record without id");
        return None;
    };

    let enabled = fields.get("enabled").and_then(bool_like).unwrap_or(true);
    let start = fields.get("start").and_then(timestamp_like);
    let end = fields.get("end").and_then(timestamp_like);
    let polygon = fields.get("polygon").map(decode_polygon).unwrap_or_default();

    if polygon.is_degenerate() {
        debug!(id = %id, vertices = polygon.len(), "Geofence polygon is degenerate");
    }

    let mut geofence = Geofence::new(id, polygon);
    geofence.enabled = enabled;
    if let (Some(start), Some(end)) = (start, end) {
        geofence = geofence.with_window(start, end);
    }
    Some(geofence)
}

/// Decode a polygon ring, keeping only the vertices that parse.
fn decode_polygon(value: &Value) -> Polygon {
    let vertices: Vec<&Value> = match value {
        Value::Array(items) => items.iter().collect(),
        Value::Object(items) => indexed_values(items),
        _ => Vec::new(),
    };

    let total = vertices.len();
    let polygon: Polygon = vertices.into_iter().filter_map(decode_vertex).collect();
    if polygon.len() < total {
        debug!(
            dropped = total - polygon.len(),
            kept = polygon.len(),
            "Dropped invalid polygon vertices"
        );
    }
    polygon
}

/// Values of an array-like object (`{"0": .., "1": ..}`) in index order.
///
/// Keys that are not non-negative integers are ignored.
fn indexed_values(items: &Map<String, Value>) -> Vec<&Value> {
    let mut indexed: Vec<(usize, &Value)> = items
        .iter()
        .filter_map(|(key, value)| key.parse::<usize>().ok().map(|index| (index, value)))
        .collect();
    indexed.sort_by_key(|(index, _)| *index);
    indexed.into_iter().map(|(_, value)| value).collect()
}

/// A vertex as `[lng, lat]`, `{lng, lat}`, `{lon, lat}` or `{longitude, latitude}`.
fn decode_vertex(value: &Value) -> Option<Coordinate> {
    let (lng, lat) = match value {
        Value::Array(pair) if pair.len() >= 2 => (number_like(&pair[0])?, number_like(&pair[1])?),
        Value::Object(fields) => {
            let lng = ["lng", "lon", "longitude"]
                .iter()
                .find_map(|key| fields.get(*key).and_then(number_like))?;
            let lat = ["lat", "latitude"]
                .iter()
                .find_map(|key| fields.get(*key).and_then(number_like))?;
            (lng, lat)
        }
        _ => return None,
    };
    Some(Coordinate::new(lat, lng))
}

fn number_like(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    number.is_finite().then_some(number)
}

fn timestamp_like(value: &Value) -> Option<TimestampMs> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f as i64))
        }
        _ => None,
    }
}

fn bool_like(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => s.trim().parse::<bool>().ok(),
        _ => None,
    }
}

fn string_like(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
