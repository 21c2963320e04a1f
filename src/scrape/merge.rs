//! Response validation and result merging
//!
//! Count responses must be `{"count": <number>}`. Multiquery responses must
//! be a JSON array of `{"name": <label>, "result": [...]}` objects, one per
//! sub-query. Merged games are sorted by `name`, stably.

use crate::client::CatalogResponse;
use crate::query::MultiqueryBatch;
use crate::ScrapeError;
use serde_json::Value;

/// Largest count accepted from a `/count` response
///
/// Several times the size of the whole IGDB catalog. A playlist claiming more
/// is treated as a malformed answer rather than paged.
pub const MAX_COUNT: u64 = 1_000_000;

/// Extracts the item count from a `/count` response
pub fn parse_count(playlist: &str, response: &CatalogResponse) -> Result<usize, ScrapeError> {
    let invalid = |reason: String| ScrapeError::InvalidCountResponse {
        playlist: playlist.to_string(),
        reason,
    };

    if !response.is_json() {
        return Err(invalid(format!(
            "expected JSON, got {} ({})",
            response.content_type.as_deref().unwrap_or("no content type"),
            response.text()
        )));
    }

    let value = response
        .json()
        .map_err(|e| invalid(format!("malformed JSON: {}", e)))?;

    let object = value
        .as_object()
        .ok_or_else(|| invalid(format!("expected a JSON object, got {}", value)))?;

    let count = object
        .get("count")
        .ok_or_else(|| invalid(format!("no 'count' attribute in {}", value)))?;

    let count = match count.as_u64() {
        Some(n) => n,
        // Integral floats such as `7.0` are accepted; `7.5` is not
        None => match count.as_f64() {
            Some(n)
                if n.is_finite() && n >= 0.0 && n.fract() == 0.0 && n <= MAX_COUNT as f64 =>
            {
                n as u64
            }
            _ => {
                return Err(invalid(format!(
                    "expected 'count' to be an integer between 0 and {}, got {}",
                    MAX_COUNT, count
                )))
            }
        },
    };

    if count > MAX_COUNT {
        return Err(invalid(format!(
            "count {} exceeds the limit of {}",
            count, MAX_COUNT
        )));
    }

    usize::try_from(count).map_err(|_| invalid(format!("count {} too large", count)))
}

/// Pulls each sub-query's `result` array out of a multiquery response
///
/// Results are returned in the batch's label order, whatever order the API
/// answered in.
pub fn parse_batch(
    batch: &MultiqueryBatch,
    response: &CatalogResponse,
) -> Result<Vec<Value>, ScrapeError> {
    let malformed = |reason: String| ScrapeError::RequestFailed {
        status: response.status,
        body: reason,
    };

    if !response.is_json() {
        return Err(malformed(format!(
            "expected JSON multiquery response, got {} ({})",
            response.content_type.as_deref().unwrap_or("no content type"),
            response.text()
        )));
    }

    let value = response
        .json()
        .map_err(|e| malformed(format!("malformed multiquery JSON: {}", e)))?;

    let sub_results = match value {
        Value::Array(sub_results) => sub_results,
        other => {
            return Err(malformed(format!(
                "expected multiquery response to be a JSON array, got {}",
                other
            )))
        }
    };

    let mut items = Vec::new();
    for label in batch.labels() {
        let sub_result = sub_results
            .iter()
            .find(|r| r.get("name").and_then(Value::as_str) == Some(label))
            .ok_or_else(|| malformed(format!("no sub-result named '{}'", label)))?;

        match sub_result.get("result") {
            Some(Value::Array(games)) => items.extend(games.iter().cloned()),
            _ => {
                return Err(malformed(format!(
                    "sub-result '{}' has no 'result' array",
                    label
                )))
            }
        }
    }

    Ok(items)
}

/// Sort key: the item's `name`, or "" when it has none
fn display_name(item: &Value) -> &str {
    item.get("name").and_then(Value::as_str).unwrap_or("")
}

/// Sorts items ascending by name (byte-wise, case-sensitive, stable)
pub fn sort_by_name(items: &mut [Value]) {
    items.sort_by(|a, b| display_name(a).cmp(display_name(b)));
}

/// Concatenates per-batch results in batch order, then sorts by name
pub fn merge_results(batches: Vec<Vec<Value>>) -> Vec<Value> {
    let mut items: Vec<Value> = batches.into_iter().flatten().collect();
    sort_by_name(&mut items);
    items
}
