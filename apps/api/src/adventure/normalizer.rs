//! Response Normalizer — turns raw completion text into a schema-valid `Adventure`.
//!
//! Flow: unwrap fences → parse → repair (interests, vibe, scalars, stops, stats)
//!       → final schema check.
//!
//! Only two exits are fatal: text that is not JSON at all (`Parse`), and a
//! repaired record that still breaks the `Adventure` invariants (`Schema`).
//! Every repair step is a plain function over the loosely typed record so each
//! can be exercised on its own.

use std::sync::OnceLock;

use rand::Rng;
use regex::Regex;
use serde_json::{json, Map, Value};
use thiserror::Error;
use tracing::warn;

use crate::adventure::models::{Adventure, AdventureRequest, Vibe};

pub type Record = Map<String, Value>;

#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("response is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("response violates the adventure schema: {}", .0.join(", "))]
    Schema(Vec<String>),
}

const FUN_FACTOR_MIN: i64 = 1;
const FUN_FACTOR_MAX: i64 = 10;
const DEFAULT_COST: &str = "$10-20";
const STOP_FIELDS: [&str; 5] = ["time", "location", "activity", "duration", "quirkyDetail"];

fn dollar_amount() -> &'static Regex {
    static DOLLAR_AMOUNT: OnceLock<Regex> = OnceLock::new();
    DOLLAR_AMOUNT.get_or_init(|| Regex::new(r"^\$\d+").expect("static regex"))
}

/// Normalizes with the thread-local RNG for fun-factor fallbacks.
pub fn normalize(raw: &str, request: &AdventureRequest) -> Result<Adventure, NormalizeError> {
    normalize_with_rng(raw, request, &mut rand::thread_rng())
}

pub fn normalize_with_rng<R: Rng>(
    raw: &str,
    request: &AdventureRequest,
    rng: &mut R,
) -> Result<Adventure, NormalizeError> {
    let value = parse_reply(raw)?;

    let mut record = match value {
        Value::Object(map) => map,
        other => {
            warn!("Completion root is {}, not an object", type_name(&other));
            return Err(NormalizeError::Schema(vec!["$".to_string()]));
        }
    };

    repair(&mut record, request, rng);
    validate_schema(record)
}

/// Runs every repair step, in order. A no-op on an already valid record.
pub fn repair<R: Rng>(record: &mut Record, request: &AdventureRequest, rng: &mut R) {
    coerce_interests(record);
    coerce_vibe(record, request);
    backfill_scalars(record, request);
    repair_stops(record);
    repair_stats(record, rng);
}

// ────────────────────────────────────────────────────────────────────────────
// Steps 1–2: unwrap formatting, parse
// ────────────────────────────────────────────────────────────────────────────

/// Parses the reply as-is first; fences are only stripped when that fails, so
/// backticks inside JSON string values never count as a fence.
fn parse_reply(raw: &str) -> Result<Value, NormalizeError> {
    match serde_json::from_str(raw.trim()) {
        Ok(value) => Ok(value),
        Err(e) if !raw.contains("```") => Err(e.into()),
        Err(_) => Ok(serde_json::from_str(unwrap_fences(raw))?),
    }
}

/// Returns the body of the first fenced code block, or the trimmed input when
/// there is no fence. Handles ```json and bare ``` openers, and a missing closer.
pub fn unwrap_fences(text: &str) -> &str {
    let Some(open) = text.find("```") else {
        return text.trim();
    };
    let after_open = &text[open + 3..];
    // Skip the language tag (if any) up to the end of the opening line.
    let body = match after_open.find('\n') {
        Some(newline) if !after_open[..newline].contains('{') => &after_open[newline + 1..],
        _ => after_open.trim_start_matches(|c: char| c.is_ascii_alphabetic()),
    };
    match body.find("```") {
        Some(close) => body[..close].trim(),
        None => body.trim(),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Steps 3–7: repairs
// ────────────────────────────────────────────────────────────────────────────

/// Joins an `interests` array into one `", "`-separated string.
pub fn coerce_interests(record: &mut Record) {
    if let Some(Value::Array(items)) = record.get("interests") {
        let joined = items
            .iter()
            .map(|item| match item {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join(", ");
        record.insert("interests".to_string(), Value::String(joined));
    }
}

/// Lower-cases a present vibe; anything outside the enum falls back to the
/// requested vibe, then `balanced`.
pub fn coerce_vibe(record: &mut Record, request: &AdventureRequest) {
    let Some(raw) = record.get("vibe") else {
        return;
    };
    if raw.is_null() {
        record.remove("vibe");
        return;
    }

    let vibe = raw
        .as_str()
        .and_then(|s| Vibe::parse(&s.to_lowercase()))
        .unwrap_or_else(|| {
            let fallback = request.vibe.unwrap_or(Vibe::Balanced);
            warn!("Replacing unknown vibe {raw} with '{fallback}'");
            fallback
        });
    record.insert("vibe".to_string(), json!(vibe.as_str()));
}

/// Fills an empty or missing `timeWindow` and `title` from the request.
pub fn backfill_scalars(record: &mut Record, request: &AdventureRequest) {
    if is_blank(record.get("timeWindow")) {
        record.insert("timeWindow".to_string(), json!(request.time_window));
    }
    if is_blank(record.get("title")) {
        warn!("Completion omitted a title; synthesizing one");
        record.insert(
            "title".to_string(),
            json!(format!("Adventure in {}", request.location)),
        );
    }
}

/// Substitutes a single placeholder stop when `stops` is missing, not an
/// array, or empty. Malformed entries inside a non-empty array are left for
/// the schema check.
pub fn repair_stops(record: &mut Record) {
    let usable = matches!(record.get("stops"), Some(Value::Array(stops)) if !stops.is_empty());
    if !usable {
        warn!("Completion had no usable stops; inserting placeholder");
        record.insert("stops".to_string(), json!([placeholder_stop()]));
    }
}

fn placeholder_stop() -> Value {
    json!({
        "time": "Start time",
        "location": "First stop",
        "activity": "Begin your adventure",
        "duration": "30 minutes",
        "quirkyDetail": "Look for the hidden details"
    })
}

/// Synthesizes missing stats, fills travel time, clamps the fun factor, and
/// canonicalizes cost.
pub fn repair_stats<R: Rng>(record: &mut Record, rng: &mut R) {
    if !matches!(record.get("stats"), Some(Value::Object(_))) {
        warn!("Completion omitted stats; synthesizing defaults");
        record.insert(
            "stats".to_string(),
            json!({
                "travelTime": "Varies",
                "cost": "N/A",
                "funFactor": random_fun_factor(rng)
            }),
        );
        return;
    }
    let Some(Value::Object(stats)) = record.get_mut("stats") else {
        return;
    };

    if is_blank(stats.get("travelTime")) {
        stats.insert("travelTime".to_string(), json!("Varies"));
    }

    let fun_factor = match stats.get("funFactor").and_then(valid_fun_factor) {
        Some(score) => score,
        None => {
            warn!(
                "Replacing invalid funFactor {}",
                stats.get("funFactor").unwrap_or(&serde_json::Value::Null)
            );
            random_fun_factor(rng)
        }
    };
    stats.insert("funFactor".to_string(), json!(fun_factor));

    let cost = stats.get("cost").and_then(Value::as_str);
    if !cost.is_some_and(|c| dollar_amount().is_match(c)) {
        let canonical = canonical_cost(cost);
        stats.insert("cost".to_string(), json!(canonical));
    }
}

/// Maps `$`-tier shorthand onto fixed ranges. Unknown values get the low tier.
pub fn canonical_cost(cost: Option<&str>) -> &'static str {
    match cost {
        Some("$") => "$10-20",
        Some("$$") => "$20-50",
        Some("$$$") => "$50-100",
        Some("$$$$") => "$100+",
        Some("N/A") => "N/A",
        _ => DEFAULT_COST,
    }
}

/// In-range numbers, rounded to the nearest whole score.
fn valid_fun_factor(value: &Value) -> Option<i64> {
    let n = value.as_f64()?;
    if !(FUN_FACTOR_MIN as f64..=FUN_FACTOR_MAX as f64).contains(&n) {
        return None;
    }
    Some((n.round() as i64).clamp(FUN_FACTOR_MIN, FUN_FACTOR_MAX))
}

fn random_fun_factor<R: Rng>(rng: &mut R) -> i64 {
    rng.gen_range(FUN_FACTOR_MIN..=FUN_FACTOR_MAX)
}

// ────────────────────────────────────────────────────────────────────────────
// Step 8: final schema check
// ────────────────────────────────────────────────────────────────────────────

/// Checks every `Adventure` invariant, reporting all violated paths at once.
pub fn validate_schema(record: Record) -> Result<Adventure, NormalizeError> {
    let violations = schema_violations(&record);
    if !violations.is_empty() {
        return Err(NormalizeError::Schema(violations));
    }

    serde_json::from_value(Value::Object(record))
        .map_err(|e| NormalizeError::Schema(vec![e.to_string()]))
}

fn schema_violations(record: &Record) -> Vec<String> {
    let mut violations = Vec::new();

    for field in ["location", "interests"] {
        if !record.get(field).is_some_and(Value::is_string) {
            violations.push(field.to_string());
        }
    }
    for field in ["timeWindow", "title"] {
        let value = record.get(field);
        if is_blank(value) || !value.is_some_and(Value::is_string) {
            violations.push(field.to_string());
        }
    }

    match record.get("vibe") {
        None => {}
        Some(v) if v.as_str().and_then(Vibe::parse).is_some() => {}
        Some(_) => violations.push("vibe".to_string()),
    }

    match record.get("approximationTime") {
        None | Some(Value::Null) | Some(Value::String(_)) => {}
        Some(_) => violations.push("approximationTime".to_string()),
    }

    match record.get("stops") {
        Some(Value::Array(stops)) if !stops.is_empty() => {
            for (i, stop) in stops.iter().enumerate() {
                for field in STOP_FIELDS {
                    if !stop.get(field).is_some_and(Value::is_string) {
                        violations.push(format!("stops[{i}].{field}"));
                    }
                }
            }
        }
        _ => violations.push("stops".to_string()),
    }

    match record.get("stats") {
        Some(Value::Object(stats)) => {
            if !stats.get("travelTime").is_some_and(Value::is_string) {
                violations.push("stats.travelTime".to_string());
            }
            let cost_ok = stats
                .get("cost")
                .and_then(Value::as_str)
                .is_some_and(|c| c == "N/A" || dollar_amount().is_match(c));
            if !cost_ok {
                violations.push("stats.cost".to_string());
            }
            let fun_ok = stats
                .get("funFactor")
                .and_then(Value::as_i64)
                .is_some_and(|n| (FUN_FACTOR_MIN..=FUN_FACTOR_MAX).contains(&n));
            if !fun_ok {
                violations.push("stats.funFactor".to_string());
            }
        }
        _ => violations.push("stats".to_string()),
    }

    violations
}

fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
