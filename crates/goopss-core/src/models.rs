//! Core data models for listings, optimization records, and tasks.
//!
//! Wire shapes follow what the upstream collaborators actually return:
//! marketplace listings use the marketplace's snake_case keys
//! (`listing_id`, `title`, ...), while optimization and task records use
//! the camelCase keys of the Firestore collections (`optimizedTitle`,
//! `customerId`, `dateCompleted`, ...).
//!
//! Deserialization is deliberately tolerant: optional fields may be absent
//! or `null`, `listing_id` and record ids may be numbers or strings, and
//! `dateCompleted` accepts several timestamp encodings (see
//! [`instant_from_wire`]). An unreadable `dateCompleted` is logged and read
//! as absent instead of failing the record.

use anyhow::{bail, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

// ═══════════════════════════════════════════════════════════════════════
// Listings
// ═══════════════════════════════════════════════════════════════════════

/// A marketplace product entry as returned by the listing backend.
///
/// Only the fields the reconciler cares about are typed; everything else
/// (price, url, state, ...) is kept in [`extra`](Self::extra) and passed
/// through to the reconciled record untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketplaceListing {
    #[serde(deserialize_with = "de_listing_id")]
    pub listing_id: i64,
    #[serde(default, deserialize_with = "de_null_default")]
    pub title: String,
    #[serde(default, deserialize_with = "de_null_default")]
    pub description: String,
    #[serde(default, deserialize_with = "de_null_default")]
    pub tags: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MarketplaceListing {
    pub fn new(listing_id: i64, title: impl Into<String>) -> Self {
        Self {
            listing_id,
            title: title.into(),
            description: String::new(),
            tags: Vec::new(),
            extra: Map::new(),
        }
    }
}

/// A stored optimization of one listing: the suggested replacement copy
/// plus a snapshot of the values it replaced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationRecord {
    #[serde(deserialize_with = "de_record_id")]
    pub id: String,
    #[serde(rename = "listing_id", deserialize_with = "de_listing_id")]
    pub listing_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optimized_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optimized_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optimized_tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optimization_status: Option<bool>,
    /// Pre-optimization title snapshot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Pre-optimization description snapshot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Pre-optimization tags snapshot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl OptimizationRecord {
    pub fn new(id: impl Into<String>, listing_id: i64) -> Self {
        Self {
            id: id.into(),
            listing_id,
            optimized_title: None,
            optimized_description: None,
            optimized_tags: None,
            optimization_status: None,
            title: None,
            description: None,
            tags: None,
        }
    }
}

/// One marketplace listing joined with its optimization record, if any.
///
/// Serializes as the listing's own fields followed by the camelCase
/// optimization fields. `id` and the `original*` snapshot fields are
/// omitted when unset.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciledListing {
    #[serde(flatten)]
    pub listing: MarketplaceListing,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub is_optimized: bool,
    pub optimized_title: String,
    pub optimized_description: String,
    pub optimized_tags: Vec<String>,
    pub optimization_status: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_tags: Option<Vec<String>>,
}

impl ReconciledListing {
    /// Drop pass-through listing keys that this record emits itself, so
    /// each key is serialized once and the reconciled value wins.
    pub fn without_shadowed_extra(mut self) -> Self {
        let emitted = [
            ("id", self.id.is_some()),
            ("isOptimized", true),
            ("optimizedTitle", true),
            ("optimizedDescription", true),
            ("optimizedTags", true),
            ("optimizationStatus", true),
            ("originalTitle", self.original_title.is_some()),
            ("originalDescription", self.original_description.is_some()),
            ("originalTags", self.original_tags.is_some()),
        ];
        self.listing
            .extra
            .retain(|key, _| !emitted.iter().any(|(k, on)| *on && k == key));
        self
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Tasks
// ═══════════════════════════════════════════════════════════════════════

/// A unit of work logged against a customer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "de_null_default")]
    pub customer_id: String,
    /// Raw category. `None` and the literal `"undefined"` both mean
    /// "uncategorized".
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "de_opt_instant")]
    pub date_completed: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl TaskRecord {
    pub fn new(customer_id: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            id: None,
            customer_id: customer_id.into(),
            category: Some(category.into()),
            date_completed: None,
            title: None,
        }
    }

    pub fn completed_at(mut self, at: DateTime<Utc>) -> Self {
        self.date_completed = Some(at);
        self
    }
}

/// Number of filtered tasks in one display category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCount {
    pub category: String,
    pub count: usize,
}

/// A completion-date window. Both bounds are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Parse both bounds with [`parse_instant`].
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        Ok(Self::new(parse_instant(start)?, parse_instant(end)?))
    }

    /// Whether `at` lies strictly between `start` and `end`.
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start < at && at < self.end
    }
}

/// Parse a timestamp given as RFC 3339, `YYYY-MM-DDTHH:MM:SS` (UTC), or a
/// bare `YYYY-MM-DD` date (midnight UTC).
pub fn parse_instant(s: &str) -> Result<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Ok(Utc.from_utc_datetime(&naive));
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }
    bail!("invalid date '{}': expected YYYY-MM-DD or RFC 3339", s)
}

// ═══════════════════════════════════════════════════════════════════════
// Wire helpers
// ═══════════════════════════════════════════════════════════════════════

fn de_null_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WireId {
    Int(i64),
    Float(f64),
    Text(String),
}

fn de_listing_id<'de, D>(deserializer: D) -> std::result::Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    match WireId::deserialize(deserializer)? {
        WireId::Int(n) => Ok(n),
        WireId::Float(f) if f.fract() == 0.0 => Ok(f as i64),
        WireId::Float(f) => Err(D::Error::custom(format!("invalid listing_id: {}", f))),
        WireId::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| D::Error::custom(format!("invalid listing_id: {:?}", s))),
    }
}

/// Record ids are strings upstream, but exports sometimes carry numbers.
fn de_record_id<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match WireId::deserialize(deserializer)? {
        WireId::Int(n) => n.to_string(),
        WireId::Float(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => (f as i64).to_string(),
        WireId::Float(f) => f.to_string(),
        WireId::Text(s) => s,
    })
}

/// `dateCompleted` never fails a record: values that cannot be read as an
/// instant are logged and become `None`.
fn de_opt_instant<'de, D>(deserializer: D) -> std::result::Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<Value>::deserialize(deserializer)? else {
        return Ok(None);
    };
    match instant_from_wire(&raw) {
        Ok(at) => Ok(at),
        Err(e) => {
            tracing::warn!(value = %raw, error = %e, "ignoring unreadable dateCompleted");
            Ok(None)
        }
    }
}

/// Read a wire timestamp.
///
/// Strings go through [`parse_instant`]; numbers are epoch millis (integer
/// or fractional); objects are Firestore `{seconds, nanoseconds}` or admin
/// SDK `{_seconds, _nanoseconds}`. `null` and blank strings are `None`.
pub fn instant_from_wire(value: &Value) -> Result<Option<DateTime<Utc>>> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::String(s) => parse_instant(s).map(Some),
        Value::Number(n) => {
            let millis = match n.as_i64() {
                Some(ms) => ms,
                None => match n.as_f64() {
                    Some(f) if f.is_finite() && f.abs() < i64::MAX as f64 => f.trunc() as i64,
                    _ => bail!("timestamp out of range: {}", n),
                },
            };
            match Utc.timestamp_millis_opt(millis).single() {
                Some(at) => Ok(Some(at)),
                None => bail!("timestamp out of range: {}", n),
            }
        }
        Value::Object(obj) => {
            let Some(seconds) = obj
                .get("seconds")
                .or_else(|| obj.get("_seconds"))
                .and_then(Value::as_i64)
            else {
                bail!("timestamp object without seconds");
            };
            let nanos = obj
                .get("nanoseconds")
                .or_else(|| obj.get("_nanoseconds"))
                .and_then(Value::as_u64)
                .unwrap_or(0);
            let nanos = u32::try_from(nanos).unwrap_or(0);
            match Utc.timestamp_opt(seconds, nanos).single() {
                Some(at) => Ok(Some(at)),
                None => bail!("timestamp out of range: {}", seconds),
            }
        }
        other => bail!("unsupported timestamp: {}", other),
    }
}
