//! Typed record model
//!
//! A [`Record`] is one row of inventory data: an ordered mapping from field
//! name to a scalar [`FieldValue`]. Records are produced by the normalizer from
//! uploaded CSV text, or decoded from the remote store's listing, in which case
//! they carry a store-assigned identifier ([`StoredRecord`]).

use crate::error::{IvtError, Result};
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

/// Largest integer an `f64` holds without losing digits (2^53 - 1).
pub const MAX_SAFE_INTEGER: i64 = 9_007_199_254_740_991;

/// Default identifier candidates, checked in order before the suffix rule.
pub const DEFAULT_IDENTIFIER_FIELDS: &[&str] = &["id", "inventario_id"];

/// Default case-insensitive identifier suffix.
pub const DEFAULT_IDENTIFIER_SUFFIX: &str = "_id";

/// A single scalar cell value
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Number(f64),
    /// Integer from the store too large for an `f64` to hold exactly
    Integer(i64),
    Boolean(bool),
    Null,
    String(String),
}

impl FieldValue {
    /// Convert a JSON value from the store into a field value.
    ///
    /// Arrays and objects are kept as their compact JSON text.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => FieldValue::Null,
            Value::Bool(b) => FieldValue::Boolean(*b),
            Value::Number(n) => match (n.as_i64(), n.as_f64()) {
                (Some(i), _) if i.unsigned_abs() > MAX_SAFE_INTEGER as u64 => {
                    FieldValue::Integer(i)
                },
                (_, Some(f)) => FieldValue::Number(f),
                _ => FieldValue::String(n.to_string()),
            },
            Value::String(s) => FieldValue::String(s.clone()),
            other => FieldValue::String(other.to_string()),
        }
    }

    /// Convert into a JSON value, writing integral numbers as integers
    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Number(n) => match integral(*n) {
                Some(i) => Value::from(i),
                None => serde_json::Number::from_f64(*n)
                    .map(Value::Number)
                    .unwrap_or(Value::Null),
            },
            FieldValue::Integer(i) => Value::from(*i),
            FieldValue::Boolean(b) => Value::Bool(*b),
            FieldValue::Null => Value::Null,
            FieldValue::String(s) => Value::String(s.clone()),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            FieldValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }
}

/// Integral value of `n` when it round-trips through `i64` without loss
fn integral(n: f64) -> Option<i64> {
    if n.is_finite() && n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER as f64 {
        Some(n as i64)
    } else {
        None
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Number(n) => match integral(*n) {
                Some(i) => write!(f, "{}", i),
                None => write!(f, "{}", n),
            },
            FieldValue::Integer(i) => write!(f, "{}", i),
            FieldValue::Boolean(b) => write!(f, "{}", b),
            FieldValue::Null => Ok(()),
            FieldValue::String(s) => f.write_str(s),
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            FieldValue::Number(n) => match integral(*n) {
                Some(i) => serializer.serialize_i64(i),
                None => serializer.serialize_f64(*n),
            },
            FieldValue::Integer(i) => serializer.serialize_i64(*i),
            FieldValue::Boolean(b) => serializer.serialize_bool(*b),
            FieldValue::Null => serializer.serialize_none(),
            FieldValue::String(s) => serializer.serialize_str(s),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::String(s.to_string())
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        FieldValue::Number(n)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Boolean(b)
    }
}

/// Ordered mapping of field name to value
///
/// Field order is insertion order. Missing fields are absent rather than null.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, FieldValue)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            fields: Vec::with_capacity(capacity),
        }
    }

    /// Insert a field, replacing the value in place if the name already exists
    pub fn insert(&mut self, name: impl Into<String>, value: FieldValue) {
        let name = name.into();
        match self.fields.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate over fields in order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    /// Build a record from a JSON object, keeping the object's key order
    pub fn from_json_object(object: &Map<String, Value>) -> Self {
        object
            .iter()
            .map(|(name, value)| (name.clone(), FieldValue::from_json(value)))
            .collect()
    }

    pub fn to_json(&self) -> Value {
        Value::Object(
            self.fields
                .iter()
                .map(|(name, value)| (name.clone(), value.to_json()))
                .collect(),
        )
    }

    /// Case-insensitive substring match against every rendered value.
    ///
    /// An empty term matches everything.
    pub fn matches(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return true;
        }
        self.fields
            .iter()
            .any(|(_, value)| value.to_string().to_lowercase().contains(&term))
    }
}

impl FromIterator<(String, FieldValue)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, FieldValue)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (name, value) in iter {
            record.insert(name, value);
        }
        record
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Store-assigned record identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RecordId {
    Number(i64),
    Text(String),
}

impl RecordId {
    /// Parse a user-supplied identifier
    ///
    /// Only canonical integers become numeric ids; anything else (`007`,
    /// `+5`) keeps its spelling so the request path is exactly what was typed.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        Some(match raw.parse::<i64>() {
            Ok(n) if n.to_string() == raw => RecordId::Number(n),
            _ => RecordId::Text(raw.to_string()),
        })
    }

    /// Identifier carried by a field value, if the value can be one
    pub fn from_value(value: &FieldValue) -> Option<Self> {
        match value {
            FieldValue::Number(n) => integral(*n).map(RecordId::Number),
            FieldValue::Integer(i) => Some(RecordId::Number(*i)),
            FieldValue::String(s) if !s.trim().is_empty() => {
                Some(RecordId::Text(s.trim().to_string()))
            },
            _ => None,
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Number(n) => write!(f, "{}", n),
            RecordId::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for RecordId {
    fn from(n: i64) -> Self {
        RecordId::Number(n)
    }
}

impl Serialize for RecordId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            RecordId::Number(n) => serializer.serialize_i64(*n),
            RecordId::Text(s) => serializer.serialize_str(s),
        }
    }
}

/// Ordered rule set for locating a record's identifier field
///
/// Explicit candidates are checked first, in order, by exact name. If none of
/// them holds a usable value, the first field (in record order) whose name ends
/// with the suffix, compared case-insensitively, is used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifierPolicy {
    candidates: Vec<String>,
    suffix: Option<String>,
}

impl Default for IdentifierPolicy {
    fn default() -> Self {
        Self {
            candidates: DEFAULT_IDENTIFIER_FIELDS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            suffix: Some(DEFAULT_IDENTIFIER_SUFFIX.to_string()),
        }
    }
}

impl IdentifierPolicy {
    pub fn new(candidates: Vec<String>, suffix: Option<String>) -> Result<Self> {
        if candidates.iter().any(|c| c.trim().is_empty()) {
            return Err(IvtError::Config(
                "identifier field names must not be empty".to_string(),
            ));
        }
        let suffix = suffix
            .map(|s| s.to_lowercase())
            .filter(|s| !s.is_empty());
        if candidates.is_empty() && suffix.is_none() {
            return Err(IvtError::Config(
                "at least one identifier field or a suffix is required".to_string(),
            ));
        }
        Ok(Self { candidates, suffix })
    }

    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    /// Name of the field holding the record's identifier
    pub fn field_name<'a>(&self, record: &'a Record) -> Option<&'a str> {
        self.locate(record).map(|(name, _)| name)
    }

    /// Resolve the record's identifier
    pub fn resolve(&self, record: &Record) -> Option<RecordId> {
        self.locate(record).map(|(_, id)| id)
    }

    fn locate<'a>(&self, record: &'a Record) -> Option<(&'a str, RecordId)> {
        for candidate in &self.candidates {
            if let Some((name, value)) = record.iter().find(|(name, _)| *name == candidate.as_str()) {
                if let Some(id) = RecordId::from_value(value) {
                    return Some((name, id));
                }
            }
        }

        let suffix = self.suffix.as_deref()?;
        record.iter().find_map(|(name, value)| {
            if name.to_lowercase().ends_with(suffix) {
                RecordId::from_value(value).map(|id| (name, id))
            } else {
                None
            }
        })
    }
}

/// A record as returned by the remote store
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
    pub record: Record,
    /// Name of the field the identifier was read from
    pub id_field: Option<String>,
    /// `None` when the record has no deletable identifier
    pub id: Option<RecordId>,
}

impl StoredRecord {
    pub fn from_record(record: Record, policy: &IdentifierPolicy) -> Self {
        let located = policy.locate(&record);
        let (id_field, id) = match located {
            Some((name, id)) => (Some(name.to_string()), Some(id)),
            None => (None, None),
        };
        Self {
            record,
            id_field,
            id,
        }
    }

    /// Decode one listing entry; non-objects yield `None`
    pub fn from_json(value: &Value, policy: &IdentifierPolicy) -> Option<Self> {
        value
            .as_object()
            .map(|object| Self::from_record(Record::from_json_object(object), policy))
    }

    pub fn is_deletable(&self) -> bool {
        self.id.is_some()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(pairs: &[(&str, FieldValue)]) -> Record {
        pairs
            .iter()
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect()
    }

    #[test]
    fn test_record_preserves_insertion_order() {
        let mut r = Record::new();
        r.insert("zeta", FieldValue::Number(1.0));
        r.insert("alpha", FieldValue::Null);
        r.insert("mid", "x".into());
        assert_eq!(r.field_names().collect::<Vec<_>>(), vec!["zeta", "alpha", "mid"]);

        r.insert("zeta", FieldValue::Boolean(true));
        assert_eq!(r.len(), 3);
        assert_eq!(r.get("zeta"), Some(&FieldValue::Boolean(true)));
    }

    #[test]
    fn test_record_serializes_integral_numbers_as_integers() {
        let r = record(&[
            ("codigo", "PROD001".into()),
            ("EAN", FieldValue::Number(7891234567890.0)),
            ("peso", FieldValue::Number(1.5)),
            ("ativo", FieldValue::Boolean(true)),
            ("obs", FieldValue::Null),
        ]);
        let text = serde_json::to_string(&r).unwrap();
        assert_eq!(
            text,
            r#"{"codigo":"PROD001","EAN":7891234567890,"peso":1.5,"ativo":true,"obs":null}"#
        );
        assert_eq!(r.to_json(), serde_json::from_str::<Value>(&text).unwrap());
    }

    #[test]
    fn test_field_value_from_nested_json_keeps_text() {
        let value = FieldValue::from_json(&json!({"a": [1, 2]}));
        assert_eq!(value, FieldValue::String(r#"{"a":[1,2]}"#.to_string()));
    }

    #[test]
    fn test_policy_prefers_literal_id() {
        let policy = IdentifierPolicy::default();
        let r = record(&[
            ("produto_id", FieldValue::Number(9.0)),
            ("inventario_id", FieldValue::Number(7.0)),
            ("id", FieldValue::Number(3.0)),
        ]);
        assert_eq!(policy.resolve(&r), Some(RecordId::Number(3)));
        assert_eq!(policy.field_name(&r), Some("id"));
    }

    #[test]
    fn test_policy_falls_back_to_inventario_id_then_suffix() {
        let policy = IdentifierPolicy::default();
        let r = record(&[
            ("Produto_ID", "abc".into()),
            ("inventario_id", FieldValue::Number(7.0)),
        ]);
        assert_eq!(policy.resolve(&r), Some(RecordId::Number(7)));

        let r = record(&[("descricao", "x".into()), ("Produto_ID", "abc".into())]);
        assert_eq!(policy.resolve(&r), Some(RecordId::Text("abc".to_string())));
        assert_eq!(policy.field_name(&r), Some("Produto_ID"));
    }

    #[test]
    fn test_policy_skips_unusable_values() {
        let policy = IdentifierPolicy::default();
        let r = record(&[("id", FieldValue::Null), ("loja_id", FieldValue::Number(12.0))]);
        assert_eq!(policy.resolve(&r), Some(RecordId::Number(12)));

        let r = record(&[("id", FieldValue::Number(1.5)), ("descricao", "x".into())]);
        assert_eq!(policy.resolve(&r), None);
    }

    #[test]
    fn test_policy_without_identifier() {
        let policy = IdentifierPolicy::default();
        let r = record(&[("descricao", "x".into()), ("video", "y".into())]);
        assert_eq!(policy.resolve(&r), None);
        let stored = StoredRecord::from_record(r, &policy);
        assert!(!stored.is_deletable());
        assert_eq!(stored.id_field, None);
    }

    #[test]
    fn test_policy_rejects_empty_configuration() {
        assert!(IdentifierPolicy::new(vec![], None).is_err());
        assert!(IdentifierPolicy::new(vec![" ".to_string()], Some("_id".into())).is_err());
        let policy = IdentifierPolicy::new(vec!["sku".to_string()], None).unwrap();
        let r = record(&[("id", FieldValue::Number(1.0)), ("sku", "A-1".into())]);
        assert_eq!(policy.resolve(&r), Some(RecordId::Text("A-1".to_string())));
    }

    #[test]
    fn test_stored_record_from_json() {
        let policy = IdentifierPolicy::default();
        let stored = StoredRecord::from_json(
            &json!({"id": 42, "descricao": "Kit", "created_at": 1700000000000_i64}),
            &policy,
        )
        .unwrap();
        assert_eq!(stored.id, Some(RecordId::Number(42)));
        assert_eq!(
            stored.record.field_names().collect::<Vec<_>>(),
            vec!["id", "descricao", "created_at"]
        );
        assert!(StoredRecord::from_json(&json!("nope"), &policy).is_none());
    }

    #[test]
    fn test_record_matches_is_case_insensitive() {
        let r = record(&[("descricao", "Caixa Organizadora".into()), ("qtd", FieldValue::Number(10.0))]);
        assert!(r.matches("caixa"));
        assert!(r.matches("ORGANIZ"));
        assert!(r.matches("10"));
        assert!(r.matches(""));
        assert!(!r.matches("kit"));
    }

    #[test]
    fn test_record_id_parse() {
        assert_eq!(RecordId::parse("17"), Some(RecordId::Number(17)));
        assert_eq!(RecordId::parse("-3"), Some(RecordId::Number(-3)));
        assert_eq!(RecordId::parse(" abc-1 "), Some(RecordId::Text("abc-1".to_string())));
        assert_eq!(RecordId::parse("  "), None);
        assert_eq!(RecordId::Number(17).to_string(), "17");
    }

    #[test]
    fn test_record_id_parse_keeps_non_canonical_spelling() {
        assert_eq!(RecordId::parse("007"), Some(RecordId::Text("007".to_string())));
        assert_eq!(RecordId::parse("+5"), Some(RecordId::Text("+5".to_string())));
        assert_eq!(RecordId::parse("007").unwrap().to_string(), "007");
    }

    #[test]
    fn test_large_store_integer_id_is_exact() {
        let policy = IdentifierPolicy::default();
        let stored = StoredRecord::from_json(
            &json!({"id": 9007199254740993_i64, "descricao": "Kit"}),
            &policy,
        )
        .unwrap();
        assert_eq!(stored.id, Some(RecordId::Number(9007199254740993)));
        assert_eq!(stored.id.unwrap().to_string(), "9007199254740993");
        assert_eq!(stored.record.to_json()["id"], json!(9007199254740993_i64));
        assert!(stored.record.matches("740993"));

        // Safe-range integers keep the usual representation
        let small = FieldValue::from_json(&json!(42));
        assert_eq!(small, FieldValue::Number(42.0));
    }
}
