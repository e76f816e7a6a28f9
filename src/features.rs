//! Request record and the translation from an inbound JSON body into it.
//!
//! The front end speaks Indonesian field names (`kota`, `luas_tanah`, ...)
//! while the model was trained on the English column names. Both spellings
//! are accepted; after remapping, the six required fields must be present
//! and the five numeric ones must coerce to `f64`.

use crate::error::{ApiError, FeatureError};
use serde::Serialize;
use serde_json::{Map, Value};

/// Localized name -> canonical model feature name.
pub const FIELD_ALIASES: [(&str, &str); 6] = [
    ("kota", "location"),
    ("jumlah_kamar_tidur", "bed"),
    ("jumlah_kamar_mandi", "bath"),
    ("muatan_parkir", "carport"),
    ("luas_tanah", "surface_area"),
    ("luas_bangunan", "building_area"),
];

/// Canonical names, in the order they are reported when missing.
pub const REQUIRED_FIELDS: [&str; 6] = [
    "location",
    "bed",
    "bath",
    "carport",
    "surface_area",
    "building_area",
];

/// The numeric subset of [`REQUIRED_FIELDS`].
pub const NUMERIC_FIELDS: [&str; 5] = ["bed", "bath", "carport", "surface_area", "building_area"];

/// One property to price. Lives for a single request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyFeatures {
    pub location: String,
    pub bed: f64,
    pub bath: f64,
    pub carport: f64,
    pub surface_area: f64,
    pub building_area: f64,
}

impl PropertyFeatures {
    /// Full request pipeline: object check, alias remap, presence check,
    /// then coercion.
    pub fn from_payload(payload: Value) -> Result<Self, ApiError> {
        let map = match payload {
            Value::Object(map) if !map.is_empty() => map,
            _ => return Err(ApiError::EmptyBody),
        };

        let mapped = remap_fields(map);
        let missing = missing_fields(&mapped);
        if !missing.is_empty() {
            return Err(ApiError::MissingFields(
                missing.into_iter().map(str::to_owned).collect(),
            ));
        }

        // presence was checked above, NULL stands in only to satisfy the lookup
        static NULL: Value = Value::Null;
        let get = |k: &str| mapped.get(k).unwrap_or(&NULL);
        Ok(Self {
            location: location_label(get("location"))?,
            bed: coerce_number("bed", get("bed"))?,
            bath: coerce_number("bath", get("bath"))?,
            carport: coerce_number("carport", get("carport"))?,
            surface_area: coerce_number("surface_area", get("surface_area"))?,
            building_area: coerce_number("building_area", get("building_area"))?,
        })
    }

    /// Value of a numeric column by its canonical name.
    pub fn numeric(&self, name: &str) -> Option<f64> {
        match name {
            "bed" => Some(self.bed),
            "bath" => Some(self.bath),
            "carport" => Some(self.carport),
            "surface_area" => Some(self.surface_area),
            "building_area" => Some(self.building_area),
            _ => None,
        }
    }
}

/// Alias lookup; unknown keys map to themselves.
pub fn canonical_name(key: &str) -> &str {
    FIELD_ALIASES
        .iter()
        .find(|(alias, _)| *alias == key)
        .map(|(_, canonical)| *canonical)
        .unwrap_or(key)
}

/// Renames every key through [`FIELD_ALIASES`]. If a payload carries both an
/// alias and its canonical key, the later one in the document wins.
pub fn remap_fields(map: Map<String, Value>) -> Map<String, Value> {
    let mut out = Map::with_capacity(map.len());
    for (k, v) in map {
        let name = canonical_name(&k).to_owned();
        out.insert(name, v);
    }
    out
}

/// Required fields that are absent, `null` or `""`.
pub fn missing_fields(map: &Map<String, Value>) -> Vec<&'static str> {
    REQUIRED_FIELDS
        .iter()
        .copied()
        .filter(|f| match map.get(*f) {
            None | Some(Value::Null) => true,
            Some(Value::String(s)) => s.is_empty(),
            Some(_) => false,
        })
        .collect()
}

/// Lenient float conversion: numbers as-is, booleans as 0/1, strings trimmed
/// and parsed.
pub fn coerce_number(field: &str, value: &Value) -> Result<f64, FeatureError> {
    match value {
        Value::Number(n) => n.as_f64().ok_or_else(|| FeatureError::NotANumber {
            field: field.to_owned(),
            value: n.to_string(),
        }),
        Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => s.trim().parse::<f64>().map_err(|_| FeatureError::NotANumber {
            field: field.to_owned(),
            value: s.clone(),
        }),
        other => Err(FeatureError::WrongType {
            field: field.to_owned(),
            kind: kind_of(other),
        }),
    }
}

/// Categorical location as a label. Scalars are accepted, containers are not.
pub fn location_label(value: &Value) -> Result<String, FeatureError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(FeatureError::WrongType {
            field: "location".to_owned(),
            kind: kind_of(other),
        }),
    }
}

fn kind_of(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
