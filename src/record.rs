//! Raw input records and the typed car specification they are built from.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Year car age is measured against.
pub const REFERENCE_YEAR: i64 = 2025;

// Column names the model artifacts were produced with.
pub const ID: &str = "ID";
pub const LEVY: &str = "Levy";
pub const MANUFACTURER: &str = "Manufacturer";
pub const MODEL: &str = "Model";
pub const PROD_YEAR: &str = "Prod._year";
pub const CATEGORY: &str = "Category";
pub const LEATHER_INTERIOR: &str = "Leather_interior";
pub const FUEL_TYPE: &str = "Fuel_type";
pub const ENGINE_VOLUME: &str = "Engine_volume";
pub const MILEAGE: &str = "Mileage";
pub const CYLINDERS: &str = "Cylinders";
pub const GEAR_BOX_TYPE: &str = "Gear_box_type";
pub const DRIVE_WHEELS: &str = "Drive_wheels";
pub const DOORS: &str = "Doors";
pub const WHEEL: &str = "Wheel";
pub const COLOR: &str = "Color";
pub const AIRBAGS: &str = "Airbags";
pub const CAR_AGE: &str = "Car_Age";

/// A single user-provided value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Int(i64),
    Float(f64),
    Str(String),
}

impl RawValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            RawValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric view of the value. Strings are parsed, so `"04"` is 4.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            RawValue::Int(v) => Some(*v as f64),
            RawValue::Float(v) => Some(*v),
            RawValue::Str(s) => s.trim().parse().ok(),
        }
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::Int(v) => write!(f, "{}", v),
            RawValue::Float(v) => write!(f, "{}", v),
            RawValue::Str(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for RawValue {
    fn from(v: i64) -> Self {
        RawValue::Int(v)
    }
}

impl From<i32> for RawValue {
    fn from(v: i32) -> Self {
        RawValue::Int(v.into())
    }
}

impl From<f64> for RawValue {
    fn from(v: f64) -> Self {
        RawValue::Float(v)
    }
}

impl From<&str> for RawValue {
    fn from(v: &str) -> Self {
        RawValue::Str(v.to_string())
    }
}

impl From<String> for RawValue {
    fn from(v: String) -> Self {
        RawValue::Str(v)
    }
}

/// Field name to value, in the order the fields were collected.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRecord {
    fields: Vec<(String, RawValue)>,
}

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `name`, replacing an existing value in place.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<RawValue>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((name, value)),
        }
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<RawValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn remove(&mut self, name: &str) -> Option<RawValue> {
        let pos = self.fields.iter().position(|(n, _)| n == name)?;
        Some(self.fields.remove(pos).1)
    }

    pub fn get(&self, name: &str) -> Option<&RawValue> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn columns(&self) -> Vec<String> {
        self.fields.iter().map(|(n, _)| n.clone()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RawValue)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for RawRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Age of a car produced in `prod_year`. Saturates instead of overflowing
/// so an unchecked submission can still be turned into a record.
pub fn car_age(reference_year: i64, prod_year: i64) -> i64 {
    reference_year.saturating_sub(prod_year)
}

/// One form submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarSpec {
    pub manufacturer: String,
    pub model: String,
    pub prod_year: i64,
    pub category: String,
    pub leather_interior: String,
    pub fuel_type: String,
    pub engine_volume: f64,
    pub mileage: i64,
    pub cylinders: i64,
    pub gear_box_type: String,
    pub drive_wheels: String,
    pub doors: String,
    pub wheel: String,
    pub color: String,
    pub airbags: i64,
    pub levy: i64,
}

impl CarSpec {
    /// Build the raw record with the exact column names, plus `Car_Age`.
    pub fn to_record(&self, reference_year: i64) -> RawRecord {
        RawRecord::new()
            .with(ID, 0i64)
            .with(LEVY, self.levy)
            .with(MANUFACTURER, self.manufacturer.as_str())
            .with(MODEL, self.model.as_str())
            .with(PROD_YEAR, self.prod_year)
            .with(CATEGORY, self.category.as_str())
            .with(LEATHER_INTERIOR, self.leather_interior.as_str())
            .with(FUEL_TYPE, self.fuel_type.as_str())
            .with(ENGINE_VOLUME, self.engine_volume)
            .with(MILEAGE, self.mileage)
            .with(CYLINDERS, self.cylinders)
            .with(GEAR_BOX_TYPE, self.gear_box_type.as_str())
            .with(DRIVE_WHEELS, self.drive_wheels.as_str())
            .with(DOORS, self.doors.as_str())
            .with(WHEEL, self.wheel.as_str())
            .with(COLOR, self.color.as_str())
            .with(AIRBAGS, self.airbags)
            .with(CAR_AGE, car_age(reference_year, self.prod_year))
    }
}
