//! Form schema: which inputs the page shows and the limits they enforce.

use serde::Serialize;

use crate::encoder::EncoderSet;
use crate::error::{PredictorError, Result};
use crate::record::{self, CarSpec, RawRecord, RawValue};

pub const MIN_PROD_YEAR: i64 = 1990;

const LEATHER_CHOICES: [&str; 2] = ["Yes", "No"];
const DOOR_CHOICES: [&str; 4] = ["02", "04", "06", "08"];
const WHEEL_CHOICES: [&str; 2] = ["Left wheel", "Right wheel"];

/// Input widget and its constraints.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldKind {
    Select { choices: Vec<String> },
    Text,
    Slider { min: i64, max: i64 },
    Integer { min: i64, max: Option<i64> },
    Float { min: f64, max: f64, step: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldSpec {
    /// Form input name (the `CarSpec` field).
    pub name: &'static str,
    /// Record column the value lands in.
    pub column: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub default: RawValue,
}

impl FieldSpec {
    fn select(name: &'static str, column: &'static str, label: &'static str, choices: Vec<String>) -> Self {
        let default = RawValue::Str(choices.first().cloned().unwrap_or_default());
        FieldSpec {
            name,
            column,
            label,
            kind: FieldKind::Select { choices },
            default,
        }
    }

    /// Inclusive bounds of a numeric field; `None` for strings.
    pub fn bounds(&self) -> Option<(f64, f64)> {
        match &self.kind {
            FieldKind::Slider { min, max } => Some((*min as f64, *max as f64)),
            FieldKind::Integer { min, max } => {
                Some((*min as f64, max.map_or(f64::INFINITY, |m| m as f64)))
            }
            FieldKind::Float { min, max, .. } => Some((*min, *max)),
            FieldKind::Select { .. } | FieldKind::Text => None,
        }
    }
}

/// All inputs of the page, in display order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormSchema {
    pub reference_year: i64,
    pub fields: Vec<FieldSpec>,
}

impl FormSchema {
    /// Build the schema; every encoder-backed select needs its encoder.
    pub fn new(encoders: &EncoderSet, reference_year: i64) -> Result<Self> {
        if reference_year < MIN_PROD_YEAR {
            return Err(PredictorError::config(format!(
                "reference year {} is before {}",
                reference_year, MIN_PROD_YEAR
            )));
        }
        let classes = |column: &str| -> Result<Vec<String>> {
            Ok(encoders.require(column)?.classes().to_vec())
        };
        let fixed = |choices: &[&str]| choices.iter().map(|c| c.to_string()).collect::<Vec<_>>();

        let fields = vec![
            FieldSpec::select("manufacturer", record::MANUFACTURER, "Manufacturer", classes(record::MANUFACTURER)?),
            FieldSpec {
                name: "model",
                column: record::MODEL,
                label: "Model",
                kind: FieldKind::Text,
                default: RawValue::from("Camry"),
            },
            FieldSpec {
                name: "prod_year",
                column: record::PROD_YEAR,
                label: "Production Year",
                kind: FieldKind::Slider {
                    min: MIN_PROD_YEAR,
                    max: reference_year,
                },
                default: RawValue::Int(reference_year.min(2020)),
            },
            FieldSpec::select("category", record::CATEGORY, "Category", classes(record::CATEGORY)?),
            FieldSpec::select("leather_interior", record::LEATHER_INTERIOR, "Leather Interior", fixed(&LEATHER_CHOICES)),
            FieldSpec::select("fuel_type", record::FUEL_TYPE, "Fuel Type", classes(record::FUEL_TYPE)?),
            FieldSpec {
                name: "engine_volume",
                column: record::ENGINE_VOLUME,
                label: "Engine Volume (L)",
                kind: FieldKind::Float {
                    min: 0.5,
                    max: 8.0,
                    step: 0.1,
                },
                default: RawValue::Float(2.0),
            },
            FieldSpec {
                name: "mileage",
                column: record::MILEAGE,
                label: "Mileage (km)",
                kind: FieldKind::Integer { min: 0, max: None },
                default: RawValue::Int(50000),
            },
            FieldSpec {
                name: "cylinders",
                column: record::CYLINDERS,
                label: "Cylinders",
                kind: FieldKind::Integer { min: 0, max: Some(16) },
                default: RawValue::Int(4),
            },
            FieldSpec::select("gear_box_type", record::GEAR_BOX_TYPE, "Gear Box Type", classes(record::GEAR_BOX_TYPE)?),
            FieldSpec::select("drive_wheels", record::DRIVE_WHEELS, "Drive Wheels", classes(record::DRIVE_WHEELS)?),
            FieldSpec::select("doors", record::DOORS, "Doors", fixed(&DOOR_CHOICES)),
            FieldSpec::select("wheel", record::WHEEL, "Wheel", fixed(&WHEEL_CHOICES)),
            FieldSpec::select("color", record::COLOR, "Color", classes(record::COLOR)?),
            FieldSpec {
                name: "airbags",
                column: record::AIRBAGS,
                label: "Airbags",
                kind: FieldKind::Integer { min: 0, max: Some(16) },
                default: RawValue::Int(6),
            },
            FieldSpec {
                name: "levy",
                column: record::LEVY,
                label: "Levy",
                kind: FieldKind::Integer { min: 0, max: None },
                default: RawValue::Int(0),
            },
        ];

        Ok(FormSchema {
            reference_year,
            fields,
        })
    }

    pub fn field(&self, column: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.column == column)
    }

    /// The submission a user gets by not touching any input.
    pub fn default_spec(&self) -> CarSpec {
        let text = |column: &str| {
            self.field(column)
                .map(|f| f.default.to_string())
                .unwrap_or_default()
        };
        let int = |column: &str| match self.field(column).map(|f| &f.default) {
            Some(RawValue::Int(v)) => *v,
            _ => 0,
        };
        CarSpec {
            manufacturer: text(record::MANUFACTURER),
            model: text(record::MODEL),
            prod_year: int(record::PROD_YEAR),
            category: text(record::CATEGORY),
            leather_interior: text(record::LEATHER_INTERIOR),
            fuel_type: text(record::FUEL_TYPE),
            engine_volume: self
                .field(record::ENGINE_VOLUME)
                .and_then(|f| f.default.as_f64())
                .unwrap_or_default(),
            mileage: int(record::MILEAGE),
            cylinders: int(record::CYLINDERS),
            gear_box_type: text(record::GEAR_BOX_TYPE),
            drive_wheels: text(record::DRIVE_WHEELS),
            doors: text(record::DOORS),
            wheel: text(record::WHEEL),
            color: text(record::COLOR),
            airbags: int(record::AIRBAGS),
            levy: int(record::LEVY),
        }
    }

    /// Check a submission against the numeric bounds and build its record.
    ///
    /// Categorical strings are not checked against the choices; unseen
    /// values are handled by the encoder fallback.
    pub fn collect(&self, spec: &CarSpec) -> Result<RawRecord> {
        let record = spec.to_record(self.reference_year);
        for field in &self.fields {
            let Some((min, max)) = field.bounds() else {
                continue;
            };
            let Some(value) = record.get(field.column).and_then(RawValue::as_f64) else {
                continue;
            };
            if !(min..=max).contains(&value) {
                return Err(PredictorError::OutOfRange {
                    field: field.label,
                    value,
                    min,
                    max,
                });
            }
        }
        Ok(record)
    }
}
