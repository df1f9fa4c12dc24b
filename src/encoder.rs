//! Label encoders for categorical fields.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use crate::error::{PredictorError, Result};

/// Code passed to the model for a category never seen during training.
pub const UNKNOWN_CATEGORY: i64 = -1;

/// Maps a fixed set of category strings to integer codes.
///
/// A class's code is its position in the list the encoder was built from,
/// so an exported `classes_` array keeps the codes the model was trained
/// with. Duplicate classes are rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct LabelEncoder {
    classes: Vec<String>,
    codes: HashMap<String, i64>,
}

impl LabelEncoder {
    pub fn new<I, S>(classes: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let classes: Vec<String> = classes.into_iter().map(Into::into).collect();
        let mut codes = HashMap::with_capacity(classes.len());
        for (i, class) in classes.iter().enumerate() {
            if codes.insert(class.clone(), i as i64).is_some() {
                return Err(PredictorError::DuplicateClass(class.clone()));
            }
        }
        Ok(LabelEncoder { classes, codes })
    }

    /// Known classes in code order.
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn contains(&self, value: &str) -> bool {
        self.codes.contains_key(value)
    }

    /// Code for `value`, or `None` if it is not a known class.
    pub fn transform(&self, value: &str) -> Option<i64> {
        self.codes.get(value).copied()
    }
}

impl TryFrom<Vec<String>> for LabelEncoder {
    type Error = PredictorError;

    fn try_from(classes: Vec<String>) -> Result<Self> {
        LabelEncoder::new(classes)
    }
}

impl From<LabelEncoder> for Vec<String> {
    fn from(encoder: LabelEncoder) -> Self {
        encoder.classes
    }
}

/// Outcome of encoding one categorical value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "code")]
pub enum Encoded {
    Known(i64),
    Unknown,
}

impl Encoded {
    /// Integer fed to the model; `Unknown` becomes [`UNKNOWN_CATEGORY`].
    pub fn code(self) -> i64 {
        match self {
            Encoded::Known(code) => code,
            Encoded::Unknown => UNKNOWN_CATEGORY,
        }
    }

    pub fn is_unknown(self) -> bool {
        matches!(self, Encoded::Unknown)
    }
}

/// Encode `value`, falling back to `Unknown` for unseen categories.
pub fn safe_encode(encoder: &LabelEncoder, value: &str) -> Encoded {
    match encoder.transform(value) {
        Some(code) => Encoded::Known(code),
        None => Encoded::Unknown,
    }
}

/// Encoders keyed by the column they apply to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncoderSet {
    encoders: BTreeMap<String, LabelEncoder>,
}

impl EncoderSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read an encoder set from a JSON object of `column -> [classes]`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let txt = fs::read_to_string(path)
            .map_err(|e| PredictorError::artifact(path.display().to_string(), e))?;
        serde_json::from_str(&txt)
            .map_err(|e| PredictorError::artifact(path.display().to_string(), e))
    }

    pub fn with(mut self, column: impl Into<String>, encoder: LabelEncoder) -> Self {
        self.encoders.insert(column.into(), encoder);
        self
    }

    pub fn get(&self, column: &str) -> Option<&LabelEncoder> {
        self.encoders.get(column)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.encoders.contains_key(column)
    }

    /// Like [`EncoderSet::get`] but a missing encoder is an error.
    pub fn require(&self, column: &str) -> Result<&LabelEncoder> {
        self.get(column)
            .ok_or_else(|| PredictorError::MissingEncoder(column.to_string()))
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.encoders.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.encoders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.encoders.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manufacturers() -> LabelEncoder {
        LabelEncoder::new(["TOYOTA", "BMW", "Toyota", "AUDI"]).unwrap()
    }

    #[test]
    fn test_codes_follow_given_order() {
        let enc = manufacturers();
        assert_eq!(enc.classes(), ["TOYOTA", "BMW", "Toyota", "AUDI"]);
        assert_eq!(enc.transform("TOYOTA"), Some(0));
        assert_eq!(enc.transform("AUDI"), Some(3));
        assert!(enc.contains("Toyota"));
    }

    #[test]
    fn test_duplicate_class_rejected() {
        let err = LabelEncoder::new(["BMW", "Audi", "BMW"]).unwrap_err();
        assert!(matches!(err, PredictorError::DuplicateClass(c) if c == "BMW"));

        let err = serde_json::from_str::<EncoderSet>(r#"{"Color": ["Red", "Red"]}"#).unwrap_err();
        assert!(err.to_string().contains("Duplicate encoder class"));
    }

    #[test]
    fn test_safe_encode_matches_transform_for_known_classes() {
        let enc = manufacturers();
        for class in enc.classes() {
            let expected = enc.transform(class).unwrap();
            assert_eq!(safe_encode(&enc, class), Encoded::Known(expected));
            assert_eq!(safe_encode(&enc, class).code(), expected);
        }
    }

    #[test]
    fn test_unseen_category_falls_back_to_sentinel() {
        let enc = manufacturers();
        let out = safe_encode(&enc, "Zzyzx");
        assert_eq!(out, Encoded::Unknown);
        assert_eq!(out.code(), UNKNOWN_CATEGORY);
        // case matters
        assert!(safe_encode(&enc, "toyota").is_unknown());
        assert!(safe_encode(&enc, "").is_unknown());
    }

    #[test]
    fn test_code_zero_is_distinct_from_unknown() {
        let enc = manufacturers();
        let first = safe_encode(&enc, "TOYOTA");
        assert_eq!(first, Encoded::Known(0));
        assert!(!first.is_unknown());
    }

    #[test]
    fn test_encoder_set_from_json_keeps_artifact_codes() {
        let json = r#"{"Color": ["White", "Black"], "Wheel": ["Left wheel", "Right wheel"]}"#;
        let set: EncoderSet = serde_json::from_str(json).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.get("Color").unwrap().transform("White"), Some(0));
        assert_eq!(safe_encode(set.get("Color").unwrap(), "Black"), Encoded::Known(1));
        assert_eq!(serde_json::to_string(set.get("Color").unwrap()).unwrap(), r#"["White","Black"]"#);
        assert!(matches!(
            set.require("Doors"),
            Err(PredictorError::MissingEncoder(c)) if c == "Doors"
        ));
    }

    #[test]
    fn test_load_reports_duplicate_as_artifact_error() {
        let dir = std::env::temp_dir().join(format!("encoders-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("label_encoders.json");
        fs::write(&path, r#"{"Doors": ["02", "04", "02"]}"#).unwrap();

        let err = EncoderSet::load(&path).unwrap_err();
        assert!(matches!(err, PredictorError::Artifact { ref message, .. } if message.contains("`02`")));
        fs::remove_dir_all(&dir).ok();
    }
}
