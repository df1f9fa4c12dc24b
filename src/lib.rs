//! Car price prediction from a web form.
//!
//! Raw form input is label-encoded, zero-filled and ordered into the exact
//! feature row a pre-trained regressor expects, then scored.

pub mod artifacts;
pub mod config;
pub mod encoder;
pub mod error;
pub mod form;
pub mod model;
pub mod pipeline;
pub mod record;
pub mod server;
pub mod view;

pub use artifacts::{Artifacts, FeatureOrder};
pub use config::AppConfig;
pub use encoder::{safe_encode, Encoded, EncoderSet, LabelEncoder, UNKNOWN_CATEGORY};
pub use error::{AssemblyFault, PredictionAssemblyFailure, PredictorError, Result};
pub use form::FormSchema;
pub use model::{LinearRegressor, Regressor};
pub use pipeline::{EncodedRecord, PredictionReport, Predictor};
pub use record::{car_age, CarSpec, RawRecord, RawValue, REFERENCE_YEAR};
