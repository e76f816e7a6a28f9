//! HTTP price estimator for residential property in the Yogyakarta region.
//!
//! The trained model is loaded once at startup and shared read-only; each
//! `POST /predict` request goes through [`features`] (alias remap, presence
//! check, coercion), the [`model::Regressor`], and [`model::clamp_price`].

pub mod config;
pub mod error;
pub mod features;
pub mod logging;
pub mod model;
pub mod server;

pub use error::{ApiError, FeatureError};
pub use features::PropertyFeatures;
pub use model::{clamp_price, FeatureLayout, ModelMeta, Regressor};
pub use server::{router, AppState};
