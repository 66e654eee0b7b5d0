//! CabinetKit Settings Crate
//!
//! Typed engine configuration with JSON/TOML persistence and validation.

pub mod config;
pub mod error;

pub use config::{
    CabinetSettings, DefaultGeometry, DeriveSettings, EditingSettings, EditorConfig,
    MeasurementSettings, ServiceSettings,
};
pub use error::{SettingsError, SettingsResult};
