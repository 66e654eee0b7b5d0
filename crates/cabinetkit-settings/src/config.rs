//! Configuration for the CabinetKit edit engine
//!
//! Supports JSON and TOML files stored in the platform config directory.
//! Every section has defaults, so a file only needs the keys it overrides.
//!
//! Configuration is organized into logical sections:
//! - Editing (minimum dimension, grid, snapping, history depth)
//! - Derivation (debounce window, review threshold)
//! - Measurement (display scale)
//! - Calculation service endpoint
//! - Cabinet defaults sent with every derivation request

use crate::error::{SettingsError, SettingsResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Geometry used when the project store has nothing yet
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DefaultGeometry {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Default for DefaultGeometry {
    fn default() -> Self {
        Self {
            x: 50.0,
            y: 50.0,
            width: 200.0,
            height: 120.0,
        }
    }
}

/// Editing settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EditingSettings {
    /// Smallest committed width/height, in canvas units
    pub min_dimension: f64,
    /// Snap grid step, in canvas units
    pub grid_size: f64,
    /// Whether snapping starts enabled
    pub snap_enabled: bool,
    /// Maximum undo depth; `None` keeps every entry
    pub max_history: Option<usize>,
    /// Geometry used when the project store is empty
    pub default_geometry: DefaultGeometry,
}

impl Default for EditingSettings {
    fn default() -> Self {
        Self {
            min_dimension: 50.0,
            grid_size: 10.0,
            snap_enabled: false,
            max_history: Some(100),
            default_geometry: DefaultGeometry::default(),
        }
    }
}

/// Recalculation scheduling settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeriveSettings {
    /// Quiet period before a burst of edits triggers a request
    pub debounce_ms: u64,
    /// Results with confidence below this are flagged for engineering review
    pub review_threshold: f64,
}

impl Default for DeriveSettings {
    fn default() -> Self {
        Self {
            debounce_ms: 300,
            review_threshold: 0.8,
        }
    }
}

impl DeriveSettings {
    /// Debounce window as a `Duration`
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

/// Measurement display settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MeasurementSettings {
    /// Canvas pixels per displayed unit
    pub pixels_per_unit: f64,
    /// Label of the displayed unit
    pub unit_label: String,
}

impl Default for MeasurementSettings {
    fn default() -> Self {
        Self {
            pixels_per_unit: 10.0,
            unit_label: "in".to_string(),
        }
    }
}

/// Calculation service endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Base URL, e.g. `http://localhost:8000`
    pub base_url: String,
    /// Path of the derive endpoint
    pub derive_path: String,
    /// Total request timeout in milliseconds
    pub timeout_ms: u64,
    /// Connect timeout in milliseconds
    pub connect_timeout_ms: u64,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            derive_path: "/signage/common/cabinets/derive".to_string(),
            timeout_ms: 10_000,
            connect_timeout_ms: 3_000,
        }
    }
}

impl ServiceSettings {
    /// Full URL of the derive endpoint
    pub fn derive_url(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.derive_path.trim_start_matches('/')
        )
    }
}

/// Physical cabinet parameters sent alongside the edited footprint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CabinetSettings {
    /// Cabinet depth in inches
    pub depth_in: f64,
    /// Material density in lb/ft³
    pub density_lb_ft3: f64,
    /// Canvas pixels per inch, used to convert the footprint for the service
    pub pixels_per_inch: f64,
}

impl Default for CabinetSettings {
    fn default() -> Self {
        Self {
            depth_in: 12.0,
            density_lb_ft3: 10.0,
            pixels_per_inch: 10.0,
        }
    }
}

/// Complete engine configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EditorConfig {
    pub editing: EditingSettings,
    pub derive: DeriveSettings,
    pub measurement: MeasurementSettings,
    pub service: ServiceSettings,
    pub cabinet: CabinetSettings,
}

impl EditorConfig {
    /// Create new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Default location: `<config dir>/cabinetkit/config.toml`
    pub fn config_path() -> SettingsResult<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join("cabinetkit").join("config.toml"))
            .ok_or_else(|| {
                SettingsError::ConfigDirectory("no config directory on this platform".into())
            })
    }

    /// Load config from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let content = std::fs::read_to_string(path)?;

        let config: Self = match Format::of(path)? {
            Format::Json => serde_json::from_str(&content)?,
            Format::Toml => toml::from_str(&content)?,
        };

        config.validate()?;
        tracing::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Load config from file, or fall back to defaults when it does not exist
    pub fn load_or_default(path: &Path) -> SettingsResult<Self> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            tracing::info!(
                "No configuration at {}, using defaults",
                path.display()
            );
            Ok(Self::default())
        }
    }

    /// Save config to file (JSON or TOML)
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;

        let content = match Format::of(path)? {
            Format::Json => serde_json::to_string_pretty(self)?,
            Format::Toml => toml::to_string_pretty(self)?,
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> SettingsResult<()> {
        let editing = &self.editing;
        if !(editing.min_dimension > 0.0) {
            return Err(SettingsError::invalid(
                "editing.min_dimension",
                "must be > 0",
            ));
        }
        if !(editing.grid_size > 0.0) {
            return Err(SettingsError::invalid("editing.grid_size", "must be > 0"));
        }
        if editing.max_history == Some(0) {
            return Err(SettingsError::invalid(
                "editing.max_history",
                "must be > 0 (omit for unbounded)",
            ));
        }
        let geometry = &editing.default_geometry;
        if geometry.width < editing.min_dimension || geometry.height < editing.min_dimension {
            return Err(SettingsError::invalid(
                "editing.default_geometry",
                format!(
                    "width and height must be >= min_dimension ({})",
                    editing.min_dimension
                ),
            ));
        }

        if !(0.0..=1.0).contains(&self.derive.review_threshold) {
            return Err(SettingsError::invalid(
                "derive.review_threshold",
                "must be within [0, 1]",
            ));
        }

        if !(self.measurement.pixels_per_unit > 0.0) {
            return Err(SettingsError::invalid(
                "measurement.pixels_per_unit",
                "must be > 0",
            ));
        }

        if self.service.base_url.trim().is_empty() {
            return Err(SettingsError::invalid("service.base_url", "must not be empty"));
        }
        if self.service.timeout_ms == 0 {
            return Err(SettingsError::invalid("service.timeout_ms", "must be > 0"));
        }

        if !(self.cabinet.pixels_per_inch > 0.0) {
            return Err(SettingsError::invalid(
                "cabinet.pixels_per_inch",
                "must be > 0",
            ));
        }

        Ok(())
    }
}

enum Format {
    Json,
    Toml,
}

impl Format {
    fn of(path: &Path) -> SettingsResult<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Ok(Format::Json),
            Some("toml") => Ok(Format::Toml),
            other => Err(SettingsError::UnsupportedFormat(
                other.unwrap_or("<none>").to_string(),
            )),
        }
    }
}
