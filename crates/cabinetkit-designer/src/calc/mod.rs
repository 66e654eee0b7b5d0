//! Remote calculation collaborator.
//!
//! The engine only ever sees [`CalculationService::derive`]: an async call
//! that takes the cabinet inputs plus a cancellation token and returns the
//! response envelope. [`HttpCalculationService`] is the production
//! implementation.

mod http;

pub use http::{parse_envelope, parse_validation_detail, HttpCalculationService};

use async_trait::async_trait;
use cabinetkit_core::{CalcError, CancellationToken};
use cabinetkit_settings::CabinetSettings;
use serde::{Deserialize, Serialize};

use crate::geometry::{Dimensions, PartialGeometry};

/// Body of a derive request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeriveRequest {
    pub width_in: f64,
    pub height_in: f64,
    pub depth_in: f64,
    pub density_lb_ft3: f64,
    /// Hash of the previous result, letting the service reuse cached work
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_hash: Option<String>,
}

impl DeriveRequest {
    /// Convert a canvas footprint into service inputs
    pub fn for_dimensions(
        dimensions: Dimensions,
        cabinet: &CabinetSettings,
        content_hash: Option<String>,
    ) -> Self {
        let ppi = if cabinet.pixels_per_inch > 0.0 {
            cabinet.pixels_per_inch
        } else {
            1.0
        };
        Self {
            width_in: dimensions.width / ppi,
            height_in: dimensions.height / ppi,
            depth_in: cabinet.depth_in,
            density_lb_ft3: cabinet.density_lb_ft3,
            content_hash,
        }
    }
}

/// Physical quantities derived by the service.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DerivedQuantities {
    /// Face area in square feet
    #[serde(rename = "A_ft2", default, skip_serializing_if = "Option::is_none")]
    pub area_ft2: Option<f64>,
    /// Height of the centre of gravity in feet
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z_cg_ft: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight_estimate_lb: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_token: Option<String>,
    /// Geometry correction in canvas units, applied like a manual edit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry: Option<PartialGeometry>,
}

fn default_confidence() -> f64 {
    0.95
}

/// Response envelope returned by the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub result: Option<DerivedQuantities>,
    /// Assumptions and warnings, in display order
    #[serde(default, alias = "warnings")]
    pub assumptions: Vec<String>,
    #[serde(default = "default_confidence")]
    pub confidence: f64,
    #[serde(default, alias = "content_hash")]
    pub content_sha256: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requires_review: Option<bool>,
}

impl Default for Envelope {
    fn default() -> Self {
        Self {
            result: None,
            assumptions: Vec::new(),
            confidence: default_confidence(),
            content_sha256: None,
            requires_review: None,
        }
    }
}

/// An async calculation backend.
///
/// Implementations should give up and return [`CalcError::Cancelled`] once
/// `cancel` fires; callers still tolerate a late result because liveness is
/// checked separately.
#[async_trait]
pub trait CalculationService: Send + Sync {
    async fn derive(
        &self,
        request: DeriveRequest,
        cancel: CancellationToken,
    ) -> Result<Envelope, CalcError>;
}
