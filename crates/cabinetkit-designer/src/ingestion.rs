//! Result ingestion.
//!
//! Maps a calculation envelope onto the derived state shown next to the
//! shape (confidence badge, warning list, review flag) and turns failures
//! into notifications. Cancellations never get this far as user-visible
//! messages.

use std::sync::Arc;

use cabinetkit_core::{CalcError, FieldError, Notification, NotificationSink};
use serde::Serialize;

use crate::calc::{DerivedQuantities, Envelope};
use crate::geometry::PartialGeometry;

/// Assumption phrases that imply an engineer should look at the result
const REVIEW_MARKERS: [&str; 2] = ["review", "request engineering"];

/// A calculation response in the shape the editor consumes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivationResult {
    /// Clamped to `[0, 1]`
    pub confidence: f64,
    pub warnings: Vec<String>,
    pub content_hash: Option<String>,
    pub requires_review: bool,
    pub derived_geometry: Option<PartialGeometry>,
    pub quantities: Option<DerivedQuantities>,
}

impl DerivationResult {
    /// Interpret an envelope; confidence below `review_threshold` flags the
    /// result for review.
    pub fn from_envelope(envelope: Envelope, review_threshold: f64) -> Self {
        let confidence = if envelope.confidence.is_finite() {
            envelope.confidence.clamp(0.0, 1.0)
        } else {
            0.0
        };

        let flagged_by_text = envelope.assumptions.iter().any(|warning| {
            let lower = warning.to_lowercase();
            REVIEW_MARKERS.iter().any(|marker| lower.contains(marker))
        });

        let requires_review = envelope.requires_review.unwrap_or(false)
            || flagged_by_text
            || confidence < review_threshold;

        let derived_geometry = envelope
            .result
            .as_ref()
            .and_then(|r| r.geometry)
            .filter(|g| !g.is_empty());

        Self {
            confidence,
            warnings: envelope.assumptions,
            content_hash: envelope.content_sha256.filter(|h| !h.is_empty()),
            requires_review,
            derived_geometry,
            quantities: envelope.result,
        }
    }
}

/// Derived values currently displayed alongside the shape.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct DerivedState {
    pub confidence: Option<f64>,
    pub warnings: Vec<String>,
    pub requires_review: bool,
    pub quantities: Option<DerivedQuantities>,
    /// Inputs the service rejected on the last attempt
    pub field_errors: Vec<FieldError>,
    /// Last transport or service failure, cleared by the next success
    pub last_error: Option<String>,
}

/// What the caller must do after a live result was ingested
#[derive(Debug, Clone, PartialEq, Default)]
pub struct IngestEffects {
    /// Commit this through the normal edit path
    pub derived_geometry: Option<PartialGeometry>,
    /// Use as the cache key on the next request
    pub content_hash: Option<String>,
}

pub struct ResultIngestor {
    state: DerivedState,
    notifications: Arc<dyn NotificationSink>,
}

impl ResultIngestor {
    pub fn new(notifications: Arc<dyn NotificationSink>) -> Self {
        Self {
            state: DerivedState::default(),
            notifications,
        }
    }

    pub fn state(&self) -> &DerivedState {
        &self.state
    }

    /// Apply a successful result. Superseded results are ignored and return
    /// `None`.
    pub fn ingest(
        &mut self,
        result: DerivationResult,
        for_live_request: bool,
    ) -> Option<IngestEffects> {
        if !for_live_request {
            tracing::trace!("Ignoring superseded derivation result");
            return None;
        }

        self.notifications
            .notify(Notification::info("Dimensions updated"));
        for warning in &result.warnings {
            self.notifications
                .notify(Notification::warning(format!("Warning: {}", warning)));
        }
        if result.requires_review {
            self.notifications
                .notify(Notification::warning("Engineering review recommended"));
        }

        self.state = DerivedState {
            confidence: Some(result.confidence),
            warnings: result.warnings,
            requires_review: result.requires_review,
            quantities: result.quantities,
            field_errors: Vec::new(),
            last_error: None,
        };

        Some(IngestEffects {
            derived_geometry: result.derived_geometry,
            content_hash: result.content_hash,
        })
    }

    /// Surface a failed calculation without touching geometry.
    pub fn ingest_failure(&mut self, error: &CalcError) {
        match error {
            CalcError::Cancelled => {
                tracing::debug!("Calculation cancelled");
            }
            CalcError::Validation { fields } => {
                tracing::warn!("Calculation rejected {} input(s)", fields.len());
                for field in fields {
                    self.notifications
                        .notify(Notification::warning(format!("Warning: {}", field)));
                }
                self.state.field_errors = fields.clone();
            }
            other => {
                tracing::warn!("Calculation failed: {}", other);
                self.notifications
                    .notify(Notification::warning(format!("Warning: {}", other)));
                self.state.last_error = Some(other.to_string());
            }
        }
    }
}
