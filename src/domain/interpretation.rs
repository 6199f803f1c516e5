//! AI-derived interpretation of a transcribed note.
//!
//! One tagged structure, validated once when it crosses the store write
//! boundary. Reads never re-parse an ambiguous union.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation failures for an interpretation record
#[derive(Debug, Error)]
pub enum InterpretationError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("unknown entity type: {0}")]
    UnknownEntityType(String),
}

/// Entity types the archive understands
pub const ENTITY_TYPES: &[&str] = &["US", "TOMBA", "MATERIALE"];

/// A stratigraphic relationship extracted from a note,
/// e.g. ("Copre", "2044", "1", "Pompeii").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    /// Relationship type (Copre, Taglia, ...)
    pub kind: String,

    /// Target stratigraphic unit number
    pub unit: String,

    pub area: String,

    pub site: String,
}

/// Structured record extracted by the archive's AI interpreter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interpretation {
    /// One of [`ENTITY_TYPES`]
    pub entity_type: String,

    /// Destination table in the permanent record store
    pub target_table: String,

    /// Clamped to 0..=1 at validation
    pub confidence: f64,

    /// Field name to extracted value; keys are archive column names
    pub extracted_fields: BTreeMap<String, String>,

    #[serde(default)]
    pub relationships: Vec<Relationship>,

    /// Interpreter doubts or caveats
    #[serde(default)]
    pub notes: String,
}

impl Interpretation {
    /// Normalize and check an interpretation before it is persisted.
    ///
    /// Clamps confidence into 0..=1 and rejects records missing the fields
    /// the confirm step cannot work without.
    pub fn validate(mut self) -> Result<Self, InterpretationError> {
        if self.entity_type.is_empty() {
            return Err(InterpretationError::MissingField("entity_type"));
        }
        if !ENTITY_TYPES.contains(&self.entity_type.as_str()) {
            return Err(InterpretationError::UnknownEntityType(self.entity_type));
        }
        if self.target_table.is_empty() {
            return Err(InterpretationError::MissingField("target_table"));
        }

        self.confidence = self.confidence.clamp(0.0, 1.0);
        Ok(self)
    }
}
