//! Structured extraction: pull one JSON object out of model text and
//! flatten its fields to form text.

pub mod normalize;
pub mod parser;
pub mod types;

use serde_json::{Map, Value};

use crate::error::AssistantError;
use crate::remote::ExtractionPayload;

pub use normalize::{normalize_field, FieldValue};
pub use parser::{locate_json_candidate, parse_structured};
pub use types::{ExtractedDocumentData, TreatmentSuggestion};

/// Resolve an extraction response to its field map, parsing raw text when
/// the backend could not.
pub fn parse_payload(payload: ExtractionPayload) -> Result<Map<String, Value>, AssistantError> {
    match payload {
        ExtractionPayload::Structured(map) => Ok(map),
        ExtractionPayload::Raw(text) => parse_structured(&text),
    }
}

/// Parse a treatment autofill reply.
pub fn parse_treatment_suggestion(reply: &str) -> Result<TreatmentSuggestion, AssistantError> {
    parse_structured(reply).map(|fields| TreatmentSuggestion::from_fields(&fields))
}
