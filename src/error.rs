//! Error taxonomy for operator-triggered workflow actions.
//!
//! Every variant is recoverable: the action that raised it leaves entity
//! state as it was, and the operator may retry or abandon it.

use thiserror::Error;

use crate::models::enums::{PatientOperation, PlanOperation};
use crate::remote::RemoteError;

#[derive(Error, Debug)]
pub enum AssistantError {
    /// Structured data could not be located or parsed in remote text.
    #[error("Malformed extraction: {reason}")]
    MalformedExtraction { reason: String, raw: String },

    #[error("Disease prediction failed: {0}")]
    PredictionFailed(#[source] RemoteError),

    #[error("Chat request failed: {0}")]
    ChatFailed(#[source] RemoteError),

    #[error("Treatment plan {operation} failed: {source}")]
    PlanOperationFailed {
        operation: PlanOperation,
        source: RemoteError,
    },

    #[error("Patient {operation} failed: {source}")]
    PatientOperationFailed {
        operation: PatientOperation,
        source: RemoteError,
    },

    #[error("Cannot derive age: {0}")]
    AgeDerivationFailed(String),

    #[error("Missing precondition: {0}")]
    MissingPrecondition(String),

    #[error("Selection store error: {0}")]
    Storage(String),
}

impl AssistantError {
    pub(crate) fn malformed(reason: impl Into<String>, raw: &str) -> Self {
        Self::MalformedExtraction {
            reason: reason.into(),
            raw: raw.to_string(),
        }
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MalformedExtraction { .. } => "MALFORMED_EXTRACTION",
            Self::PredictionFailed(_) => "PREDICTION_FAILED",
            Self::ChatFailed(_) => "CHAT_FAILED",
            Self::PlanOperationFailed { .. } => "PLAN_OPERATION_FAILED",
            Self::PatientOperationFailed { .. } => "PATIENT_OPERATION_FAILED",
            Self::AgeDerivationFailed(_) => "AGE_DERIVATION_FAILED",
            Self::MissingPrecondition(_) => "MISSING_PRECONDITION",
            Self::Storage(_) => "STORAGE",
        }
    }

    /// Human-readable notice shown to the operator.
    pub fn notice(&self) -> String {
        match self {
            Self::MalformedExtraction { .. } => {
                "The AI response was not in the expected format. Try again or edit manually."
                    .into()
            }
            Self::PredictionFailed(_) => {
                "Failed to predict disease. Please check patient symptoms.".into()
            }
            Self::ChatFailed(_) => "Failed to get AI response.".into(),
            Self::PlanOperationFailed { operation, .. } => match operation {
                PlanOperation::List => "Failed to load treatment plans.".into(),
                PlanOperation::Create | PlanOperation::Update => {
                    "Failed to save/update treatment plan.".into()
                }
                PlanOperation::Delete => "Failed to delete treatment plan.".into(),
            },
            Self::PatientOperationFailed { operation, .. } => match operation {
                PatientOperation::List => "Failed to load patients.".into(),
                PatientOperation::Create => "Patient submission failed.".into(),
                PatientOperation::Delete => "Failed to delete patient.".into(),
                PatientOperation::RecordVisit => "Failed to add medical record.".into(),
                PatientOperation::VisitHistory => "Failed to load medical history.".into(),
                PatientOperation::Extract => "Autofill failed. Try manual entry.".into(),
            },
            Self::AgeDerivationFailed(_) => {
                "Could not work out the patient's age from the document. Enter it manually."
                    .into()
            }
            Self::MissingPrecondition(detail) => detail.clone(),
            Self::Storage(_) => "Saved session data could not be read or written.".into(),
        }
    }

    /// The raw remote text attached to a malformed extraction, for diagnostics.
    pub fn raw_text(&self) -> Option<&str> {
        match self {
            Self::MalformedExtraction { raw, .. } => Some(raw),
            _ => None,
        }
    }
}
