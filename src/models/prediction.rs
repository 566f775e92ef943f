use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use super::patient::PatientId;

/// Outcome of one disease prediction for a patient.
///
/// Never updated in place; a new prediction supersedes the old one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiseasePrediction {
    pub patient_id: PatientId,
    pub label: String,
    /// The backend already persisted this prediction in the disease history.
    pub stored: bool,
    pub symptoms: Vec<String>,
    pub predicted_at: DateTime<Local>,
}

/// A persisted prediction as listed by the disease-history endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiseaseHistoryEntry {
    pub id: i64,
    #[serde(default)]
    pub patient_id: Option<PatientId>,
    #[serde(default)]
    pub symptoms: Option<String>,
    pub predicted_disease: String,
    #[serde(default)]
    pub created_at: Option<String>,
}
