use serde::{Deserialize, Serialize};

use super::hospital::HospitalId;

/// Server-assigned patient identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatientId(pub i64);

impl std::fmt::Display for PatientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A patient as stored by the backend.
///
/// List-like clinical fields (symptoms, allergies, conditions, medications)
/// are kept as the comma-delimited text the operator entered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    pub id: PatientId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub age: u32,
    #[serde(default)]
    pub contact: String,
    #[serde(default)]
    pub dob: String,
    #[serde(default)]
    pub symptoms: String,
    #[serde(default)]
    pub allergies: Option<String>,
    #[serde(default)]
    pub previous_diseases: Option<String>,
    #[serde(default)]
    pub weight: Option<String>,
    #[serde(default)]
    pub height: Option<String>,
    #[serde(default)]
    pub medications: Option<String>,
    pub hospital_id: HospitalId,
}

/// Unsaved new-patient form state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientDraft {
    pub name: String,
    pub age: Option<u32>,
    pub contact: String,
    pub dob: String,
    pub symptoms: String,
    pub allergies: String,
    pub previous_diseases: String,
    pub weight: String,
    pub height: String,
    pub medications: String,
    /// Operator consent to store the patient's medical details.
    pub consent: bool,
}

impl PatientDraft {
    /// Names of the fields the registration form requires but are blank.
    pub fn missing_required_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.name.trim().is_empty() {
            missing.push("name");
        }
        if self.age.is_none() {
            missing.push("age");
        }
        if self.contact.trim().is_empty() {
            missing.push("contact");
        }
        if self.dob.trim().is_empty() {
            missing.push("dob");
        }
        if self.symptoms.trim().is_empty() {
            missing.push("symptoms");
        }
        missing
    }
}

/// Unsaved new-visit form state for an existing patient.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitDraft {
    pub symptoms: String,
    pub allergies: String,
    pub previous_diseases: String,
    pub medications: String,
    pub weight: String,
    pub height: String,
}

/// One entry of a patient's append-only visit history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisitRecord {
    pub id: i64,
    pub patient_id: PatientId,
    #[serde(default)]
    pub symptoms: Option<String>,
    #[serde(default)]
    pub document_summary: Option<String>,
    #[serde(default)]
    pub visit_date: Option<String>,
    #[serde(default)]
    pub allergies: Option<String>,
    #[serde(default)]
    pub previous_diseases: Option<String>,
    #[serde(default)]
    pub medications: Option<String>,
    #[serde(default)]
    pub weight: Option<String>,
    #[serde(default)]
    pub height: Option<String>,
}

/// Result of a successful patient registration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisteredPatient {
    pub id: PatientId,
    pub name: String,
    #[serde(default)]
    pub predicted_disease: Option<String>,
    #[serde(default)]
    pub document_summary: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patient_deserializes_backend_row() {
        let row = serde_json::json!({
            "id": 7,
            "name": "Asha Rao",
            "age": 41,
            "contact": "555-0101",
            "dob": "1983-02-11",
            "symptoms": "fever, cough",
            "allergies": null,
            "previous_diseases": "asthma",
            "weight": "62",
            "height": "165",
            "medical_summary": "ocr text",
            "hospital_id": 3,
            "medications": null
        });
        let patient: Patient = serde_json::from_value(row).unwrap();
        assert_eq!(patient.id, PatientId(7));
        assert_eq!(patient.hospital_id, HospitalId(3));
        assert_eq!(patient.symptoms, "fever, cough");
        assert!(patient.allergies.is_none());
        assert_eq!(patient.previous_diseases.as_deref(), Some("asthma"));
    }

    #[test]
    fn draft_reports_missing_required_fields() {
        let draft = PatientDraft {
            name: "  ".into(),
            contact: "555".into(),
            symptoms: "fever".into(),
            ..Default::default()
        };
        assert_eq!(draft.missing_required_fields(), vec!["name", "age", "dob"]);
    }
}
