use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::normalize::normalize_field;
use crate::models::TreatmentFields;

/// Patient fields read from a scanned document, already normalized to text.
/// An empty string means the document did not provide the field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedDocumentData {
    pub name: String,
    pub birth_date: String,
    pub age: String,
    pub allergies: String,
    pub weight: String,
    pub height: String,
    pub notable_conditions: String,
    pub medications: String,
}

impl ExtractedDocumentData {
    pub fn from_fields(fields: &Map<String, Value>) -> Self {
        let field = |key: &str| normalize_field(fields.get(key));
        let mut birth_date = field("birth_date");
        if birth_date.is_empty() {
            birth_date = field("dob");
        }

        Self {
            name: field("name"),
            birth_date,
            age: field("age"),
            allergies: field("allergies"),
            weight: field("weight"),
            height: field("height"),
            notable_conditions: field("notable_conditions"),
            medications: field("medications"),
        }
    }
}

/// Treatment autofill reply: `{treatment, medications, tests, precautions}`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreatmentSuggestion {
    pub treatment: String,
    pub medications: String,
    pub tests: String,
    pub precautions: String,
}

impl TreatmentSuggestion {
    pub fn from_fields(fields: &Map<String, Value>) -> Self {
        let field = |key: &str| normalize_field(fields.get(key));
        Self {
            treatment: field("treatment"),
            medications: field("medications"),
            tests: field("tests"),
            precautions: field("precautions"),
        }
    }
}

impl From<TreatmentSuggestion> for TreatmentFields {
    fn from(s: TreatmentSuggestion) -> Self {
        Self {
            treatment: s.treatment,
            medication: s.medications,
            tests: s.tests,
            precaution: s.precautions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn document_fields_are_normalized() {
        let data = ExtractedDocumentData::from_fields(&object(json!({
            "name": "Ada Lovelace",
            "birth_date": "2000-05-01",
            "allergies": ["Penicillin", "Peanuts"],
            "weight": 61,
            "notable_conditions": ["Asthma"],
            "immunizations": ["MMR"]
        })));
        assert_eq!(data.name, "Ada Lovelace");
        assert_eq!(data.allergies, "Penicillin, Peanuts");
        assert_eq!(data.weight, "61");
        assert_eq!(data.height, "");
        assert_eq!(data.notable_conditions, "Asthma");
        assert_eq!(data.age, "");
    }

    #[test]
    fn dob_backs_up_birth_date() {
        let data = ExtractedDocumentData::from_fields(&object(json!({"dob": "01/05/2000"})));
        assert_eq!(data.birth_date, "01/05/2000");
    }

    #[test]
    fn suggestion_maps_to_plan_fields() {
        let suggestion = TreatmentSuggestion::from_fields(&object(json!({
            "treatment": "Rest",
            "medications": ["Paracetamol", "ORS"],
            "tests": "CBC",
        })));
        let fields = TreatmentFields::from(suggestion);
        assert_eq!(fields.medication, "Paracetamol, ORS");
        assert_eq!(fields.precaution, "");
        assert_eq!(fields.tests, "CBC");
    }
}
