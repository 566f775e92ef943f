use crate::models::Patient;

/// Build the system message that opens every chat request.
///
/// The predicted disease line is only present once a prediction exists.
pub fn build_patient_context(patient: &Patient, predicted_disease: Option<&str>) -> String {
    let mut prompt = String::from("You are an AI medical assistant. Here's the patient info:\n");
    prompt.push_str(&format!("Name: {}\n", patient.name));
    prompt.push_str(&format!("Age: {}\n", patient.age));
    prompt.push_str(&format!("Contact: {}\n", patient.contact));
    prompt.push_str(&format!("Symptoms: {}\n", patient.symptoms));
    if let Some(disease) = predicted_disease {
        prompt.push_str(&format!("Predicted Disease: {disease}\n"));
    }
    prompt.push_str("Provide diagnosis guidance, precautions, and treatment if asked.");
    prompt
}

/// Build the single-message request asking for a treatment plan as JSON.
pub fn build_treatment_prompt(disease: &str) -> String {
    format!(
        r#"Return ONLY a pure JSON object with: treatment, medications, tests, precautions for "{disease}". No explanation, no markdown. Format:
{{
  "treatment": "...",
  "medications": "...",
  "tests": "...",
  "precautions": "..."
}}"#
    )
}

/// Shown above an empty transcript.
pub fn greeting(patient_name: &str) -> String {
    format!(
        "Hello I am {patient_name}'s AI Medical Assistant! I can help interpret symptoms, \
         suggest possible diseases, and answer any health-related questions."
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{HospitalId, PatientId};

    fn patient() -> Patient {
        Patient {
            id: PatientId(7),
            name: "Ada".into(),
            age: 24,
            contact: "555-0100".into(),
            dob: "2000-05-01".into(),
            symptoms: "fever, cough".into(),
            allergies: None,
            previous_diseases: None,
            weight: None,
            height: None,
            medications: None,
            hospital_id: HospitalId(1),
        }
    }

    #[test]
    fn context_lists_patient_fields() {
        let prompt = build_patient_context(&patient(), None);
        assert!(prompt.contains("Name: Ada\n"));
        assert!(prompt.contains("Age: 24\n"));
        assert!(prompt.contains("Contact: 555-0100\n"));
        assert!(prompt.contains("Symptoms: fever, cough\n"));
        assert!(!prompt.contains("Predicted Disease"));
    }

    #[test]
    fn context_includes_prediction_when_known() {
        let prompt = build_patient_context(&patient(), Some("Influenza"));
        assert!(prompt.contains("Predicted Disease: Influenza\n"));
        assert!(prompt.ends_with("treatment if asked."));
    }

    #[test]
    fn treatment_prompt_names_disease_and_keys() {
        let prompt = build_treatment_prompt("Malaria");
        assert!(prompt.contains("for \"Malaria\""));
        for key in ["treatment", "medications", "tests", "precautions"] {
            assert!(prompt.contains(&format!("\"{key}\": \"...\"")));
        }
    }

    #[test]
    fn greeting_uses_name() {
        assert!(greeting("Ada").starts_with("Hello I am Ada's AI Medical Assistant!"));
    }
}
