use serde::{Deserialize, Serialize};

/// Server-assigned treatment plan identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlanId(pub i64);

impl std::fmt::Display for PlanId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The four free-text fields of a treatment plan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreatmentFields {
    #[serde(default)]
    pub treatment: String,
    #[serde(default)]
    pub medication: String,
    #[serde(default)]
    pub tests: String,
    #[serde(default)]
    pub precaution: String,
}

impl TreatmentFields {
    pub fn is_empty(&self) -> bool {
        self.treatment.is_empty()
            && self.medication.is_empty()
            && self.tests.is_empty()
            && self.precaution.is_empty()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// A persisted treatment plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreatmentPlan {
    pub id: PlanId,
    #[serde(flatten)]
    pub fields: TreatmentFields,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_reads_flat_backend_shape() {
        let plan: TreatmentPlan = serde_json::from_value(serde_json::json!({
            "id": 12,
            "treatment": "rest",
            "medication": "paracetamol",
            "tests": "CBC",
            "precaution": "hydrate"
        }))
        .unwrap();
        assert_eq!(plan.id, PlanId(12));
        assert_eq!(plan.fields.medication, "paracetamol");
    }

    #[test]
    fn clear_empties_every_field() {
        let mut fields = TreatmentFields {
            treatment: "a".into(),
            medication: "b".into(),
            tests: "c".into(),
            precaution: "d".into(),
        };
        assert!(!fields.is_empty());
        fields.clear();
        assert!(fields.is_empty());
    }
}
