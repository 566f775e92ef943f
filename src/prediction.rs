use chrono::Local;

use crate::error::AssistantError;
use crate::models::{DiseasePrediction, PatientId};
use crate::remote::DiseasePredictor;
use crate::session::SessionContext;

/// Split stored symptom text on commas, trimming each token.
///
/// Empty tokens are kept as empty strings.
pub fn split_symptoms(text: &str) -> Vec<String> {
    text.split(',').map(|s| s.trim().to_string()).collect()
}

/// Sends symptom lists to the prediction capability.
pub struct DiseasePredictionClient<'a, B> {
    backend: &'a B,
}

impl<'a, B: DiseasePredictor> DiseasePredictionClient<'a, B> {
    pub fn new(backend: &'a B) -> Self {
        Self { backend }
    }

    /// Predict a disease from explicit symptoms. No retry on failure.
    pub async fn predict(
        &self,
        patient_id: PatientId,
        symptoms: Vec<String>,
    ) -> Result<DiseasePrediction, AssistantError> {
        tracing::debug!(patient_id = %patient_id, symptom_count = symptoms.len(), "Requesting disease prediction");

        let response = self
            .backend
            .predict_disease(patient_id, &symptoms)
            .await
            .map_err(|e| {
                tracing::warn!(patient_id = %patient_id, error = %e, "Disease prediction failed");
                AssistantError::PredictionFailed(e)
            })?;

        tracing::info!(
            patient_id = %patient_id,
            stored = response.stored,
            "Disease predicted"
        );

        Ok(DiseasePrediction {
            patient_id,
            label: response.predicted_disease,
            stored: response.stored,
            symptoms,
            predicted_at: Local::now(),
        })
    }

    /// Predict from the session patient's stored symptom text and record the
    /// result in the session.
    pub async fn predict_for_session(
        &self,
        session: &mut SessionContext,
    ) -> Result<DiseasePrediction, AssistantError> {
        let symptoms = split_symptoms(&session.patient.symptoms);
        let prediction = self.predict(session.patient_id(), symptoms).await?;
        session.record_prediction(prediction.clone())?;
        Ok(prediction)
    }
}
