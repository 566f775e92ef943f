//! Patient registration, visit recording and history for one hospital.

use serde::Serialize;

use crate::error::AssistantError;
use crate::models::enums::PatientOperation;
use crate::models::{
    DiseaseHistoryEntry, HospitalId, Patient, PatientDraft, PatientId, RegisteredPatient,
    UploadedDocument, VisitDraft, VisitRecord,
};
use crate::remote::{PatientApi, RemoteError};
use crate::session::OperatorPrompt;

pub const DELETE_PATIENT_CONFIRMATION: &str = "Are you sure you want to delete this patient?";

/// A visit record with the disease history entry shown next to it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisitHistoryEntry {
    pub record: VisitRecord,
    pub disease: Option<DiseaseHistoryEntry>,
}

pub struct PatientRegistry<'a, B> {
    backend: &'a B,
    hospital_id: HospitalId,
}

fn failed(operation: PatientOperation) -> impl FnOnce(RemoteError) -> AssistantError {
    move |source| {
        tracing::warn!(operation = %operation, error = %source, "Patient operation failed");
        AssistantError::PatientOperationFailed { operation, source }
    }
}

impl<'a, B: PatientApi> PatientRegistry<'a, B> {
    pub fn new(backend: &'a B, hospital_id: HospitalId) -> Self {
        Self {
            backend,
            hospital_id,
        }
    }

    pub fn hospital_id(&self) -> HospitalId {
        self.hospital_id
    }

    pub async fn list_patients(&self) -> Result<Vec<Patient>, AssistantError> {
        let patients = self
            .backend
            .list_patients(self.hospital_id)
            .await
            .map_err(failed(PatientOperation::List))?;
        tracing::debug!(hospital_id = %self.hospital_id, count = patients.len(), "Patients loaded");
        Ok(patients)
    }

    /// Create a patient from a consented, complete draft and its document.
    pub async fn register(
        &self,
        draft: &PatientDraft,
        document: Option<&UploadedDocument>,
    ) -> Result<RegisteredPatient, AssistantError> {
        if !draft.consent {
            return Err(AssistantError::MissingPrecondition(
                "Consent to store the patient's medical details is required".into(),
            ));
        }
        let document = document.ok_or_else(|| {
            AssistantError::MissingPrecondition("Please upload a document".into())
        })?;
        let missing = draft.missing_required_fields();
        if !missing.is_empty() {
            return Err(AssistantError::MissingPrecondition(format!(
                "Missing required fields: {}",
                missing.join(", ")
            )));
        }

        let created = self
            .backend
            .create_patient(self.hospital_id, draft, document)
            .await
            .map_err(failed(PatientOperation::Create))?;
        tracing::info!(
            hospital_id = %self.hospital_id,
            patient_id = %created.id,
            predicted = created.predicted_disease.is_some(),
            "Patient registered"
        );
        Ok(created)
    }

    /// Append a visit. Needs symptoms or a document.
    pub async fn record_visit(
        &self,
        patient_id: PatientId,
        draft: &VisitDraft,
        document: Option<&UploadedDocument>,
    ) -> Result<(), AssistantError> {
        if draft.symptoms.trim().is_empty() && document.is_none() {
            return Err(AssistantError::MissingPrecondition(
                "Please enter symptoms or upload a document.".into(),
            ));
        }
        self.backend
            .record_visit(patient_id, draft, document)
            .await
            .map_err(failed(PatientOperation::RecordVisit))?;
        tracing::info!(patient_id = %patient_id, with_document = document.is_some(), "Visit recorded");
        Ok(())
    }

    /// Delete after confirmation. Returns false when the operator declined.
    pub async fn delete_patient<P>(
        &self,
        patient_id: PatientId,
        prompt: &P,
    ) -> Result<bool, AssistantError>
    where
        P: OperatorPrompt + ?Sized,
    {
        if !prompt.confirm(DELETE_PATIENT_CONFIRMATION) {
            return Ok(false);
        }
        self.backend
            .delete_patient(patient_id)
            .await
            .map_err(failed(PatientOperation::Delete))?;
        tracing::info!(patient_id = %patient_id, "Patient deleted");
        Ok(true)
    }

    /// Visit records paired by position with the disease history.
    pub async fn visit_history(
        &self,
        patient_id: PatientId,
    ) -> Result<Vec<VisitHistoryEntry>, AssistantError> {
        let records = self
            .backend
            .list_visit_records(patient_id)
            .await
            .map_err(failed(PatientOperation::VisitHistory))?;
        let mut diseases = self
            .backend
            .list_disease_history(patient_id)
            .await
            .map_err(failed(PatientOperation::VisitHistory))?
            .into_iter();

        Ok(records
            .into_iter()
            .map(|record| VisitHistoryEntry {
                record,
                disease: diseases.next(),
            })
            .collect())
    }
}
