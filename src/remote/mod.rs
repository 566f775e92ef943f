//! Remote capabilities consumed by the workflow.
//!
//! One trait per capability so each component depends only on what it calls.
//! `HttpBackend` implements all of them against the Medicare backend;
//! `MockBackend` scripts them for tests.

pub mod http;
pub mod mock;

use std::future::Future;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{
    DiseaseHistoryEntry, HospitalId, Patient, PatientDraft, PatientId, PlanId,
    RegisteredPatient, TreatmentFields, TreatmentPlan, UploadedDocument, VisitDraft, VisitRecord,
    WireMessage,
};

pub use http::HttpBackend;
pub use mock::MockBackend;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    #[error("Backend is not reachable at {0}")]
    Connection(String),

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("Backend returned error (status {status}): {body}")]
    Status { status: u16, body: String },

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Response parsing error: {0}")]
    ResponseParsing(String),

    /// Success status carrying an `{"error": ...}` envelope.
    #[error("Backend rejected the request: {0}")]
    Rejected(String),
}

/// Body of a successful predict-disease call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub predicted_disease: String,
    #[serde(default)]
    pub stored: bool,
}

/// Acknowledgement of a treatment-plan mutation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanReceipt {
    #[serde(default)]
    pub id: Option<PlanId>,
    #[serde(default)]
    pub message: Option<String>,
}

/// What the extraction capability returned for a document.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionPayload {
    /// Fields already decoded into a JSON object.
    Structured(serde_json::Map<String, serde_json::Value>),
    /// Free text that still has to go through the parser.
    Raw(String),
}

pub trait DiseasePredictor {
    fn predict_disease(
        &self,
        patient_id: PatientId,
        symptoms: &[String],
    ) -> impl Future<Output = Result<PredictionResponse, RemoteError>> + Send;
}

pub trait ChatCompletion {
    /// Send the ordered message list, returning the assistant reply text.
    fn complete(
        &self,
        messages: &[WireMessage],
    ) -> impl Future<Output = Result<String, RemoteError>> + Send;
}

pub trait TreatmentPlanApi {
    fn list_plans(
        &self,
        patient_id: PatientId,
    ) -> impl Future<Output = Result<Vec<TreatmentPlan>, RemoteError>> + Send;

    fn create_plan(
        &self,
        patient_id: PatientId,
        fields: &TreatmentFields,
    ) -> impl Future<Output = Result<PlanReceipt, RemoteError>> + Send;

    fn update_plan(
        &self,
        plan_id: PlanId,
        fields: &TreatmentFields,
    ) -> impl Future<Output = Result<PlanReceipt, RemoteError>> + Send;

    fn delete_plan(
        &self,
        plan_id: PlanId,
    ) -> impl Future<Output = Result<PlanReceipt, RemoteError>> + Send;
}

pub trait DocumentExtractor {
    fn extract_document(
        &self,
        document: &UploadedDocument,
    ) -> impl Future<Output = Result<ExtractionPayload, RemoteError>> + Send;
}

pub trait PatientApi {
    fn list_patients(
        &self,
        hospital_id: HospitalId,
    ) -> impl Future<Output = Result<Vec<Patient>, RemoteError>> + Send;

    fn create_patient(
        &self,
        hospital_id: HospitalId,
        draft: &PatientDraft,
        document: &UploadedDocument,
    ) -> impl Future<Output = Result<RegisteredPatient, RemoteError>> + Send;

    fn delete_patient(
        &self,
        patient_id: PatientId,
    ) -> impl Future<Output = Result<(), RemoteError>> + Send;

    fn record_visit(
        &self,
        patient_id: PatientId,
        draft: &VisitDraft,
        document: Option<&UploadedDocument>,
    ) -> impl Future<Output = Result<(), RemoteError>> + Send;

    fn list_visit_records(
        &self,
        patient_id: PatientId,
    ) -> impl Future<Output = Result<Vec<VisitRecord>, RemoteError>> + Send;

    fn list_disease_history(
        &self,
        patient_id: PatientId,
    ) -> impl Future<Output = Result<Vec<DiseaseHistoryEntry>, RemoteError>> + Send;
}
