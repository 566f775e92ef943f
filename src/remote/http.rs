use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{
    ChatCompletion, DiseasePredictor, DocumentExtractor, ExtractionPayload, PatientApi,
    PlanReceipt, PredictionResponse, RemoteError, TreatmentPlanApi,
};
use crate::config::{AssistantConfig, DEFAULT_API_URL};
use crate::models::{
    DiseaseHistoryEntry, HospitalId, Patient, PatientDraft, PatientId, PlanId,
    RegisteredPatient, TreatmentFields, TreatmentPlan, UploadedDocument, VisitDraft, VisitRecord,
    WireMessage,
};

/// HTTP client for the Medicare backend (FastAPI JSON + multipart API).
pub struct HttpBackend {
    base_url: String,
    client: reqwest::Client,
    timeout_secs: u64,
}

impl HttpBackend {
    pub fn new(
        base_url: &str,
        timeout_secs: u64,
        connect_timeout_secs: u64,
    ) -> Result<Self, RemoteError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(connect_timeout_secs))
            .build()
            .map_err(|e| RemoteError::HttpClient(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            timeout_secs,
        })
    }

    pub fn from_config(config: &AssistantConfig) -> Result<Self, RemoteError> {
        Self::new(
            &config.api_base_url,
            config.request_timeout_secs,
            config.connect_timeout_secs,
        )
    }

    /// Backend on localhost:8000 with the default timeouts.
    pub fn default_local() -> Result<Self, RemoteError> {
        Self::from_config(&AssistantConfig {
            api_base_url: DEFAULT_API_URL.to_string(),
            ..AssistantConfig::default()
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn transport_error(&self, e: reqwest::Error) -> RemoteError {
        if e.is_connect() {
            RemoteError::Connection(self.base_url.clone())
        } else if e.is_timeout() {
            RemoteError::Timeout(self.timeout_secs)
        } else {
            RemoteError::HttpClient(e.to_string())
        }
    }

    /// Send a request and decode the JSON body of a 2xx response.
    async fn send(&self, request: RequestBuilder) -> Result<Value, RemoteError> {
        let response = request.send().await.map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RemoteError::Status {
                status: status.as_u16(),
                body: status_body(response.text().await),
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| RemoteError::ResponseParsing(e.to_string()))
    }

    /// Like `send`, rejecting `{"error": ...}` envelopes and decoding into `T`.
    async fn send_as<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, RemoteError> {
        let value = self.send(request).await?;
        reject_envelope(value.get("error"))?;
        serde_json::from_value(value).map_err(|e| RemoteError::ResponseParsing(e.to_string()))
    }
}

/// Body of a failed response, or why it could not be read.
fn status_body<E: std::fmt::Display>(read: Result<String, E>) -> String {
    read.unwrap_or_else(|e| format!("<unreadable body: {e}>"))
}

/// The backend reports some failures as 200 with an `error` field.
fn reject_envelope(error: Option<&Value>) -> Result<(), RemoteError> {
    match error {
        Some(Value::String(message)) => Err(RemoteError::Rejected(message.clone())),
        Some(Value::Null) | None => Ok(()),
        Some(other) => Err(RemoteError::Rejected(other.to_string())),
    }
}

fn document_part(document: &UploadedDocument) -> Result<Part, RemoteError> {
    Part::bytes(document.bytes.clone())
        .file_name(document.file_name.clone())
        .mime_str(&document.content_type)
        .map_err(|e| RemoteError::HttpClient(e.to_string()))
}

#[derive(Serialize)]
struct PredictRequest<'a> {
    symptoms: &'a [String],
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    messages: &'a [WireMessage],
}

#[derive(Deserialize)]
struct ChatReply {
    reply: String,
}

#[derive(Deserialize)]
struct CreatePatientResponse {
    patient: RegisteredPatient,
}

impl DiseasePredictor for HttpBackend {
    async fn predict_disease(
        &self,
        patient_id: PatientId,
        symptoms: &[String],
    ) -> Result<PredictionResponse, RemoteError> {
        tracing::debug!(patient_id = %patient_id, symptom_count = symptoms.len(), "POST /ai/predict");
        let request = self
            .client
            .post(self.url("/ai/predict"))
            .query(&[("patient_id", patient_id.0)])
            .json(&PredictRequest { symptoms });
        self.send_as(request).await
    }
}

impl ChatCompletion for HttpBackend {
    async fn complete(&self, messages: &[WireMessage]) -> Result<String, RemoteError> {
        tracing::debug!(message_count = messages.len(), "POST /ai/chat");
        let request = self
            .client
            .post(self.url("/ai/chat"))
            .json(&ChatRequest { messages });
        let reply: ChatReply = self.send_as(request).await?;
        Ok(reply.reply)
    }
}

impl TreatmentPlanApi for HttpBackend {
    async fn list_plans(&self, patient_id: PatientId) -> Result<Vec<TreatmentPlan>, RemoteError> {
        let request = self
            .client
            .get(self.url(&format!("/ai/treatment-plan/{patient_id}/list")));
        self.send_as(request).await
    }

    async fn create_plan(
        &self,
        patient_id: PatientId,
        fields: &TreatmentFields,
    ) -> Result<PlanReceipt, RemoteError> {
        let request = self
            .client
            .post(self.url(&format!("/ai/treatment-plan/{patient_id}/add")))
            .json(fields);
        self.send_as(request).await
    }

    async fn update_plan(
        &self,
        plan_id: PlanId,
        fields: &TreatmentFields,
    ) -> Result<PlanReceipt, RemoteError> {
        let request = self
            .client
            .put(self.url(&format!("/ai/treatment-plan/{plan_id}/update")))
            .json(fields);
        self.send_as(request).await
    }

    async fn delete_plan(&self, plan_id: PlanId) -> Result<PlanReceipt, RemoteError> {
        let request = self
            .client
            .delete(self.url(&format!("/ai/treatment-plan/{plan_id}/delete")));
        self.send_as(request).await
    }
}

impl DocumentExtractor for HttpBackend {
    async fn extract_document(
        &self,
        document: &UploadedDocument,
    ) -> Result<ExtractionPayload, RemoteError> {
        tracing::debug!(file = %document.file_name, bytes = document.bytes.len(), "POST /patients/extract-info");
        let form = Form::new().part("document", document_part(document)?);
        let request = self
            .client
            .post(self.url("/patients/extract-info"))
            .multipart(form);

        match self.send(request).await? {
            Value::Object(mut map) => {
                // Parsing failures come back with the raw model text attached.
                if let Some(Value::String(raw)) = map.remove("raw_response") {
                    return Ok(ExtractionPayload::Raw(raw));
                }
                reject_envelope(map.get("error"))?;
                Ok(ExtractionPayload::Structured(map))
            }
            Value::String(raw) => Ok(ExtractionPayload::Raw(raw)),
            other => Err(RemoteError::ResponseParsing(format!(
                "unexpected extraction payload type: {}",
                json_type_name(&other)
            ))),
        }
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl PatientApi for HttpBackend {
    async fn list_patients(&self, hospital_id: HospitalId) -> Result<Vec<Patient>, RemoteError> {
        let request = self
            .client
            .get(self.url(&format!("/patients/hospital/{hospital_id}")));
        self.send_as(request).await
    }

    async fn create_patient(
        &self,
        hospital_id: HospitalId,
        draft: &PatientDraft,
        document: &UploadedDocument,
    ) -> Result<RegisteredPatient, RemoteError> {
        let mut form = Form::new()
            .text("name", draft.name.clone())
            .text("contact", draft.contact.clone())
            .text("dob", draft.dob.clone())
            .text("symptoms", draft.symptoms.clone())
            .text("allergies", draft.allergies.clone())
            .text("previous_diseases", draft.previous_diseases.clone())
            .text("weight", draft.weight.clone())
            .text("height", draft.height.clone())
            .text("medications", draft.medications.clone())
            .text("hospital_id", hospital_id.to_string());
        if let Some(age) = draft.age {
            form = form.text("age", age.to_string());
        }
        form = form.part("document", document_part(document)?);

        let request = self.client.post(self.url("/patients/")).multipart(form);
        let created: CreatePatientResponse = self.send_as(request).await?;
        Ok(created.patient)
    }

    async fn delete_patient(&self, patient_id: PatientId) -> Result<(), RemoteError> {
        let request = self.client.delete(self.url(&format!("/patients/{patient_id}")));
        let value = self.send(request).await?;
        reject_envelope(value.get("error"))
    }

    async fn record_visit(
        &self,
        patient_id: PatientId,
        draft: &VisitDraft,
        document: Option<&UploadedDocument>,
    ) -> Result<(), RemoteError> {
        let mut form = Form::new()
            .text("symptoms", draft.symptoms.clone())
            .text("allergies", draft.allergies.clone())
            .text("previous_diseases", draft.previous_diseases.clone())
            .text("medications", draft.medications.clone())
            .text("weight", draft.weight.clone())
            .text("height", draft.height.clone());
        if let Some(document) = document {
            form = form.part("document", document_part(document)?);
        }

        let request = self
            .client
            .post(self.url(&format!("/patients/update/{patient_id}")))
            .multipart(form);
        let value = self.send(request).await?;
        reject_envelope(value.get("error"))
    }

    async fn list_visit_records(&self, patient_id: PatientId) -> Result<Vec<VisitRecord>, RemoteError> {
        let request = self
            .client
            .get(self.url(&format!("/patients/{patient_id}/records")));
        self.send_as(request).await
    }

    async fn list_disease_history(
        &self,
        patient_id: PatientId,
    ) -> Result<Vec<DiseaseHistoryEntry>, RemoteError> {
        let request = self
            .client
            .get(self.url(&format!("/disease-history/{patient_id}")));
        self.send_as(request).await
    }
}
