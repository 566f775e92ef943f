use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};

use chrono::Local;

use super::{
    ChatCompletion, DiseasePredictor, DocumentExtractor, ExtractionPayload, PatientApi,
    PlanReceipt, PredictionResponse, RemoteError, TreatmentPlanApi,
};
use crate::models::{
    DiseaseHistoryEntry, HospitalId, Patient, PatientDraft, PatientId, PlanId,
    RegisteredPatient, TreatmentFields, TreatmentPlan, UploadedDocument, VisitDraft, VisitRecord,
    WireMessage,
};

/// Capability call that can be made to fail once via `MockBackend::fail_next`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockOperation {
    Predict,
    Chat,
    ListPlans,
    CreatePlan,
    UpdatePlan,
    DeletePlan,
    Extract,
    ListPatients,
    CreatePatient,
    DeletePatient,
    RecordVisit,
    ListVisits,
    ListHistory,
}

/// A call observed by the mock, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCall {
    Predict {
        patient_id: PatientId,
        symptoms: Vec<String>,
    },
    Chat(Vec<WireMessage>),
    ListPlans(PatientId),
    CreatePlan {
        patient_id: PatientId,
        fields: TreatmentFields,
    },
    UpdatePlan {
        plan_id: PlanId,
        fields: TreatmentFields,
    },
    DeletePlan(PlanId),
    Extract {
        file_name: String,
    },
    ListPatients(HospitalId),
    CreatePatient {
        hospital_id: HospitalId,
        draft: PatientDraft,
    },
    DeletePatient(PatientId),
    RecordVisit {
        patient_id: PatientId,
        draft: VisitDraft,
        with_document: bool,
    },
    ListVisits(PatientId),
    ListHistory(PatientId),
}

struct MockState {
    plans: Vec<(PatientId, TreatmentPlan)>,
    next_plan_id: i64,
    prediction: PredictionResponse,
    chat_replies: VecDeque<String>,
    extraction: ExtractionPayload,
    patients: Vec<Patient>,
    next_patient_id: i64,
    visits: Vec<VisitRecord>,
    history: Vec<DiseaseHistoryEntry>,
    failures: HashMap<MockOperation, RemoteError>,
    calls: Vec<RecordedCall>,
}

impl MockState {
    fn take_failure(&mut self, op: MockOperation) -> Result<(), RemoteError> {
        match self.failures.remove(&op) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn chat_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, RecordedCall::Chat(_)))
            .count()
    }
}

/// In-memory stand-in for the Medicare backend.
///
/// Keeps plans, patients and visits in memory, records every call, and
/// replays scripted chat replies (falling back to a numbered canned reply).
pub struct MockBackend {
    state: Mutex<MockState>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState {
                plans: Vec::new(),
                next_plan_id: 1,
                prediction: PredictionResponse {
                    predicted_disease: "Common Cold".into(),
                    stored: false,
                },
                chat_replies: VecDeque::new(),
                extraction: ExtractionPayload::Structured(serde_json::Map::new()),
                patients: Vec::new(),
                next_patient_id: 1,
                visits: Vec::new(),
                history: Vec::new(),
                failures: HashMap::new(),
                calls: Vec::new(),
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        // A panicking test thread must not poison the other assertions.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Seed an existing plan; returns its assigned id via `plans_for`.
    pub fn with_plan(self, patient_id: PatientId, fields: TreatmentFields) -> Self {
        {
            let mut state = self.state();
            let id = PlanId(state.next_plan_id);
            state.next_plan_id += 1;
            state.plans.push((patient_id, TreatmentPlan { id, fields }));
        }
        self
    }

    pub fn with_prediction(self, label: &str, stored: bool) -> Self {
        self.state().prediction = PredictionResponse {
            predicted_disease: label.to_string(),
            stored,
        };
        self
    }

    /// Queue a chat reply; replies are consumed in order.
    pub fn with_chat_reply(self, reply: &str) -> Self {
        self.state().chat_replies.push_back(reply.to_string());
        self
    }

    pub fn with_extraction(self, payload: ExtractionPayload) -> Self {
        self.state().extraction = payload;
        self
    }

    pub fn with_patient(self, patient: Patient) -> Self {
        {
            let mut state = self.state();
            state.next_patient_id = state.next_patient_id.max(patient.id.0 + 1);
            state.patients.push(patient);
        }
        self
    }

    pub fn with_visit_record(self, record: VisitRecord) -> Self {
        self.state().visits.push(record);
        self
    }

    pub fn with_disease_history(self, entry: DiseaseHistoryEntry) -> Self {
        self.state().history.push(entry);
        self
    }

    /// Make the next call of `op` fail with `err`.
    pub fn fail_next(&self, op: MockOperation, err: RemoteError) {
        self.state().failures.insert(op, err);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }

    /// Message lists sent to the chat capability, oldest first.
    pub fn chat_requests(&self) -> Vec<Vec<WireMessage>> {
        self.state()
            .calls
            .iter()
            .filter_map(|c| match c {
                RecordedCall::Chat(messages) => Some(messages.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn plans_for(&self, patient_id: PatientId) -> Vec<TreatmentPlan> {
        self.state()
            .plans
            .iter()
            .filter(|(owner, _)| *owner == patient_id)
            .map(|(_, plan)| plan.clone())
            .collect()
    }

    pub fn patients(&self) -> Vec<Patient> {
        self.state().patients.clone()
    }

    pub fn visits(&self) -> Vec<VisitRecord> {
        self.state().visits.clone()
    }
}

fn not_found(what: &str) -> RemoteError {
    RemoteError::Status {
        status: 404,
        body: format!("{{\"detail\":\"{what} not found\"}}"),
    }
}

impl DiseasePredictor for MockBackend {
    async fn predict_disease(
        &self,
        patient_id: PatientId,
        symptoms: &[String],
    ) -> Result<PredictionResponse, RemoteError> {
        let mut state = self.state();
        state.calls.push(RecordedCall::Predict {
            patient_id,
            symptoms: symptoms.to_vec(),
        });
        state.take_failure(MockOperation::Predict)?;
        Ok(state.prediction.clone())
    }
}

impl ChatCompletion for MockBackend {
    async fn complete(&self, messages: &[WireMessage]) -> Result<String, RemoteError> {
        let mut state = self.state();
        state.calls.push(RecordedCall::Chat(messages.to_vec()));
        state.take_failure(MockOperation::Chat)?;
        let count = state.chat_count();
        Ok(state
            .chat_replies
            .pop_front()
            .unwrap_or_else(|| format!("Assistant reply {count}")))
    }
}

impl TreatmentPlanApi for MockBackend {
    async fn list_plans(&self, patient_id: PatientId) -> Result<Vec<TreatmentPlan>, RemoteError> {
        let mut state = self.state();
        state.calls.push(RecordedCall::ListPlans(patient_id));
        state.take_failure(MockOperation::ListPlans)?;
        Ok(state
            .plans
            .iter()
            .filter(|(owner, _)| *owner == patient_id)
            .map(|(_, plan)| plan.clone())
            .collect())
    }

    async fn create_plan(
        &self,
        patient_id: PatientId,
        fields: &TreatmentFields,
    ) -> Result<PlanReceipt, RemoteError> {
        let mut state = self.state();
        state.calls.push(RecordedCall::CreatePlan {
            patient_id,
            fields: fields.clone(),
        });
        state.take_failure(MockOperation::CreatePlan)?;
        let id = PlanId(state.next_plan_id);
        state.next_plan_id += 1;
        state.plans.push((
            patient_id,
            TreatmentPlan {
                id,
                fields: fields.clone(),
            },
        ));
        Ok(PlanReceipt {
            id: Some(id),
            message: Some("Treatment plan saved".into()),
        })
    }

    async fn update_plan(
        &self,
        plan_id: PlanId,
        fields: &TreatmentFields,
    ) -> Result<PlanReceipt, RemoteError> {
        let mut state = self.state();
        state.calls.push(RecordedCall::UpdatePlan {
            plan_id,
            fields: fields.clone(),
        });
        state.take_failure(MockOperation::UpdatePlan)?;
        let plan = state
            .plans
            .iter_mut()
            .map(|(_, plan)| plan)
            .find(|plan| plan.id == plan_id)
            .ok_or_else(|| not_found("Treatment plan"))?;
        plan.fields = fields.clone();
        Ok(PlanReceipt {
            id: Some(plan_id),
            message: Some("Treatment plan updated".into()),
        })
    }

    async fn delete_plan(&self, plan_id: PlanId) -> Result<PlanReceipt, RemoteError> {
        let mut state = self.state();
        state.calls.push(RecordedCall::DeletePlan(plan_id));
        state.take_failure(MockOperation::DeletePlan)?;
        let before = state.plans.len();
        state.plans.retain(|(_, plan)| plan.id != plan_id);
        if state.plans.len() == before {
            return Err(not_found("Treatment plan"));
        }
        Ok(PlanReceipt {
            id: Some(plan_id),
            message: Some("Treatment plan deleted".into()),
        })
    }
}

impl DocumentExtractor for MockBackend {
    async fn extract_document(
        &self,
        document: &UploadedDocument,
    ) -> Result<ExtractionPayload, RemoteError> {
        let mut state = self.state();
        state.calls.push(RecordedCall::Extract {
            file_name: document.file_name.clone(),
        });
        state.take_failure(MockOperation::Extract)?;
        Ok(state.extraction.clone())
    }
}

impl PatientApi for MockBackend {
    async fn list_patients(&self, hospital_id: HospitalId) -> Result<Vec<Patient>, RemoteError> {
        let mut state = self.state();
        state.calls.push(RecordedCall::ListPatients(hospital_id));
        state.take_failure(MockOperation::ListPatients)?;
        Ok(state
            .patients
            .iter()
            .filter(|p| p.hospital_id == hospital_id)
            .cloned()
            .collect())
    }

    async fn create_patient(
        &self,
        hospital_id: HospitalId,
        draft: &PatientDraft,
        _document: &UploadedDocument,
    ) -> Result<RegisteredPatient, RemoteError> {
        let mut state = self.state();
        state.calls.push(RecordedCall::CreatePatient {
            hospital_id,
            draft: draft.clone(),
        });
        state.take_failure(MockOperation::CreatePatient)?;

        let id = PatientId(state.next_patient_id);
        state.next_patient_id += 1;
        let non_empty = |s: &str| (!s.is_empty()).then(|| s.to_string());
        state.patients.push(Patient {
            id,
            name: draft.name.clone(),
            age: draft.age.unwrap_or_default(),
            contact: draft.contact.clone(),
            dob: draft.dob.clone(),
            symptoms: draft.symptoms.clone(),
            allergies: non_empty(&draft.allergies),
            previous_diseases: non_empty(&draft.previous_diseases),
            weight: non_empty(&draft.weight),
            height: non_empty(&draft.height),
            medications: non_empty(&draft.medications),
            hospital_id,
        });
        Ok(RegisteredPatient {
            id,
            name: draft.name.clone(),
            predicted_disease: Some(state.prediction.predicted_disease.clone()),
            document_summary: None,
        })
    }

    async fn delete_patient(&self, patient_id: PatientId) -> Result<(), RemoteError> {
        let mut state = self.state();
        state.calls.push(RecordedCall::DeletePatient(patient_id));
        state.take_failure(MockOperation::DeletePatient)?;
        let before = state.patients.len();
        state.patients.retain(|p| p.id != patient_id);
        if state.patients.len() == before {
            return Err(RemoteError::Rejected("Patient not found".into()));
        }
        state.visits.retain(|v| v.patient_id != patient_id);
        Ok(())
    }

    async fn record_visit(
        &self,
        patient_id: PatientId,
        draft: &VisitDraft,
        document: Option<&UploadedDocument>,
    ) -> Result<(), RemoteError> {
        let mut state = self.state();
        state.calls.push(RecordedCall::RecordVisit {
            patient_id,
            draft: draft.clone(),
            with_document: document.is_some(),
        });
        state.take_failure(MockOperation::RecordVisit)?;
        if !state.patients.iter().any(|p| p.id == patient_id) {
            return Err(RemoteError::Rejected("Patient not found".into()));
        }
        let id = state.visits.len() as i64 + 1;
        let summary = if document.is_some() { "scanned" } else { "N/A" };
        let non_empty = |s: &str| (!s.is_empty()).then(|| s.to_string());
        state.visits.push(VisitRecord {
            id,
            patient_id,
            symptoms: non_empty(&draft.symptoms),
            document_summary: Some(summary.to_string()),
            visit_date: Some(Local::now().naive_local().to_string()),
            allergies: non_empty(&draft.allergies),
            previous_diseases: non_empty(&draft.previous_diseases),
            medications: non_empty(&draft.medications),
            weight: non_empty(&draft.weight),
            height: non_empty(&draft.height),
        });
        Ok(())
    }

    async fn list_visit_records(&self, patient_id: PatientId) -> Result<Vec<VisitRecord>, RemoteError> {
        let mut state = self.state();
        state.calls.push(RecordedCall::ListVisits(patient_id));
        state.take_failure(MockOperation::ListVisits)?;
        Ok(state
            .visits
            .iter()
            .filter(|v| v.patient_id == patient_id)
            .cloned()
            .collect())
    }

    async fn list_disease_history(
        &self,
        patient_id: PatientId,
    ) -> Result<Vec<DiseaseHistoryEntry>, RemoteError> {
        let mut state = self.state();
        state.calls.push(RecordedCall::ListHistory(patient_id));
        state.take_failure(MockOperation::ListHistory)?;
        Ok(state
            .history
            .iter()
            .filter(|h| h.patient_id == Some(patient_id))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(treatment: &str) -> TreatmentFields {
        TreatmentFields {
            treatment: treatment.into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn scripted_chat_replies_then_canned() {
        let mock = MockBackend::new().with_chat_reply("first");
        let msgs = vec![WireMessage::user("hi")];
        assert_eq!(mock.complete(&msgs).await.unwrap(), "first");
        assert_eq!(mock.complete(&msgs).await.unwrap(), "Assistant reply 2");
        assert_eq!(mock.chat_requests().len(), 2);
    }

    #[tokio::test]
    async fn failure_is_one_shot() {
        let mock = MockBackend::new();
        mock.fail_next(MockOperation::ListPlans, RemoteError::Timeout(5));
        assert_eq!(
            mock.list_plans(PatientId(1)).await.unwrap_err(),
            RemoteError::Timeout(5)
        );
        assert!(mock.list_plans(PatientId(1)).await.is_ok());
    }

    #[tokio::test]
    async fn plans_are_scoped_by_patient() {
        let mock = MockBackend::new()
            .with_plan(PatientId(1), fields("rest"))
            .with_plan(PatientId(2), fields("surgery"));
        let plans = mock.list_plans(PatientId(1)).await.unwrap();
        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].id, PlanId(1));
        assert_eq!(mock.plans_for(PatientId(2))[0].id, PlanId(2));
    }

    #[tokio::test]
    async fn clear_calls_forgets_recorded_traffic() {
        let mock = MockBackend::new().with_plan(PatientId(1), fields("rest"));
        mock.list_plans(PatientId(1)).await.unwrap();
        assert_eq!(mock.calls(), vec![RecordedCall::ListPlans(PatientId(1))]);

        mock.clear_calls();
        assert!(mock.calls().is_empty());
        assert_eq!(mock.plans_for(PatientId(1)).len(), 1);
    }

    #[tokio::test]
    async fn update_of_unknown_plan_is_not_found() {
        let mock = MockBackend::new();
        let err = mock.update_plan(PlanId(9), &fields("x")).await.unwrap_err();
        assert!(matches!(err, RemoteError::Status { status: 404, .. }));
    }
}
