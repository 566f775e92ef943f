//! Session context threaded through every workflow operation, and the
//! file-backed store for the selected hospital and patient.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use crate::config::AssistantConfig;
use crate::error::AssistantError;
use crate::models::{DiseasePrediction, HospitalIdentity, Patient, PatientId};

const HOSPITAL_FILE: &str = "hospital.json";
const PATIENT_FILE: &str = "selected_patient.json";

/// Asks the operator to confirm a destructive action.
pub trait OperatorPrompt {
    fn confirm(&self, message: &str) -> bool;
}

impl<F> OperatorPrompt for F
where
    F: Fn(&str) -> bool,
{
    fn confirm(&self, message: &str) -> bool {
        self(message)
    }
}

/// Current hospital, current patient and the latest prediction for them.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub hospital: HospitalIdentity,
    pub patient: Patient,
    prediction: Option<DiseasePrediction>,
    stored_notice_pending: bool,
    session_id: Uuid,
}

impl SessionContext {
    pub fn new(hospital: HospitalIdentity, patient: Patient) -> Self {
        Self {
            hospital,
            patient,
            prediction: None,
            stored_notice_pending: false,
            session_id: Uuid::new_v4(),
        }
    }

    pub fn patient_id(&self) -> PatientId {
        self.patient.id
    }

    /// Correlation id for log lines of this session.
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn prediction(&self) -> Option<&DiseasePrediction> {
        self.prediction.as_ref()
    }

    pub fn predicted_disease(&self) -> Option<&str> {
        self.prediction.as_ref().map(|p| p.label.as_str())
    }

    /// Replace the current prediction. A prediction for another patient is
    /// refused.
    pub fn record_prediction(&mut self, prediction: DiseasePrediction) -> Result<(), AssistantError> {
        if prediction.patient_id != self.patient.id {
            return Err(AssistantError::MissingPrecondition(format!(
                "Prediction belongs to patient {}, not the selected patient {}",
                prediction.patient_id, self.patient.id
            )));
        }
        self.stored_notice_pending = prediction.stored;
        self.prediction = Some(prediction);
        Ok(())
    }

    /// Whether the "already stored" notice is still owed; clears it.
    pub fn acknowledge_stored(&mut self) -> bool {
        std::mem::take(&mut self.stored_notice_pending)
    }
}

/// Persists the logged-in hospital and the selected patient between runs.
pub struct SelectionStore {
    dir: PathBuf,
}

impl SelectionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn from_config(config: &AssistantConfig) -> Self {
        Self::new(config.state_dir.clone())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn save_hospital(&self, hospital: &HospitalIdentity) -> Result<(), AssistantError> {
        self.write_json(HOSPITAL_FILE, hospital)
    }

    pub fn hospital(&self) -> Result<Option<HospitalIdentity>, AssistantError> {
        self.read_json(HOSPITAL_FILE)
    }

    pub fn select_patient(&self, patient: &Patient) -> Result<(), AssistantError> {
        self.write_json(PATIENT_FILE, patient)?;
        tracing::debug!(patient_id = %patient.id, "Patient selected");
        Ok(())
    }

    pub fn selected_patient(&self) -> Result<Option<Patient>, AssistantError> {
        self.read_json(PATIENT_FILE)
    }

    pub fn clear_patient(&self) -> Result<(), AssistantError> {
        match std::fs::remove_file(self.dir.join(PATIENT_FILE)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(storage_error(PATIENT_FILE, e)),
        }
    }

    /// Load hospital and patient once and build the session context.
    pub fn open_session(&self) -> Result<SessionContext, AssistantError> {
        let hospital = self.hospital()?.ok_or_else(|| {
            AssistantError::MissingPrecondition("No hospital is logged in".into())
        })?;
        let patient = self.selected_patient()?.ok_or_else(|| {
            AssistantError::MissingPrecondition("Select a patient first".into())
        })?;
        let session = SessionContext::new(hospital, patient);
        tracing::info!(
            session_id = %session.session_id(),
            hospital_id = %session.hospital.id,
            patient_id = %session.patient_id(),
            "Session opened"
        );
        Ok(session)
    }

    fn write_json<T: Serialize>(&self, file: &str, value: &T) -> Result<(), AssistantError> {
        std::fs::create_dir_all(&self.dir).map_err(|e| storage_error(file, e))?;
        let json = serde_json::to_string_pretty(value)
            .map_err(|e| AssistantError::Storage(format!("{file}: {e}")))?;
        // Write-then-rename so a crash never leaves a half-written selection.
        let tmp = self.dir.join(format!("{file}.tmp"));
        std::fs::write(&tmp, json).map_err(|e| storage_error(file, e))?;
        std::fs::rename(&tmp, self.dir.join(file)).map_err(|e| storage_error(file, e))
    }

    fn read_json<T: DeserializeOwned>(&self, file: &str) -> Result<Option<T>, AssistantError> {
        let bytes = match std::fs::read(self.dir.join(file)) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(storage_error(file, e)),
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| AssistantError::Storage(format!("{file}: {e}")))
    }
}

fn storage_error(file: &str, e: std::io::Error) -> AssistantError {
    AssistantError::Storage(format!("{file}: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::HospitalId;
    use chrono::Local;

    fn hospital() -> HospitalIdentity {
        HospitalIdentity {
            id: HospitalId(3),
            name: "St. Mary".into(),
        }
    }

    fn patient(id: i64) -> Patient {
        Patient {
            id: PatientId(id),
            name: "Ada".into(),
            age: 24,
            contact: "555-0100".into(),
            dob: "2000-05-01".into(),
            symptoms: "fever, cough".into(),
            allergies: Some("Penicillin".into()),
            previous_diseases: None,
            weight: None,
            height: None,
            medications: None,
            hospital_id: HospitalId(3),
        }
    }

    fn prediction(patient_id: i64, stored: bool) -> DiseasePrediction {
        DiseasePrediction {
            patient_id: PatientId(patient_id),
            label: "Influenza".into(),
            stored,
            symptoms: vec!["fever".into()],
            predicted_at: Local::now(),
        }
    }

    #[test]
    fn stored_notice_is_one_shot() {
        let mut session = SessionContext::new(hospital(), patient(1));
        session.record_prediction(prediction(1, true)).unwrap();
        assert_eq!(session.predicted_disease(), Some("Influenza"));
        assert!(session.acknowledge_stored());
        assert!(!session.acknowledge_stored());
    }

    #[test]
    fn unstored_prediction_owes_no_notice() {
        let mut session = SessionContext::new(hospital(), patient(1));
        session.record_prediction(prediction(1, false)).unwrap();
        assert!(!session.acknowledge_stored());
    }

    #[test]
    fn prediction_for_other_patient_is_refused() {
        let mut session = SessionContext::new(hospital(), patient(1));
        let err = session.record_prediction(prediction(2, false)).unwrap_err();
        assert_eq!(err.code(), "MISSING_PRECONDITION");
        assert!(session.prediction().is_none());
    }

    #[test]
    fn closures_confirm() {
        let yes = |_: &str| true;
        assert!(yes.confirm("Delete?"));
    }

    #[test]
    fn selection_round_trips_through_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = SelectionStore::new(dir.path().join("state"));
        store.save_hospital(&hospital()).unwrap();
        store.select_patient(&patient(9)).unwrap();

        let session = store.open_session().unwrap();
        assert_eq!(session.hospital, hospital());
        assert_eq!(session.patient_id(), PatientId(9));
        assert!(!dir.path().join("state/selected_patient.json.tmp").exists());
    }

    #[test]
    fn open_session_requires_selected_patient() {
        let dir = tempfile::tempdir().unwrap();
        let store = SelectionStore::new(dir.path());
        store.save_hospital(&hospital()).unwrap();
        let err = store.open_session().unwrap_err();
        assert!(matches!(err, AssistantError::MissingPrecondition(_)));
    }

    #[test]
    fn open_session_requires_hospital() {
        let dir = tempfile::tempdir().unwrap();
        let store = SelectionStore::new(dir.path());
        store.select_patient(&patient(1)).unwrap();
        assert!(store.open_session().is_err());
    }

    #[test]
    fn clear_patient_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = SelectionStore::new(dir.path());
        store.select_patient(&patient(1)).unwrap();
        store.clear_patient().unwrap();
        store.clear_patient().unwrap();
        assert!(store.selected_patient().unwrap().is_none());
    }

    #[test]
    fn corrupt_file_is_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("hospital.json"), "{not json").unwrap();
        let store = SelectionStore::new(dir.path());
        assert_eq!(store.hospital().unwrap_err().code(), "STORAGE");
    }
}
