//! Treatment plan lifecycle for one patient: the plan list plus a single
//! add/edit draft.

use crate::error::AssistantError;
use crate::extraction::parse_treatment_suggestion;
use crate::models::enums::PlanOperation;
use crate::models::{PatientId, PlanId, TreatmentFields, TreatmentPlan, WireMessage};
use crate::prompt::build_treatment_prompt;
use crate::remote::{ChatCompletion, TreatmentPlanApi};
use crate::session::{OperatorPrompt, SessionContext};

pub const DELETE_PLAN_CONFIRMATION: &str = "Are you sure you want to delete this plan?";

/// Which plan, if any, the draft will be written to on save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftMode {
    Add,
    Edit(PlanId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveTarget {
    /// Newly created; the id is present when the backend reports it.
    Created(Option<PlanId>),
    Updated(PlanId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveOutcome {
    pub target: SaveTarget,
    /// False when the mutation succeeded but reloading the list did not.
    pub list_refreshed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The operator did not confirm; nothing was sent.
    Declined,
    Deleted {
        plan_id: PlanId,
        /// The deleted plan was open for editing and the draft was reset.
        edit_cancelled: bool,
        list_refreshed: bool,
    },
}

pub struct TreatmentPlanStore {
    patient_id: PatientId,
    mode: DraftMode,
    fields: TreatmentFields,
    plans: Vec<TreatmentPlan>,
}

impl TreatmentPlanStore {
    pub fn new(patient_id: PatientId) -> Self {
        Self {
            patient_id,
            mode: DraftMode::Add,
            fields: TreatmentFields::default(),
            plans: Vec::new(),
        }
    }

    pub fn for_session(session: &SessionContext) -> Self {
        Self::new(session.patient_id())
    }

    pub fn patient_id(&self) -> PatientId {
        self.patient_id
    }

    pub fn mode(&self) -> DraftMode {
        self.mode
    }

    pub fn fields(&self) -> &TreatmentFields {
        &self.fields
    }

    pub fn fields_mut(&mut self) -> &mut TreatmentFields {
        &mut self.fields
    }

    pub fn set_treatment(&mut self, value: impl Into<String>) {
        self.fields.treatment = value.into();
    }

    pub fn set_medication(&mut self, value: impl Into<String>) {
        self.fields.medication = value.into();
    }

    pub fn set_tests(&mut self, value: impl Into<String>) {
        self.fields.tests = value.into();
    }

    pub fn set_precaution(&mut self, value: impl Into<String>) {
        self.fields.precaution = value.into();
    }

    /// Last loaded plan list.
    pub fn plans(&self) -> &[TreatmentPlan] {
        &self.plans
    }

    /// Load `plan` into the draft for editing, replacing any current draft.
    pub fn start_edit(&mut self, plan: &TreatmentPlan) {
        self.mode = DraftMode::Edit(plan.id);
        self.fields = plan.fields.clone();
    }

    pub fn cancel_edit(&mut self) {
        self.mode = DraftMode::Add;
        self.fields.clear();
    }

    pub async fn refresh<B: TreatmentPlanApi>(
        &mut self,
        backend: &B,
    ) -> Result<&[TreatmentPlan], AssistantError> {
        let plans = backend.list_plans(self.patient_id).await.map_err(|source| {
            AssistantError::PlanOperationFailed {
                operation: PlanOperation::List,
                source,
            }
        })?;
        tracing::debug!(patient_id = %self.patient_id, count = plans.len(), "Treatment plans loaded");
        self.plans = plans;
        Ok(&self.plans)
    }

    /// Reload after a successful mutation. Failure keeps the stale list.
    async fn refresh_after_mutation<B: TreatmentPlanApi>(&mut self, backend: &B) -> bool {
        let patient_id = self.patient_id;
        match self.refresh(backend).await {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(patient_id = %patient_id, error = %e, "Plan list refresh failed after mutation");
                false
            }
        }
    }

    /// Write the draft: create in add mode, update exactly the edited plan
    /// in edit mode. On success the store is back in add mode with empty
    /// fields; on failure the draft is left as it was.
    pub async fn save<B: TreatmentPlanApi>(
        &mut self,
        backend: &B,
        session: &SessionContext,
    ) -> Result<SaveOutcome, AssistantError> {
        if session.patient_id() != self.patient_id {
            return Err(AssistantError::MissingPrecondition(
                "The selected patient changed; reopen the treatment plans".into(),
            ));
        }

        let target = match self.mode {
            DraftMode::Add => {
                if session.predicted_disease().is_none() {
                    return Err(AssistantError::MissingPrecondition(
                        "Predict a disease before saving a treatment plan".into(),
                    ));
                }
                let receipt = backend
                    .create_plan(self.patient_id, &self.fields)
                    .await
                    .map_err(|source| AssistantError::PlanOperationFailed {
                        operation: PlanOperation::Create,
                        source,
                    })?;
                tracing::info!(patient_id = %self.patient_id, plan_id = ?receipt.id, "Treatment plan saved");
                SaveTarget::Created(receipt.id)
            }
            DraftMode::Edit(plan_id) => {
                backend
                    .update_plan(plan_id, &self.fields)
                    .await
                    .map_err(|source| AssistantError::PlanOperationFailed {
                        operation: PlanOperation::Update,
                        source,
                    })?;
                tracing::info!(patient_id = %self.patient_id, plan_id = %plan_id, "Treatment plan updated");
                SaveTarget::Updated(plan_id)
            }
        };

        self.cancel_edit();
        let list_refreshed = self.refresh_after_mutation(backend).await;
        Ok(SaveOutcome {
            target,
            list_refreshed,
        })
    }

    /// Delete a plan after operator confirmation. Deleting the plan being
    /// edited also resets the draft to add mode.
    pub async fn delete<B, P>(
        &mut self,
        backend: &B,
        plan_id: PlanId,
        prompt: &P,
    ) -> Result<DeleteOutcome, AssistantError>
    where
        B: TreatmentPlanApi,
        P: OperatorPrompt + ?Sized,
    {
        if !prompt.confirm(DELETE_PLAN_CONFIRMATION) {
            return Ok(DeleteOutcome::Declined);
        }

        backend
            .delete_plan(plan_id)
            .await
            .map_err(|source| AssistantError::PlanOperationFailed {
                operation: PlanOperation::Delete,
                source,
            })?;
        tracing::info!(patient_id = %self.patient_id, plan_id = %plan_id, "Treatment plan deleted");

        let edit_cancelled = self.mode == DraftMode::Edit(plan_id);
        if edit_cancelled {
            self.cancel_edit();
        }
        let list_refreshed = self.refresh_after_mutation(backend).await;
        Ok(DeleteOutcome::Deleted {
            plan_id,
            edit_cancelled,
            list_refreshed,
        })
    }

    /// Ask the chat capability for a plan for `label` and overwrite all four
    /// draft fields with the reply. The mode is unchanged.
    pub async fn autofill_from_prediction<B: ChatCompletion>(
        &mut self,
        backend: &B,
        label: &str,
    ) -> Result<&TreatmentFields, AssistantError> {
        let label = label.trim();
        if label.is_empty() {
            return Err(AssistantError::MissingPrecondition(
                "Predict a disease before requesting a treatment plan".into(),
            ));
        }

        let request = [WireMessage::system(build_treatment_prompt(label))];
        let reply = backend
            .complete(&request)
            .await
            .map_err(AssistantError::ChatFailed)?;
        let suggestion = parse_treatment_suggestion(&reply)?;

        self.fields = suggestion.into();
        tracing::debug!(patient_id = %self.patient_id, "Treatment draft autofilled");
        Ok(&self.fields)
    }
}
