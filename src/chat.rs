//! Multi-turn diagnostic chat about the selected patient.
//!
//! Every request carries a fresh system message describing the patient,
//! followed by the full transcript and the new question. The transcript only
//! grows when the assistant answered.

use crate::error::AssistantError;
use crate::models::enums::ChatRole;
use crate::models::{ChatMessage, WireMessage};
use crate::prompt::{build_patient_context, greeting};
use crate::remote::ChatCompletion;
use crate::session::SessionContext;

#[derive(Debug, Default)]
pub struct ChatSession {
    transcript: Vec<ChatMessage>,
    input: String,
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Text shown before the first exchange.
    pub fn greeting(&self, session: &SessionContext) -> String {
        greeting(&session.patient.name)
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    /// Pending text in the chat input box.
    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    // ═══════════════════════════════════════════
    // Request assembly
    // ═══════════════════════════════════════════

    /// `[system context, ..transcript, question]` as sent on the wire.
    pub fn build_request(&self, session: &SessionContext, question: &str) -> Vec<WireMessage> {
        let mut messages = Vec::with_capacity(self.transcript.len() + 2);
        messages.push(WireMessage::system(build_patient_context(
            &session.patient,
            session.predicted_disease(),
        )));
        messages.extend(self.transcript.iter().map(WireMessage::from));
        messages.push(WireMessage::user(question));
        messages
    }

    fn push(&mut self, role: ChatRole, text: String) {
        let position = self.transcript.len();
        self.transcript.push(ChatMessage {
            position,
            role,
            text,
        });
    }

    // ═══════════════════════════════════════════
    // Turns
    // ═══════════════════════════════════════════

    /// Ask one question. On success the question and reply are appended and
    /// the pending input cleared; on failure nothing changes.
    pub async fn ask<B: ChatCompletion>(
        &mut self,
        backend: &B,
        session: &SessionContext,
        question: &str,
    ) -> Result<&ChatMessage, AssistantError> {
        if question.trim().is_empty() {
            return Err(AssistantError::MissingPrecondition(
                "Type a question first".into(),
            ));
        }

        let request = self.build_request(session, question);
        let reply = backend.complete(&request).await.map_err(|e| {
            tracing::warn!(
                session_id = %session.session_id(),
                patient_id = %session.patient_id(),
                error = %e,
                "Chat request failed"
            );
            AssistantError::ChatFailed(e)
        })?;

        self.push(ChatRole::Operator, question.to_string());
        self.push(ChatRole::Assistant, reply);
        self.input.clear();

        tracing::debug!(
            session_id = %session.session_id(),
            patient_id = %session.patient_id(),
            messages = self.transcript.len(),
            "Chat turn completed"
        );

        let last = self.transcript.len() - 1;
        Ok(&self.transcript[last])
    }

    /// Ask the pending input.
    pub async fn submit<B: ChatCompletion>(
        &mut self,
        backend: &B,
        session: &SessionContext,
    ) -> Result<&ChatMessage, AssistantError> {
        let question = self.input.clone();
        self.ask(backend, session, &question).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        DiseasePrediction, HospitalId, HospitalIdentity, Patient, PatientId, WireRole,
    };
    use crate::remote::mock::MockOperation;
    use crate::remote::{MockBackend, RemoteError};
    use chrono::Local;

    fn session() -> SessionContext {
        SessionContext::new(
            HospitalIdentity {
                id: HospitalId(1),
                name: "General".into(),
            },
            Patient {
                id: PatientId(8),
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
            },
        )
    }

    #[tokio::test]
    async fn transcript_alternates_after_n_asks() {
        let backend = MockBackend::new();
        let session = session();
        let mut chat = ChatSession::new();

        for i in 0..3 {
            chat.ask(&backend, &session, &format!("question {i}")).await.unwrap();
        }

        let transcript = chat.transcript();
        assert_eq!(transcript.len(), 6);
        for (i, msg) in transcript.iter().enumerate() {
            assert_eq!(msg.position, i);
            let expected = if i % 2 == 0 { ChatRole::Operator } else { ChatRole::Assistant };
            assert_eq!(msg.role, expected);
        }
        assert_eq!(transcript[5].text, "Assistant reply 3");
    }

    #[tokio::test]
    async fn request_carries_context_history_and_question() {
        let backend = MockBackend::new().with_chat_reply("Rest and fluids.");
        let session = session();
        let mut chat = ChatSession::new();
        chat.ask(&backend, &session, "What should I do?").await.unwrap();
        chat.ask(&backend, &session, "For how long?").await.unwrap();

        let requests = backend.chat_requests();
        let second = &requests[1];
        let roles: Vec<WireRole> = second.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![WireRole::System, WireRole::User, WireRole::Assistant, WireRole::User]
        );
        assert!(second[0].content.contains("Name: Ada"));
        assert_eq!(second[1].content, "What should I do?");
        assert_eq!(second[2].content, "Rest and fluids.");
        assert_eq!(second[3].content, "For how long?");
    }

    #[tokio::test]
    async fn system_context_includes_prediction() {
        let backend = MockBackend::new();
        let mut session = session();
        session
            .record_prediction(DiseasePrediction {
                patient_id: PatientId(8),
                label: "Bronchitis".into(),
                stored: false,
                symptoms: vec![],
                predicted_at: Local::now(),
            })
            .unwrap();
        let mut chat = ChatSession::new();
        chat.ask(&backend, &session, "Hi").await.unwrap();
        assert!(backend.chat_requests()[0][0]
            .content
            .contains("Predicted Disease: Bronchitis"));
    }

    #[tokio::test]
    async fn failure_leaves_transcript_and_input_unchanged() {
        let backend = MockBackend::new();
        let session = session();
        let mut chat = ChatSession::new();
        chat.ask(&backend, &session, "first").await.unwrap();
        chat.set_input("second");
        backend.fail_next(MockOperation::Chat, RemoteError::Timeout(120));

        let err = chat.submit(&backend, &session).await.unwrap_err();

        assert_eq!(err.notice(), "Failed to get AI response.");
        assert_eq!(chat.transcript().len(), 2);
        assert_eq!(chat.input(), "second");
    }

    #[tokio::test]
    async fn submit_clears_input() {
        let backend = MockBackend::new();
        let session = session();
        let mut chat = ChatSession::new();
        chat.set_input("Any precautions?");
        let reply = chat.submit(&backend, &session).await.unwrap();
        assert_eq!(reply.role, ChatRole::Assistant);
        assert_eq!(chat.input(), "");
        assert_eq!(chat.transcript()[0].text, "Any precautions?");
    }

    #[tokio::test]
    async fn blank_question_is_rejected_locally() {
        let backend = MockBackend::new();
        let mut chat = ChatSession::new();
        let err = chat.ask(&backend, &session(), "   ").await.unwrap_err();
        assert!(matches!(err, AssistantError::MissingPrecondition(_)));
        assert!(backend.calls().is_empty());
    }

    #[test]
    fn greeting_names_patient() {
        let chat = ChatSession::new();
        assert!(chat.greeting(&session()).contains("Ada's AI Medical Assistant"));
    }
}
