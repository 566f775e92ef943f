//! Document-driven autofill for the new-patient and new-visit forms.

use std::sync::LazyLock;

use chrono::{Datelike, Local, NaiveDate};
use regex::Regex;
use serde::Serialize;

use crate::error::AssistantError;
use crate::extraction::{parse_payload, ExtractedDocumentData};
use crate::models::enums::PatientOperation;
use crate::models::{PatientDraft, UploadedDocument, VisitDraft};
use crate::remote::DocumentExtractor;

const BIRTH_DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%d %B %Y",
    "%d %b %Y",
];

/// Earliest birth year accepted; chrono's `%Y` also takes two-digit years.
const MIN_BIRTH_YEAR: i32 = 1800;
const MAX_AGE: u32 = 150;

static YEAR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(1[89]\d{2}|2\d{3})\b").unwrap());

static AGE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?:age\s*[:=]?\s*)?(\d{1,3})(?:\.0+)?(?:\s*(?:years?|yrs?)(?:\s+old)?)?$",
    )
    .unwrap()
});

/// Year of a birth date written in any of the accepted layouts, or the
/// first plausible four-digit year in the text.
pub fn parse_birth_year(text: &str) -> Option<i32> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Some(date) = BIRTH_DATE_FORMATS
        .iter()
        .filter_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        .find(|date| date.year() >= MIN_BIRTH_YEAR)
    {
        return Some(date.year());
    }
    YEAR_PATTERN
        .captures(text)
        .and_then(|caps| caps[1].parse().ok())
}

/// An age the document states outright ("24", "24 years", "Age: 24").
pub fn explicit_age(text: &str) -> Option<u32> {
    AGE_PATTERN
        .captures(text.trim())
        .and_then(|caps| caps[1].parse().ok())
}

/// Explicit age when present, else `current_year - birth year`.
pub fn derive_age(data: &ExtractedDocumentData, current_year: i32) -> Result<u32, AssistantError> {
    if let Some(age) = explicit_age(&data.age) {
        return plausible(age);
    }
    if data.birth_date.trim().is_empty() {
        return Err(AssistantError::AgeDerivationFailed(
            "the document has neither an age nor a birth date".into(),
        ));
    }
    let year = parse_birth_year(&data.birth_date).ok_or_else(|| {
        AssistantError::AgeDerivationFailed(format!(
            "unrecognised birth date '{}'",
            data.birth_date
        ))
    })?;
    let age = u32::try_from(current_year - year).map_err(|_| {
        AssistantError::AgeDerivationFailed(format!("birth year {year} is in the future"))
    })?;
    plausible(age)
}

fn plausible(age: u32) -> Result<u32, AssistantError> {
    if age > MAX_AGE {
        return Err(AssistantError::AgeDerivationFailed(format!(
            "age {age} is not plausible"
        )));
    }
    Ok(age)
}

// ═══════════════════════════════════════════
// Patches
// ═══════════════════════════════════════════

/// Values autofill writes into a new-patient draft. Contact, symptoms and
/// consent are operator-owned and not part of the patch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatientPatch {
    pub name: String,
    pub dob: String,
    pub age: u32,
    pub allergies: String,
    pub weight: String,
    pub height: String,
    pub previous_diseases: String,
    pub medications: String,
}

impl PatientPatch {
    pub fn new(data: &ExtractedDocumentData, age: u32) -> Self {
        Self {
            name: data.name.clone(),
            dob: data.birth_date.clone(),
            age,
            allergies: data.allergies.clone(),
            weight: data.weight.clone(),
            height: data.height.clone(),
            previous_diseases: data.notable_conditions.clone(),
            medications: data.medications.clone(),
        }
    }

    pub fn apply(&self, draft: &mut PatientDraft) {
        draft.name = self.name.clone();
        draft.dob = self.dob.clone();
        draft.age = Some(self.age);
        draft.allergies = self.allergies.clone();
        draft.weight = self.weight.clone();
        draft.height = self.height.clone();
        draft.previous_diseases = self.previous_diseases.clone();
        draft.medications = self.medications.clone();
    }
}

/// Values autofill writes into a new-visit draft; symptoms stay as typed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VisitPatch {
    pub allergies: String,
    pub previous_diseases: String,
    pub medications: String,
    pub weight: String,
    pub height: String,
}

impl VisitPatch {
    pub fn new(data: &ExtractedDocumentData) -> Self {
        Self {
            allergies: data.allergies.clone(),
            previous_diseases: data.notable_conditions.clone(),
            medications: data.medications.clone(),
            weight: data.weight.clone(),
            height: data.height.clone(),
        }
    }

    pub fn apply(&self, draft: &mut VisitDraft) {
        draft.allergies = self.allergies.clone();
        draft.previous_diseases = self.previous_diseases.clone();
        draft.medications = self.medications.clone();
        draft.weight = self.weight.clone();
        draft.height = self.height.clone();
    }
}

/// An applied patch plus the extracted data, kept for the preview panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Autofill<P> {
    pub patch: P,
    pub preview: ExtractedDocumentData,
}

// ═══════════════════════════════════════════
// Autofill service
// ═══════════════════════════════════════════

pub struct PatientIntakeAutofill<'a, B> {
    backend: &'a B,
    reference_date: Option<NaiveDate>,
}

impl<'a, B: DocumentExtractor> PatientIntakeAutofill<'a, B> {
    pub fn new(backend: &'a B) -> Self {
        Self {
            backend,
            reference_date: None,
        }
    }

    /// Pin "today" for age derivation.
    pub fn with_reference_date(mut self, date: NaiveDate) -> Self {
        self.reference_date = Some(date);
        self
    }

    fn current_year(&self) -> i32 {
        self.reference_date
            .unwrap_or_else(|| Local::now().date_naive())
            .year()
    }

    /// Send the document to the extraction capability and normalize the result.
    pub async fn extract(
        &self,
        document: Option<&UploadedDocument>,
    ) -> Result<ExtractedDocumentData, AssistantError> {
        let document = document.ok_or_else(|| {
            AssistantError::MissingPrecondition("Please upload a document first!".into())
        })?;

        tracing::debug!(file = %document.file_name, bytes = document.bytes.len(), "Extracting document fields");
        let payload = self
            .backend
            .extract_document(document)
            .await
            .map_err(|source| AssistantError::PatientOperationFailed {
                operation: PatientOperation::Extract,
                source,
            })?;
        let fields = parse_payload(payload).inspect_err(|_| {
            tracing::warn!(file = %document.file_name, "Extraction reply was not parseable");
        })?;
        Ok(ExtractedDocumentData::from_fields(&fields))
    }

    /// Fill a new-patient draft. The draft is only touched when every step,
    /// including age derivation, succeeded.
    pub async fn autofill_new_patient(
        &self,
        document: Option<&UploadedDocument>,
        draft: &mut PatientDraft,
    ) -> Result<Autofill<PatientPatch>, AssistantError> {
        let data = self.extract(document).await?;
        let age = derive_age(&data, self.current_year())?;
        let patch = PatientPatch::new(&data, age);
        patch.apply(draft);
        tracing::info!(age, "New patient draft autofilled");
        Ok(Autofill {
            patch,
            preview: data,
        })
    }

    /// Fill a new-visit draft. Visits carry no age, so none is derived.
    pub async fn autofill_visit(
        &self,
        document: Option<&UploadedDocument>,
        draft: &mut VisitDraft,
    ) -> Result<Autofill<VisitPatch>, AssistantError> {
        let data = self.extract(document).await?;
        let patch = VisitPatch::new(&data);
        patch.apply(draft);
        tracing::info!("Visit draft autofilled");
        Ok(Autofill {
            patch,
            preview: data,
        })
    }
}
