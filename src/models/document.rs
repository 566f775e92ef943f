use std::path::Path;

use crate::error::AssistantError;

/// Content types the upload form accepts.
pub const ACCEPTED_CONTENT_TYPES: &[&str] = &["application/pdf", "image/jpeg", "image/png"];

/// A scanned document attached by the operator.
#[derive(Clone, PartialEq, Eq)]
pub struct UploadedDocument {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl UploadedDocument {
    /// Wrap document bytes, guessing the content type from the file name.
    pub fn from_bytes(file_name: &str, bytes: Vec<u8>) -> Result<Self, AssistantError> {
        let content_type = mime_guess::from_path(file_name)
            .first()
            .map(|m| m.essence_str().to_string())
            .unwrap_or_default();

        if !ACCEPTED_CONTENT_TYPES.contains(&content_type.as_str()) {
            return Err(AssistantError::MissingPrecondition(format!(
                "Unsupported document type for {file_name}: upload a PDF, JPG or PNG file"
            )));
        }
        if bytes.is_empty() {
            return Err(AssistantError::MissingPrecondition(format!(
                "Document {file_name} is empty"
            )));
        }

        Ok(Self {
            file_name: file_name.to_string(),
            content_type,
            bytes,
        })
    }

    /// Read a document from disk.
    pub async fn read(path: &Path) -> Result<Self, AssistantError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| AssistantError::Storage(format!("{}: {e}", path.display())))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::from_bytes(&file_name, bytes)
    }
}

// Bytes are deliberately left out: documents carry patient data.
impl std::fmt::Debug for UploadedDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadedDocument")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pdf_and_images_are_accepted() {
        let pdf = UploadedDocument::from_bytes("scan.pdf", vec![1, 2, 3]).unwrap();
        assert_eq!(pdf.content_type, "application/pdf");
        let jpg = UploadedDocument::from_bytes("photo.JPEG", vec![1]).unwrap();
        assert_eq!(jpg.content_type, "image/jpeg");
        let png = UploadedDocument::from_bytes("page.png", vec![1]).unwrap();
        assert_eq!(png.content_type, "image/png");
    }

    #[test]
    fn other_types_are_rejected() {
        let err = UploadedDocument::from_bytes("notes.docx", vec![1]).unwrap_err();
        assert!(matches!(err, AssistantError::MissingPrecondition(_)));
        assert!(UploadedDocument::from_bytes("no_extension", vec![1]).is_err());
    }

    #[test]
    fn empty_document_is_rejected() {
        let err = UploadedDocument::from_bytes("scan.pdf", Vec::new()).unwrap_err();
        assert!(matches!(err, AssistantError::MissingPrecondition(_)));
    }

    #[test]
    fn debug_omits_bytes() {
        let doc = UploadedDocument::from_bytes("scan.pdf", vec![42; 8]).unwrap();
        let shown = format!("{doc:?}");
        assert!(shown.contains("len: 8"));
        assert!(!shown.contains("42"));
    }

    #[tokio::test]
    async fn read_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.pdf");
        std::fs::write(&path, b"%PDF-1.4").unwrap();

        let doc = UploadedDocument::read(&path).await.unwrap();
        assert_eq!(doc.file_name, "report.pdf");
        assert_eq!(doc.bytes, b"%PDF-1.4");
    }

    #[tokio::test]
    async fn read_missing_file_is_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = UploadedDocument::read(&dir.path().join("gone.pdf"))
            .await
            .unwrap_err();
        assert!(matches!(err, AssistantError::Storage(_)));
    }
}
