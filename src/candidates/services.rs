use anyhow::Context;
use bytes::Bytes;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    form::{ApplicationForm, Attachments},
    repo_types::{Candidate, CandidateFilter, CandidateSummary},
};
use crate::{
    error::{AppError, Result},
    state::AppState,
    storage::ext_from_mime,
};

const PRESIGN_TTL_SECS: u64 = 30 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Resume,
    Academics,
}

impl DocumentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DocumentKind::Resume => "resume",
            DocumentKind::Academics => "academics",
        }
    }

    fn path_of(self, c: &Candidate) -> Option<&str> {
        match self {
            DocumentKind::Resume => c.resume_path.as_deref(),
            DocumentKind::Academics => c.academic_docs_path.as_deref(),
        }
    }
}

pub struct UploadItem {
    pub body: Bytes,
    pub content_type: String,
}

async fn store_document(
    st: &AppState,
    folder: Uuid,
    kind: DocumentKind,
    item: UploadItem,
) -> Result<String> {
    let ext = ext_from_mime(&item.content_type).ok_or_else(|| {
        AppError::validation(format!(
            "Documents: unsupported {} file type {}",
            kind.as_str(),
            item.content_type
        ))
    })?;
    let key = format!("candidates/{}/{}.{}", folder, kind.as_str(), ext);
    st.storage
        .put_object(&key, item.body, &item.content_type)
        .await
        .with_context(|| format!("put_object {}", key))
        .map_err(AppError::internal("Failed to store documents"))?;
    Ok(key)
}

async fn remove_documents(st: &AppState, keys: &[String]) {
    for key in keys {
        if let Err(e) = st.storage.delete_object(key).await {
            warn!(error = %format!("{e:#}"), key = %key, "document not removed");
        }
    }
}

/// Validates the application, stores its documents and records the candidate.
#[instrument(skip_all, fields(email = %form.email))]
pub async fn submit_application(
    st: &AppState,
    form: ApplicationForm,
    resume: Option<UploadItem>,
    academics: Option<UploadItem>,
) -> Result<i64> {
    let attachments = Attachments {
        resume: resume.is_some(),
        academics: academics.is_some(),
    };
    let mut candidate = form
        .validate(attachments, st.clock.now().year())
        .map_err(|e| {
            warn!(step = e.step.title(), field = e.field, "application rejected");
            AppError::validation(e.to_string())
        })?;

    let folder = Uuid::new_v4();
    let mut stored = Vec::new();
    for (kind, item) in [(DocumentKind::Resume, resume), (DocumentKind::Academics, academics)] {
        let Some(item) = item else { continue };
        match store_document(st, folder, kind, item).await {
            Ok(key) => {
                match kind {
                    DocumentKind::Resume => candidate.resume_path = Some(key.clone()),
                    DocumentKind::Academics => candidate.academic_docs_path = Some(key.clone()),
                }
                stored.push(key);
            }
            Err(e) => {
                remove_documents(st, &stored).await;
                return Err(e);
            }
        }
    }

    match st.candidates.insert(candidate).await {
        Ok(id) => {
            info!(candidate_id = id, documents = stored.len(), "application received");
            Ok(id)
        }
        Err(e) => {
            remove_documents(st, &stored).await;
            Err(AppError::internal("Failed to submit application")(e))
        }
    }
}

pub async fn list_candidates(
    st: &AppState,
    filter: &CandidateFilter,
) -> Result<(Vec<CandidateSummary>, i64)> {
    st.candidates
        .list(filter)
        .await
        .map_err(AppError::internal("Failed to fetch candidates"))
}

pub async fn get_candidate(st: &AppState, id: i64) -> Result<Candidate> {
    st.candidates
        .get(id)
        .await
        .map_err(AppError::internal("Failed to fetch candidate"))?
        .ok_or_else(|| AppError::not_found("Candidate not found"))
}

/// Short-lived download link for one of the candidate's documents.
#[instrument(skip(st))]
pub async fn document_url(st: &AppState, id: i64, kind: DocumentKind) -> Result<String> {
    let candidate = get_candidate(st, id).await?;
    let key = kind
        .path_of(&candidate)
        .ok_or_else(|| AppError::not_found(format!("No {} uploaded", kind.as_str())))?;
    st.storage
        .presign_get(key, PRESIGN_TTL_SECS)
        .await
        .with_context(|| format!("presign url for {}", key))
        .map_err(AppError::internal("Failed to fetch document"))
}

#[instrument(skip(st))]
pub async fn delete_candidate(st: &AppState, id: i64) -> Result<()> {
    let removed = st
        .candidates
        .delete(id)
        .await
        .map_err(AppError::internal("Failed to delete candidate"))?
        .ok_or_else(|| AppError::not_found("Candidate not found"))?;
    let keys: Vec<String> = [removed.resume_path, removed.academic_docs_path]
        .into_iter()
        .flatten()
        .collect();
    remove_documents(st, &keys).await;
    info!(candidate_id = id, "candidate deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidates::form::tests::complete_form;
    use crate::state::testing::TestContext;

    fn form() -> ApplicationForm {
        serde_json::from_value(complete_form()).unwrap()
    }

    fn pdf() -> UploadItem {
        UploadItem {
            body: Bytes::from_static(b"%PDF-1.4"),
            content_type: "application/pdf".into(),
        }
    }

    #[tokio::test]
    async fn submit_stores_documents_under_one_folder() {
        let ctx = TestContext::new();
        let id = submit_application(&ctx.state, form(), Some(pdf()), Some(pdf()))
            .await
            .unwrap();

        let keys = ctx.storage.keys();
        assert_eq!(keys.len(), 2);
        let c = get_candidate(&ctx.state, id).await.unwrap();
        let resume = c.resume_path.unwrap();
        let academics = c.academic_docs_path.unwrap();
        assert!(resume.starts_with("candidates/") && resume.ends_with("/resume.pdf"));
        assert_eq!(
            resume.trim_end_matches("resume.pdf"),
            academics.trim_end_matches("academics.pdf")
        );
    }

    #[tokio::test]
    async fn rejected_application_stores_nothing() {
        let ctx = TestContext::new();
        let err = submit_application(&ctx.state, form(), None, Some(pdf()))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Documents: Resume is required");
        assert!(ctx.storage.keys().is_empty());
    }

    #[tokio::test]
    async fn unsupported_document_type_rolls_back_earlier_upload() {
        let ctx = TestContext::new();
        let exe = UploadItem {
            body: Bytes::from_static(b"MZ"),
            content_type: "application/x-msdownload".into(),
        };
        let err = submit_application(&ctx.state, form(), Some(pdf()), Some(exe))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(ctx.storage.keys().is_empty());
    }

    #[tokio::test]
    async fn document_url_requires_an_upload() {
        let ctx = TestContext::new();
        let id = submit_application(&ctx.state, form(), Some(pdf()), None)
            .await
            .unwrap();
        let url = document_url(&ctx.state, id, DocumentKind::Resume).await.unwrap();
        assert!(url.contains("/resume.pdf"));
        let err = document_url(&ctx.state, id, DocumentKind::Academics).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn delete_removes_row_and_documents() {
        let ctx = TestContext::new();
        let id = submit_application(&ctx.state, form(), Some(pdf()), Some(pdf()))
            .await
            .unwrap();
        delete_candidate(&ctx.state, id).await.unwrap();
        assert!(ctx.storage.keys().is_empty());
        assert!(matches!(
            delete_candidate(&ctx.state, id).await.unwrap_err(),
            AppError::NotFound(_)
        ));
    }
}
