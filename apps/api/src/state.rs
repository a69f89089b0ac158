use std::path::PathBuf;
use std::sync::Arc;

use crate::auth::SessionKeys;
use crate::llm_client::TextGenerator;
use crate::render::PdfRenderer;
use crate::storage::DocumentStore;

/// Shared application state injected into all route handlers via Axum extractors.
/// Every collaborator is constructed in `main` and held behind a trait object.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub llm: Arc<dyn TextGenerator>,
    pub pdf: Arc<dyn PdfRenderer>,
    pub sessions: SessionKeys,
    /// Style-guide HTML handed to the model; read on each generation so edits
    /// apply without a restart.
    pub resume_template_path: PathBuf,
}
