//! Generative Resume Producer.
//!
//! Flow: load profile → build prompt → one model call → strip fences →
//!       check for a complete HTML document → store HTML → append index record.
//!
//! The index record is only written after the HTML is stored, and the HTML is
//! removed again if the index write fails, so a failed generation leaves neither
//! a record nor a file behind.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::llm_client::prompts::{render_template, PromptContext};
use crate::llm_client::{strip_code_fences, GenerationParams, TextGenerator};
use crate::profile::models::Profile;
use crate::profile::service::load_profile;
use crate::resumes::index::{append_record, ResumeRecord, TIMESTAMP_FORMAT};
use crate::resumes::prompts::{NO_CUSTOM_INSTRUCTIONS, RESUME_PROMPT_TEMPLATE, RESUME_SYSTEM};
use crate::storage::keys::{self, ProfileName};
use crate::storage::{DocumentStore, HTML_CONTENT_TYPE};

/// Low temperature keeps the output close to the template; the token ceiling
/// leaves room for a full HTML document with inline CSS.
pub const RESUME_GENERATION: GenerationParams = GenerationParams {
    temperature: 0.2,
    max_output_tokens: 8192,
};

const DOCTYPE_PREFIX: &str = "<!doctype html";
const SNIPPET_CHARS: usize = 200;
const MAX_FILENAME_PART: usize = 40;
const ID_SUFFIX_CHARS: usize = 8;

/// Request body for resume generation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub job_title: String,
    #[serde(default, alias = "company")]
    pub company_name: String,
    #[serde(default)]
    pub job_description: String,
}

/// Generates, stores and indexes one tailored resume.
pub async fn generate_resume(
    store: &dyn DocumentStore,
    llm: &dyn TextGenerator,
    style_guide: &str,
    profile: &ProfileName,
    request: &GenerateRequest,
) -> Result<ResumeRecord, AppError> {
    let job_description = request.job_description.trim();
    if job_description.is_empty() {
        return Err(AppError::Validation(
            "Job description cannot be empty.".to_string(),
        ));
    }
    let job_title = request.job_title.trim();
    let company = request.company_name.trim();

    let data = load_profile(store, profile).await?;
    let prompt = build_resume_prompt(&data, job_title, company, job_description, style_guide)?;

    info!(
        "Generating resume for '{profile}' ({} prompt chars, role: {job_title:?} at {company:?})",
        prompt.len()
    );
    let raw = llm
        .generate_text(RESUME_SYSTEM, &prompt, RESUME_GENERATION)
        .await?;
    let html = validate_html(&raw)?;

    let now = Utc::now();
    let id = Uuid::new_v4();
    let filename = resume_filename(profile, now, id, job_title, company);
    let key = keys::resume_body(profile, &filename)?;

    store
        .put(&key, Bytes::copy_from_slice(html.as_bytes()), HTML_CONTENT_TYPE)
        .await?;

    let record = ResumeRecord {
        id,
        filename,
        display_name: display_name(job_title, company),
        job_title: job_title.to_string(),
        company: company.to_string(),
        created_at: now.format(TIMESTAMP_FORMAT).to_string(),
    };

    if let Err(e) = append_record(store, profile, record.clone()).await {
        if let Err(cleanup) = store.delete(&key).await {
            warn!("Could not remove orphaned resume '{key}': {cleanup}");
        }
        return Err(e.into());
    }

    info!(
        "Generated resume {} ('{}') for '{profile}'",
        record.id, record.filename
    );
    Ok(record)
}

/// Fills the generation template.
///
/// The candidate's custom instructions are rendered against the same context
/// first, so they may mention `{job_title}` or `{company_name}`; an unknown
/// placeholder there is reported as `MissingContextKey`.
pub fn build_resume_prompt(
    profile: &Profile,
    job_title: &str,
    company: &str,
    job_description: &str,
    style_guide: &str,
) -> Result<String, AppError> {
    let profile_json = serde_json::to_string_pretty(profile)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to serialize profile: {e}")))?;

    let mut context = PromptContext::from([
        ("profile_json", profile_json),
        ("job_title", job_title.to_string()),
        ("company_name", company.to_string()),
        ("job_description", job_description.to_string()),
        ("template_example", style_guide.to_string()),
    ]);

    let custom = profile.ai_custom_prompt.trim();
    let custom = if custom.is_empty() {
        NO_CUSTOM_INSTRUCTIONS.to_string()
    } else {
        render_template(custom, &context)?
    };
    context.insert("custom_instructions", custom);

    Ok(render_template(RESUME_PROMPT_TEMPLATE, &context)?)
}

/// Strips fences and checks the result is a complete HTML document.
fn validate_html(raw: &str) -> Result<&str, AppError> {
    let html = strip_code_fences(raw);
    let is_document = html
        .get(..DOCTYPE_PREFIX.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(DOCTYPE_PREFIX));

    if !is_document {
        let snippet: String = html.chars().take(SNIPPET_CHARS).collect();
        return Err(AppError::InvalidGenerationOutput {
            snippet: escape_html(&snippet),
        });
    }
    Ok(html)
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// `{profile}_{YYYYmmdd_HHMMSS}_{title}_{company}_{id8}.html`, empty parts omitted.
///
/// The record id prefix keeps same-second generations for the same role from
/// sharing a body.
fn resume_filename(
    profile: &ProfileName,
    at: DateTime<Utc>,
    id: Uuid,
    job_title: &str,
    company: &str,
) -> String {
    let mut parts = vec![
        filename_token(profile.as_str()).unwrap_or_else(|| "resume".to_string()),
        at.format("%Y%m%d_%H%M%S").to_string(),
    ];
    parts.extend(filename_token(job_title));
    parts.extend(filename_token(company));
    parts.push(id.simple().to_string()[..ID_SUFFIX_CHARS].to_string());
    format!("{}.html", parts.join("_"))
}

/// Reduces `raw` to `[A-Za-z0-9._-]`, whitespace becoming `_`. `None` if nothing
/// usable remains.
fn filename_token(raw: &str) -> Option<String> {
    let mut token = String::new();
    for c in raw.chars() {
        if c.is_ascii_alphanumeric() || c == '-' || c == '.' {
            token.push(c);
        } else if (c.is_whitespace() || c == '_') && !token.ends_with('_') {
            token.push('_');
        }
    }
    let token: String = token
        .trim_matches(|c| c == '_' || c == '.')
        .chars()
        .take(MAX_FILENAME_PART)
        .collect();
    let token = token.trim_end_matches(['_', '.']);
    (!token.is_empty()).then(|| token.to_string())
}

fn display_name(job_title: &str, company: &str) -> String {
    match (job_title.is_empty(), company.is_empty()) {
        (false, false) => format!("{job_title} at {company}"),
        (false, true) => job_title.to_string(),
        (true, false) => format!("Resume for {company}"),
        (true, true) => "Untitled resume".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::LlmError;
    use crate::profile::service::set_custom_prompt;
    use crate::resumes::index::list_records;
    use crate::storage::memory::MemoryStore;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::sync::Mutex;

    const STYLE_GUIDE: &str = "<!DOCTYPE html><html><style>body { margin: 0 }</style></html>";
    const GOOD_HTML: &str = "<!DOCTYPE html>\n<html><body><h1>Ada</h1></body></html>";

    /// Returns a fixed reply and remembers the prompt it was given.
    struct StubGenerator {
        reply: Result<String, ()>,
        seen: Mutex<Option<(String, GenerationParams)>>,
    }

    impl StubGenerator {
        fn replying(text: &str) -> Self {
            Self {
                reply: Ok(text.to_string()),
                seen: Mutex::new(None),
            }
        }

        fn failing() -> Self {
            Self {
                reply: Err(()),
                seen: Mutex::new(None),
            }
        }

        fn prompt(&self) -> Option<String> {
            self.seen.lock().unwrap().as_ref().map(|(p, _)| p.clone())
        }
    }

    #[async_trait]
    impl TextGenerator for StubGenerator {
        async fn generate_text(
            &self,
            _system: &str,
            prompt: &str,
            params: GenerationParams,
        ) -> Result<String, LlmError> {
            *self.seen.lock().unwrap() = Some((prompt.to_string(), params));
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(()) => Err(LlmError::Api {
                    status: 503,
                    message: "overloaded".to_string(),
                }),
            }
        }
    }

    fn alice() -> ProfileName {
        ProfileName::parse("alice").unwrap()
    }

    fn request() -> GenerateRequest {
        GenerateRequest {
            job_title: "Backend Engineer".to_string(),
            company_name: "Acme Corp".to_string(),
            job_description: "Build reliable services in Rust.".to_string(),
        }
    }

    #[tokio::test]
    async fn test_success_stores_exact_output_and_one_record() {
        let store = MemoryStore::new();
        let llm = StubGenerator::replying(&format!("```html\n{GOOD_HTML}\n```"));

        let record = generate_resume(&store, &llm, STYLE_GUIDE, &alice(), &request())
            .await
            .unwrap();

        let records = list_records(&store, &alice()).await.unwrap();
        assert_eq!(records, vec![record.clone()]);
        assert_eq!(record.display_name, "Backend Engineer at Acme Corp");

        let body = store
            .get(&format!("alice/{}", record.filename))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(&body[..], GOOD_HTML.as_bytes());
    }

    #[tokio::test]
    async fn test_invalid_output_leaves_nothing_behind() {
        let store = MemoryStore::new();
        let llm = StubGenerator::replying("Sure! Here is your resume: <html></html>");

        let err = generate_resume(&store, &llm, STYLE_GUIDE, &alice(), &request())
            .await
            .unwrap_err();

        match err {
            AppError::InvalidGenerationOutput { snippet } => {
                assert!(snippet.starts_with("Sure! Here is your resume: &lt;html&gt;"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(store.keys().await.is_empty());
    }

    #[tokio::test]
    async fn test_model_failure_leaves_nothing_behind() {
        let store = MemoryStore::new();
        let llm = StubGenerator::failing();

        let err = generate_resume(&store, &llm, STYLE_GUIDE, &alice(), &request())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Llm(_)));
        assert!(store.keys().await.is_empty());
    }

    #[tokio::test]
    async fn test_empty_job_description_rejected_before_model_call() {
        let store = MemoryStore::new();
        let llm = StubGenerator::replying(GOOD_HTML);
        let req = GenerateRequest {
            job_description: "   ".to_string(),
            ..request()
        };

        let err = generate_resume(&store, &llm, STYLE_GUIDE, &alice(), &req)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(llm.prompt().is_none());
    }

    #[tokio::test]
    async fn test_stray_placeholder_in_custom_prompt_is_reported() {
        let store = MemoryStore::new();
        set_custom_prompt(&store, &alice(), "Mention {salary} expectations".to_string())
            .await
            .unwrap();
        let llm = StubGenerator::replying(GOOD_HTML);

        let err = generate_resume(&store, &llm, STYLE_GUIDE, &alice(), &request())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::MissingContextKey(ref msg) if msg.contains("{salary}")));
        assert!(llm.prompt().is_none());
        assert!(list_records(&store, &alice()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_prompt_carries_all_context_and_params() {
        let store = MemoryStore::new();
        set_custom_prompt(&store, &alice(), "Stress fit for {company_name}.".to_string())
            .await
            .unwrap();
        let llm = StubGenerator::replying(GOOD_HTML);

        generate_resume(&store, &llm, STYLE_GUIDE, &alice(), &request())
            .await
            .unwrap();

        let prompt = llm.prompt().unwrap();
        assert!(prompt.contains("TARGET ROLE: Backend Engineer at Acme Corp"));
        assert!(prompt.contains("Build reliable services in Rust."));
        assert!(prompt.contains(STYLE_GUIDE));
        assert!(prompt.contains("\"ai_custom_prompt\""));
        assert!(prompt.contains("Stress fit for Acme Corp."));

        let (_, params) = llm.seen.lock().unwrap().clone().unwrap();
        assert_eq!(params, RESUME_GENERATION);
    }

    #[tokio::test]
    async fn test_same_second_generations_get_distinct_files() {
        let store = MemoryStore::new();
        let llm = StubGenerator::replying(GOOD_HTML);

        let first = generate_resume(&store, &llm, STYLE_GUIDE, &alice(), &request())
            .await
            .unwrap();
        let second = generate_resume(&store, &llm, STYLE_GUIDE, &alice(), &request())
            .await
            .unwrap();

        assert_ne!(first.id, second.id);
        assert_ne!(first.filename, second.filename);
        assert!(first.filename.ends_with(&format!("_{}.html", &first.id.simple().to_string()[..8])));
        assert_eq!(list_records(&store, &alice()).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_generations_never_share_a_body() {
        let store = MemoryStore::new();
        let llm = StubGenerator::replying(GOOD_HTML);

        let (profile, job) = (alice(), request());

        let (first, second) = tokio::join!(
            generate_resume(&store, &llm, STYLE_GUIDE, &profile, &job),
            generate_resume(&store, &llm, STYLE_GUIDE, &profile, &job),
        );
        let (first, second) = (first.unwrap(), second.unwrap());

        assert_ne!(first.filename, second.filename);
        for record in [&first, &second] {
            let key = format!("alice/{}", record.filename);
            assert!(store.exists(&key).await.unwrap(), "missing body {key}");
        }
    }

    #[test]
    fn test_validate_html_accepts_lowercase_doctype() {
        assert!(validate_html("<!doctype html><html></html>").is_ok());
        assert!(validate_html("<html></html>").is_err());
        assert!(validate_html("").is_err());
    }

    #[test]
    fn test_snippet_is_truncated() {
        let long = "x".repeat(1000);
        match validate_html(&long) {
            Err(AppError::InvalidGenerationOutput { snippet }) => assert_eq!(snippet.len(), 200),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_resume_filename_is_sanitized() {
        let at = Utc.with_ymd_and_hms(2024, 5, 17, 9, 30, 5).unwrap();
        let name = ProfileName::parse("Ada Lovelace").unwrap();
        let id = Uuid::parse_str("0f1e2d3c-4b5a-4978-8695-a4b3c2d1e0f9").unwrap();
        assert_eq!(
            resume_filename(&name, at, id, "Sr. Engineer / Platform", "Acme, Inc."),
            "Ada_Lovelace_20240517_093005_Sr._Engineer_Platform_Acme_Inc_0f1e2d3c.html"
        );
        assert_eq!(
            resume_filename(&name, at, id, "", "  "),
            "Ada_Lovelace_20240517_093005_0f1e2d3c.html"
        );
    }

    #[test]
    fn test_filename_token_strips_unsafe_characters() {
        assert_eq!(filename_token("../../etc").as_deref(), Some("etc"));
        assert_eq!(filename_token("日本語"), None);
        assert_eq!(filename_token("a  b__c").as_deref(), Some("a_b_c"));
    }

    #[test]
    fn test_display_name_variants() {
        assert_eq!(display_name("Engineer", "Acme"), "Engineer at Acme");
        assert_eq!(display_name("Engineer", ""), "Engineer");
        assert_eq!(display_name("", "Acme"), "Resume for Acme");
        assert_eq!(display_name("", ""), "Untitled resume");
    }
}
