//! HTML-to-PDF rendering for resume downloads.
//!
//! The renderer is an external program invoked as `<program> [args..] <input.html>
//! <output.pdf>` inside a scratch directory (wkhtmltopdf's calling convention).
//! Failures are surfaced to the user; nothing is retried.

use std::process::Stdio;

use async_trait::async_trait;
use tempfile::TempDir;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("could not start renderer '{program}': {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("renderer exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[async_trait]
pub trait PdfRenderer: Send + Sync {
    async fn render(&self, html: &str) -> Result<Vec<u8>, RenderError>;
}

#[derive(Debug, Clone)]
pub struct CommandPdfRenderer {
    program: String,
    args: Vec<String>,
}

impl CommandPdfRenderer {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Extra arguments placed before the input and output paths.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// wkhtmltopdf with quiet output and print media styles.
    pub fn wkhtmltopdf(program: impl Into<String>) -> Self {
        Self::new(program).with_args(["--quiet", "--print-media-type"])
    }
}

#[async_trait]
impl PdfRenderer for CommandPdfRenderer {
    async fn render(&self, html: &str) -> Result<Vec<u8>, RenderError> {
        let scratch = TempDir::new()?;
        let input = scratch.path().join("resume.html");
        let output = scratch.path().join("resume.pdf");
        tokio::fs::write(&input, html).await?;

        let result = Command::new(&self.program)
            .args(&self.args)
            .arg(&input)
            .arg(&output)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|source| RenderError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr).trim().to_string();
            warn!("PDF renderer failed ({}): {stderr}", result.status);
            return Err(RenderError::Failed {
                status: result.status.to_string(),
                stderr,
            });
        }

        let pdf = tokio::fs::read(&output).await?;
        debug!("Rendered {} bytes of HTML into {} bytes of PDF", html.len(), pdf.len());
        Ok(pdf)
    }
}
