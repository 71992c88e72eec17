//! Name suggestion — the one external boundary of the session.
//!
//! DESIGN
//! ======
//! An upload pre-fills its display name from a suggestion service fed the
//! original file name. The service is opaque behind `NameSuggester`; the
//! session only depends on the consumed contract: a short label, trimmed of
//! quotes and capped at ten characters, with a fixed default whenever the
//! backend is missing, failing, or returns nothing usable. Failures never
//! reach the user.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

/// Fallback label when no usable suggestion is available.
pub const DEFAULT_TEMPLATE_NAME: &str = "New Template";

/// Display-character cap on suggested names.
pub const MAX_SUGGESTED_NAME_CHARS: usize = 10;

#[derive(Debug, thiserror::Error)]
#[error("name suggestion failed: {0}")]
pub struct NameSuggestError(pub String);

/// Opaque suggestion backend. Implementations are out of scope; tests use a
/// mock.
#[async_trait]
pub trait NameSuggester: Send + Sync {
    async fn suggest(&self, file_name: &str) -> Result<String, NameSuggestError>;
}

/// Produce the display name for an upload: the sanitized suggestion, or the
/// default label.
pub async fn suggest_display_name(suggester: Option<&Arc<dyn NameSuggester>>, file_name: &str) -> String {
    let Some(suggester) = suggester else {
        return DEFAULT_TEMPLATE_NAME.to_string();
    };

    match suggester.suggest(file_name).await {
        Ok(raw) => {
            let sanitized = sanitize(&raw);
            if sanitized.is_empty() {
                DEFAULT_TEMPLATE_NAME.to_string()
            } else {
                sanitized
            }
        }
        Err(e) => {
            warn!(error = %e, file_name, "name suggestion failed; using default label");
            DEFAULT_TEMPLATE_NAME.to_string()
        }
    }
}

/// Trim whitespace, strip one layer of surrounding quotes, cap the length.
fn sanitize(raw: &str) -> String {
    let trimmed = raw.trim();
    let unquoted = trimmed
        .strip_prefix(['"', '\u{201c}'])
        .and_then(|s| s.strip_suffix(['"', '\u{201d}']))
        .unwrap_or(trimmed)
        .trim();
    unquoted.chars().take(MAX_SUGGESTED_NAME_CHARS).collect()
}

// =============================================================================
// TESTS
// =============================================================================
