//! Query expansion: one phrase in, a handful of alternative phrasings out.
//!
//! The language model behind it is external. `variants_for` is the only
//! entry point the retriever uses, and it degrades to the raw query whenever
//! the expander is missing, fails, or returns nothing usable.

use crate::error::{Result, SeekError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const MAX_VARIANTS: usize = 5;

pub trait QueryExpander: Send + Sync {
    /// Raw newline-delimited alternatives for `prompt`.
    fn expand(&self, prompt: &str) -> Result<String>;
}

/// Split expander output into at most `MAX_VARIANTS` non-blank lines.
pub fn parse_variants(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .take(MAX_VARIANTS)
        .map(str::to_string)
        .collect()
}

/// Variants to search for `query`, in the order they should be processed.
pub fn variants_for(expander: Option<&dyn QueryExpander>, query: &str) -> Vec<String> {
    let fallback = || vec![query.to_string()];
    let Some(expander) = expander else {
        return fallback();
    };

    match expander.expand(query) {
        Ok(text) => {
            let variants = parse_variants(&text);
            if variants.is_empty() {
                tracing::warn!("[Expander] No variants for '{}', using the query as is", query);
                fallback()
            } else {
                tracing::debug!("[Expander] '{}' -> {:?}", query, variants);
                variants
            }
        }
        Err(e) => {
            tracing::warn!("[Expander] Expansion failed for '{}': {}", query, e);
            fallback()
        }
    }
}

fn expansion_prompt(query: &str) -> String {
    format!(
        "Generate five different names for the file, directory or application the user \
         asked to open or search for. They are used to look up items in a vector database \
         of file names, so vary spelling, wording and common product names. If the user \
         described a task instead of a name, list the applications or files that would do \
         that task (for a web search app: chrome, microsoft edge, firefox, opera, brave). \
         Reply with the names only, one per line.\n\
         User asked for: {}",
        query
    )
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    content: Option<String>,
}

/// Expander backed by an OpenAI-compatible chat completions endpoint.
///
/// Uses the blocking client; call it from a blocking context.
pub struct ChatExpander {
    client: reqwest::blocking::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

impl ChatExpander {
    pub fn new(endpoint: &str, model: &str, api_key: Option<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SeekError::Expansion(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            model: model.to_string(),
            api_key,
        })
    }
}

impl QueryExpander for ChatExpander {
    fn expand(&self, prompt: &str) -> Result<String> {
        let content = expansion_prompt(prompt);
        let body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage { role: "user", content: &content }],
            temperature: 0.7,
        };

        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| SeekError::Expansion(e.to_string()))?;
        let parsed: ChatResponse = response
            .json()
            .map_err(|e| SeekError::Expansion(format!("Bad response body: {}", e)))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| SeekError::Expansion("Response had no content".into()))
    }
}


#[cfg(test)]
mod tests {
    use super::testing::CannedExpander;
    use super::*;

    #[test]
    fn test_parse_drops_blank_lines_and_caps_at_five() {
        let text = "chrome\n\n  edge  \nfirefox\n\nopera\nbrave\nvivaldi\n";
        assert_eq!(parse_variants(text), vec!["chrome", "edge", "firefox", "opera", "brave"]);
    }

    #[test]
    fn test_parse_is_restartable() {
        let text = "a\nb";
        assert_eq!(parse_variants(text), parse_variants(text));
    }

    #[test]
    fn test_no_expander_uses_raw_query() {
        assert_eq!(variants_for(None, "web browser"), vec!["web browser"]);
    }

    #[test]
    fn test_failing_or_blank_expander_uses_raw_query() {
        let failing = CannedExpander::failing();
        assert_eq!(variants_for(Some(&failing), "web browser"), vec!["web browser"]);

        let blank = CannedExpander::lines(&["", "   "]);
        assert_eq!(variants_for(Some(&blank), "web browser"), vec!["web browser"]);
    }

    #[test]
    fn test_expander_variants_replace_query() {
        let expander = CannedExpander::lines(&["chrome.exe", "msedge.exe"]);
        assert_eq!(variants_for(Some(&expander), "web browser"), vec!["chrome.exe", "msedge.exe"]);
    }
}
