use citemark::{Citation, CitationTable};
use serde::Deserialize;

use crate::error::StudioError;

const DEFAULT_FALLBACK: &str =
    "I can help analyze your agreements. Try asking about termination, renewal or liability.";

/// One pre-authored reply and the phrases that trigger it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScriptedResponse {
    pub triggers: Vec<String>,
    pub content: String,
    #[serde(default)]
    pub citations: Vec<Citation>,
}

/// The scripted replies used in place of a live model.
///
/// ```toml
/// fallback = "Ask me about termination."
///
/// [[response]]
/// triggers = ["termination", "terminate"]
/// content = "Either party may terminate [MSA §4]¹."
///
/// [[response.citations]]
/// id = "1"
/// documentId = "msa"
/// documentTitle = "Master Services Agreement"
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Script {
    #[serde(default = "default_fallback")]
    pub fallback: String,
    #[serde(default, rename = "response")]
    pub responses: Vec<ScriptedResponse>,
}

fn default_fallback() -> String {
    DEFAULT_FALLBACK.to_string()
}

impl Default for Script {
    fn default() -> Self {
        Script {
            fallback: default_fallback(),
            responses: Vec::new(),
        }
    }
}

/// A reply chosen for one user message.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptedReply {
    pub content: String,
    pub citations: CitationTable,
}

impl Script {
    pub fn from_toml(source: &str) -> Result<Self, StudioError> {
        Ok(toml::from_str(source)?)
    }

    /// Find the scripted response for `input`, if any trigger matches.
    ///
    /// Responses are tried in order; a trigger matches when it occurs in the
    /// input, ignoring case. Empty triggers never match.
    pub fn find(&self, input: &str) -> Option<&ScriptedResponse> {
        let input = input.to_lowercase();
        self.responses.iter().find(|response| {
            response
                .triggers
                .iter()
                .map(|t| t.trim().to_lowercase())
                .any(|t| !t.is_empty() && input.contains(&t))
        })
    }

    /// The reply for `input`: the first matching response, else the fallback.
    pub fn respond(&self, input: &str) -> ScriptedReply {
        match self.find(input) {
            Some(response) => ScriptedReply {
                content: response.content.clone(),
                citations: response.citations.iter().cloned().collect(),
            },
            None => ScriptedReply {
                content: self.fallback.clone(),
                citations: CitationTable::new(),
            },
        }
    }
}
