/// Optional AI-assisted text features
///
/// Remark merging and profile summarization are expressed as capabilities
/// (`TextMerger`, `ProfileSummarizer`). Which implementation backs them is
/// decided once at startup: a network-backed one when a text-generation
/// service is configured, the deterministic local one otherwise.

pub mod assist;
pub mod generator;
pub mod remark;

pub use assist::*;
pub use generator::*;
pub use remark::*;

use std::sync::Arc;

use thiserror::Error;

use crate::config::TextGenerationConfig;

/// Errors from the text-generation service
///
/// These never reach an HTTP caller; every use site recovers with the
/// local fallback.
#[derive(Error, Debug)]
pub enum TextError {
    #[error("Text generation request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Text generation service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Text generation service returned no content")]
    EmptyResponse,
}

/// The text capabilities handed to the HTTP layer
#[derive(Clone)]
pub struct TextCapabilities {
    pub merger: Arc<dyn TextMerger>,
    pub profiler: Arc<dyn ProfileSummarizer>,
}

impl TextCapabilities {
    /// Deterministic capabilities, no network involved
    pub fn local() -> Self {
        let local = Arc::new(LocalText);
        Self {
            merger: local.clone(),
            profiler: local,
        }
    }

    /// Pick the implementation from configuration presence
    pub fn from_config(config: Option<&TextGenerationConfig>) -> Result<Self, TextError> {
        let Some(config) = config else {
            tracing::info!("No text generation service configured, using local text fallback");
            return Ok(Self::local());
        };

        let client = ChatCompletionsClient::new(config)?;
        tracing::info!(
            "Text generation enabled with model {} at {}",
            config.model,
            config.base_url
        );

        let assisted = Arc::new(AssistedText::new(client));
        Ok(Self {
            merger: assisted.clone(),
            profiler: assisted,
        })
    }
}
