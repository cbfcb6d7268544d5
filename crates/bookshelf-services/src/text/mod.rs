//! Book description polishing through an external text generation API

pub mod nlp_cloud;

use std::sync::Arc;

use async_trait::async_trait;
use bookshelf_core::AppError;
use serde::Serialize;

pub use nlp_cloud::NlpCloudClient;

/// Sampling parameters sent with a generation request
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GenerationParams {
    pub max_length: u32,
    pub length_no_input: bool,
    pub temperature: f32,
    pub top_p: f32,
    pub repetition_penalty: f32,
}

impl GenerationParams {
    /// Conservative sampling for grammar fixes
    pub fn grammar() -> Self {
        Self {
            temperature: 0.3,
            ..Self::default()
        }
    }

    pub fn creative() -> Self {
        Self {
            temperature: 0.7,
            ..Self::default()
        }
    }
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_length: 2500,
            length_no_input: true,
            temperature: 0.7,
            top_p: 0.9,
            repetition_penalty: 1.2,
        }
    }
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate a continuation of `prompt`
    async fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String, AppError>;
}

fn grammar_prompt(text: &str) -> String {
    format!(
        "Fix all grammar and spelling mistakes in the following text. Return ONLY the corrected text without any explanations:\n\n{}",
        text
    )
}

fn improve_prompt(text: &str, instruction: Option<&str>) -> String {
    match instruction.map(str::trim).filter(|i| !i.is_empty()) {
        Some(instruction) => format!(
            "Improve the following book description based on this instruction: \"{}\". Keep the same core information but enhance the writing according to the instruction. Do not add fictional details, only improve the existing content:\n\n{}\n\nImproved description:",
            instruction, text
        ),
        None => format!(
            "Improve the following book description to make it more engaging, professional, and appealing to readers. Keep the same core information but enhance the writing quality, flow, and impact. Do not add fictional details, only improve the existing content:\n\n{}\n\nImproved description:",
            text
        ),
    }
}

/// Grammar fixes and description improvements on top of a [`TextGenerator`]
#[derive(Clone)]
pub struct DescriptionPolisher {
    generator: Arc<dyn TextGenerator>,
}

impl DescriptionPolisher {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    #[tracing::instrument(skip(self, text), fields(text_len = text.len()))]
    pub async fn fix_grammar(&self, text: &str) -> Result<String, AppError> {
        let text = require_text(text)?;
        let generated = self
            .generator
            .generate(&grammar_prompt(text), &GenerationParams::grammar())
            .await?;
        Ok(or_original(generated, text))
    }

    #[tracing::instrument(skip(self, text, instruction), fields(text_len = text.len()))]
    pub async fn improve(&self, text: &str, instruction: Option<&str>) -> Result<String, AppError> {
        let text = require_text(text)?;
        let generated = self
            .generator
            .generate(&improve_prompt(text, instruction), &GenerationParams::creative())
            .await?;
        Ok(or_original(generated, text))
    }
}

fn require_text(text: &str) -> Result<&str, AppError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(AppError::BadRequest("Text is required".to_string()));
    }
    Ok(trimmed)
}

fn or_original(generated: String, original: &str) -> String {
    let generated = generated.trim();
    if generated.is_empty() {
        tracing::warn!("Text generation returned an empty answer, keeping the input text");
        original.to_string()
    } else {
        generated.to_string()
    }
}
