//! Prompt validation and the coloring page template.

use crate::error::{GenerationError, GenerationErrorCode};
use crate::Result;

/// Longest accepted prompt, in characters
pub const MAX_PROMPT_CHARS: usize = 2000;

const PREAMBLE: &str = "A black and white kids coloring page.";
const OPEN_TAG: &str = "<image-description>";
const CLOSE_TAG: &str = "</image-description>";

/// Check a user prompt and return it trimmed.
pub fn validate_prompt(prompt: &str) -> Result<&str> {
    let trimmed = prompt.trim();
    if trimmed.is_empty() {
        return Err(GenerationError::new(
            GenerationErrorCode::EmptyPrompt,
            "Please describe the picture you want to color",
        )
        .into());
    }

    let chars = prompt.chars().count();
    if chars > MAX_PROMPT_CHARS {
        return Err(GenerationError::new(
            GenerationErrorCode::PromptTooLong,
            format!(
                "Prompt is {} characters, the limit is {}",
                chars, MAX_PROMPT_CHARS
            ),
        )
        .into());
    }

    // Delimiters would let the prompt escape its description block
    if trimmed.contains(OPEN_TAG) || trimmed.contains(CLOSE_TAG) {
        return Err(GenerationError::new(
            GenerationErrorCode::InvalidPrompt,
            "Prompt must not contain image-description tags",
        )
        .into());
    }
    if trimmed.chars().any(|c| c.is_control() && c != '\n' && c != '\t') {
        return Err(GenerationError::new(
            GenerationErrorCode::InvalidPrompt,
            "Prompt contains control characters",
        )
        .into());
    }

    Ok(trimmed)
}

/// Wrap a validated description in the coloring page template.
pub fn build_prompt(description: &str) -> String {
    format!(
        "{}\n{}\n{}\n{}\n{}",
        PREAMBLE, OPEN_TAG, description, CLOSE_TAG, description
    )
}
