// file: src/utils/validation.rs
// description: data validation utilities and helpers
// reference: input validation patterns

use crate::error::{PipelineError, Result};

pub struct Validator;

impl Validator {
    /// Only the empty string is rejected; queries are otherwise passed through untouched.
    pub fn validate_query(query: &str) -> Result<()> {
        if query.is_empty() {
            return Err(PipelineError::Validation("Query is empty".to_string()));
        }
        Ok(())
    }

    pub fn validate_top_k(top_k: usize) -> Result<()> {
        if top_k == 0 {
            return Err(PipelineError::Validation(
                "top_k must be greater than 0".to_string(),
            ));
        }

        if top_k > 10000 {
            return Err(PipelineError::Validation(
                "top_k too large (max 10000)".to_string(),
            ));
        }

        Ok(())
    }

    pub fn validate_dimension(expected: usize, actual: usize) -> Result<()> {
        if expected != actual {
            return Err(PipelineError::Validation(format!(
                "Vector dimension {} does not match expected dimension {}",
                actual, expected
            )));
        }
        Ok(())
    }

    pub fn validate_url(url: &str) -> Result<()> {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(PipelineError::Validation(format!(
                "Invalid URL format: {}",
                url
            )));
        }
        Ok(())
    }

    pub fn truncate_text(text: &str, max_chars: usize) -> String {
        match text.char_indices().nth(max_chars) {
            Some((byte_idx, _)) => format!("{}...", &text[..byte_idx]),
            None => text.to_string(),
        }
    }
}
