//! Value extraction from page content.

use regex::Regex;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PatternError {
    #[error("Invalid pattern: {0}")]
    Invalid(#[from] regex::Error),

    #[error("Pattern `{0}` has no capture group")]
    MissingCaptureGroup(String),

    #[error("Pattern `{0}` did not match the page")]
    NoMatch(String),
}

/// A compiled extraction rule. The first capture group is the watched value.
#[derive(Debug, Clone)]
pub struct ExtractionPattern {
    regex: Regex,
}

impl ExtractionPattern {
    pub fn compile(pattern: &str) -> Result<Self, PatternError> {
        let regex = Regex::new(pattern)?;
        // captures_len counts the implicit whole-match group
        if regex.captures_len() < 2 {
            return Err(PatternError::MissingCaptureGroup(pattern.to_string()));
        }
        Ok(Self { regex })
    }

    /// First capture of the first match. An optional group that did not
    /// participate yields an empty string.
    pub fn extract(&self, content: &str) -> Result<String, PatternError> {
        let captures = self
            .regex
            .captures(content)
            .ok_or_else(|| PatternError::NoMatch(self.regex.as_str().to_string()))?;

        Ok(captures
            .get(1)
            .map(|m| m.as_str().to_string())
            .unwrap_or_default())
    }
}
