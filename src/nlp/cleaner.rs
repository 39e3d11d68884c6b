use regex::Regex;

use crate::error::PipelineError;
use crate::Result;

/// Normalises raw post text before classification
pub trait TextCleaner: Send + Sync {
    fn clean(&self, text: &str) -> String;
}

/// Lowercases, strips links, `<user>`/`<url>` placeholders and anything that
/// is not an ASCII letter, then collapses whitespace.
#[derive(Debug, Clone)]
pub struct BasicCleaner {
    /// `http…` / `www…` runs up to the next whitespace
    link_regex: Regex,
    /// Placeholders left by upstream anonymisation
    placeholder_regex: Regex,
    non_letter_regex: Regex,
    whitespace_regex: Regex,
}

impl BasicCleaner {
    pub fn new() -> Result<Self> {
        Ok(Self {
            link_regex: compile(r"http\S+|www\S+")?,
            placeholder_regex: compile(r"<user>|<url>")?,
            non_letter_regex: compile(r"[^a-z\s]")?,
            whitespace_regex: compile(r"\s+")?,
        })
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern)
        .map_err(|e| PipelineError::InvalidInput(format!("bad pattern {}: {}", pattern, e)))
}

impl TextCleaner for BasicCleaner {
    fn clean(&self, text: &str) -> String {
        let text = text.to_lowercase();
        let text = self.link_regex.replace_all(&text, "");
        let text = self.placeholder_regex.replace_all(&text, "");
        let text = self.non_letter_regex.replace_all(&text, "");
        let text = self.whitespace_regex.replace_all(&text, " ");
        text.trim().to_string()
    }
}
