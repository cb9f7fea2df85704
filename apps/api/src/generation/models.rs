use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::models::user::Tier;

/// What the caller wants generated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    /// Resume summary plus a cover letter.
    #[default]
    Resume,
    /// LinkedIn headline, summary and experience bullets.
    Linkedin,
}

impl FromStr for ContentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "resume" => Ok(ContentType::Resume),
            "linkedin" => Ok(ContentType::Linkedin),
            other => Err(format!(
                "Invalid contentType '{other}': expected 'resume' or 'linkedin'"
            )),
        }
    }
}

/// A validated generation request. Lives for one request/response cycle.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub input: String,
    pub content_type: ContentType,
    pub user_tier: Tier,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeSections {
    pub resume_section: String,
    pub cover_letter_section: String,
    pub raw_text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkedinSections {
    pub headline_section: String,
    pub summary_section: String,
    pub experience_section: String,
    pub raw_text: String,
}

/// Structured fields pulled out of one completion, plus the untouched completion text.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum GenerationResult {
    Resume(ResumeSections),
    Linkedin(LinkedinSections),
}
