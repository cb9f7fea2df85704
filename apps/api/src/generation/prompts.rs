// All prompt templates and section markers for the Generation module.

use crate::generation::models::ContentType;

pub const RESUME_MARKER: &str = "---RESUME---";
pub const COVER_LETTER_MARKER: &str = "---COVER LETTER---";
pub const HEADLINE_MARKER: &str = "---HEADLINE---";
pub const SUMMARY_MARKER: &str = "---SUMMARY---";
pub const EXPERIENCE_MARKER: &str = "---EXPERIENCE---";

/// Markers the completion is split on, in the order the prompt asks for them.
pub fn section_markers(content_type: ContentType) -> &'static [&'static str] {
    match content_type {
        ContentType::Resume => &[RESUME_MARKER, COVER_LETTER_MARKER],
        ContentType::Linkedin => &[HEADLINE_MARKER, SUMMARY_MARKER, EXPERIENCE_MARKER],
    }
}

/// Resume + cover letter prompt. Replace `{input}` before sending.
pub const RESUME_PROMPT_TEMPLATE: &str = r#"
You are an expert career coach and professional resume writer.

Based on the following candidate information, generate:

1. A professional resume summary with bullet points.
2. A tailored cover letter addressed to the hiring manager.

Candidate information:
{input}

Return the response with these exact section headers:

---RESUME---
(resume content here)

---COVER LETTER---
(cover letter content here)"#;

/// LinkedIn profile prompt. Replace `{input}` before sending.
pub const LINKEDIN_PROMPT_TEMPLATE: &str = r#"
You are a LinkedIn expert career coach.

Based on the following candidate information:
{input}

Generate:

1. A LinkedIn headline (max 120 characters)
2. A LinkedIn summary/About section (2-3 paragraphs)
3. Optimized bullet points for work experience

Return the response with these exact section headers:

---HEADLINE---
...
---SUMMARY---
...
---EXPERIENCE---
..."#;

/// Builds the provider prompt. `input` goes in verbatim: no escaping, no trimming.
pub fn build_prompt(input: &str, content_type: ContentType) -> String {
    let template = match content_type {
        ContentType::Linkedin => LINKEDIN_PROMPT_TEMPLATE,
        ContentType::Resume => RESUME_PROMPT_TEMPLATE,
    };
    template.replace("{input}", input)
}
