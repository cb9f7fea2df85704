//! Structured Extractor — splits a completion into named sections on the literal
//! markers the prompt asked for.
//!
//! Matching is case-insensitive and purely textual. A missing marker leaves its field
//! empty; extraction itself never fails.

use std::sync::OnceLock;

use regex::Regex;

use crate::generation::models::{ContentType, GenerationResult, LinkedinSections, ResumeSections};
use crate::generation::prompts::section_markers;

/// One compiled alternation over every marker of a content type. Capture group `i + 1`
/// matches marker `i`.
fn marker_pattern(content_type: ContentType) -> &'static Regex {
    static RESUME: OnceLock<Regex> = OnceLock::new();
    static LINKEDIN: OnceLock<Regex> = OnceLock::new();

    let cell = match content_type {
        ContentType::Resume => &RESUME,
        ContentType::Linkedin => &LINKEDIN,
    };
    cell.get_or_init(|| {
        let alternation = section_markers(content_type)
            .iter()
            .map(|m| format!("({})", regex::escape(m)))
            .collect::<Vec<_>>()
            .join("|");
        // Escaped literals joined by `|` always form a valid pattern.
        Regex::new(&format!("(?i){alternation}")).expect("marker pattern is valid")
    })
}

/// Returns the trimmed content of each marker's section, in marker order.
///
/// A section runs from the end of the first occurrence of its marker to the start of
/// the next marker occurrence of any kind, or the end of the text.
fn split_sections(raw_text: &str, content_type: ContentType) -> Vec<String> {
    let markers = section_markers(content_type);
    let hits: Vec<(usize, usize, usize)> = marker_pattern(content_type)
        .captures_iter(raw_text)
        .filter_map(|caps| {
            (1..caps.len()).find_map(|group| {
                caps.get(group)
                    .map(|m| (group - 1, m.start(), m.end()))
            })
        })
        .collect();

    markers
        .iter()
        .enumerate()
        .map(|(idx, _)| {
            let Some(&(_, _, content_start)) = hits.iter().find(|(i, _, _)| *i == idx) else {
                return String::new();
            };
            let content_end = hits
                .iter()
                .map(|&(_, start, _)| start)
                .find(|&start| start >= content_start)
                .unwrap_or(raw_text.len());
            raw_text[content_start..content_end].trim().to_string()
        })
        .collect()
}

/// Extracts the structured fields for `content_type` from a raw completion.
pub fn extract_sections(raw_text: &str, content_type: ContentType) -> GenerationResult {
    let mut sections = split_sections(raw_text, content_type).into_iter();
    let mut next = || sections.next().unwrap_or_default();

    match content_type {
        ContentType::Resume => GenerationResult::Resume(ResumeSections {
            resume_section: next(),
            cover_letter_section: next(),
            raw_text: raw_text.to_string(),
        }),
        ContentType::Linkedin => GenerationResult::Linkedin(LinkedinSections {
            headline_section: next(),
            summary_section: next(),
            experience_section: next(),
            raw_text: raw_text.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resume(raw: &str) -> ResumeSections {
        match extract_sections(raw, ContentType::Resume) {
            GenerationResult::Resume(s) => s,
            other => panic!("expected resume sections, got {other:?}"),
        }
    }

    fn linkedin(raw: &str) -> LinkedinSections {
        match extract_sections(raw, ContentType::Linkedin) {
            GenerationResult::Linkedin(s) => s,
            other => panic!("expected linkedin sections, got {other:?}"),
        }
    }

    #[test]
    fn test_resume_sections_are_split_and_trimmed() {
        let raw = "---RESUME---\nA\n---COVER LETTER---\nB";
        let s = resume(raw);
        assert_eq!(s.resume_section, "A");
        assert_eq!(s.cover_letter_section, "B");
        assert_eq!(s.raw_text, raw);
    }

    #[test]
    fn test_missing_cover_letter_marker_leaves_field_empty() {
        let s = resume("---RESUME---\nA");
        assert_eq!(s.resume_section, "A");
        assert_eq!(s.cover_letter_section, "");
    }

    #[test]
    fn test_no_markers_keeps_raw_text_only() {
        let raw = "Sorry, I can't help with that.";
        let s = resume(raw);
        assert_eq!(s.resume_section, "");
        assert_eq!(s.cover_letter_section, "");
        assert_eq!(s.raw_text, raw);
    }

    #[test]
    fn test_markers_match_case_insensitively() {
        let s = resume("---Resume---\n Summary \n---cover letter---\n Letter ");
        assert_eq!(s.resume_section, "Summary");
        assert_eq!(s.cover_letter_section, "Letter");
    }

    #[test]
    fn test_unicode_case_folded_marker_is_recognised() {
        // U+017F LATIN SMALL LETTER LONG S folds to `s`.
        let s = resume("---RE\u{17F}UME---\nA\n---COVER LETTER---\nB");
        assert_eq!(s.resume_section, "A");
        assert_eq!(s.cover_letter_section, "B");
    }

    #[test]
    fn test_preamble_before_first_marker_is_ignored() {
        let s = resume("Here you go!\n\n---RESUME---\n- Led a team\n\n---COVER LETTER---\nDear Hiring Manager,");
        assert_eq!(s.resume_section, "- Led a team");
        assert_eq!(s.cover_letter_section, "Dear Hiring Manager,");
    }

    #[test]
    fn test_linkedin_three_sections() {
        let raw = "---HEADLINE---\nBackend Engineer\n---SUMMARY---\nI build systems.\n---EXPERIENCE---\n- Shipped X\n- Scaled Y";
        let s = linkedin(raw);
        assert_eq!(s.headline_section, "Backend Engineer");
        assert_eq!(s.summary_section, "I build systems.");
        assert_eq!(s.experience_section, "- Shipped X\n- Scaled Y");
        assert_eq!(s.raw_text, raw);
    }

    #[test]
    fn test_linkedin_missing_middle_marker() {
        let s = linkedin("---HEADLINE---\nH\n---EXPERIENCE---\nE");
        assert_eq!(s.headline_section, "H");
        assert_eq!(s.summary_section, "");
        assert_eq!(s.experience_section, "E");
    }

    #[test]
    fn test_resume_markers_do_not_split_linkedin_output() {
        let s = linkedin("---HEADLINE---\nH ---RESUME--- still headline");
        assert_eq!(s.headline_section, "H ---RESUME--- still headline");
    }

    #[test]
    fn test_empty_completion() {
        let s = linkedin("");
        assert_eq!(s.headline_section, "");
        assert_eq!(s.summary_section, "");
        assert_eq!(s.experience_section, "");
        assert_eq!(s.raw_text, "");
    }

    #[test]
    fn test_adjacent_markers_yield_empty_section() {
        let s = resume("---RESUME------COVER LETTER---\nB");
        assert_eq!(s.resume_section, "");
        assert_eq!(s.cover_letter_section, "B");
    }
}
