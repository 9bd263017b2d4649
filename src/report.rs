//! Plain-text rendering of a [`PaperSummary`].
//!
//! Section order is fixed: header, basic info, research question, abstract,
//! key findings, methodology, conclusions, limitations, future research,
//! citations. Formatting cannot fail.

use crate::schema::{Citation, KeyFinding, Methodology, PaperSummary};

/// Abstracts longer than this many characters are cut and marked with `...`.
pub const ABSTRACT_PREVIEW_CHARS: usize = 300;

const HEADER: &str = "📄 RESEARCH PAPER SUMMARY";
const RULE_WIDTH: usize = 50;

/// Render `summary` as a human-readable report.
pub fn format_summary(summary: &PaperSummary) -> String {
    let mut out: Vec<String> = Vec::new();
    out.push(HEADER.to_string());
    out.push("=".repeat(RULE_WIDTH));

    out.push(format!("Title: {}", summary.title));
    out.push(format!("Authors: {}", summary.authors.join(", ")));
    out.push(format!("Category: {}", summary.paper_category));
    out.push(format!("Relevance Score: {}/10", summary.relevance_score));

    out.push("\n🎯 RESEARCH QUESTION:".to_string());
    out.push(summary.research_question.clone());

    out.push("\n📋 ABSTRACT:".to_string());
    out.push(abstract_preview(&summary.abstract_text));

    out.push(format!("\n🔍 KEY FINDINGS ({}):", summary.key_findings.len()));
    for (i, finding) in summary.key_findings.iter().enumerate() {
        push_finding(&mut out, i + 1, finding);
    }

    push_methodology(&mut out, &summary.methodology);

    out.push("\n💡 CONCLUSIONS:".to_string());
    out.push(summary.conclusions.clone());

    out.push("\n⚠️  LIMITATIONS:".to_string());
    out.extend(summary.limitations.iter().map(|l| format!("• {l}")));

    out.push("\n🚀 FUTURE RESEARCH DIRECTIONS:".to_string());
    out.extend(summary.future_research.iter().map(|d| format!("• {d}")));

    out.push(format!("\n📚 KEY CITATIONS ({}):", summary.citations.len()));
    for (i, citation) in summary.citations.iter().enumerate() {
        push_citation(&mut out, i + 1, citation);
    }

    out.join("\n")
}

/// First [`ABSTRACT_PREVIEW_CHARS`] characters plus `...`, or the whole text.
pub fn abstract_preview(text: &str) -> String {
    match text.char_indices().nth(ABSTRACT_PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

fn push_finding(out: &mut Vec<String>, n: usize, finding: &KeyFinding) {
    out.push(format!("{}. {}", n, finding.finding));
    out.push(format!("   Evidence: {}", finding.evidence));
    out.push(format!("   Significance: {}", finding.significance));
    if let Some(page) = finding.page_reference.filter(|&p| p > 0) {
        out.push(format!("   (Page {page})"));
    }
    out.push(String::new());
}

fn push_methodology(out: &mut Vec<String>, m: &Methodology) {
    out.push("🔬 METHODOLOGY:".to_string());
    out.push(format!("Approach: {}", m.approach));
    out.push(format!("Data Sources: {}", m.data_sources.join(", ")));
    out.push(format!("Analysis Methods: {}", m.analysis_methods.join(", ")));
    if let Some(size) = m.sample_size.as_deref().filter(|s| !s.is_empty()) {
        out.push(format!("Sample Size: {size}"));
    }
}

fn push_citation(out: &mut Vec<String>, n: usize, c: &Citation) {
    let year = c
        .year
        .filter(|&y| y != 0)
        .map(|y| format!("({y})"))
        .unwrap_or_default();
    out.push(format!("{}. {} {}", n, c.authors.join(", "), year));
    out.push(format!("   \"{}\"", c.title));
    if let Some(journal) = c.journal.as_deref().filter(|j| !j.is_empty()) {
        out.push(format!("   {journal}"));
    }
    out.push(format!("   Context: {}", c.citation_context));
    out.push(String::new());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Citation, KeyFinding, Methodology};

    fn finding(n: usize, page: Option<u32>) -> KeyFinding {
        KeyFinding {
            finding: format!("Finding {n}"),
            evidence: format!("Evidence {n}"),
            page_reference: page,
            significance: format!("Significance {n}"),
        }
    }

    fn sample() -> PaperSummary {
        PaperSummary {
            title: "Gut Bacteria and Mood".into(),
            authors: vec!["A. Smith".into(), "B. Jones".into()],
            abstract_text: "Short abstract.".into(),
            research_question: "Do gut bacteria affect mood?".into(),
            key_findings: vec![finding(1, Some(3)), finding(2, None), finding(3, Some(7))],
            methodology: Methodology {
                approach: "Randomised controlled trial".into(),
                data_sources: vec!["Stool samples".into(), "Surveys".into()],
                analysis_methods: vec!["ANOVA".into()],
                sample_size: Some("120 adults".into()),
                limitations: vec![],
            },
            conclusions: "Probably yes.".into(),
            limitations: vec!["Small sample".into()],
            future_research: vec!["Larger cohorts".into(), "Animal models".into()],
            citations: vec![
                Citation {
                    authors: vec!["C. Lee".into()],
                    title: "Microbiome basics".into(),
                    journal: Some("Nature".into()),
                    year: Some(2019),
                    doi: None,
                    page_numbers: None,
                    citation_context: "Background".into(),
                },
                Citation {
                    authors: vec!["D. Kim".into()],
                    title: "Mood scales".into(),
                    journal: None,
                    year: None,
                    doi: None,
                    page_numbers: None,
                    citation_context: "Instrument".into(),
                },
            ],
            paper_category: "empirical".into(),
            relevance_score: 7,
        }
    }

    #[test]
    fn header_and_basic_info() {
        let report = format_summary(&sample());
        let lines: Vec<&str> = report.lines().collect();
        assert_eq!(lines[0], "📄 RESEARCH PAPER SUMMARY");
        assert_eq!(lines[1], "=".repeat(50));
        assert_eq!(lines[2], "Title: Gut Bacteria and Mood");
        assert_eq!(lines[3], "Authors: A. Smith, B. Jones");
        assert_eq!(lines[4], "Category: empirical");
        assert_eq!(lines[5], "Relevance Score: 7/10");
    }

    #[test]
    fn sections_in_fixed_order() {
        let report = format_summary(&sample());
        let order = [
            "🎯 RESEARCH QUESTION:",
            "📋 ABSTRACT:",
            "🔍 KEY FINDINGS (3):",
            "🔬 METHODOLOGY:",
            "💡 CONCLUSIONS:",
            "⚠️  LIMITATIONS:",
            "🚀 FUTURE RESEARCH DIRECTIONS:",
            "📚 KEY CITATIONS (2):",
        ];
        let positions: Vec<usize> = order
            .iter()
            .map(|h| report.find(h).unwrap_or_else(|| panic!("missing {h}")))
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn findings_are_numbered_with_optional_page() {
        let report = format_summary(&sample());
        assert!(report.contains("1. Finding 1\n   Evidence: Evidence 1\n   Significance: Significance 1\n   (Page 3)\n"));
        assert!(report.contains("2. Finding 2\n   Evidence: Evidence 2\n   Significance: Significance 2\n\n"));
        assert_eq!(report.matches("(Page ").count(), 2);
    }

    #[test]
    fn methodology_block() {
        let report = format_summary(&sample());
        assert!(report.contains("Approach: Randomised controlled trial"));
        assert!(report.contains("Data Sources: Stool samples, Surveys"));
        assert!(report.contains("Analysis Methods: ANOVA"));
        assert!(report.contains("Sample Size: 120 adults"));

        let mut s = sample();
        s.methodology.sample_size = None;
        assert!(!format_summary(&s).contains("Sample Size"));
    }

    #[test]
    fn bullets_and_citations() {
        let report = format_summary(&sample());
        assert!(report.contains("• Small sample"));
        assert!(report.contains("• Larger cohorts\n• Animal models"));
        assert!(report.contains("1. C. Lee (2019)\n   \"Microbiome basics\"\n   Nature\n   Context: Background"));
        assert!(report.contains("2. D. Kim \n   \"Mood scales\"\n   Context: Instrument"));
    }

    #[test]
    fn abstract_truncation_boundary() {
        let exact = "a".repeat(300);
        assert_eq!(abstract_preview(&exact), exact);

        let long = "b".repeat(301);
        let preview = abstract_preview(&long);
        assert_eq!(preview, format!("{}...", "b".repeat(300)));
    }

    #[test]
    fn abstract_truncation_counts_chars_not_bytes() {
        let long = "é".repeat(400);
        let preview = abstract_preview(&long);
        assert_eq!(preview.chars().count(), 303);
        assert!(preview.ends_with("..."));
    }

    #[test]
    fn long_abstract_in_report() {
        let mut s = sample();
        s.abstract_text = "x".repeat(500);
        let report = format_summary(&s);
        assert!(report.contains(&format!("{}...", "x".repeat(300))));
        assert!(!report.contains(&"x".repeat(301)));
    }
}
