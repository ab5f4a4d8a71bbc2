//! Markdown research report built from a research council's results.

use chrono::{DateTime, Utc};

use crate::models::OfficerResult;
use crate::text::truncate_chars;

const PREVIEW_CHARS: usize = 500;

pub fn report_filename(generated_at: DateTime<Utc>) -> String {
    format!("research_{}.md", generated_at.format("%Y%m%d_%H%M%S"))
}

pub fn search_mode_label(web_search: bool) -> &'static str {
    if web_search {
        "✅ Web Search Enabled - Sources Cited"
    } else {
        "📚 Pretraining Knowledge Only"
    }
}

pub fn render_research_report(
    topic: &str,
    results: &[OfficerResult],
    class_label: &str,
    web_search: bool,
    generated_at: DateTime<Utc>,
) -> String {
    let council: Vec<&str> = results.iter().map(|r| r.officer_id.as_str()).collect();

    let mut md = format!(
        "# Research Report: {topic}\n\n\
         **Generated:** {generated}\n\
         **Capability Class:** {class_label}\n\
         **Research Council:** {council}\n\
         **Search Mode:** {mode}\n\n\
         ---\n\n\
         ## Executive Summary\n\n\
         This research explores **{topic}** through four analytical lenses:\n\
         - **State-of-the-Art:** Current best practices\n\
         - **Critical Analysis:** Limitations and risks\n\
         - **Visionary Perspective:** Future possibilities\n\
         - **Historical Context:** Evolution and lessons\n\n\
         ---\n\n",
        generated = generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
        council = council.join(", "),
        mode = search_mode_label(web_search),
    );

    for result in results {
        let role = result.research_role.as_deref().unwrap_or("Perspective");
        md.push_str(&format!(
            "## {}\n\n**Officer:** {}\n**Model:** {}\n\n{}\n\n---\n\n",
            role,
            result.label(),
            result.model,
            result.response
        ));
    }

    md.push_str("\n**Report generated by Atlas War Room - Research Command**\n");
    md
}

/// First 500 characters of the report, with an ellipsis when cut
pub fn report_preview(markdown: &str) -> String {
    let preview = truncate_chars(markdown, PREVIEW_CHARS);
    if preview.len() < markdown.len() {
        format!("{}...", preview)
    } else {
        preview.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CapabilityClass, Officer};
    use chrono::TimeZone;

    fn result(id: &str, role: &str) -> OfficerResult {
        let officer = Officer {
            id: id.to_string(),
            title: format!("Title {}", id),
            model: "perplexity/sonar".to_string(),
            capability_class: CapabilityClass::Tactical,
            specialty: "s".to_string(),
            system_prompt: "p".to_string(),
            color: None,
        };
        OfficerResult::success(&officer, format!("Findings from {}", id)).with_research_role(role)
    }

    #[test]
    fn test_filename_format() {
        let at = Utc.with_ymd_and_hms(2025, 3, 7, 9, 5, 1).unwrap();
        assert_eq!(report_filename(at), "research_20250307_090501.md");
    }

    #[test]
    fn test_report_structure() {
        let at = Utc.with_ymd_and_hms(2025, 3, 7, 9, 5, 1).unwrap();
        let results = vec![result("O9", "State-of-the-Art Researcher"), result("O10", "Critical Analyst")];
        let md = render_research_report("Edge AI", &results, "Tactical", true, at);

        assert!(md.starts_with("# Research Report: Edge AI\n\n**Generated:** 2025-03-07 09:05:01 UTC\n"));
        assert!(md.contains("**Capability Class:** Tactical\n"));
        assert!(md.contains("**Research Council:** O9, O10\n"));
        assert!(md.contains("**Search Mode:** ✅ Web Search Enabled - Sources Cited"));
        assert!(md.contains("This research explores **Edge AI** through four analytical lenses:"));
        assert!(md.contains("## Critical Analyst\n\n**Officer:** O10 - Title O10\n**Model:** perplexity/sonar\n\nFindings from O10"));
        let first = md.find("## State-of-the-Art Researcher").unwrap();
        let second = md.find("## Critical Analyst").unwrap();
        assert!(first < second);
        assert!(md.ends_with("\n**Report generated by Atlas War Room - Research Command**\n"));
    }

    #[test]
    fn test_preview() {
        assert_eq!(report_preview("short"), "short");
        let long = "y".repeat(600);
        let preview = report_preview(&long);
        assert_eq!(preview.len(), 503);
        assert!(preview.ends_with("..."));
    }
}
