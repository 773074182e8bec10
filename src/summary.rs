//! Structured summary responses.
//!
//! Summarize asks the model for a JSON-shaped answer. Parsing is strictly
//! best-effort: anything that does not match the expected shape is rendered
//! as plain text instead. A malformed response is never an error.

use serde::Deserialize;

/// The JSON shape requested by the summary prompt.
///
/// Both the rich shape (`mainIdea` + `summary` points + `conclusion`) and the
/// legacy shape (a single `summary` string) are accepted.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredSummary {
    #[serde(default)]
    pub main_idea: Option<String>,
    #[serde(default)]
    pub summary: Option<SummaryBody>,
    #[serde(default)]
    pub conclusion: Option<String>,
    #[serde(default)]
    pub follow_up_questions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum SummaryBody {
    Points(Vec<String>),
    Prose(String),
}

/// Parse a raw model response into a structured summary.
///
/// Returns `None` when the response is not JSON of the expected shape, or
/// when it carries neither a main idea nor a summary body.
pub fn parse(raw: &str) -> Option<StructuredSummary> {
    let parsed: StructuredSummary = serde_json::from_str(raw.trim()).ok()?;
    if parsed.main_idea.is_none() && parsed.summary.is_none() {
        return None;
    }
    Some(parsed)
}

impl StructuredSummary {
    /// Render the summary as markdown sections.
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();

        if let Some(idea) = &self.main_idea {
            out.push_str("### Main Idea\n");
            out.push_str(idea);
            out.push_str("\n\n");
        }

        match &self.summary {
            Some(SummaryBody::Points(points)) => {
                out.push_str("### Summary\n");
                for point in points {
                    out.push_str("- ");
                    out.push_str(point);
                    out.push('\n');
                }
                out.push('\n');
            }
            Some(SummaryBody::Prose(text)) => {
                out.push_str("### Summary\n");
                out.push_str(text);
                out.push_str("\n\n");
            }
            None => {}
        }

        if let Some(conclusion) = &self.conclusion {
            out.push_str("### Conclusion\n");
            out.push_str(conclusion);
            out.push_str("\n\n");
        }

        if !self.follow_up_questions.is_empty() {
            out.push_str("### Follow-up Questions\n");
            for question in &self.follow_up_questions {
                out.push_str("- ");
                out.push_str(question);
                out.push('\n');
            }
        }

        out.trim_end().to_string()
    }
}

/// Render a raw model response: structured markdown when it parses, the
/// trimmed text verbatim otherwise.
pub fn render_response(raw: &str) -> String {
    match parse(raw) {
        Some(summary) => summary.to_markdown(),
        None => raw.trim().to_string(),
    }
}
