//! Prompt templates for summarization and follow-up questions.
//!
//! The summary prompt asks for a structured JSON response; the verbosity tier
//! controls the target paragraph length and the word caps baked into it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::content::PageContent;

/// How long a summary the user wants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verbosity {
    Short,
    #[default]
    Medium,
    Full,
}

impl Verbosity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verbosity::Short => "short",
            Verbosity::Medium => "medium",
            Verbosity::Full => "full",
        }
    }

    /// (point style, main idea word cap, conclusion word cap) for the tier.
    fn knobs(&self) -> (&'static str, u32, u32) {
        match self {
            Verbosity::Short => ("a brief sentence of 1-2 lines", 25, 20),
            Verbosity::Medium => ("a detailed paragraph of 4-5 lines", 35, 30),
            Verbosity::Full => ("a comprehensive paragraph of 6-8 lines", 45, 40),
        }
    }
}

impl fmt::Display for Verbosity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Verbosity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "short" => Ok(Verbosity::Short),
            "medium" => Ok(Verbosity::Medium),
            "full" => Ok(Verbosity::Full),
            other => Err(format!(
                "unknown verbosity '{other}' (expected short, medium, or full)"
            )),
        }
    }
}

/// Build the summarization prompt for a page at the given verbosity tier.
///
/// The response shape it mandates is what [`crate::summary::parse`] expects.
pub fn summary_prompt(verbosity: Verbosity, page: &PageContent) -> String {
    let (point_style, main_idea_cap, conclusion_cap) = verbosity.knobs();
    format!(
        r#"Your task is to create a concise, scannable summary.
Rules:
No filler: Do not use any introductory phrases. Start directly with the "Main Idea".
Be brief: Every word counts. Use the shortest possible phrasing.
Return your response as valid JSON in the following structure:
{{
  "mainIdea": "A single sentence, {main_idea_cap} words max",
  "summary": [
    "Critical point 1 - {point_style}",
    "Critical point 2 - {point_style}",
    "Critical point 3 - {point_style}"
  ],
  "conclusion": "A single phrase or very short sentence, {conclusion_cap} words max",
  "followUpQuestions": [
    "Question 1?",
    "Question 2?"
  ]
}}
Webpage Content to Analyze:
Title: {title}
Content:
{content}"#,
        title = page.title,
        content = page.text,
    )
}

/// Build the history-free Q&A prompt: only the cached page text and the
/// question are passed, never the chat history.
pub fn question_prompt(question: &str, page_text: &str) -> String {
    format!(
        "Based on the following webpage content, please answer the user's question: \"{question}\"\n\nWebpage Content: {page_text}"
    )
}
