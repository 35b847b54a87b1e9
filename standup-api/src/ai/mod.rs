/// AI summaries of a day's stand-up notes
///
/// The notes of the caller's selected teammates for one day are flattened
/// into a plain-text transcript, wrapped in a fixed system prompt and sent to
/// a chat-completion model that answers with an HTML fragment.
///
/// The model sits behind [`TextGenerator`]; [`OpenAiGenerator`] is the real
/// implementation.

pub mod openai;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Serialize;

use standup_shared::{models::profile::preferred_name, summaries::aggregate::AggregatedNote};

pub use openai::OpenAiGenerator;

/// Name used for notes whose owner has neither display name nor username
pub const UNKNOWN_AUTHOR: &str = "Unknown";

/// Greeting fallback when the requester has no display name or email
pub const DEFAULT_REQUESTER: &str = "teammate";

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("Text generation is not configured")]
    NotConfigured,

    #[error("Generation request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Model API returned status {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Model returned no content")]
    EmptyResponse,
}

/// One chat-completion call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    pub system: String,
    pub user: String,
    pub temperature: f32,
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Runs the request and returns the model's raw text
    async fn generate(&self, request: &ChatRequest) -> Result<String, GenerationError>;
}

/// Result of a summary request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SummaryOutcome {
    /// Nothing to summarize for that day
    NotFound,

    /// HTML summary, fences stripped
    Summary(String),
}

fn contributor_name(note: &AggregatedNote) -> &str {
    preferred_name(note.display_name.as_deref(), note.username.as_deref()).unwrap_or(UNKNOWN_AUTHOR)
}

/// Distinct contributor names in first-seen order
pub fn contributors(notes: &[AggregatedNote]) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for note in notes {
        let name = contributor_name(note);
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    names
}

/// One line per note: `Name — YESTERDAY: … • TODAY: … • BLOCKERS: … • LEARNINGS: …`
///
/// Empty fields are left out.
pub fn format_transcript(notes: &[AggregatedNote]) -> String {
    notes
        .iter()
        .map(|note| {
            let parts: Vec<String> = [
                ("YESTERDAY", &note.yesterday),
                ("TODAY", &note.today),
                ("BLOCKERS", &note.blockers),
                ("LEARNINGS", &note.learnings),
            ]
            .into_iter()
            .filter_map(|(label, value)| {
                value
                    .as_deref()
                    .filter(|v| !v.trim().is_empty())
                    .map(|v| format!("{}: {}", label, v))
            })
            .collect();

            format!("{} — {}", contributor_name(note), parts.join(" • "))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// `March 5, 2025`
pub fn display_date(day: NaiveDate) -> String {
    day.format("%B %-d, %Y").to_string()
}

/// System prompt naming the day, the contributors and the reader
pub fn system_prompt(day: NaiveDate, contributors: &[String], requester: &str) -> String {
    let date = display_date(day);
    let names = contributors.join(", ");

    format!(
        r#"You summarize daily stand-up notes for a software team. Write a short, professional summary of the notes for {date}.

Contributors: {names}.

Answer with one block of clean HTML only. Do not wrap it in markdown code fences.

Use exactly this structure:

<div class="ai-summary-container">
  <h2>Daily Summary for {date}</h2>
  <p>Updates from: {names}</p>

  <h3>Key Takeaways:</h3>
  <ul>
    <!-- Bullet list of accomplishments, plans and blockers from the notes. -->
  </ul>

  <hr />

  <h3>Personalized Email Update:</h3>
  <p>Dear {requester},</p>
  <p>Here's a quick update on today's stand-up notes:</p>
  <p>
    <!-- A short, friendly email covering the notes. -->
  </p>
  <p>Best,</p>
  <p>Standup</p>
</div>"#
    )
}

/// Removes a leading ```` ```html ```` fence and a trailing ```` ``` ````
pub fn strip_html_fence(raw: &str) -> String {
    const OPEN: &str = "```html";

    let mut text = raw.trim();
    if text
        .get(..OPEN.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(OPEN))
    {
        text = &text[OPEN.len()..];
    }
    text = text.strip_suffix("```").unwrap_or(text);

    text.trim().to_string()
}

/// Summarizes one day's notes
///
/// Returns [`SummaryOutcome::NotFound`] without calling the model when there
/// are no notes.
pub async fn summarize_day(
    generator: &dyn TextGenerator,
    day: NaiveDate,
    requester: &str,
    notes: &[AggregatedNote],
    temperature: f32,
) -> Result<SummaryOutcome, GenerationError> {
    if notes.is_empty() {
        return Ok(SummaryOutcome::NotFound);
    }

    let names = contributors(notes);
    let request = ChatRequest {
        system: system_prompt(day, &names, requester),
        user: format_transcript(notes),
        temperature,
    };

    tracing::info!(
        day = %day,
        notes = notes.len(),
        contributors = names.len(),
        "Requesting AI summary"
    );

    let raw = generator.generate(&request).await?;
    Ok(SummaryOutcome::Summary(strip_html_fence(&raw)))
}
