//! Insight request orchestration.
//!
//! One request moves Idle -> Pending -> {Succeeded, Failed(kind), TimedOut}:
//! exactly one external generation call, raced against a wall-clock timeout.
//! Whichever settles first is the terminal state; the loser is discarded.

pub mod gemini;

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use time::{Date, OffsetDateTime};
use usage_core::domain::{Insight, Reading};

pub use gemini::GeminiClient;

/// Failure modes of the raw text-generation capability.
#[derive(thiserror::Error, Debug, Clone)]
pub enum GenerateError {
    #[error("text generation capability is not configured")]
    Unconfigured,
    #[error("text generation capability is unreachable: {0}")]
    Unreachable(String),
    #[error("text generation capability returned no usable payload: {0}")]
    Upstream(String),
}

/// The consumed capability: given a prompt, return text or fail. The real
/// client may also hang; the engine imposes the only timeout discipline.
#[async_trait::async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, GenerateError>;
}

/// Terminal failure states surfaced to the caller. Exactly one of these, or
/// a successful insight, is the outcome of a request.
#[derive(thiserror::Error, Debug)]
pub enum InsightError {
    #[error("no readings available to analyze")]
    NoData,
    #[error("insight generation took too long")]
    Timeout,
    #[error("insight generation is not configured")]
    Configuration(String),
    #[error("insight generation failed upstream")]
    Upstream(String),
    #[error("insight generation failed")]
    Unknown(String),
}

#[derive(Serialize)]
struct PromptReading<'a> {
    date: Date,
    #[serde(rename = "type")]
    utility_type: &'a str,
    usage: f64,
    notes: &'a str,
}

/// Structured prompt: the reading rows as JSON plus a fixed instruction for
/// a short trend summary and three recommendations.
pub fn build_prompt(readings: &[Reading]) -> String {
    let rows: Vec<PromptReading<'_>> = readings
        .iter()
        .map(|r| PromptReading {
            date: r.date,
            utility_type: r.utility_type.as_str(),
            usage: r.usage,
            notes: r.notes.as_deref().unwrap_or(""),
        })
        .collect();

    let data = serde_json::to_string_pretty(&rows).unwrap_or_else(|_| "[]".to_string());

    format!(
        "Analyze the following household energy usage data:\n\n{data}\n\n\
         Provide:\n\
         1. A 2-3 sentence summary of recent trends (increases, decreases, patterns)\n\
         2. Three specific, actionable recommendations for reducing energy consumption\n\n\
         Format the response as natural, friendly language suitable for homeowners."
    )
}

/// Orchestrates insight requests against an injected generation client.
///
/// The client is constructed once at process start and shared by reference;
/// there is no process-wide singleton behind this.
pub struct InsightEngine {
    generator: Arc<dyn TextGenerator>,
    timeout: Duration,
}

impl InsightEngine {
    pub fn new(generator: Arc<dyn TextGenerator>, timeout: Duration) -> Self {
        Self { generator, timeout }
    }

    /// Run one insight request over an already-filtered reading set.
    ///
    /// An empty set is rejected locally; the external capability is never
    /// invoked for it. Otherwise exactly one generation call is issued and
    /// raced against the configured timeout. On timeout the in-flight call
    /// is detached, not cancelled; a late result is discarded and never
    /// alters the already-surfaced terminal state.
    pub async fn request(&self, readings: &[Reading]) -> Result<Insight, InsightError> {
        if readings.is_empty() {
            return Err(InsightError::NoData);
        }

        let prompt = build_prompt(readings);
        let generator = Arc::clone(&self.generator);
        let mut call = tokio::spawn(async move { generator.generate(&prompt).await });

        let joined = tokio::select! {
            res = &mut call => res,
            _ = tokio::time::sleep(self.timeout) => {
                metrics::counter!("insight_requests_timed_out_total").increment(1);
                tracing::warn!(timeout_ms = self.timeout.as_millis() as u64, "insight generation timed out");
                return Err(InsightError::Timeout);
            }
        };

        match joined {
            Ok(Ok(text)) => {
                metrics::counter!("insight_requests_succeeded_total").increment(1);
                Ok(Insight {
                    summary: text,
                    // The model folds its recommendations into the narrative
                    // text rather than a separate list.
                    recommendations: Vec::new(),
                    generated_at: OffsetDateTime::now_utc(),
                })
            }
            Ok(Err(e)) => {
                metrics::counter!("insight_requests_failed_total").increment(1);
                tracing::warn!(error = %e, "insight generation failed");
                Err(match e {
                    GenerateError::Unconfigured | GenerateError::Unreachable(_) => {
                        InsightError::Configuration(e.to_string())
                    }
                    GenerateError::Upstream(detail) => InsightError::Upstream(detail),
                })
            }
            Err(join_err) => {
                metrics::counter!("insight_requests_failed_total").increment(1);
                tracing::error!(error = %join_err, "insight generation task failed");
                Err(InsightError::Unknown(join_err.to_string()))
            }
        }
    }
}
