use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::AdvisorConfig;

/// Something that turns a prompt into text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Client for the hosted Gemini `generateContent` endpoint.
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(config: &AdvisorConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .context("missing advisor api key; set GEMINI_API_KEY")?;
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .context("build http client")?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
        })
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
        };

        let resp = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .context("generateContent request")?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            bail!("generateContent error {status}: {text}");
        }

        let parsed: GenerateResponse = resp.json().await.context("parse generateContent")?;
        Ok(parsed
            .candidates
            .into_iter()
            .filter_map(|c| c.content)
            .flat_map(|c| c.parts)
            .filter_map(|p| p.text)
            .collect::<Vec<_>>()
            .join(""))
    }
}

const EXPLAIN_EMPTY: &str = "Could not generate explanation.";
const EXPLAIN_FAILED: &str = "Investing is like planting a tree. You water it a little bit every day, and eventually, it grows big.";
const TIP_EMPTY: &str =
    "Skip one chai today and invest that ₹10. Your future self will thank you!";
const TIP_FAILED: &str = "Small steps lead to big journeys. Start with just ₹10!";
const ANSWER_EMPTY: &str = "I didn't quite catch that, but remember: start small!";
const ANSWER_FAILED: &str = "I'm having trouble connecting right now. Please try again later.";
const LESSON_EMPTY: &str = "<p>Sorry, we couldn't generate a lesson for this topic right now.</p>";
const LESSON_FAILED: &str = "<p>We are having trouble reaching the AI tutor.</p>";

/// Advisory text for learners. Never fails: when generation errors or comes
/// back empty, a fixed fallback is returned instead.
pub struct Advisor {
    generator: Option<Box<dyn TextGenerator>>,
}

impl Advisor {
    pub fn new(generator: Box<dyn TextGenerator>) -> Self {
        Self {
            generator: Some(generator),
        }
    }

    /// An advisor with no generator; every call returns its fallback.
    pub fn offline() -> Self {
        Self { generator: None }
    }

    /// Build from config, going offline when no client can be built.
    pub fn from_config(config: &AdvisorConfig) -> Self {
        match GeminiClient::new(config) {
            Ok(client) => Self::new(Box::new(client)),
            Err(err) => {
                tracing::debug!(error = %err, "advisor running offline");
                Self::offline()
            }
        }
    }

    pub async fn explain_concept(&self, concept: &str) -> String {
        let prompt = format!(
            "Explain the financial concept \"{concept}\" to a college student who has zero finance knowledge. \
             Use a fun, relatable analogy (like food, college life, or sports). \
             Keep it under 60 words. Tone: encouraging and simple. Language: English."
        );
        self.ask(&prompt, EXPLAIN_EMPTY, EXPLAIN_FAILED).await
    }

    pub async fn quick_tip(&self) -> String {
        let prompt = "Generate a quick financial tip in English for a first-time investor in India.\n\
             Requirements:\n\
             - 1-3 sentences max\n\
             - Actionable (they can do it today)\n\
             - Encouraging and positive\n\
             - Relevant to a ₹10-100 investment range\n\
             - Include 1 practical example\n\
             Make it motivating, like something a friend would say. No jargon.";
        self.ask(prompt, TIP_EMPTY, TIP_FAILED).await
    }

    pub async fn ask_question(&self, question: &str) -> String {
        let prompt = format!(
            "You are a helpful, encouraging financial mentor for students named 'Pocket Guru'. \
             Answer this user question in English: \"{question}\". \
             Keep the answer safe, conservative, and education-focused. \
             Do not give specific buy/sell recommendations. Keep it short (max 3 sentences)."
        );
        self.ask(&prompt, ANSWER_EMPTY, ANSWER_FAILED).await
    }

    /// A short HTML lesson on `topic`.
    pub async fn generate_lesson(&self, topic: &str) -> String {
        let prompt = format!(
            "Create a beginner-friendly lesson in English on: \"{topic}\"\n\
             Requirements:\n\
             - Assume the reader has no financial background\n\
             - Use simple, everyday language\n\
             - Include 1 Indian real-life example\n\
             - Include 1 simple analogy\n\
             - Keep under 180 words\n\
             - Add 3 action points they can take today\n\
             - Use bullet points for clarity\n\
             - Add 1 encouraging sentence at the end\n\
             - Format the output as clean HTML (using <p>, <ul>, <li>, <strong> tags only, no markdown code blocks)."
        );
        let text = self.ask(&prompt, LESSON_EMPTY, LESSON_FAILED).await;
        let cleaned = strip_code_fences(&text);
        if cleaned.is_empty() {
            LESSON_EMPTY.to_string()
        } else {
            cleaned
        }
    }

    async fn ask(&self, prompt: &str, if_empty: &str, if_failed: &str) -> String {
        let Some(generator) = &self.generator else {
            return if_failed.to_string();
        };
        match generator.generate(prompt).await {
            Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
            Ok(_) => if_empty.to_string(),
            Err(err) => {
                tracing::warn!(error = %err, "text generation failed");
                if_failed.to_string()
            }
        }
    }
}

/// Remove markdown code fences a model may wrap HTML in.
pub fn strip_code_fences(text: &str) -> String {
    text.replace("```html", "").replace("```", "").trim().to_string()
}
