//! Optional free-text commentary over a snapshot.
//!
//! The digest handed to a [`Narrator`] is deterministic. Whatever the narrator
//! does, [`narrate_or_advise`] turns failure into an advisory message so the
//! caller never has to treat commentary as fatal.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::http_client::{HttpClient, HttpRequest, ReqwestHttpClient};
use crate::risk::RiskSignal;
use crate::MarketQuote;

pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
pub const FALLBACK_MODELS: [&str; 3] = ["gemini-1.5-pro", "gemini-1.5-flash-8b", "gemini-1.0-pro"];

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

const ANALYST_PREAMBLE: &str = "You are a macro and market risk analyst. Using the indicators and \
the heuristic risk level below, conservatively assess the likelihood of US political instability \
(such as escalating social conflict) and economic swings (volatility expansion, deleveraging) over \
the next several days to weeks. Avoid overconfidence, state the limits of the data, and answer in \
terms of observable signals and conditional scenarios.\n\n";

const REQUIREMENTS: &str = "Requirements:\n\
1) Strong, moderate and weak evidence for each signal\n\
2) Scenario ranges for the short term (1 week) and the near-to-medium term (2-4 weeks)\n\
3) Three to five triggers that would ease or escalate risk\n\
4) General portfolio-level cautions (not investment advice)\n\
5) Data and model limitations and uncertainty";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NarrativeError {
    #[error("no narrative API key configured")]
    MissingApiKey,
    #[error("narrative transport error: {0}")]
    Transport(String),
    #[error("narrative service returned status {status} for model '{model}'")]
    Status { model: String, status: u16 },
    #[error("no narrative model available (tried: {})", .tried.join(", "))]
    ModelNotFound { tried: Vec<String> },
    #[error("narrative response could not be parsed: {0}")]
    Parse(String),
    #[error("narrative response contained no text")]
    EmptyResponse,
}

pub type NarrativeFuture<'a> =
    Pin<Box<dyn Future<Output = Result<String, NarrativeError>> + Send + 'a>>;

/// Commentary generator fed with a [`format_digest`] digest.
pub trait Narrator: Send + Sync {
    fn narrate<'a>(&'a self, digest: &'a str) -> NarrativeFuture<'a>;
}

/// What the caller shows in place of commentary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "text", rename_all = "snake_case")]
pub enum NarrativeOutcome {
    Commentary(String),
    Unavailable(String),
}

impl NarrativeOutcome {
    pub fn text(&self) -> &str {
        match self {
            Self::Commentary(text) | Self::Unavailable(text) => text,
        }
    }
}

/// One line per quote, a blank line, then the heuristic risk line.
pub fn format_digest(quotes: &[MarketQuote], risk: &RiskSignal) -> String {
    let mut lines = Vec::with_capacity(quotes.len() + 3);
    lines.push("[Market snapshot]".to_owned());
    lines.extend(quotes.iter().map(|quote| {
        format!(
            "- {} ({}): current {}, change {:+.2}%",
            quote.display_name, quote.ticker_label, quote.formatted_value, quote.change_pct
        )
    }));
    lines.push(String::new());

    let factors = if risk.factors.is_empty() {
        "none".to_owned()
    } else {
        risk.descriptions().join("; ")
    };
    lines.push(format!(
        "[Heuristic risk] level={}, score={}, factors={}",
        risk.level, risk.score, factors
    ));
    lines.join("\n")
}

/// Full prompt sent to a language model for `digest`.
pub fn build_prompt(digest: &str) -> String {
    format!("{ANALYST_PREAMBLE}Input data:\n{digest}\n\n{REQUIREMENTS}")
}

/// Runs `narrator` if present; every failure becomes an advisory.
pub async fn narrate_or_advise(narrator: Option<&dyn Narrator>, digest: &str) -> NarrativeOutcome {
    let Some(narrator) = narrator else {
        return NarrativeOutcome::Unavailable(
            "Commentary disabled: set GOOGLE_API_KEY or narrative.api_key to enable it.".to_owned(),
        );
    };

    match narrator.narrate(digest).await {
        Ok(text) => NarrativeOutcome::Commentary(text),
        Err(error) => {
            tracing::warn!(%error, "narrative unavailable");
            NarrativeOutcome::Unavailable(format!("Commentary unavailable: {error}"))
        }
    }
}

/// Gemini `generateContent` client with model fallback on 404.
#[derive(Clone)]
pub struct GeminiNarrator {
    http_client: Arc<dyn HttpClient>,
    api_key: String,
    model: String,
    base_url: String,
    timeout_ms: u64,
}

impl GeminiNarrator {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_http_client(Arc::new(ReqwestHttpClient::new()), api_key)
    }

    pub fn with_http_client(http_client: Arc<dyn HttpClient>, api_key: impl Into<String>) -> Self {
        Self {
            http_client,
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_owned(),
            base_url: GEMINI_BASE_URL.to_owned(),
            timeout_ms: 30_000,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_owned();
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Configured model first, then the fallbacks not already tried.
    pub fn candidate_models(&self) -> Vec<String> {
        let mut models = vec![self.model.clone()];
        models.extend(
            FALLBACK_MODELS
                .iter()
                .filter(|fallback| **fallback != self.model)
                .map(|fallback| (*fallback).to_owned()),
        );
        models
    }

    async fn generate(&self, digest: &str) -> Result<String, NarrativeError> {
        if self.api_key.trim().is_empty() {
            return Err(NarrativeError::MissingApiKey);
        }

        let body = serde_json::to_string(&GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: build_prompt(digest),
                }],
            }],
        })
        .map_err(|e| NarrativeError::Parse(e.to_string()))?;

        let models = self.candidate_models();
        for model in &models {
            let url = format!("{}/{}:generateContent", self.base_url, model);
            let request = HttpRequest::post_json(url, body.clone())
                .with_header("x-goog-api-key", self.api_key.clone())
                .with_timeout_ms(self.timeout_ms);

            let response = self
                .http_client
                .execute(request)
                .await
                .map_err(|e| NarrativeError::Transport(e.message().to_owned()))?;

            if response.status == 404 {
                tracing::debug!(model = %model, "narrative model not found, trying next");
                continue;
            }
            if !response.is_success() {
                return Err(NarrativeError::Status {
                    model: model.clone(),
                    status: response.status,
                });
            }
            return parse_generated_text(&response.body);
        }

        Err(NarrativeError::ModelNotFound { tried: models })
    }
}

impl Narrator for GeminiNarrator {
    fn narrate<'a>(&'a self, digest: &'a str) -> NarrativeFuture<'a> {
        Box::pin(self.generate(digest))
    }
}

fn parse_generated_text(body: &str) -> Result<String, NarrativeError> {
    let response: GenerateResponse =
        serde_json::from_str(body).map_err(|e| NarrativeError::Parse(e.to_string()))?;

    let text = response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(NarrativeError::EmptyResponse);
    }
    Ok(text)
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http_client::{HttpError, HttpResponse};
    use crate::risk::{Factor, RiskLevel};
    use crate::InstrumentCatalog;
    use std::sync::Mutex;

    const REPLY: &str = r#"{"candidates":[{"content":{"parts":[{"text":"Risk is contained."}]}}]}"#;

    /// Answers 404 for every model except `serving`.
    struct ModelRouter {
        serving: &'static str,
        urls: Mutex<Vec<String>>,
    }

    impl HttpClient for ModelRouter {
        fn execute<'a>(
            &'a self,
            request: HttpRequest,
        ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
            let served = request.url.contains(&format!("/{}:", self.serving));
            self.urls
                .lock()
                .expect("url store should not be poisoned")
                .push(request.url);
            Box::pin(async move {
                if served {
                    Ok(HttpResponse::ok_json(REPLY))
                } else {
                    Ok(HttpResponse::new(404, "{}"))
                }
            })
        }
    }

    fn router(serving: &'static str) -> Arc<ModelRouter> {
        Arc::new(ModelRouter {
            serving,
            urls: Mutex::new(Vec::new()),
        })
    }

    #[test]
    fn digest_lists_quotes_then_risk_line() {
        let catalog = InstrumentCatalog::builtin();
        let vix =
            MarketQuote::from_observations(catalog.get("vix").expect("vix"), 36.0, Some(30.0));
        let gold = MarketQuote::unavailable(catalog.get("gold").expect("gold"));
        let risk = RiskSignal::from_factors(vec![Factor {
            description: "VIX very high (36.0) +3".to_owned(),
            delta: 3,
        }]);

        let digest = format_digest(&[vix, gold], &risk);

        assert_eq!(
            digest,
            "[Market snapshot]\n\
             - CBOE Volatility Index (VIX): current 36.00, change +20.00%\n\
             - Gold (XAU/USD): current N/A, change +0.00%\n\
             \n\
             [Heuristic risk] level=medium, score=3, factors=VIX very high (36.0) +3"
        );
    }

    #[test]
    fn digest_marks_empty_factor_list() {
        let risk = RiskSignal::from_factors(Vec::new());
        assert_eq!(risk.level, RiskLevel::Low);
        assert!(format_digest(&[], &risk).ends_with("factors=none"));
    }

    #[tokio::test]
    async fn falls_back_through_models_on_not_found() {
        let client = router("gemini-1.5-flash-8b");
        let narrator = GeminiNarrator::with_http_client(client.clone(), "key");

        let text = narrator.narrate("digest").await.expect("fallback serves");

        assert_eq!(text, "Risk is contained.");
        let urls = client.urls.lock().expect("url store").clone();
        assert_eq!(urls.len(), 3);
        assert!(urls[0].ends_with("/gemini-1.5-flash:generateContent"));
        assert!(urls[1].ends_with("/gemini-1.5-pro:generateContent"));
    }

    #[tokio::test]
    async fn exhausted_fallbacks_become_advisory() {
        let narrator = GeminiNarrator::with_http_client(router("none"), "key");
        let err = narrator.narrate("digest").await.expect_err("all 404");
        assert!(matches!(err, NarrativeError::ModelNotFound { ref tried } if tried.len() == 4));

        let outcome = narrate_or_advise(Some(&narrator), "digest").await;
        assert!(matches!(outcome, NarrativeOutcome::Unavailable(_)));
    }

    #[tokio::test]
    async fn missing_narrator_or_key_is_not_fatal() {
        let outcome = narrate_or_advise(None, "digest").await;
        assert!(outcome.text().contains("GOOGLE_API_KEY"));

        let keyless = GeminiNarrator::with_http_client(router(DEFAULT_MODEL), "  ");
        assert_eq!(
            keyless.narrate("digest").await,
            Err(NarrativeError::MissingApiKey)
        );
    }

    #[test]
    fn configured_fallback_is_not_tried_twice() {
        let narrator =
            GeminiNarrator::with_http_client(router("x"), "key").with_model("gemini-1.5-pro");
        assert_eq!(
            narrator.candidate_models(),
            vec!["gemini-1.5-pro", "gemini-1.5-flash-8b", "gemini-1.0-pro"]
        );
    }

    #[test]
    fn prompt_embeds_digest_and_requirements() {
        let prompt = build_prompt("[Market snapshot]");
        assert!(prompt.contains("Input data:\n[Market snapshot]\n\nRequirements:"));
        assert!(prompt.ends_with("uncertainty"));
    }
}
