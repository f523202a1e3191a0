//! GeminiClient - direct REST client for the Gemini generateContent API.
//!
//! Used as the generative-text fallback for messages the fixed templates
//! don't cleanly cover. Responses are cached briefly keyed by exact prompt
//! text, and requests are rate-limited to roughly one per second by
//! delaying rather than dropping. Without an API key the client answers
//! from a deterministic keyword-routed mock pool.

use async_trait::async_trait;
use flightfriend_core::error::{FlightFriendError, Result};
use rand::seq::SliceRandom;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, warn};

const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";
const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// How long a cached response stays valid. Rapid repeated identical input
/// within this window does not trigger a second billable call.
const CACHE_TTL: Duration = Duration::from_secs(5);
/// Minimum spacing between outbound requests.
const MIN_REQUEST_INTERVAL: Duration = Duration::from_secs(1);

/// The outbound generateContent call, separated so tests can substitute a
/// counting double for the HTTP client.
#[async_trait]
trait GeminiApi: Send + Sync {
    async fn generate_content(&self, model: &str, api_key: &str, prompt: &str) -> Result<String>;
}

/// Client for the Gemini HTTP API with cache, rate limit and mock fallback.
pub struct GeminiClient {
    api: Box<dyn GeminiApi>,
    api_key: Option<String>,
    model: String,
    state: Mutex<ClientState>,
}

#[derive(Default)]
struct ClientState {
    cache: HashMap<String, CachedResponse>,
    last_request: Option<Instant>,
    request_count: u64,
}

struct CachedResponse {
    text: String,
    stored_at: Instant,
}

impl GeminiClient {
    /// Creates a client. `api_key = None` selects mock mode.
    pub fn new(api_key: Option<String>) -> Self {
        if api_key.is_none() {
            info!("[GeminiClient] No API key configured, using mock responses");
        }
        Self {
            api: Box::new(HttpGeminiApi {
                client: Client::new(),
            }),
            api_key,
            model: DEFAULT_GEMINI_MODEL.to_string(),
            state: Mutex::new(ClientState::default()),
        }
    }

    #[cfg(test)]
    fn with_api(api: Box<dyn GeminiApi>, api_key: Option<String>) -> Self {
        Self {
            api,
            api_key,
            model: DEFAULT_GEMINI_MODEL.to_string(),
            state: Mutex::new(ClientState::default()),
        }
    }

    /// Overrides the model after construction.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Generates a completion for the prompt.
    ///
    /// Returns `Err` only for a keyed client whose call failed or produced
    /// an empty/malformed response; the engine then falls back to its fixed
    /// template pools. A keyless client always answers from the mock pool.
    pub async fn generate(&self, prompt: &str) -> Result<String> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Ok(mock_response(prompt));
        };

        // Cache check and rate limiting share the client state lock.
        let wait = {
            let mut state = self.state.lock().await;
            state
                .cache
                .retain(|_, cached| cached.stored_at.elapsed() < CACHE_TTL);
            if let Some(cached) = state.cache.get(prompt) {
                debug!("[GeminiClient] Using cached response for recent identical prompt");
                return Ok(cached.text.clone());
            }
            let wait = state
                .last_request
                .map(|last| MIN_REQUEST_INTERVAL.saturating_sub(last.elapsed()))
                .filter(|remaining| !remaining.is_zero());
            state.last_request = Some(Instant::now());
            state.request_count += 1;
            wait
        };
        if let Some(delay) = wait {
            debug!("[GeminiClient] Rate limit hit, delaying {delay:?}");
            tokio::time::sleep(delay).await;
        }

        let text = self
            .api
            .generate_content(&self.model, api_key, prompt)
            .await?;

        let mut state = self.state.lock().await;
        state.cache.insert(
            prompt.to_string(),
            CachedResponse {
                text: text.clone(),
                stored_at: Instant::now(),
            },
        );
        Ok(text)
    }

    /// Number of outbound (non-cached) requests issued so far.
    pub async fn request_count(&self) -> u64 {
        self.state.lock().await.request_count
    }
}

struct HttpGeminiApi {
    client: Client,
}

#[async_trait]
impl GeminiApi for HttpGeminiApi {
    async fn generate_content(&self, model: &str, api_key: &str, prompt: &str) -> Result<String> {
        let url = format!("{BASE_URL}/{model}:generateContent?key={api_key}");

        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GenerationConfig::default(),
            safety_settings: default_safety_settings(),
        };

        let response = self
            .client
            .post(url)
            .json(&request)
            .send()
            .await
            .map_err(|err| {
                FlightFriendError::external("gemini", format!("request failed: {err}"))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "failed to read error body".to_string());
            warn!("[GeminiClient] API error ({status}): {body}");
            return Err(map_http_error(status, body));
        }

        let parsed: GenerateContentResponse = response.json().await.map_err(|err| {
            FlightFriendError::external("gemini", format!("failed to parse response: {err}"))
        })?;

        let text = extract_text_response(parsed)?;
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(FlightFriendError::external(
                "gemini",
                "empty response candidate",
            ));
        }
        Ok(trimmed.to_string())
    }
}

fn map_http_error(status: StatusCode, body: String) -> FlightFriendError {
    let message = serde_json::from_str::<ErrorWrapper>(&body)
        .ok()
        .and_then(|wrapper| wrapper.error.message)
        .unwrap_or(body);
    FlightFriendError::external("gemini", format!("{status}: {message}"))
}

fn extract_text_response(response: GenerateContentResponse) -> Result<String> {
    response
        .candidates
        .and_then(|mut candidates| {
            if candidates.is_empty() {
                None
            } else {
                Some(candidates.remove(0))
            }
        })
        .and_then(|candidate| candidate.content)
        .and_then(|content| content.parts.into_iter().find_map(|part| part.text))
        .ok_or_else(|| {
            FlightFriendError::external("gemini", "no text in the response candidates")
        })
}

/// Deterministic keyword-routed responses used without an API key and kept
/// intentionally travel-flavored so the conversation stays coherent offline.
fn mock_response(prompt: &str) -> String {
    let lower = prompt.to_lowercase();
    let mut rng = rand::thread_rng();

    if lower.contains("hello") || lower.contains("hi ") || lower.contains("hey") {
        return "Hello! I'm Flight Friend, your travel assistant. How can I help you plan your travels today?".to_string();
    }
    if lower.contains("tip") || lower.contains("advice") || lower.contains("recommend") {
        let tips = [
            "For domestic flights in India, try booking 4-6 weeks in advance for the best deals.",
            "Weekday flights (especially Tuesday and Wednesday) are typically cheaper than weekend flights.",
            "Consider early morning or late night flights for better prices.",
            "Being flexible with your travel dates can often save you money.",
        ];
        return (*tips.choose(&mut rng).unwrap_or(&tips[0])).to_string();
    }
    if lower.contains("airline") || lower.contains("indigo") || lower.contains("vistara") {
        return "That airline operates flights on many routes across India. Their fares depend on the route, time of booking, and season. Would you like me to help you search for flights with them?".to_string();
    }
    if lower.contains("price") || lower.contains("cost") || lower.contains("cheap") {
        return "Flight prices vary based on how far in advance you book, the season, day of the week, and demand. I can help you find the best deals if you let me know your travel plans.".to_string();
    }
    let defaults = [
        "I'm your flight assistant, and I can help you find flights, compare prices, and provide travel tips. What would you like to know?",
        "Looking for flights? I can help you find the best options for your travel needs. Just let me know your departure, destination, and dates.",
        "I'm here to make your travel planning easier. Ask me about flights, destinations, or travel tips!",
    ];
    (*defaults.choose(&mut rng).unwrap_or(&defaults[0])).to_string()
}

#[derive(Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
    #[serde(rename = "safetySettings")]
    safety_settings: Vec<SafetySetting>,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_k: u32,
    top_p: f32,
    max_output_tokens: u32,
    stop_sequences: Vec<String>,
    candidate_count: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.9,
            top_k: 40,
            top_p: 0.95,
            max_output_tokens: 1024,
            stop_sequences: vec!["\n\n".to_string(), "END".to_string()],
            candidate_count: 1,
        }
    }
}

#[derive(Serialize)]
struct SafetySetting {
    category: &'static str,
    threshold: &'static str,
}

fn default_safety_settings() -> Vec<SafetySetting> {
    [
        "HARM_CATEGORY_HARASSMENT",
        "HARM_CATEGORY_HATE_SPEECH",
        "HARM_CATEGORY_SEXUALLY_EXPLICIT",
        "HARM_CATEGORY_DANGEROUS_CONTENT",
    ]
    .into_iter()
    .map(|category| SafetySetting {
        category,
        threshold: "BLOCK_MEDIUM_AND_ABOVE",
    })
    .collect()
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<ContentResponse>,
}

#[derive(Deserialize)]
struct ContentResponse {
    parts: Vec<PartResponse>,
}

#[derive(Deserialize)]
struct PartResponse {
    text: Option<String>,
}

#[derive(Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    /// Answers every prompt and counts how often it was actually called.
    struct CountingApi {
        calls: Arc<AtomicU64>,
    }

    #[async_trait]
    impl GeminiApi for CountingApi {
        async fn generate_content(
            &self,
            _model: &str,
            _api_key: &str,
            prompt: &str,
        ) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!("echo: {prompt}"))
        }
    }

    fn counting_client() -> (GeminiClient, Arc<AtomicU64>) {
        let calls = Arc::new(AtomicU64::new(0));
        let client = GeminiClient::with_api(
            Box::new(CountingApi {
                calls: calls.clone(),
            }),
            Some("test-key".to_string()),
        );
        (client, calls)
    }

    #[tokio::test(start_paused = true)]
    async fn test_identical_prompt_within_ttl_hits_cache() {
        let (client, calls) = counting_client();

        let first = client.generate("same question").await.unwrap();
        let second = client.generate("same question").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(client.request_count().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cache_expires_after_ttl() {
        let (client, calls) = counting_client();

        client.generate("same question").await.unwrap();
        tokio::time::sleep(CACHE_TTL + Duration::from_secs(1)).await;
        client.generate("same question").await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_distinct_prompts_are_spaced_by_rate_limit() {
        let (client, calls) = counting_client();
        let start = Instant::now();

        client.generate("first question").await.unwrap();
        client.generate("second question").await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(client.request_count().await, 2);
        assert!(start.elapsed() >= MIN_REQUEST_INTERVAL);
    }

    #[tokio::test]
    async fn test_keyless_client_always_answers() {
        let client = GeminiClient::new(None);
        let reply = client.generate("hello there").await.unwrap();
        assert!(!reply.is_empty());
        // No outbound request should have been issued.
        assert_eq!(client.request_count().await, 0);
    }

    #[test]
    fn test_mock_routing_by_keyword() {
        let tip = mock_response("any travel tip for me?");
        assert!(tip.to_lowercase().contains("flight") || tip.to_lowercase().contains("book"));

        let airline = mock_response("tell me about indigo");
        assert!(airline.contains("airline"));
    }

    #[test]
    fn test_extract_text_from_first_candidate() {
        let response = GenerateContentResponse {
            candidates: Some(vec![Candidate {
                content: Some(ContentResponse {
                    parts: vec![PartResponse {
                        text: Some("first".to_string()),
                    }],
                }),
            }]),
        };
        assert_eq!(extract_text_response(response).unwrap(), "first");
    }

    #[test]
    fn test_missing_candidates_is_an_error() {
        let response = GenerateContentResponse { candidates: None };
        let err = extract_text_response(response).unwrap_err();
        assert!(err.is_external());
    }

    #[test]
    fn test_generation_config_defaults() {
        let config = GenerationConfig::default();
        assert_eq!(config.candidate_count, 1);
        assert_eq!(config.max_output_tokens, 1024);
        assert_eq!(config.stop_sequences, vec!["\n\n", "END"]);
    }
}
