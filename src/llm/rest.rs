use std::future::Future;

use reqwest::Url;
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};

use super::GenerationError;
use super::secrets::ApiKey;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

impl HttpReply {
    fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The one HTTP call the fallback strategy needs.
pub trait HttpTransport {
    fn post_json(
        &self,
        url: Url,
        body: String,
    ) -> impl Future<Output = Result<HttpReply, GenerationError>> + Send;
}

impl HttpTransport for reqwest::Client {
    async fn post_json(&self, url: Url, body: String) -> Result<HttpReply, GenerationError> {
        let response = self
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            // The key rides in the query string.
            .map_err(|err| GenerationError::Transport(err.without_url().to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|err| GenerationError::Transport(err.without_url().to_string()))?;
        Ok(HttpReply { status, body })
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: [Content<'a>; 1],
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: [RequestPart<'a>; 1],
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    parts: Option<Vec<ResponsePart>>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// Raw `generateContent` calls, used when the managed client is not available.
pub struct RestBackend<T> {
    transport: T,
    api_key: ApiKey,
    host: String,
    model: String,
}

impl<T: HttpTransport + Sync> RestBackend<T> {
    pub fn new(transport: T, api_key: ApiKey, host: &str, model: &str) -> Self {
        Self {
            transport,
            api_key,
            host: host.trim_end_matches('/').to_string(),
            model: model.to_string(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> Result<Url, GenerationError> {
        let base = format!(
            "{}/v1beta/models/{}:generateContent",
            self.host, self.model
        );
        Url::parse_with_params(&base, [("key", self.api_key.expose())])
            .map_err(|err| GenerationError::Transport(format!("invalid endpoint: {err}")))
    }

    pub async fn generate(&self, prompt: &str, temperature: f32) -> Result<String, GenerationError> {
        let url = self.endpoint()?;
        let body = request_body(prompt, temperature)?;
        let reply = self.transport.post_json(url, body).await?;

        if !reply.is_success() {
            return Err(GenerationError::Transport(describe_failure(&reply)));
        }
        extract_text(&reply.body)
    }
}

fn request_body(prompt: &str, temperature: f32) -> Result<String, GenerationError> {
    let request = GenerateContentRequest {
        contents: [Content {
            parts: [RequestPart { text: prompt }],
        }],
        generation_config: GenerationConfig { temperature },
    };
    serde_json::to_string(&request)
        .map_err(|err| GenerationError::Transport(format!("could not encode request: {err}")))
}

fn describe_failure(reply: &HttpReply) -> String {
    match serde_json::from_str::<ErrorEnvelope>(&reply.body) {
        Ok(envelope) => format!("HTTP {}: {}", reply.status, envelope.error.message),
        Err(_) => format!("HTTP {}", reply.status),
    }
}

/// Text of the first part of the first candidate.
fn extract_text(body: &str) -> Result<String, GenerationError> {
    let response: GenerateContentResponse = serde_json::from_str(body)
        .map_err(|err| GenerationError::Shape(format!("body is not valid JSON: {err}")))?;

    let candidate = response
        .candidates
        .and_then(|candidates| candidates.into_iter().next())
        .ok_or_else(|| GenerationError::Shape("no candidates in response".into()))?;

    let text = candidate
        .content
        .and_then(|content| content.parts)
        .and_then(|parts| parts.into_iter().next())
        .and_then(|part| part.text)
        .ok_or_else(|| GenerationError::Shape("first candidate has no text part".into()))?;

    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(GenerationError::Shape("model returned empty text".into()));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use serde_json::{Value, json};

    use super::*;

    /// Replays one canned reply and remembers what it was sent.
    pub(crate) struct FakeTransport {
        reply: Result<HttpReply, GenerationError>,
        delay: Option<Duration>,
        calls: Arc<AtomicUsize>,
        pub(crate) last_request: Mutex<Option<(Url, String)>>,
    }

    impl FakeTransport {
        pub(crate) fn replying(status: u16, body: impl Into<String>) -> Self {
            Self {
                reply: Ok(HttpReply {
                    status,
                    body: body.into(),
                }),
                delay: None,
                calls: Arc::new(AtomicUsize::new(0)),
                last_request: Mutex::new(None),
            }
        }

        pub(crate) fn failing(message: &str) -> Self {
            Self {
                reply: Err(GenerationError::Transport(message.to_string())),
                delay: None,
                calls: Arc::new(AtomicUsize::new(0)),
                last_request: Mutex::new(None),
            }
        }

        /// Holds every reply back for `delay`.
        pub(crate) fn delayed(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }

        /// Shared call counter that outlives the transport being moved.
        pub(crate) fn counter(&self) -> Arc<AtomicUsize> {
            Arc::clone(&self.calls)
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl HttpTransport for FakeTransport {
        async fn post_json(&self, url: Url, body: String) -> Result<HttpReply, GenerationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            *self.last_request.lock().unwrap() = Some((url, body));
            self.reply.clone()
        }
    }

    fn backend(transport: FakeTransport) -> RestBackend<FakeTransport> {
        RestBackend::new(
            transport,
            ApiKey::parse("test-key").unwrap(),
            "https://example.test/",
            "gemini-2.5-flash",
        )
    }

    fn success_body(text: &str) -> String {
        json!({"candidates": [{"content": {"parts": [{"text": text}]}}]}).to_string()
    }

    #[tokio::test]
    async fn sends_documented_request_shape() {
        let rest = backend(FakeTransport::replying(200, success_body("  ### Word  \n")));
        let text = rest.generate("hello", 0.6).await.unwrap();
        assert_eq!(text, "### Word");

        let (url, body) = rest.transport.last_request.lock().unwrap().clone().unwrap();
        assert_eq!(
            url.as_str(),
            "https://example.test/v1beta/models/gemini-2.5-flash:generateContent?key=test-key"
        );
        let body: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(body["contents"][0]["parts"][0]["text"], "hello");
        let temperature = body["generationConfig"]["temperature"].as_f64().unwrap();
        assert!((temperature - 0.6).abs() < 1e-6);
    }

    #[tokio::test]
    async fn missing_candidates_is_shape_error() {
        let rest = backend(FakeTransport::replying(200, r#"{"promptFeedback":{}}"#));
        let err = rest.generate("hello", 0.2).await.unwrap_err();
        assert!(matches!(err, GenerationError::Shape(_)));
    }

    #[tokio::test]
    async fn empty_candidates_is_shape_error() {
        let rest = backend(FakeTransport::replying(200, r#"{"candidates":[]}"#));
        let err = rest.generate("hello", 0.2).await.unwrap_err();
        assert!(matches!(err, GenerationError::Shape(_)));
    }

    #[tokio::test]
    async fn non_json_body_is_shape_error() {
        let rest = backend(FakeTransport::replying(200, "<html>oops</html>"));
        let err = rest.generate("hello", 0.2).await.unwrap_err();
        assert!(matches!(err, GenerationError::Shape(_)));
    }

    #[tokio::test]
    async fn non_success_status_is_transport_error_with_message() {
        let body = json!({"error": {"code": 400, "message": "API key not valid."}}).to_string();
        let rest = backend(FakeTransport::replying(400, body));
        let err = rest.generate("hello", 0.2).await.unwrap_err();
        assert_eq!(
            err,
            GenerationError::Transport("HTTP 400: API key not valid.".into())
        );
    }

    #[tokio::test]
    async fn network_failure_passes_through() {
        let rest = backend(FakeTransport::failing("connection refused"));
        let err = rest.generate("hello", 0.2).await.unwrap_err();
        assert_eq!(err, GenerationError::Transport("connection refused".into()));
        assert_eq!(rest.transport.call_count(), 1);
    }

    #[test]
    fn whitespace_only_text_is_rejected() {
        let err = extract_text(&success_body("   ")).unwrap_err();
        assert!(matches!(err, GenerationError::Shape(_)));
    }

    #[test]
    fn part_without_text_is_rejected() {
        let body = json!({"candidates": [{"content": {"parts": [{"inlineData": {}}]}}]}).to_string();
        assert!(matches!(extract_text(&body), Err(GenerationError::Shape(_))));
    }
}
