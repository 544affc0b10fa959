//! Chat-completion seam and its OpenAI-compatible HTTP client.
//!
//! # Invariants
//! - `ChatModel::complete` returns the first choice's content, untrimmed.
//! - The HTTP client never retries; failures propagate to the caller.

use crate::ai::{AiError, AiResult};
use log::{error, info};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

pub const DEFAULT_MODEL: &str = "gpt-4o";
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const MAX_ERROR_BODY_CHARS: usize = 400;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// One role-tagged message of a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

/// Model name and sampling temperature shared by every operation.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationSettings {
    pub model: String,
    pub temperature: f32,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

/// Serialized as the chat-completions request body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
}

impl ChatRequest {
    /// Builds the system + user pair every operation sends.
    pub fn new(
        settings: &GenerationSettings,
        system_prompt: impl Into<String>,
        user_prompt: impl Into<String>,
    ) -> Self {
        Self {
            model: settings.model.clone(),
            messages: vec![
                ChatMessage::system(system_prompt),
                ChatMessage::user(user_prompt),
            ],
            temperature: settings.temperature,
        }
    }
}

/// External chat model. Implementations perform exactly one completion.
pub trait ChatModel {
    fn complete(&self, request: &ChatRequest) -> AiResult<String>;
}

impl<M: ChatModel + ?Sized> ChatModel for &M {
    fn complete(&self, request: &ChatRequest) -> AiResult<String> {
        (**self).complete(request)
    }
}

impl<M: ChatModel + ?Sized> ChatModel for Box<M> {
    fn complete(&self, request: &ChatRequest) -> AiResult<String> {
        (**self).complete(request)
    }
}

/// Blocking client for any OpenAI-compatible `/chat/completions` endpoint.
pub struct OpenAiChatClient {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl OpenAiChatClient {
    pub fn new(base_url: &str, api_key: impl Into<String>, timeout: Duration) -> AiResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: completions_endpoint(base_url),
            api_key: api_key.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

impl ChatModel for OpenAiChatClient {
    fn complete(&self, request: &ChatRequest) -> AiResult<String> {
        let started_at = Instant::now();
        let prompt_chars: usize = request
            .messages
            .iter()
            .map(|message| message.content.chars().count())
            .sum();
        info!(
            "event=chat_complete module=ai status=start model={} messages={} prompt_chars={}",
            request.model,
            request.messages.len(),
            prompt_chars
        );

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .inspect_err(|err| {
                error!(
                    "event=chat_complete module=ai status=error duration_ms={} error_code=transport error={}",
                    started_at.elapsed().as_millis(),
                    err
                );
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            error!(
                "event=chat_complete module=ai status=error duration_ms={} error_code=http_status http_status={}",
                started_at.elapsed().as_millis(),
                status.as_u16()
            );
            return Err(AiError::Status {
                status: status.as_u16(),
                body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
            });
        }

        let completion: CompletionResponse = response.json()?;
        let content = extract_content(completion)?;
        info!(
            "event=chat_complete module=ai status=ok duration_ms={} reply_chars={}",
            started_at.elapsed().as_millis(),
            content.chars().count()
        );
        Ok(content)
    }
}

fn extract_content(completion: CompletionResponse) -> AiResult<String> {
    completion
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or(AiError::EmptyResponse)
}

fn completions_endpoint(base_url: &str) -> String {
    format!("{}/chat/completions", base_url.trim().trim_end_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::{
        completions_endpoint, extract_content, ChatModel, ChatRequest, CompletionResponse,
        GenerationSettings, OpenAiChatClient, MAX_ERROR_BODY_CHARS,
    };
    use crate::ai::AiError;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread::{self, JoinHandle};
    use std::time::Duration;

    /// Serves one canned HTTP response and hands back the raw request text.
    fn serve_once(status_line: &str, body: String) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base_url = format!("http://{}/v1", listener.local_addr().unwrap());
        let status_line = status_line.to_string();
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let request = read_request(&mut stream);
            let response = format!(
                "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).unwrap();
            request
        });
        (base_url, handle)
    }

    fn read_request(stream: &mut std::net::TcpStream) -> String {
        let mut raw = Vec::new();
        let mut buf = [0_u8; 4096];
        loop {
            let read = stream.read(&mut buf).unwrap();
            if read == 0 {
                break;
            }
            raw.extend_from_slice(&buf[..read]);
            let text = String::from_utf8_lossy(&raw);
            if let Some(head_end) = text.find("\r\n\r\n") {
                let content_length = text[..head_end]
                    .lines()
                    .find_map(|line| {
                        let (name, value) = line.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())
                            .flatten()
                    })
                    .unwrap_or(0);
                if raw.len() >= head_end + 4 + content_length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&raw).into_owned()
    }

    fn client(base_url: &str) -> OpenAiChatClient {
        OpenAiChatClient::new(base_url, "sk-test-key", Duration::from_secs(5)).unwrap()
    }

    fn request() -> ChatRequest {
        ChatRequest::new(&GenerationSettings::default(), "sys", "hello")
    }

    #[test]
    fn endpoint_joins_without_double_slash() {
        assert_eq!(
            completions_endpoint("https://api.openai.com/v1/"),
            "https://api.openai.com/v1/chat/completions"
        );
        assert_eq!(
            completions_endpoint("http://localhost:11434/v1"),
            "http://localhost:11434/v1/chat/completions"
        );
    }

    #[test]
    fn request_serializes_roles_in_lowercase() {
        let request = ChatRequest::new(&GenerationSettings::default(), "sys", "hello");
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["model"], "gpt-4o");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["messages"][1]["content"], "hello");
        assert!((body["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);
    }

    #[test]
    fn first_choice_content_is_returned() {
        let completion: CompletionResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":"Hi there"}},
                           {"message":{"role":"assistant","content":"ignored"}}]}"#,
        )
        .unwrap();
        assert_eq!(extract_content(completion).unwrap(), "Hi there");
    }

    #[test]
    fn missing_or_blank_content_is_empty_response() {
        let no_choices: CompletionResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(matches!(
            extract_content(no_choices),
            Err(AiError::EmptyResponse)
        ));

        let null_content: CompletionResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"content":null}}]}"#).unwrap();
        assert!(matches!(
            extract_content(null_content),
            Err(AiError::EmptyResponse)
        ));
    }

    #[test]
    fn complete_posts_with_bearer_auth_and_returns_content() {
        let (base_url, server) = serve_once(
            "200 OK",
            r#"{"choices":[{"message":{"role":"assistant","content":"Hey Amy!"}}]}"#.to_string(),
        );

        let reply = client(&base_url).complete(&request()).unwrap();
        let raw_request = server.join().unwrap();

        assert_eq!(reply, "Hey Amy!");
        assert!(raw_request.starts_with("POST /v1/chat/completions "));
        assert!(raw_request
            .lines()
            .any(|line| line.eq_ignore_ascii_case("authorization: Bearer sk-test-key")));
        assert!(raw_request.contains(r#""content":"hello""#));
    }

    #[test]
    fn non_success_status_keeps_truncated_body() {
        let body = format!(r#"{{"error":"{}"}}"#, "x".repeat(1000));
        let (base_url, server) = serve_once("401 Unauthorized", body);

        let err = client(&base_url).complete(&request()).unwrap_err();
        server.join().unwrap();

        match err {
            AiError::Status { status, body } => {
                assert_eq!(status, 401);
                assert_eq!(body.chars().count(), MAX_ERROR_BODY_CHARS);
                assert!(body.starts_with(r#"{"error":"xxx"#));
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[test]
    fn unreachable_endpoint_is_transport_error() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };

        let err = client(&format!("http://127.0.0.1:{port}/v1"))
            .complete(&request())
            .unwrap_err();
        assert!(matches!(err, AiError::Http(_)));
    }
}
