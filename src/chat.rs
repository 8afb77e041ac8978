//! Chat session management and provider round trips.
//!
//! Defines the predefined [`ProviderConfig`]s (OpenRouter, DeepSeek) and the
//! [`ChatSession`] state machine that owns the message history.
//!
//! A session is idle, awaiting a response, or folding an error back into the
//! history. The state transitions are synchronous and separated from I/O:
//! [`ChatSession::prepare_send`] applies the guards and the optimistic user
//! echo, [`ChatSession::apply_reply`] / [`ChatSession::apply_failure`] record
//! the outcome. [`ChatSession::send`] wires them to one HTTP request.
//!
//! At most one request is in flight per session; a send attempted while a
//! request is pending is rejected. Failures are never retried automatically —
//! they surface as an error-flagged assistant message and the user resends.

use std::io::{BufRead, Write};
use std::time::Duration;

use anyhow::{bail, Result};
use chrono::Utc;
use reqwest::Client;
use serde_json::json;

use crate::config::{ChatConfig, Config};
use crate::models::{ChatMessage, Role};

/// Greeting seeded into every fresh (or cleared) session history.
pub const GREETING: &str = "Hello! I'm your AI assistant. I can help you with \
various tasks using different AI models. How can I assist you today?";

/// Fixed configuration for one chat-completion provider.
pub struct ProviderConfig {
    pub name: &'static str,
    pub endpoint: &'static str,
    /// Available models, first entry is the default.
    pub models: &'static [&'static str],
    /// Environment variable the credential is read from.
    pub credential_env: &'static str,
}

/// The two predefined providers.
pub static PROVIDERS: &[ProviderConfig] = &[
    ProviderConfig {
        name: "openrouter",
        endpoint: "https://openrouter.ai/api/v1/chat/completions",
        models: &[
            "qwen/qwen3-coder:free",
            "anthropic/claude-3.5-sonnet",
            "openai/gpt-4o",
            "openai/gpt-4o-mini",
            "google/gemini-pro-1.5",
            "meta-llama/llama-3.1-405b-instruct",
            "microsoft/phi-3-medium-128k-instruct",
            "deepseek/deepseek-r1-0528:free",
            "deepseek/deepseek-chat-v3-0324:free",
        ],
        credential_env: "OPENROUTER_API_KEY",
    },
    ProviderConfig {
        name: "deepseek",
        endpoint: "https://api.deepseek.com/chat/completions",
        models: &["deepseek-chat", "deepseek-coder"],
        credential_env: "DEEPSEEK_API_KEY",
    },
];

pub fn provider_names() -> Vec<&'static str> {
    PROVIDERS.iter().map(|p| p.name).collect()
}

pub fn find_provider(name: &str) -> Option<&'static ProviderConfig> {
    PROVIDERS.iter().find(|p| p.name == name)
}

impl ProviderConfig {
    /// Bearer auth plus provider-specific attribution headers.
    pub fn build_headers(&self, credential: &str, chat: &ChatConfig) -> Vec<(&'static str, String)> {
        let mut headers = vec![
            ("Authorization", format!("Bearer {credential}")),
            ("Content-Type", "application/json".to_string()),
        ];
        if self.name == "openrouter" {
            if !chat.referer.is_empty() {
                headers.push(("HTTP-Referer", chat.referer.clone()));
            }
            headers.push(("X-Title", chat.title.clone()));
        }
        headers
    }
}

/// Why a send was rejected without issuing a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendBlocked {
    /// Outbound text was empty after trimming; silent no-op.
    EmptyInput,
    /// No credential configured; surfaced as a validation notice.
    MissingCredential,
    /// A request is already in flight.
    Busy,
}

/// Result of one send attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Assistant reply appended to history.
    Replied,
    /// Error-flagged message appended to history.
    Failed,
    /// Rejected by a precondition; history unchanged except no-ops.
    Blocked(SendBlocked),
}

/// An outbound request ready to be performed.
#[derive(Debug)]
pub struct PreparedRequest {
    pub url: String,
    pub headers: Vec<(&'static str, String)>,
    pub body: serde_json::Value,
}

/// One chat view's session: ordered history, provider/model selection,
/// credential, and the single-request-in-flight guard. Created per view,
/// discarded with it — never shared.
pub struct ChatSession {
    messages: Vec<ChatMessage>,
    provider: &'static ProviderConfig,
    model: String,
    credential: String,
    chat: ChatConfig,
    pending: bool,
    last_id: i64,
}

impl ChatSession {
    pub fn new(chat: ChatConfig, credential: String) -> Result<Self> {
        let provider = match find_provider(&chat.provider) {
            Some(p) => p,
            None => bail!("Unknown chat provider: '{}'", chat.provider),
        };
        let model = if chat.model.is_empty() {
            provider.models[0].to_string()
        } else if provider.models.contains(&chat.model.as_str()) {
            chat.model.clone()
        } else {
            bail!(
                "Model '{}' is not offered by provider '{}'",
                chat.model,
                provider.name
            );
        };

        let mut session = Self {
            messages: Vec::new(),
            provider,
            model,
            credential,
            chat,
            pending: false,
            last_id: 0,
        };
        session.clear();
        Ok(session)
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn provider(&self) -> &'static ProviderConfig {
        self.provider
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn set_credential(&mut self, credential: String) {
        self.credential = credential;
    }

    /// Switch providers. The selected model resets to the new provider's
    /// first available model so a stale, incompatible selection cannot be
    /// submitted.
    pub fn select_provider(&mut self, name: &str) -> Result<()> {
        let provider = match find_provider(name) {
            Some(p) => p,
            None => bail!(
                "Unknown chat provider: '{}'. Must be one of: {}",
                name,
                provider_names().join(", ")
            ),
        };
        self.provider = provider;
        self.model = provider.models[0].to_string();
        Ok(())
    }

    pub fn select_model(&mut self, model: &str) -> Result<()> {
        if !self.provider.models.contains(&model) {
            bail!(
                "Model '{}' is not offered by provider '{}'",
                model,
                self.provider.name
            );
        }
        self.model = model.to_string();
        Ok(())
    }

    /// Replace the entire history with a single fresh greeting. Always
    /// permitted, independent of current state.
    pub fn clear(&mut self) {
        let greeting = ChatMessage {
            id: self.next_id(),
            role: Role::Assistant,
            content: GREETING.to_string(),
            timestamp: Utc::now(),
            model: None,
            is_error: false,
        };
        self.messages = vec![greeting];
    }

    /// Guard a send and stage the request.
    ///
    /// On success the user message is echoed into history, the session is
    /// marked pending, and the returned request carries the full prior
    /// history plus the new message in the provider role vocabulary.
    pub fn prepare_send(&mut self, text: &str) -> std::result::Result<PreparedRequest, SendBlocked> {
        if text.trim().is_empty() {
            return Err(SendBlocked::EmptyInput);
        }
        if self.pending {
            return Err(SendBlocked::Busy);
        }
        if self.credential.trim().is_empty() {
            return Err(SendBlocked::MissingCredential);
        }

        let mut wire: Vec<serde_json::Value> = self
            .messages
            .iter()
            .map(|m| json!({ "role": m.role.as_str(), "content": m.content }))
            .collect();
        wire.push(json!({ "role": "user", "content": text }));

        let body = json!({
            "model": self.model,
            "messages": wire,
            "max_tokens": self.chat.max_tokens,
            "temperature": self.chat.temperature,
        });

        let message = ChatMessage {
            id: self.next_id(),
            role: Role::User,
            content: text.to_string(),
            timestamp: Utc::now(),
            model: None,
            is_error: false,
        };
        self.messages.push(message);
        self.pending = true;

        Ok(PreparedRequest {
            url: self.provider.endpoint.to_string(),
            headers: self.provider.build_headers(&self.credential, &self.chat),
            body,
        })
    }

    /// Record a successful reply and return to idle.
    pub fn apply_reply(&mut self, content: String) {
        let message = ChatMessage {
            id: self.next_id(),
            role: Role::Assistant,
            content,
            timestamp: Utc::now(),
            model: Some(self.model.clone()),
            is_error: false,
        };
        self.messages.push(message);
        self.pending = false;
    }

    /// Fold a failure into the history and return to idle.
    pub fn apply_failure(&mut self, error: String) {
        let message = ChatMessage {
            id: self.next_id(),
            role: Role::Assistant,
            content: format!("Error: {error}"),
            timestamp: Utc::now(),
            model: None,
            is_error: true,
        };
        self.messages.push(message);
        self.pending = false;
    }

    /// One full send: guards, optimistic echo, HTTP round trip, outcome
    /// folded into history.
    pub async fn send(&mut self, client: &Client, text: &str) -> SendOutcome {
        let request = match self.prepare_send(text) {
            Ok(r) => r,
            Err(blocked) => return SendOutcome::Blocked(blocked),
        };
        let timeout = Duration::from_secs(self.chat.timeout_secs);
        match perform_request(client, &request, timeout).await {
            Ok(content) => {
                self.apply_reply(content);
                SendOutcome::Replied
            }
            Err(error) => {
                self.apply_failure(error);
                SendOutcome::Failed
            }
        }
    }

    /// Time-derived ids, strictly monotonic even within one millisecond.
    fn next_id(&mut self) -> i64 {
        let now = Utc::now().timestamp_millis();
        let id = now.max(self.last_id + 1);
        self.last_id = id;
        id
    }
}

/// Perform one chat-completion request.
///
/// The error string follows the surfacing precedence: response-body
/// `error.message`, else the HTTP status line, else the transport error.
async fn perform_request(
    client: &Client,
    request: &PreparedRequest,
    timeout: Duration,
) -> std::result::Result<String, String> {
    let mut builder = client.post(&request.url).timeout(timeout);
    for (name, value) in &request.headers {
        builder = builder.header(*name, value.as_str());
    }

    let response = builder
        .json(&request.body)
        .send()
        .await
        .map_err(|e| e.to_string())?;

    let status = response.status();
    if !status.is_success() {
        let message = response
            .json::<serde_json::Value>()
            .await
            .ok()
            .and_then(|v| {
                v.get("error")
                    .and_then(|e| e.get("message"))
                    .and_then(|m| m.as_str())
                    .map(String::from)
            })
            .unwrap_or_else(|| format!("HTTP {status}"));
        return Err(message);
    }

    let body: serde_json::Value = response.json().await.map_err(|e| e.to_string())?;
    parse_reply(&body).ok_or_else(|| "unexpected response shape".to_string())
}

/// Extract `choices[0].message.content` from a completion response.
pub fn parse_reply(body: &serde_json::Value) -> Option<String> {
    body.get("choices")?
        .as_array()?
        .first()?
        .get("message")?
        .get("content")?
        .as_str()
        .map(String::from)
}

/// CLI entry point for `folio chat` — a line-oriented REPL over one session.
pub async fn run_chat(config: &Config) -> Result<()> {
    let provider = find_provider(&config.chat.provider)
        .ok_or_else(|| anyhow::anyhow!("Unknown chat provider: '{}'", config.chat.provider))?;
    let credential = std::env::var(provider.credential_env).unwrap_or_default();
    let mut session = ChatSession::new(config.chat.clone(), credential)?;

    let client = Client::builder()
        .timeout(Duration::from_secs(config.chat.timeout_secs))
        .build()?;

    println!(
        "chat with {} ({})  —  /provider, /model, /clear, /quit",
        session.provider().name,
        session.model()
    );
    println!("assistant: {GREETING}");

    let stdin = std::io::stdin();
    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();

        match line.split_once(' ').map_or((line, ""), |(a, b)| (a, b)) {
            ("/quit", _) | ("/exit", _) => break,
            ("/clear", _) => {
                session.clear();
                println!("assistant: {GREETING}");
                continue;
            }
            ("/provider", name) => {
                match session.select_provider(name.trim()) {
                    Ok(()) => {
                        let env = session.provider().credential_env;
                        session.set_credential(std::env::var(env).unwrap_or_default());
                        println!(
                            "provider: {} (model reset to {})",
                            session.provider().name,
                            session.model()
                        );
                    }
                    Err(e) => println!("{e}"),
                }
                continue;
            }
            ("/model", name) => {
                match session.select_model(name.trim()) {
                    Ok(()) => println!("model: {}", session.model()),
                    Err(e) => println!("{e}"),
                }
                continue;
            }
            _ => {}
        }

        match session.send(&client, line).await {
            SendOutcome::Replied | SendOutcome::Failed => {
                if let Some(last) = session.messages().last() {
                    println!("assistant: {}", last.content);
                }
            }
            SendOutcome::Blocked(SendBlocked::EmptyInput) => {}
            SendOutcome::Blocked(SendBlocked::MissingCredential) => {
                println!(
                    "Please set {} to chat with {}.",
                    session.provider().credential_env,
                    session.provider().name
                );
            }
            SendOutcome::Blocked(SendBlocked::Busy) => {
                println!("A request is already in flight.");
            }
        }
    }

    Ok(())
}
