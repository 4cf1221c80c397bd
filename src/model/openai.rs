use std::collections::VecDeque;
use std::pin::Pin;

use async_trait::async_trait;
use futures_util::{Stream, StreamExt};
use serde_json::{Value, json};

use super::{FragmentStream, LanguageModelClient, ModelError};

/// Streaming client for OpenAI-compatible chat-completions backends.
///
/// Speaks the `stream: true` SSE wire format: the response body is a
/// sequence of `data: {json}` lines terminated by `data: [DONE]`, where each
/// frame may carry one content delta. Works against any endpoint exposing
/// the protocol (hosted APIs, LM Studio, vLLM, llama.cpp server).
pub struct OpenAiCompatClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl OpenAiCompatClient {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
    ) -> Result<Self, ModelError> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
            model: model.into(),
            api_key,
        })
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl LanguageModelClient for OpenAiCompatClient {
    async fn stream_complete(
        &self,
        prompt: &str,
        api_key: Option<&str>,
    ) -> Result<FragmentStream, ModelError> {
        let body = json!({
            "model": self.model,
            "messages": [{"role": "user", "content": prompt}],
            "stream": true,
        });

        let mut request = self.http.post(self.completions_url()).json(&body);
        if let Some(key) = api_key.or(self.api_key.as_deref()) {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?.error_for_status()?;
        let byte_stream = response.bytes_stream().map(|chunk| chunk.map(|b| b.to_vec()));

        let state = SseState {
            body: Box::pin(byte_stream),
            buffer: Vec::new(),
            pending: VecDeque::new(),
            done: false,
        };

        let fragments = futures_util::stream::try_unfold(state, |mut st| async move {
            loop {
                if let Some(fragment) = st.pending.pop_front() {
                    return Ok(Some((fragment, st)));
                }
                if st.done {
                    return Ok(None);
                }
                match st.body.next().await {
                    None => st.done = true,
                    Some(Err(err)) => return Err(ModelError::Transport(err)),
                    Some(Ok(bytes)) => {
                        st.buffer.extend_from_slice(&bytes);
                        drain_lines(&mut st)?;
                    }
                }
            }
        });

        Ok(Box::pin(fragments))
    }
}

struct SseState {
    body: Pin<Box<dyn Stream<Item = Result<Vec<u8>, reqwest::Error>> + Send>>,
    // Raw bytes buffered until a full line is available; a UTF-8 code point
    // never spans a b'\n', so per-line decoding is safe.
    buffer: Vec<u8>,
    pending: VecDeque<String>,
    done: bool,
}

/// Consume every complete line currently buffered in `st`.
fn drain_lines(st: &mut SseState) -> Result<(), ModelError> {
    while let Some(pos) = st.buffer.iter().position(|&b| b == b'\n') {
        let line_bytes: Vec<u8> = st.buffer.drain(..=pos).collect();
        let line = String::from_utf8_lossy(&line_bytes);
        match parse_sse_line(line.trim())? {
            SseLine::Fragment(text) => st.pending.push_back(text),
            SseLine::Done => {
                st.done = true;
                break;
            }
            SseLine::Ignore => {}
        }
    }
    Ok(())
}

#[derive(Debug)]
enum SseLine {
    Fragment(String),
    Done,
    Ignore,
}

fn parse_sse_line(line: &str) -> Result<SseLine, ModelError> {
    let Some(data) = line.strip_prefix("data:") else {
        // Blank keep-alives and comment lines between frames.
        return Ok(SseLine::Ignore);
    };
    let data = data.trim();
    if data == "[DONE]" {
        return Ok(SseLine::Done);
    }
    if data.is_empty() {
        return Ok(SseLine::Ignore);
    }

    let frame: Value = serde_json::from_str(data)
        .map_err(|err| ModelError::Protocol(format!("invalid stream frame: {err}")))?;
    match frame["choices"][0]["delta"]["content"].as_str() {
        Some(content) if !content.is_empty() => Ok(SseLine::Fragment(content.to_owned())),
        _ => Ok(SseLine::Ignore),
    }
}
