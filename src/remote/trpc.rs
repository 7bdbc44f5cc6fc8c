use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::RemoteError;
use crate::models::{NewQuestion, Question};
use crate::remote::{QuestionService, CREATE_PROCEDURE, FILTER_PROCEDURE};
use crate::search::QuestionQuery;

pub const DEFAULT_BASE_URL: &str = "https://www.techinterviewhandbook.org";

/// Question catalog over the portal's tRPC HTTP endpoint.
pub struct TrpcQuestionService {
    base_url: String,
    api_key: Option<String>,
    client: reqwest::blocking::Client,
}

impl TrpcQuestionService {
    pub fn new(
        base_url: Option<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, RemoteError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| RemoteError::Transport {
                procedure: "client".to_string(),
                source,
            })?;
        let base_url = base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        Ok(Self {
            base_url,
            api_key,
            client,
        })
    }

    fn endpoint(&self, procedure: &str) -> String {
        format!("{}/api/trpc/{}", self.base_url, procedure)
    }

    fn send(
        &self,
        procedure: &str,
        request: reqwest::blocking::RequestBuilder,
    ) -> Result<serde_json::Value, RemoteError> {
        let request = match self.api_key {
            Some(ref key) => request.header("Authorization", format!("Bearer {key}")),
            None => request,
        };

        let resp = request.send().map_err(|source| RemoteError::Transport {
            procedure: procedure.to_string(),
            source,
        })?;

        let status = resp.status();
        let text = resp.text().map_err(|source| RemoteError::Transport {
            procedure: procedure.to_string(),
            source,
        })?;

        // tRPC reports procedure errors with a JSON envelope and a non-2xx status.
        let json: Option<serde_json::Value> = serde_json::from_str(&text).ok();
        if let Some(message) = json.as_ref().and_then(error_message) {
            return Err(RemoteError::Procedure {
                procedure: procedure.to_string(),
                message,
            });
        }
        if !status.is_success() {
            return Err(RemoteError::Http {
                procedure: procedure.to_string(),
                status: status.as_u16(),
                body: text,
            });
        }

        match json {
            Some(json) => Ok(json),
            None => serde_json::from_str(&text).map_err(|source| RemoteError::Decode {
                procedure: procedure.to_string(),
                source,
            }),
        }
    }
}

impl QuestionService for TrpcQuestionService {
    fn fetch_questions(&self, query: &QuestionQuery) -> Result<Vec<Question>, RemoteError> {
        let input = encode_input(FILTER_PROCEDURE, query)?;
        debug!("GET {FILTER_PROCEDURE} input={input}");

        let request = self
            .client
            .get(self.endpoint(FILTER_PROCEDURE))
            .query(&[("input", input.as_str())]);
        let json = self.send(FILTER_PROCEDURE, request)?;
        let questions: Vec<Question> = decode_result(FILTER_PROCEDURE, json)?;

        info!("Fetched {} questions", questions.len());
        Ok(questions)
    }

    fn create_question(&self, question: &NewQuestion) -> Result<(), RemoteError> {
        let request = self
            .client
            .post(self.endpoint(CREATE_PROCEDURE))
            .header("Content-Type", "application/json")
            .json(question);
        let json = self.send(CREATE_PROCEDURE, request)?;
        let _: serde_json::Value = decode_result(CREATE_PROCEDURE, json)?;

        info!("Created question for {}", question.company_id);
        Ok(())
    }
}

/// Serialize a procedure's `input` query parameter.
fn encode_input<T: Serialize>(procedure: &str, input: &T) -> Result<String, RemoteError> {
    serde_json::to_string(input).map_err(|source| RemoteError::Encode {
        procedure: procedure.to_string(),
        source,
    })
}

fn error_message(json: &serde_json::Value) -> Option<String> {
    let error = json.get("error")?;
    let message = error
        .get("message")
        .or_else(|| error.get("json").and_then(|j| j.get("message")))
        .and_then(|m| m.as_str())
        .unwrap_or("unknown error");
    Some(message.to_string())
}

/// Unwrap `result.data`, and the inner `json` when the server wraps payloads.
pub fn decode_result<T: DeserializeOwned>(
    procedure: &str,
    json: serde_json::Value,
) -> Result<T, RemoteError> {
    let mut data = json
        .get("result")
        .and_then(|r| r.get("data"))
        .cloned()
        .unwrap_or(serde_json::Value::Null);

    if let Some(inner) = data.get("json") {
        data = inner.clone();
    }

    serde_json::from_value(data).map_err(|source| RemoteError::Decode {
        procedure: procedure.to_string(),
        source,
    })
}
