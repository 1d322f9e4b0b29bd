use std::time::Duration;

use askdesk_core::{JobId, JobStatus};
use desk_logging::{desk_debug, desk_warn};
use futures_util::StreamExt;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::StatusCode;
use serde_json::{Map, Value};
use url::Url;

use crate::{BackendError, FailureKind, StatusReport, SubmitReply};

/// Segment of `status_path` replaced by the job id.
pub const JOB_ID_PLACEHOLDER: &str = "{job_id}";

/// Fields a rejected submission may carry a human-readable reason in.
const DETAIL_FIELDS: [&str; 3] = ["detail", "error", "message"];

#[derive(Debug, Clone)]
pub struct BackendSettings {
    pub base_url: String,
    pub submit_path: String,
    /// Must contain [`JOB_ID_PLACEHOLDER`]; otherwise the id is appended.
    pub status_path: String,
    /// JSON field the query text is sent in.
    pub query_field: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub max_bytes: u64,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            submit_path: "query".to_string(),
            status_path: format!("status/{JOB_ID_PLACEHOLDER}"),
            query_field: "query".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            max_bytes: 2 * 1024 * 1024,
        }
    }
}

/// The answering service as seen by the submitter and the poller.
#[async_trait::async_trait]
pub trait Backend: Send + Sync {
    async fn submit(&self, query: &str) -> Result<SubmitReply, BackendError>;

    async fn status(&self, job_id: &JobId) -> Result<StatusReport, BackendError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestBackend {
    settings: BackendSettings,
    base: Url,
    client: reqwest::Client,
}

impl ReqwestBackend {
    pub fn new(settings: BackendSettings) -> Result<Self, BackendError> {
        let base = Url::parse(&settings.base_url)
            .map_err(|err| BackendError::new(FailureKind::InvalidUrl, err.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(BackendError::new(
                FailureKind::InvalidUrl,
                format!("{base} cannot be used as a base url"),
            ));
        }
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| BackendError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self {
            settings,
            base,
            client,
        })
    }

    pub fn settings(&self) -> &BackendSettings {
        &self.settings
    }

    /// Joins `path` onto the base url, one percent-encoded segment at a time.
    fn endpoint(&self, path: &str, job_id: Option<&JobId>) -> Result<Url, BackendError> {
        let mut url = self.base.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                BackendError::new(FailureKind::InvalidUrl, "base url cannot have a path")
            })?;
            segments.pop_if_empty();
            let mut placed = false;
            for part in path.split('/').filter(|part| !part.is_empty()) {
                match job_id {
                    Some(job_id) if part == JOB_ID_PLACEHOLDER => {
                        segments.push(job_id.as_str());
                        placed = true;
                    }
                    _ => {
                        segments.push(part);
                    }
                }
            }
            if let (Some(job_id), false) = (job_id, placed) {
                segments.push(job_id.as_str());
            }
        }
        Ok(url)
    }

    async fn read_body(&self, response: reqwest::Response) -> Result<Vec<u8>, BackendError> {
        let max_bytes = self.settings.max_bytes;
        if let Some(content_len) = response.content_length() {
            if content_len > max_bytes {
                return Err(BackendError::new(
                    FailureKind::TooLarge {
                        max_bytes,
                        actual: Some(content_len),
                    },
                    "response too large",
                ));
            }
        }

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = bytes.len() as u64 + chunk.len() as u64;
            if next_len > max_bytes {
                return Err(BackendError::new(
                    FailureKind::TooLarge {
                        max_bytes,
                        actual: Some(next_len),
                    },
                    "response too large",
                ));
            }
            bytes.extend_from_slice(&chunk);
        }
        Ok(bytes)
    }
}

#[async_trait::async_trait]
impl Backend for ReqwestBackend {
    async fn submit(&self, query: &str) -> Result<SubmitReply, BackendError> {
        let url = self.endpoint(&self.settings.submit_path, None)?;
        let mut body = Map::new();
        body.insert(
            self.settings.query_field.clone(),
            Value::String(query.to_string()),
        );
        let body = serde_json::to_vec(&Value::Object(body))
            .map_err(|err| BackendError::new(FailureKind::MalformedBody, err.to_string()))?;

        desk_debug!("Submitting query to {} ({} chars)", url, query.len());
        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .body(body)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if status == StatusCode::ACCEPTED {
            let bytes = self.read_body(response).await?;
            let job_id = parse_json(&bytes).as_ref().and_then(extract_job_id);
            return job_id.map(SubmitReply::Accepted).ok_or_else(|| {
                BackendError::new(FailureKind::MalformedBody, "accepted reply without a job id")
            });
        }
        if status.is_success() {
            let bytes = self.read_body(response).await?;
            return parse_json(&bytes).map(SubmitReply::Answered).ok_or_else(|| {
                BackendError::new(FailureKind::MalformedBody, "answer body is not valid JSON")
            });
        }

        // The body is only a source of detail here; failing to read it is not fatal.
        let detail = match self.read_body(response).await {
            Ok(bytes) => parse_json(&bytes).as_ref().and_then(extract_detail),
            Err(err) => {
                desk_warn!("Could not read rejection body: {}", err);
                None
            }
        };
        Err(BackendError::new(
            FailureKind::HttpStatus {
                status: status.as_u16(),
                detail,
            },
            status.to_string(),
        ))
    }

    async fn status(&self, job_id: &JobId) -> Result<StatusReport, BackendError> {
        let url = self.endpoint(&self.settings.status_path, Some(job_id))?;
        let response = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::new(
                FailureKind::HttpStatus {
                    status: status.as_u16(),
                    detail: None,
                },
                status.to_string(),
            ));
        }

        let bytes = self.read_body(response).await?;
        let body = parse_json(&bytes).ok_or_else(|| {
            BackendError::new(FailureKind::MalformedBody, "status body is not valid JSON")
        })?;
        parse_status_report(&body)
    }
}

fn parse_json(bytes: &[u8]) -> Option<Value> {
    serde_json::from_slice(bytes).ok()
}

fn extract_job_id(body: &Value) -> Option<JobId> {
    ["jobId", "job_id"]
        .iter()
        .find_map(|field| match body.get(*field)? {
            Value::String(id) if !id.trim().is_empty() => Some(JobId::new(id.trim())),
            Value::Number(id) => Some(JobId::new(id.to_string())),
            _ => None,
        })
}

fn extract_detail(body: &Value) -> Option<String> {
    DETAIL_FIELDS
        .iter()
        .find_map(|field| body.get(*field).and_then(Value::as_str))
        .map(ToOwned::to_owned)
}

fn parse_status_report(body: &Value) -> Result<StatusReport, BackendError> {
    let raw = body.get("status").and_then(Value::as_str).ok_or_else(|| {
        BackendError::new(FailureKind::MalformedBody, "status reply without a status")
    })?;
    let status = JobStatus::from_wire(raw).ok_or_else(|| {
        BackendError::new(
            FailureKind::MalformedBody,
            format!("unknown job status {raw:?}"),
        )
    })?;
    let response = body.get("response").filter(|value| !value.is_null()).cloned();
    Ok(StatusReport {
        status,
        response,
        error: extract_detail(body),
    })
}

fn map_reqwest_error(err: reqwest::Error) -> BackendError {
    if err.is_timeout() {
        return BackendError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_decode() || err.is_body() {
        return BackendError::new(FailureKind::MalformedBody, err.to_string());
    }
    BackendError::new(FailureKind::Network, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::{extract_job_id, parse_status_report, BackendSettings, ReqwestBackend};
    use crate::FailureKind;
    use askdesk_core::{JobId, JobStatus};
    use serde_json::json;

    fn backend(base_url: &str) -> ReqwestBackend {
        ReqwestBackend::new(BackendSettings {
            base_url: base_url.to_string(),
            ..BackendSettings::default()
        })
        .unwrap()
    }

    #[test]
    fn endpoint_substitutes_and_encodes_job_id() {
        let backend = backend("http://localhost:9000/api/");
        let url = backend
            .endpoint("status/{job_id}", Some(&JobId::new("a b/c")))
            .unwrap();
        assert_eq!(url.as_str(), "http://localhost:9000/api/status/a%20b%2Fc");
    }

    #[test]
    fn endpoint_appends_job_id_without_placeholder() {
        let backend = backend("http://localhost:9000/api");
        let url = backend.endpoint("jobs", Some(&JobId::new("7"))).unwrap();
        assert_eq!(url.as_str(), "http://localhost:9000/api/jobs/7");
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let err = ReqwestBackend::new(BackendSettings {
            base_url: "not a url".into(),
            ..BackendSettings::default()
        })
        .unwrap_err();
        assert_eq!(err.kind, FailureKind::InvalidUrl);
    }

    #[test]
    fn job_id_accepts_both_spellings_and_numbers() {
        assert_eq!(extract_job_id(&json!({ "jobId": "x1" })), Some(JobId::new("x1")));
        assert_eq!(extract_job_id(&json!({ "job_id": 42 })), Some(JobId::new("42")));
        assert_eq!(extract_job_id(&json!({ "jobId": "  " })), None);
    }

    #[test]
    fn status_report_requires_known_status() {
        let report = parse_status_report(&json!({ "status": "COMPLETE", "response": "hi" })).unwrap();
        assert_eq!(report.status, JobStatus::Complete);
        assert_eq!(report.response, Some(json!("hi")));

        let pending = parse_status_report(&json!({ "status": "pending", "response": null })).unwrap();
        assert_eq!(pending.response, None);

        let err = parse_status_report(&json!({ "status": "SLEEPING" })).unwrap_err();
        assert_eq!(err.kind, FailureKind::MalformedBody);
    }
}
