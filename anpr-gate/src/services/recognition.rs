//! License plate recognition via the Mindee inference API
//!
//! Uploads an image to Mindee, polls the resulting job until the
//! inference completes, and extracts the `license_plate_number` field
//! from the result document.

use std::io::Write;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

const MINDEE_BASE_URL: &str = "https://api-v2.mindee.net/v2";
const USER_AGENT: &str = "anpr-gate/0.1.0";
const REQUEST_TIMEOUT_SECS: u64 = 30;
const POLL_INTERVAL_MS: u64 = 1500;
const MAX_POLL_ATTEMPTS: u32 = 20;

/// JSON pointer to the plate value inside a Mindee inference document
const PLATE_VALUE_POINTER: &str = "/inference/result/fields/license_plate_number/value";

/// Recognition backend errors
#[derive(Debug, Error)]
pub enum RecognitionError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Invalid API key")]
    InvalidApiKey,

    #[error("Inference job failed: {0}")]
    JobFailed(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Recognition timed out after {0} polls")]
    Timeout(u32),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Abstraction over the plate recognition backend
///
/// Handlers depend on this trait so tests can substitute a scripted
/// recognizer instead of calling out to Mindee.
#[async_trait]
pub trait PlateRecognizer: Send + Sync {
    /// Backend name for logging
    fn name(&self) -> &str;

    /// Recognize the plate in the image at `path`
    ///
    /// Returns `Ok(None)` when the backend completed but found no plate.
    async fn recognize_path(&self, path: &Path) -> Result<Option<String>, RecognitionError>;
}

/// Write an uploaded image to a temp file and run recognition on it
///
/// The temp file lives only for the duration of the call. `NamedTempFile`
/// deletes it on drop, including on the error paths.
pub async fn recognize_upload(
    recognizer: &dyn PlateRecognizer,
    file_name: &str,
    bytes: &[u8],
) -> Result<Option<String>, RecognitionError> {
    let suffix = Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext))
        .unwrap_or_default();

    let mut temp = tempfile::Builder::new()
        .prefix("anpr-upload-")
        .suffix(&suffix)
        .tempfile()?;
    temp.write_all(bytes)?;
    temp.flush()?;

    tracing::debug!(
        backend = recognizer.name(),
        file_name = file_name,
        bytes = bytes.len(),
        "Running plate recognition on upload"
    );

    recognizer.recognize_path(temp.path()).await
}

/// Mindee job envelope returned by enqueue and poll requests
#[derive(Debug, Deserialize)]
struct JobResponse {
    job: JobInfo,
}

#[derive(Debug, Deserialize)]
struct JobInfo {
    id: String,
    status: String,
    #[serde(default)]
    polling_url: Option<String>,
    #[serde(default)]
    result_url: Option<String>,
    #[serde(default)]
    error: Option<JobError>,
}

#[derive(Debug, Deserialize)]
struct JobError {
    #[serde(default)]
    detail: Option<String>,
}

/// Mindee inference API client
pub struct MindeeClient {
    http_client: reqwest::Client,
    api_key: String,
    model_id: String,
}

impl MindeeClient {
    pub fn new(api_key: String, model_id: String) -> Result<Self, RecognitionError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| RecognitionError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            api_key,
            model_id,
        })
    }

    /// Enqueue an inference job for the image at `path`
    async fn enqueue(&self, path: &Path) -> Result<JobInfo, RecognitionError> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("upload")
            .to_string();

        let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name);
        let form = reqwest::multipart::Form::new()
            .text("model_id", self.model_id.clone())
            .part("file", part);

        tracing::debug!(model_id = %self.model_id, "Enqueueing Mindee inference");

        let response = self
            .http_client
            .post(format!("{}/inferences/enqueue", MINDEE_BASE_URL))
            .header("Authorization", self.api_key.as_str())
            .multipart(form)
            .send()
            .await
            .map_err(|e| RecognitionError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(status_error(status.as_u16(), error_text));
        }

        let enqueued: JobResponse = response
            .json()
            .await
            .map_err(|e| RecognitionError::Parse(e.to_string()))?;
        Ok(enqueued.job)
    }

    /// Poll the job until it leaves the Processing state
    async fn wait_for_job(&self, job: JobInfo) -> Result<JobInfo, RecognitionError> {
        let poll_url = job
            .polling_url
            .clone()
            .unwrap_or_else(|| format!("{}/jobs/{}", MINDEE_BASE_URL, job.id));

        let mut current = job;
        let mut attempts = 0;
        loop {
            match current.status.as_str() {
                "Processed" => return Ok(current),
                "Failed" => {
                    let detail = current
                        .error
                        .and_then(|e| e.detail)
                        .unwrap_or_else(|| "no failure detail given".to_string());
                    return Err(RecognitionError::JobFailed(detail));
                }
                _ => {}
            }

            if attempts >= MAX_POLL_ATTEMPTS {
                return Err(RecognitionError::Timeout(attempts));
            }
            attempts += 1;

            tokio::time::sleep(Duration::from_millis(POLL_INTERVAL_MS)).await;

            let response = self
                .http_client
                .get(&poll_url)
                .header("Authorization", self.api_key.as_str())
                .send()
                .await
                .map_err(|e| RecognitionError::Network(e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                let error_text = response.text().await.unwrap_or_default();
                return Err(status_error(status.as_u16(), error_text));
            }

            let polled: JobResponse = response
                .json()
                .await
                .map_err(|e| RecognitionError::Parse(e.to_string()))?;
            current = polled.job;
        }
    }

    /// Fetch the inference result document for a processed job
    async fn fetch_result(&self, job: &JobInfo) -> Result<serde_json::Value, RecognitionError> {
        let result_url = job
            .result_url
            .clone()
            .unwrap_or_else(|| format!("{}/inferences/{}", MINDEE_BASE_URL, job.id));

        let response = self
            .http_client
            .get(&result_url)
            .header("Authorization", self.api_key.as_str())
            .send()
            .await
            .map_err(|e| RecognitionError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(status_error(status.as_u16(), error_text));
        }

        let body = response
            .text()
            .await
            .map_err(|e| RecognitionError::Network(e.to_string()))?;
        parse_inference_document(&body)
    }
}

#[async_trait]
impl PlateRecognizer for MindeeClient {
    fn name(&self) -> &str {
        "mindee"
    }

    async fn recognize_path(&self, path: &Path) -> Result<Option<String>, RecognitionError> {
        let job = self.enqueue(path).await?;
        let job = self.wait_for_job(job).await?;
        let document = self.fetch_result(&job).await?;
        let plate = extract_plate_value(&document);

        match &plate {
            Some(value) => tracing::info!(job_id = %job.id, plate = %value, "Plate recognized"),
            None => tracing::info!(job_id = %job.id, "No plate found in inference result"),
        }

        Ok(plate)
    }
}

/// Parse an inference result body into a JSON document
///
/// Some gateways return the document double-encoded as a JSON string;
/// unwrap that case before use.
fn parse_inference_document(body: &str) -> Result<serde_json::Value, RecognitionError> {
    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|e| RecognitionError::Parse(e.to_string()))?;

    if let serde_json::Value::String(inner) = &value {
        return serde_json::from_str(inner).map_err(|e| RecognitionError::Parse(e.to_string()));
    }

    Ok(value)
}

/// Extract the plate text from an inference document
///
/// Returns `None` when the field is absent or null.
fn extract_plate_value(document: &serde_json::Value) -> Option<String> {
    document
        .pointer(PLATE_VALUE_POINTER)
        .and_then(|value| value.as_str())
        .map(|s| s.to_string())
}

/// Map a non-success HTTP status to a recognition error
///
/// Every backend call classifies failures the same way: auth rejections
/// surface as a credential problem, anything else carries the status and
/// body through.
fn status_error(status: u16, body: String) -> RecognitionError {
    match status {
        401 | 403 => RecognitionError::InvalidApiKey,
        _ => RecognitionError::Api(status, body),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn inference_body(value: serde_json::Value) -> String {
        json!({
            "inference": {
                "result": {
                    "fields": {
                        "license_plate_number": { "value": value }
                    }
                }
            }
        })
        .to_string()
    }

    #[test]
    fn test_client_creation() {
        let client = MindeeClient::new("test_key".to_string(), "model-123".to_string());
        assert!(client.is_ok());
    }

    #[test]
    fn test_extract_plate_value() {
        let document = parse_inference_document(&inference_body(json!("OD02AB1234"))).unwrap();
        assert_eq!(extract_plate_value(&document), Some("OD02AB1234".to_string()));
    }

    #[test]
    fn test_extract_null_plate_value() {
        let document = parse_inference_document(&inference_body(json!(null))).unwrap();
        assert_eq!(extract_plate_value(&document), None);
    }

    #[test]
    fn test_extract_missing_field() {
        let document = parse_inference_document(r#"{"inference":{"result":{"fields":{}}}}"#).unwrap();
        assert_eq!(extract_plate_value(&document), None);
    }

    #[test]
    fn test_double_encoded_document() {
        let inner = inference_body(json!("KA01AB1234"));
        let body = serde_json::to_string(&inner).unwrap();
        let document = parse_inference_document(&body).unwrap();
        assert_eq!(extract_plate_value(&document), Some("KA01AB1234".to_string()));
    }

    #[test]
    fn test_invalid_document_is_parse_error() {
        let err = parse_inference_document("not json").unwrap_err();
        assert!(matches!(err, RecognitionError::Parse(_)));
    }

    #[test]
    fn test_auth_statuses_map_to_invalid_key() {
        assert!(matches!(
            status_error(401, String::new()),
            RecognitionError::InvalidApiKey
        ));
        assert!(matches!(
            status_error(403, "forbidden".to_string()),
            RecognitionError::InvalidApiKey
        ));
    }

    #[test]
    fn test_other_statuses_carry_code_and_body() {
        match status_error(500, "upstream exploded".to_string()) {
            RecognitionError::Api(code, body) => {
                assert_eq!(code, 500);
                assert_eq!(body, "upstream exploded");
            }
            other => panic!("expected Api, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_failed_job_carries_backend_detail() {
        let client = MindeeClient::new("key".to_string(), "model".to_string()).unwrap();
        let job = JobInfo {
            id: "job-9".to_string(),
            status: "Failed".to_string(),
            polling_url: None,
            result_url: None,
            error: Some(JobError {
                detail: Some("document unreadable".to_string()),
            }),
        };

        let err = client.wait_for_job(job).await.unwrap_err();
        match err {
            RecognitionError::JobFailed(detail) => assert_eq!(detail, "document unreadable"),
            other => panic!("expected JobFailed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_processed_job_needs_no_polling() {
        let client = MindeeClient::new("key".to_string(), "model".to_string()).unwrap();
        let job = JobInfo {
            id: "job-3".to_string(),
            status: "Processed".to_string(),
            polling_url: None,
            result_url: None,
            error: None,
        };

        let done = client.wait_for_job(job).await.unwrap();
        assert_eq!(done.id, "job-3");
        assert_eq!(done.status, "Processed");
    }

    #[test]
    fn test_job_response_deserialization() {
        let body = r#"{
            "job": {
                "id": "job-1",
                "status": "Processing",
                "polling_url": "https://api-v2.mindee.net/v2/jobs/job-1"
            }
        }"#;
        let parsed: JobResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.job.id, "job-1");
        assert_eq!(parsed.job.status, "Processing");
        assert!(parsed.job.result_url.is_none());
    }

    struct EchoRecognizer;

    #[async_trait]
    impl PlateRecognizer for EchoRecognizer {
        fn name(&self) -> &str {
            "echo"
        }

        async fn recognize_path(&self, path: &Path) -> Result<Option<String>, RecognitionError> {
            // Report back what landed on disk so the test can verify the write.
            let bytes = tokio::fs::read(path).await?;
            Ok(Some(String::from_utf8_lossy(&bytes).to_string()))
        }
    }

    #[tokio::test]
    async fn test_recognize_upload_writes_temp_file() {
        let result = recognize_upload(&EchoRecognizer, "plate.jpg", b"fake image bytes")
            .await
            .unwrap();
        assert_eq!(result, Some("fake image bytes".to_string()));
    }

    struct PathCapture {
        seen: std::sync::Mutex<Option<std::path::PathBuf>>,
    }

    #[async_trait]
    impl PlateRecognizer for PathCapture {
        fn name(&self) -> &str {
            "capture"
        }

        async fn recognize_path(&self, path: &Path) -> Result<Option<String>, RecognitionError> {
            *self.seen.lock().unwrap() = Some(path.to_path_buf());
            Ok(None)
        }
    }

    #[tokio::test]
    async fn test_upload_temp_file_removed_after_recognition() {
        let capture = PathCapture {
            seen: std::sync::Mutex::new(None),
        };
        recognize_upload(&capture, "gate.png", b"bytes").await.unwrap();

        let seen = capture.seen.lock().unwrap().clone().unwrap();
        assert_eq!(seen.extension().and_then(|e| e.to_str()), Some("png"));
        assert!(!seen.exists(), "temp upload should be deleted after use");
    }
}
