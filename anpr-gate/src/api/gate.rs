//! Entry and exit logging endpoints
//!
//! Both endpoints accept a multipart photo upload, run plate
//! recognition, and record the event. Business outcomes (rejected
//! entry, unauthorized exit, no plate found) are 200 responses with a
//! `result` discriminant; only protocol, store, and backend failures
//! map to error statuses.

use axum::{
    extract::{Multipart, State},
    routing::post,
    Json, Router,
};
use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use std::path::Path;

use anpr_common::events::{EntryEvent, ExitEvent};
use anpr_common::time::format_ist;
use anpr_common::PlateKey;

use crate::error::{ApiError, ApiResult};
use crate::services::recognition;
use crate::workflow;
use crate::workflow::entry::EntryOutcome;
use crate::AppState;

/// Upload types the recognition backend accepts
const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "pdf"];

/// A validated photo upload
struct Upload {
    file_name: String,
    bytes: Vec<u8>,
}

/// Whether a file name carries an accepted extension
fn has_allowed_extension(file_name: &str) -> bool {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .map(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

/// Pull the `file` field out of a multipart request
async fn read_upload(multipart: &mut Multipart) -> ApiResult<Upload> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Malformed multipart request: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().unwrap_or("upload").to_string();
        if !has_allowed_extension(&file_name) {
            return Err(ApiError::BadRequest(format!(
                "Unsupported file type: {:?}. Allowed: {}",
                file_name,
                ALLOWED_EXTENSIONS.join(", ")
            )));
        }

        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Failed to read upload: {}", e)))?
            .to_vec();
        if bytes.is_empty() {
            return Err(ApiError::BadRequest("Uploaded file is empty".to_string()));
        }

        return Ok(Upload { file_name, bytes });
    }

    Err(ApiError::BadRequest(
        "Missing 'file' field in multipart upload".to_string(),
    ))
}

/// Response for POST /api/entry
#[derive(Debug, Serialize)]
pub struct EntryLogResponse {
    /// One of "logged", "rejected", "no_plate"
    pub result: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plate_key: Option<PlateKey>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<FixedOffset>>,
    pub message: String,
}

impl EntryLogResponse {
    fn logged(event: &EntryEvent) -> Self {
        Self {
            result: "logged".to_string(),
            message: format!(
                "Entry Logged: {} at {} IST",
                event.plate_key,
                format_ist(&event.timestamp)
            ),
            plate_key: Some(event.plate_key.clone()),
            raw_text: Some(event.raw_plate.clone()),
            timestamp: Some(event.timestamp),
        }
    }

    fn rejected(plate_key: PlateKey, raw_text: String) -> Self {
        Self {
            result: "rejected".to_string(),
            message: format!(
                "Cannot record entry: Vehicle {} has not exited yet!",
                plate_key
            ),
            plate_key: Some(plate_key),
            raw_text: Some(raw_text),
            timestamp: None,
        }
    }

    fn no_plate() -> Self {
        Self {
            result: "no_plate".to_string(),
            message: "No license plate detected.".to_string(),
            plate_key: None,
            raw_text: None,
            timestamp: None,
        }
    }
}

/// Response for POST /api/exit
#[derive(Debug, Serialize)]
pub struct ExitLogResponse {
    /// One of "authorized", "unauthorized", "no_plate"
    pub result: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plate_key: Option<PlateKey>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<FixedOffset>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorized: Option<bool>,
    pub message: String,
}

impl ExitLogResponse {
    fn recorded(event: &ExitEvent) -> Self {
        let verdict = if event.authorized {
            "AUTHORIZED"
        } else {
            "UNAUTHORIZED"
        };
        Self {
            result: if event.authorized {
                "authorized".to_string()
            } else {
                "unauthorized".to_string()
            },
            message: format!(
                "{} EXIT for {}. Exit logged at {} IST.",
                verdict,
                event.plate_key,
                format_ist(&event.timestamp)
            ),
            plate_key: Some(event.plate_key.clone()),
            raw_text: Some(event.raw_plate.clone()),
            timestamp: Some(event.timestamp),
            authorized: Some(event.authorized),
        }
    }

    fn no_plate() -> Self {
        Self {
            result: "no_plate".to_string(),
            message: "No license plate detected.".to_string(),
            plate_key: None,
            raw_text: None,
            timestamp: None,
            authorized: None,
        }
    }
}

/// POST /api/entry
///
/// Photo upload at the entry gate. Recognizes the plate, then records
/// an entry unless the vehicle is already inside.
pub async fn log_entry(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<EntryLogResponse>> {
    let upload = read_upload(&mut multipart).await?;

    let raw_text =
        recognition::recognize_upload(state.recognizer.as_ref(), &upload.file_name, &upload.bytes)
            .await?;
    let Some(raw_text) = raw_text else {
        return Ok(Json(EntryLogResponse::no_plate()));
    };
    let Some(plate_key) = PlateKey::normalize(&raw_text) else {
        return Ok(Json(EntryLogResponse::no_plate()));
    };

    match workflow::entry::record_entry(&state.db, plate_key, raw_text.clone()).await? {
        EntryOutcome::Logged { event } => Ok(Json(EntryLogResponse::logged(&event))),
        EntryOutcome::StillInside { plate_key, .. } => {
            Ok(Json(EntryLogResponse::rejected(plate_key, raw_text)))
        }
    }
}

/// POST /api/exit
///
/// Photo upload at the exit gate. Recognizes the plate and records the
/// exit, flagging it when no matching entry exists.
pub async fn log_exit(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<ExitLogResponse>> {
    let upload = read_upload(&mut multipart).await?;

    let raw_text =
        recognition::recognize_upload(state.recognizer.as_ref(), &upload.file_name, &upload.bytes)
            .await?;
    let Some(raw_text) = raw_text else {
        return Ok(Json(ExitLogResponse::no_plate()));
    };
    let Some(plate_key) = PlateKey::normalize(&raw_text) else {
        return Ok(Json(ExitLogResponse::no_plate()));
    };

    let event = workflow::exit::record_exit(&state.db, plate_key, raw_text).await?;
    Ok(Json(ExitLogResponse::recorded(&event)))
}

/// Build gate logging routes
pub fn gate_routes() -> Router<AppState> {
    Router::new()
        .route("/api/entry", post(log_entry))
        .route("/api/exit", post(log_exit))
}
