//! Decoding of the remote processor's JSON replies.
//!
//! The endpoint has no schema; every reply is `{status, message?}`. Unknown
//! status strings are errors, never silently ignored.

use portal_core::JobStatus;
use serde::Deserialize;

use crate::types::{ClientError, FailureKind};

const DEFAULT_SUBMIT_ERROR: &str = "The server returned an error.";
const DEFAULT_JOB_ERROR: &str = "The server reported a processing error.";

#[derive(Debug, Deserialize)]
struct Reply {
    status: String,
    #[serde(default)]
    message: Option<String>,
}

/// Answer to a job submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitAck {
    Started,
    Error { message: String },
}

pub fn decode_submit_ack(body: &[u8]) -> Result<SubmitAck, ClientError> {
    let reply = parse(body)?;
    match reply.status.as_str() {
        "processing_started" => Ok(SubmitAck::Started),
        "error" => Ok(SubmitAck::Error {
            message: non_blank(reply.message).unwrap_or_else(|| DEFAULT_SUBMIT_ERROR.to_string()),
        }),
        _ => Err(unexpected_status(reply.status)),
    }
}

pub fn decode_job_status(body: &[u8]) -> Result<JobStatus, ClientError> {
    let reply = parse(body)?;
    match reply.status.as_str() {
        "idle" => Ok(JobStatus::Idle),
        "processing" => Ok(JobStatus::Processing),
        "error" => Ok(JobStatus::Error {
            message: non_blank(reply.message).unwrap_or_else(|| DEFAULT_JOB_ERROR.to_string()),
        }),
        _ => Err(unexpected_status(reply.status)),
    }
}

/// True for `application/json`, with or without parameters.
pub fn is_json_content_type(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .map(str::trim)
        .is_some_and(|essence| essence.eq_ignore_ascii_case("application/json"))
}

fn parse(body: &[u8]) -> Result<Reply, ClientError> {
    serde_json::from_slice(body).map_err(|err| {
        ClientError::new(
            FailureKind::Decode,
            format!("Received malformed response from server: {err}"),
        )
    })
}

fn unexpected_status(status: String) -> ClientError {
    let message = format!("Received unexpected status: {status}");
    ClientError::new(FailureKind::UnexpectedStatus { status }, message)
}

fn non_blank(message: Option<String>) -> Option<String> {
    message.filter(|m| !m.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submit_ack_variants() {
        assert_eq!(
            decode_submit_ack(br#"{"status":"processing_started"}"#).unwrap(),
            SubmitAck::Started
        );
        assert_eq!(
            decode_submit_ack(br#"{"status":"error","message":"Folder exists"}"#).unwrap(),
            SubmitAck::Error {
                message: "Folder exists".to_string()
            }
        );
        assert_eq!(
            decode_submit_ack(br#"{"status":"error","message":"  "}"#).unwrap(),
            SubmitAck::Error {
                message: DEFAULT_SUBMIT_ERROR.to_string()
            }
        );
    }

    #[test]
    fn unknown_status_fails_closed() {
        let err = decode_job_status(br#"{"status":"paused"}"#).unwrap_err();
        assert_eq!(
            err.kind,
            FailureKind::UnexpectedStatus {
                status: "paused".to_string()
            }
        );
        assert!(err.kind.is_terminal_for_watch());

        let err = decode_submit_ack(br#"{"status":"idle"}"#).unwrap_err();
        assert_eq!(err.message, "Received unexpected status: idle");
    }

    #[test]
    fn missing_status_is_a_decode_error() {
        let err = decode_job_status(br#"{"message":"hi"}"#).unwrap_err();
        assert_eq!(err.kind, FailureKind::Decode);
        let err = decode_job_status(b"<html>").unwrap_err();
        assert_eq!(err.kind, FailureKind::Decode);
        assert!(!err.kind.is_terminal_for_watch());
    }

    #[test]
    fn job_status_variants() {
        assert_eq!(decode_job_status(br#"{"status":"idle"}"#).unwrap(), JobStatus::Idle);
        assert_eq!(
            decode_job_status(br#"{"status":"processing","message":null}"#).unwrap(),
            JobStatus::Processing
        );
        assert_eq!(
            decode_job_status(br#"{"status":"error","message":"Drive full"}"#).unwrap(),
            JobStatus::Error {
                message: "Drive full".to_string()
            }
        );
    }

    #[test]
    fn json_content_type_matching() {
        assert!(is_json_content_type("application/json"));
        assert!(is_json_content_type("application/json; charset=utf-8"));
        assert!(is_json_content_type("Application/JSON"));
        assert!(!is_json_content_type("text/html; charset=utf-8"));
        assert!(!is_json_content_type("application/jsonp"));
    }
}
