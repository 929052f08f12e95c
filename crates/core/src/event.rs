//! Stream events and model-output cleanup.
//!
//! Each event becomes exactly one `text/event-stream` frame of the form
//! `data: <json>\n\n`, where the JSON carries either a `response` or an
//! `error` string field.

use serde::Serialize;

/// One event on the client-facing generation stream.
///
/// Serializes externally tagged so the wire payload is
/// `{"response": "..."}` for content and `{"error": "..."}` for failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum StreamEvent {
    #[serde(rename = "response")]
    Chunk(String),
    #[serde(rename = "error")]
    Error(String),
}

impl StreamEvent {
    /// JSON payload for the SSE `data:` line.
    pub fn to_frame_data(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Normalize model output before it is streamed.
///
/// Converts CRLF line endings and strips surrounding whitespace. An output
/// that is empty after cleanup produces no chunk at all.
pub fn clean_model_output(raw: &str) -> String {
    raw.replace("\r\n", "\n").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_serializes_with_response_field() {
        let event = StreamEvent::Chunk("# My Project".to_string());
        assert_eq!(event.to_frame_data(), r##"{"response":"# My Project"}"##);
    }

    #[test]
    fn test_error_serializes_with_error_field() {
        let event = StreamEvent::Error("backend unavailable".to_string());
        assert_eq!(event.to_frame_data(), r#"{"error":"backend unavailable"}"#);
    }

    #[test]
    fn test_newlines_are_escaped_in_frame_data() {
        let event = StreamEvent::Chunk("line one\nline two".to_string());
        let data = event.to_frame_data();
        // A literal newline would split the SSE frame in two.
        assert!(!data.contains('\n'));
        assert!(data.contains("\\n"));
    }

    #[test]
    fn test_clean_model_output_normalizes_crlf() {
        assert_eq!(clean_model_output("a\r\nb\r\nc"), "a\nb\nc");
    }

    #[test]
    fn test_clean_model_output_trims_whitespace() {
        assert_eq!(clean_model_output("\n\n  # Title \n\n"), "# Title");
    }

    #[test]
    fn test_clean_model_output_empty() {
        assert_eq!(clean_model_output("  \r\n  "), "");
    }
}
