use axum::{http::StatusCode, Json};

use crate::error::IngestError;

pub mod epg;
pub mod health;
pub mod playlist;
pub mod xtream;

/// Error half of every fallible handler
pub type ApiError = (StatusCode, Json<serde_json::Value>);

pub(crate) fn status_for(err: &IngestError) -> StatusCode {
    match err {
        IngestError::Fetch { .. } | IngestError::MalformedApiResponse { .. } => {
            StatusCode::BAD_GATEWAY
        }
        IngestError::EmptyPlaylist
        | IngestError::XmlStructure(_)
        | IngestError::MalformedProgramDate { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        IngestError::Http(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub(crate) fn error_response(err: &IngestError) -> ApiError {
    (
        status_for(err),
        Json(serde_json::json!({
            "error": err.user_message(),
            "kind": err.kind(),
            "details": err.to_string(),
        })),
    )
}

pub(crate) fn bad_request(message: &str) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({ "error": message })),
    )
}

pub(crate) fn not_found(message: &str) -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({ "error": message })),
    )
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_for(&IngestError::EmptyPlaylist), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            status_for(&IngestError::XmlStructure("unclosed tv".to_string())),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_for(&IngestError::fetch("http://h/x", "timeout")),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_for(&IngestError::MalformedApiResponse {
                endpoint: "get_series".to_string(),
                reason: "not a list".to_string(),
            }),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_error_body() {
        let (status, Json(body)) = error_response(&IngestError::EmptyPlaylist);
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["kind"], "empty_playlist");
        assert_eq!(
            body["error"],
            "A lista M3U está vazia ou em um formato irreconhecível."
        );
    }
}
