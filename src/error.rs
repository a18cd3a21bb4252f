//! Error taxonomy for the ingestion layer
//!
//! Transport failures, empty playlists and malformed guides are kept apart so
//! the TV app can tell "network error" from "list is empty/invalid".

use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestError {
    /// Non-2xx response, network error or oversized payload
    #[error("Fetch failed for {url}: {reason}")]
    Fetch {
        url: String,
        reason: String,
        status: Option<u16>,
    },

    /// The parser ran but produced zero entries
    #[error("Playlist is empty or in an unrecognized format")]
    EmptyPlaylist,

    /// A programme start/stop string is not `YYYYMMDDHHMMSS [±HHMM]`
    #[error("Malformed program date: '{input}'")]
    MalformedProgramDate { input: String },

    /// The guide is not well-formed XML
    #[error("Malformed XMLTV document: {0}")]
    XmlStructure(String),

    /// Xtream JSON failed validation at the boundary
    #[error("Malformed API response for '{endpoint}': {reason}")]
    MalformedApiResponse { endpoint: String, reason: String },

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

impl IngestError {
    pub fn fetch(url: &str, reason: impl Into<String>) -> Self {
        IngestError::Fetch {
            url: url.to_string(),
            reason: reason.into(),
            status: None,
        }
    }

    /// Message shown to the viewer
    pub fn user_message(&self) -> String {
        match self {
            IngestError::Fetch {
                status: Some(404), ..
            } => "Playlist não encontrada (404). Verifique a URL.".to_string(),
            IngestError::Fetch {
                status: Some(403), ..
            } => "Acesso negado (403). A playlist pode exigir autenticação.".to_string(),
            IngestError::Fetch {
                status: Some(429), ..
            } => "Muitas requisições (429). O servidor está limitando acessos.".to_string(),
            IngestError::Fetch { reason, .. } => {
                format!("Erro de rede ao buscar a lista: {}", reason)
            }
            IngestError::EmptyPlaylist => {
                "A lista M3U está vazia ou em um formato irreconhecível.".to_string()
            }
            IngestError::MalformedProgramDate { input } => {
                format!("Data de programa inválida no EPG: {}", input)
            }
            IngestError::XmlStructure(_) => "O arquivo de EPG (XMLTV) é inválido.".to_string(),
            IngestError::MalformedApiResponse { endpoint, .. } => {
                format!("Resposta inválida do servidor ({})", endpoint)
            }
            IngestError::Http(_) => "Erro interno do cliente HTTP.".to_string(),
        }
    }

    /// Stable short code for JSON error bodies and metric labels
    pub fn kind(&self) -> &'static str {
        match self {
            IngestError::Fetch { .. } => "fetch_failure",
            IngestError::EmptyPlaylist => "empty_playlist",
            IngestError::MalformedProgramDate { .. } => "malformed_program_date",
            IngestError::XmlStructure(_) => "xml_structure",
            IngestError::MalformedApiResponse { .. } => "malformed_api_response",
            IngestError::Http(_) => "http_client",
        }
    }
}

pub type Result<T, E = IngestError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_messages_by_status() {
        let err = IngestError::Fetch {
            url: "http://example.com/list.m3u".to_string(),
            reason: "HTTP 404".to_string(),
            status: Some(404),
        };
        assert!(err.user_message().contains("404"));
        assert_eq!(err.kind(), "fetch_failure");

        let err = IngestError::fetch("http://example.com/list.m3u", "connection refused");
        assert!(err.user_message().contains("connection refused"));
    }

    #[test]
    fn test_empty_playlist_is_distinct_from_fetch() {
        let err = IngestError::EmptyPlaylist;
        assert_eq!(err.kind(), "empty_playlist");
        assert_eq!(
            err.user_message(),
            "A lista M3U está vazia ou em um formato irreconhecível."
        );
    }
}
