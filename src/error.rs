//! Unified error type for the client core.
//!
//! Transport layers keep their own small error enums
//! ([`crate::traits::HttpError`], [`crate::websocket::WsError`]); this type
//! consolidates them at the API boundary. No failure is allowed to
//! propagate as a panic across frame processing.

use thiserror::Error;

use crate::traits::HttpError;
use crate::websocket::WsError;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("http transport: {0}")]
    Http(#[from] HttpError),
    #[error("stream socket: {0}")]
    Ws(#[from] WsError),
    #[error("decoding response: {0}")]
    Decode(#[from] serde_json::Error),
}

pub type ClientResult<T> = Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_errors_convert() {
        let err: ClientError = HttpError::Timeout("30s".to_string()).into();
        assert!(matches!(err, ClientError::Http(_)));
        assert_eq!(err.to_string(), "http transport: Request timeout: 30s");

        let err: ClientError = WsError::ParseError("bad".to_string()).into();
        assert!(matches!(err, ClientError::Ws(_)));
    }

    #[test]
    fn test_decode_errors_convert() {
        let parse_err = serde_json::from_str::<serde_json::Value>("nope").unwrap_err();
        let err: ClientError = parse_err.into();
        assert!(err.to_string().starts_with("decoding response:"));
    }
}
