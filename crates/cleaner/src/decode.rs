//! Ticket record decoding.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use thiserror::Error;

use omtools_core::Ticket;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("failed to unmarshal ticket: {0}")]
    Json(#[from] serde_json::Error),
}

/// Decode a stored ticket record.
///
/// Records are JSON. Some stores (in-memory test servers in particular) hand
/// values back base64-encoded, so a payload that decodes as base64 is
/// unwrapped first.
pub fn decode_ticket(data: &[u8]) -> Result<Ticket, DecodeError> {
    let unwrapped = STANDARD.decode(data).ok();
    let bytes = unwrapped.as_deref().unwrap_or(data);
    Ok(serde_json::from_slice(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RECORD: &str = r#"{"id":"t1","create_time":"2024-01-01T00:00:00Z"}"#;

    #[test]
    fn test_decode_plain_json() {
        let ticket = decode_ticket(RECORD.as_bytes()).unwrap();
        assert_eq!(ticket.id, "t1");
        assert_eq!(
            ticket.create_time.unwrap().to_rfc3339(),
            "2024-01-01T00:00:00+00:00"
        );
    }

    #[test]
    fn test_decode_base64_wrapped() {
        let wrapped = STANDARD.encode(RECORD);
        let ticket = decode_ticket(wrapped.as_bytes()).unwrap();
        assert_eq!(ticket.id, "t1");
    }

    #[test]
    fn test_decode_without_create_time() {
        let ticket = decode_ticket(br#"{"id":"t2"}"#).unwrap();
        assert_eq!(ticket.id, "t2");
        assert!(ticket.create_time.is_none());
    }

    #[test]
    fn test_decode_garbage_fails() {
        let err = decode_ticket(b"not a ticket").unwrap_err();
        assert!(err.to_string().starts_with("failed to unmarshal ticket"));
    }
}
