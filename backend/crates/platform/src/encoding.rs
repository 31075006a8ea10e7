//! Encoding Utilities

use base64::{Engine, engine::general_purpose};

/// Error decoding an inline image payload
#[derive(Debug, thiserror::Error)]
pub enum DataUrlError {
    #[error("Data URL is missing its payload")]
    MissingPayload,
    #[error("Data URL is not base64 encoded")]
    NotBase64,
    #[error("Invalid base64 payload: {0}")]
    Decode(#[from] base64::DecodeError),
}

/// Encode bytes as base64
pub fn to_base64(bytes: &[u8]) -> String {
    general_purpose::STANDARD.encode(bytes)
}

/// Decode base64 to bytes
pub fn from_base64(s: &str) -> Result<Vec<u8>, base64::DecodeError> {
    general_purpose::STANDARD.decode(s.trim())
}

/// Decode `data:<mime>;base64,<payload>` or a bare base64 payload
pub fn decode_data_url(input: &str) -> Result<Vec<u8>, DataUrlError> {
    let input = input.trim();
    let Some(rest) = input.strip_prefix("data:") else {
        return Ok(from_base64(input)?);
    };

    let (header, payload) = rest.split_once(',').ok_or(DataUrlError::MissingPayload)?;
    if !header.split(';').any(|param| param.eq_ignore_ascii_case("base64")) {
        return Err(DataUrlError::NotBase64);
    }
    if payload.is_empty() {
        return Err(DataUrlError::MissingPayload);
    }
    Ok(from_base64(payload)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base64_roundtrip() {
        let data = b"hello world";
        let encoded = to_base64(data);
        assert_eq!(from_base64(&encoded).unwrap(), data);
    }

    #[test]
    fn test_data_url() {
        let url = format!("data:image/png;base64,{}", to_base64(b"\x89PNG"));
        assert_eq!(decode_data_url(&url).unwrap(), b"\x89PNG");
    }

    #[test]
    fn test_bare_payload() {
        assert_eq!(decode_data_url("aGk=").unwrap(), b"hi");
    }

    #[test]
    fn test_rejects_malformed() {
        assert!(matches!(
            decode_data_url("data:image/png;base64"),
            Err(DataUrlError::MissingPayload)
        ));
        assert!(matches!(
            decode_data_url("data:text/plain,hello"),
            Err(DataUrlError::NotBase64)
        ));
        assert!(matches!(
            decode_data_url("data:image/png;base64,***"),
            Err(DataUrlError::Decode(_))
        ));
    }
}
