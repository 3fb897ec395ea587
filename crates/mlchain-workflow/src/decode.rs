//! Typed decoders for chaincode payloads.
//!
//! Chaincode functions return raw bytes: integers as decimal text, strings
//! as UTF-8, records as JSON. A payload that does not decode is a
//! [`WorkflowError::Decode`], never a silently coerced value.

use serde::de::DeserializeOwned;

use crate::error::WorkflowError;

/// Decode a non-negative integer such as a balance or total supply.
pub fn amount(function: &str, payload: &[u8]) -> Result<u64, WorkflowError> {
    let raw = text(function, payload)?;
    raw.trim().parse::<u64>().map_err(|e| WorkflowError::Decode {
        function: function.to_string(),
        message: format!("expected a non-negative integer, got {raw:?}: {e}"),
    })
}

/// Decode UTF-8 text.
pub fn text(function: &str, payload: &[u8]) -> Result<String, WorkflowError> {
    String::from_utf8(payload.to_vec()).map_err(|e| WorkflowError::Decode {
        function: function.to_string(),
        message: format!("payload is not UTF-8: {e}"),
    })
}

/// Decode a JSON document into `T`.
pub fn json<T: DeserializeOwned>(function: &str, payload: &[u8]) -> Result<T, WorkflowError> {
    serde_json::from_slice(payload).map_err(|e| WorkflowError::Decode {
        function: function.to_string(),
        message: e.to_string(),
    })
}

/// Decode a JSON array, treating an empty payload or `null` as empty.
pub fn json_list<T: DeserializeOwned>(function: &str, payload: &[u8]) -> Result<Vec<T>, WorkflowError> {
    if payload.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }
    let list: Option<Vec<T>> = json(function, payload)?;
    Ok(list.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amount_parses_decimal_text() {
        assert_eq!(amount("GetBalance", b"42").unwrap(), 42);
        assert_eq!(amount("GetBalance", b" 7\n").unwrap(), 7);
    }

    #[test]
    fn amount_rejects_garbage() {
        let err = amount("GetBalance", b"lots").unwrap_err();
        assert_eq!(err.code(), "DECODE_ERROR");
        assert!(amount("GetBalance", b"-3").is_err());
        assert!(amount("GetBalance", b"").is_err());
    }

    #[test]
    fn text_rejects_invalid_utf8() {
        assert!(text("GetClientId", &[0xff, 0xfe]).is_err());
        assert_eq!(text("GetClientId", b"x509::CN=alice").unwrap(), "x509::CN=alice");
    }

    #[test]
    fn json_list_accepts_null_and_empty() {
        let empty: Vec<u32> = json_list("GetAllModels", b"").unwrap();
        assert!(empty.is_empty());
        let null: Vec<u32> = json_list("GetAllModels", b"null").unwrap();
        assert!(null.is_empty());
        let some: Vec<u32> = json_list("GetAllModels", b"[1,2]").unwrap();
        assert_eq!(some, vec![1, 2]);
    }
}
