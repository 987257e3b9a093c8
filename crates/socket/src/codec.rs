//! Message Codec
//!
//! JSON in, JSON out. Decode never panics: anything that isn't a JSON
//! object of the envelope shape comes back as `MalformedPayload`.

use serde::Serialize;

use crate::error::{Result, SocketError};
use crate::protocol::{InboundEnvelope, OutboundCommand, RequestId};

/// Encode a command envelope into one text frame
pub fn encode<P: Serialize>(id: RequestId, method: &str, params: Option<&P>) -> Result<String> {
    let command = OutboundCommand { id, method, params };
    serde_json::to_string(&command).map_err(SocketError::Serialization)
}

/// Decode one inbound frame
pub fn decode(frame: &[u8]) -> Result<InboundEnvelope> {
    serde_json::from_slice(frame).map_err(SocketError::MalformedPayload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::ser::Error as _;
    use serde::Serializer;
    use serde_json::{json, Value};

    struct Unrepresentable;

    impl Serialize for Unrepresentable {
        fn serialize<S: Serializer>(&self, _: S) -> std::result::Result<S::Ok, S::Error> {
            Err(S::Error::custom("cannot be represented"))
        }
    }

    #[test]
    fn test_encode_command() {
        let frame = encode(7, "X.y", Some(&json!({"a": 1}))).unwrap();
        let value: Value = serde_json::from_str(&frame).unwrap();
        assert_eq!(value, json!({"id": 7, "method": "X.y", "params": {"a": 1}}));
    }

    #[test]
    fn test_encode_failure_is_serialization_error() {
        let err = encode(1, "X.y", Some(&Unrepresentable)).unwrap_err();
        assert!(matches!(err, SocketError::Serialization(_)));
    }

    #[test]
    fn test_non_string_map_keys_fail_to_encode() {
        let mut params = std::collections::HashMap::new();
        params.insert(vec![1u8], 1);
        let err = encode(1, "X.y", Some(&params)).unwrap_err();
        assert!(matches!(err, SocketError::Serialization(_)));
    }

    #[test]
    fn test_decode_response_and_event() {
        let response = decode(br#"{"id":7,"result":{"ok":true}}"#).unwrap();
        assert_eq!(response.id, Some(7));
        assert!(response.method.is_none());
        assert_eq!(response.result.unwrap().get(), r#"{"ok":true}"#);

        let event = decode(br#"{"method":"X.changed","params":{"v":5}}"#).unwrap();
        assert_eq!(event.id, None);
        assert_eq!(event.method.as_deref(), Some("X.changed"));
    }

    #[test]
    fn test_decode_remote_error() {
        let envelope = decode(br#"{"id":2,"error":{"code":-32601,"message":"nope"}}"#).unwrap();
        let error = envelope.error.unwrap();
        assert_eq!(error.code, -32601);
        assert_eq!(error.message, "nope");
    }

    #[test]
    fn test_decode_garbage_is_malformed() {
        let frames: [&[u8]; 6] = [
            b"not json",
            b"[1,2,3]",
            b"42",
            br#"{"id":"seven"}"#,
            br#"{"id":1,"error":"boom"}"#,
            b"",
        ];
        for frame in frames {
            let err = decode(frame).unwrap_err();
            assert!(matches!(err, SocketError::MalformedPayload(_)), "{:?}", frame);
        }
    }
}
