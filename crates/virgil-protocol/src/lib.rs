//! Message codec for the Virgil device-control protocol.
//!
//! Virgil discovers, links, and parameterizes audio channels across
//! independent devices over JSON-over-TCP. This crate is the wire-level
//! codec: it turns one JSON value into a validated, typed [`Message`]
//! (or a typed error) and back. It never touches sockets; the transport
//! hands it exactly one JSON value per message.
//!
//! # Decoding
//!
//! ```rust
//! use virgil_protocol::{Message, decode_str};
//!
//! let text = r#"{
//!     "messageType": "channelLink",
//!     "messageID": "143000250000",
//!     "sendingChannelIndex": 0,
//!     "sendingChannelType": 2
//! }"#;
//! let message = decode_str(text, false).unwrap();
//! assert_eq!(message.message_type(), "channelLink");
//! ```
//!
//! # Encoding
//!
//! Encoding takes a [`MessageIdGenerator`]: a message whose own identifier
//! is still unset gets a fresh one minted from the generator's shared
//! clock-and-counter state.
//!
//! ```rust
//! use virgil_core::{MessageId, MessageIdGenerator};
//! use virgil_protocol::{EndResponse, Message, encode_to_string};
//!
//! let generator = MessageIdGenerator::new();
//! let message = Message::EndResponse(EndResponse {
//!     id: MessageId::unset(),
//!     response_id: MessageId::parse("143000250000").unwrap(),
//!     outbound: true,
//! });
//! let text = encode_to_string(&message, &generator).unwrap();
//! assert!(text.contains("endResponse"));
//! ```

mod error;
mod message;

pub use error::{ProtocolError, ProtocolResult};
pub use message::{
    ChannelLink, ChannelUnlink, EndResponse, ErrorResponse, InfoRequest, InfoResponse,
    MESSAGE_TYPES, Message,
};

use serde_json::Value;
use virgil_core::{Clock, MessageIdGenerator};

/// Decodes one message from a JSON text.
pub fn decode_str(text: &str, outbound: bool) -> ProtocolResult<Message> {
    let value: Value = serde_json::from_str(text)?;
    Ok(Message::from_json(&value, outbound)?)
}

/// Decodes one message from UTF-8 JSON bytes.
pub fn decode_slice(bytes: &[u8], outbound: bool) -> ProtocolResult<Message> {
    let value: Value = serde_json::from_slice(bytes)?;
    Ok(Message::from_json(&value, outbound)?)
}

/// Encodes one message to a JSON text.
pub fn encode_to_string<C: Clock>(
    message: &Message,
    generator: &MessageIdGenerator<C>,
) -> ProtocolResult<String> {
    let value = message.to_json(generator)?;
    Ok(serde_json::to_string(&value)?)
}

/// Encodes one message to UTF-8 JSON bytes.
pub fn encode_to_vec<C: Clock>(
    message: &Message,
    generator: &MessageIdGenerator<C>,
) -> ProtocolResult<Vec<u8>> {
    let value = message.to_json(generator)?;
    Ok(serde_json::to_vec(&value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use virgil_core::{ChannelId, CodecError, LinkType, MessageId};

    #[test]
    fn decode_str_roundtrip() {
        let generator = MessageIdGenerator::new();
        let message = Message::InfoRequest(InfoRequest {
            id: MessageId::parse("091500000000").unwrap(),
            response_id: None,
            outbound: true,
            channel: ChannelId::new(3, LinkType::Receive),
        });
        let text = encode_to_string(&message, &generator).unwrap();
        assert_eq!(decode_str(&text, true).unwrap(), message);
    }

    #[test]
    fn decode_slice_roundtrip() {
        let generator = MessageIdGenerator::new();
        let message = Message::EndResponse(EndResponse {
            id: MessageId::parse("091500000001").unwrap(),
            response_id: MessageId::parse("091500000000").unwrap(),
            outbound: false,
        });
        let bytes = encode_to_vec(&message, &generator).unwrap();
        assert_eq!(decode_slice(&bytes, false).unwrap(), message);
    }

    #[test]
    fn invalid_json_is_a_json_error() {
        assert!(matches!(
            decode_str("{not json", false),
            Err(ProtocolError::Json(_))
        ));
    }

    #[test]
    fn schema_violations_surface_as_codec_errors() {
        let err = decode_str(r#"{"messageType": "bogus"}"#, false).unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::Codec(CodecError::UnknownMessageType { .. })
        ));
    }
}
