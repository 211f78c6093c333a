//! Channel identifiers.
//!
//! A Virgil channel is addressed by an unsigned index plus a link type.
//! On the wire the link type is a small integer (`0` transmit, `1` receive,
//! `2` auxiliary) and both fields are always written; which field names are
//! used depends on the message (most use `channelIndex`/`channelType`, link
//! messages use `sendingChannelIndex`/`sendingChannelType` for the sending
//! end).

use serde_json::{Map, Value};

use crate::error::{CodecError, CodecResult};
use crate::json;

/// Default wire field name for the channel index.
pub const CHANNEL_INDEX_FIELD: &str = "channelIndex";
/// Default wire field name for the channel type.
pub const CHANNEL_TYPE_FIELD: &str = "channelType";

/// The direction a channel carries audio in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkType {
    /// A transmit channel.
    Transmit,
    /// A receive channel.
    Receive,
    /// An auxiliary channel (control or sidechain audio).
    Auxiliary,
}

impl LinkType {
    /// Decodes the wire integer for a link type.
    pub fn from_wire(raw: u64, field: &str) -> CodecResult<Self> {
        match raw {
            0 => Ok(Self::Transmit),
            1 => Ok(Self::Receive),
            2 => Ok(Self::Auxiliary),
            other => Err(CodecError::OutOfRange {
                field: field.to_string(),
                detail: format!("link type must be 0, 1, or 2, got {other}"),
            }),
        }
    }

    /// Returns the wire integer for this link type.
    pub fn to_wire(self) -> u64 {
        match self {
            Self::Transmit => 0,
            Self::Receive => 1,
            Self::Auxiliary => 2,
        }
    }
}

/// Identifies one channel on a device: an index plus a link type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelId {
    /// Channel index within its link type.
    pub index: u16,
    /// Whether the channel transmits, receives, or is auxiliary.
    pub link_type: LinkType,
}

impl ChannelId {
    /// Creates a channel identifier.
    ///
    /// The index width is enforced by the type; there is no further
    /// type-specific index restriction.
    pub fn new(index: u16, link_type: LinkType) -> Self {
        Self { index, link_type }
    }

    /// Decodes a channel from an object using the default field names.
    pub fn from_object(obj: &Map<String, Value>) -> CodecResult<Self> {
        Self::from_object_fields(obj, CHANNEL_INDEX_FIELD, CHANNEL_TYPE_FIELD)
    }

    /// Decodes a channel from an object using the given field names.
    ///
    /// Both fields must be present and must be JSON unsigned integers; the
    /// index must fit the protocol's index width.
    pub fn from_object_fields(
        obj: &Map<String, Value>,
        index_field: &str,
        type_field: &str,
    ) -> CodecResult<Self> {
        let raw_index = json::u64_field(obj, index_field)?;
        let index = u16::try_from(raw_index).map_err(|_| CodecError::OutOfRange {
            field: index_field.to_string(),
            detail: format!("channel index must fit 16 bits, got {raw_index}"),
        })?;
        let link_type = LinkType::from_wire(json::u64_field(obj, type_field)?, type_field)?;
        Ok(Self { index, link_type })
    }

    /// Appends this channel to an object using the default field names.
    pub fn append_to(&self, obj: &mut Map<String, Value>) {
        self.append_to_fields(obj, CHANNEL_INDEX_FIELD, CHANNEL_TYPE_FIELD);
    }

    /// Appends this channel to an object using the given field names.
    ///
    /// Writes exactly the two configured fields, overwriting them if they
    /// already exist.
    pub fn append_to_fields(&self, obj: &mut Map<String, Value>, index_field: &str, type_field: &str) {
        obj.insert(index_field.to_string(), Value::from(u64::from(self.index)));
        obj.insert(type_field.to_string(), Value::from(self.link_type.to_wire()));
    }

    /// Returns `true` for auxiliary channels.
    pub fn is_aux(&self) -> bool {
        self.link_type == LinkType::Auxiliary
    }

    /// Returns `true` for transmit channels.
    pub fn is_tx(&self) -> bool {
        self.link_type == LinkType::Transmit
    }

    /// Returns `true` for receive channels.
    pub fn is_rx(&self) -> bool {
        self.link_type == LinkType::Receive
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(v: Value) -> Map<String, Value> {
        v.as_object().unwrap().clone()
    }

    #[test]
    fn link_type_wire_mapping() {
        assert_eq!(LinkType::from_wire(0, "channelType").unwrap(), LinkType::Transmit);
        assert_eq!(LinkType::from_wire(1, "channelType").unwrap(), LinkType::Receive);
        assert_eq!(LinkType::from_wire(2, "channelType").unwrap(), LinkType::Auxiliary);
        assert!(matches!(
            LinkType::from_wire(3, "channelType"),
            Err(CodecError::OutOfRange { .. })
        ));
        assert_eq!(LinkType::Auxiliary.to_wire(), 2);
    }

    #[test]
    fn decode_default_fields() {
        let m = obj(json!({"channelIndex": 4, "channelType": 1}));
        let channel = ChannelId::from_object(&m).unwrap();
        assert_eq!(channel, ChannelId::new(4, LinkType::Receive));
        assert!(channel.is_rx());
        assert!(!channel.is_tx());
        assert!(!channel.is_aux());
    }

    #[test]
    fn decode_custom_fields() {
        let m = obj(json!({"sendingChannelIndex": 0, "sendingChannelType": 2}));
        let channel =
            ChannelId::from_object_fields(&m, "sendingChannelIndex", "sendingChannelType").unwrap();
        assert!(channel.is_aux());
        assert_eq!(channel.index, 0);
    }

    #[test]
    fn decode_missing_field() {
        let m = obj(json!({"channelIndex": 4}));
        assert!(matches!(
            ChannelId::from_object(&m),
            Err(CodecError::MissingField { .. })
        ));
        let m = obj(json!({"channelType": 1}));
        assert!(matches!(
            ChannelId::from_object(&m),
            Err(CodecError::MissingField { .. })
        ));
    }

    #[test]
    fn decode_wrong_json_type() {
        let m = obj(json!({"channelIndex": "4", "channelType": 1}));
        assert!(matches!(
            ChannelId::from_object(&m),
            Err(CodecError::WrongType { .. })
        ));
        // Negative numbers are not the protocol's unsigned integer type.
        let m = obj(json!({"channelIndex": -1, "channelType": 1}));
        assert!(matches!(
            ChannelId::from_object(&m),
            Err(CodecError::WrongType { .. })
        ));
    }

    #[test]
    fn decode_index_width() {
        let m = obj(json!({"channelIndex": 65535, "channelType": 0}));
        assert_eq!(ChannelId::from_object(&m).unwrap().index, 65535);
        let m = obj(json!({"channelIndex": 65536, "channelType": 0}));
        assert!(matches!(
            ChannelId::from_object(&m),
            Err(CodecError::OutOfRange { .. })
        ));
    }

    #[test]
    fn encode_writes_both_fields() {
        let mut m = Map::new();
        ChannelId::new(7, LinkType::Transmit).append_to(&mut m);
        assert_eq!(Value::Object(m), json!({"channelIndex": 7, "channelType": 0}));
    }

    #[test]
    fn encode_decode_roundtrip_custom_fields() {
        let channel = ChannelId::new(12, LinkType::Auxiliary);
        let mut m = Map::new();
        channel.append_to_fields(&mut m, "sendingChannelIndex", "sendingChannelType");
        let back =
            ChannelId::from_object_fields(&m, "sendingChannelIndex", "sendingChannelType").unwrap();
        assert_eq!(back, channel);
    }
}
