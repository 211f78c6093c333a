//! Linked-channel records.
//!
//! An InfoResponse lists the far ends of established audio links as
//! `{ deviceName, channelIndex, channelType }` objects; this module holds
//! the typed form of one such endpoint.

use serde_json::{Map, Value};

use crate::channel::ChannelId;
use crate::error::{CodecError, CodecResult};
use crate::json;

/// One endpoint of an established audio link: a device plus a channel on it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LinkedChannel {
    /// Name of the device the channel lives on. Never empty.
    pub device_name: String,
    /// The channel on that device.
    pub channel: ChannelId,
}

impl LinkedChannel {
    /// Creates a linked-channel record; the device name must be non-empty.
    pub fn new(device_name: impl Into<String>, channel: ChannelId) -> CodecResult<Self> {
        let device_name = device_name.into();
        if device_name.is_empty() {
            return Err(CodecError::EmptyField {
                field: "deviceName",
            });
        }
        Ok(Self {
            device_name,
            channel,
        })
    }

    /// Decodes one linked-channel object.
    pub fn decode(value: &Value) -> CodecResult<Self> {
        let obj = json::as_object(value, "linkedChannels")?;
        let device_name = json::str_field(obj, "deviceName")?;
        let channel = ChannelId::from_object(obj)?;
        Self::new(device_name, channel)
    }

    /// Encodes this record; fails on an empty device name.
    pub fn encode(&self) -> CodecResult<Value> {
        if self.device_name.is_empty() {
            return Err(CodecError::EmptyField {
                field: "deviceName",
            });
        }
        let mut obj = Map::new();
        obj.insert(
            "deviceName".to_string(),
            Value::from(self.device_name.clone()),
        );
        self.channel.append_to(&mut obj);
        Ok(Value::Object(obj))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::LinkType;
    use serde_json::json;

    #[test]
    fn decode_valid_record() {
        let value = json!({"deviceName": "StageBox-01", "channelIndex": 3, "channelType": 0});
        let link = LinkedChannel::decode(&value).unwrap();
        assert_eq!(link.device_name, "StageBox-01");
        assert_eq!(link.channel, ChannelId::new(3, LinkType::Transmit));
    }

    #[test]
    fn decode_rejects_missing_device_name() {
        let value = json!({"channelIndex": 3, "channelType": 0});
        assert!(matches!(
            LinkedChannel::decode(&value),
            Err(CodecError::MissingField { .. })
        ));
    }

    #[test]
    fn decode_rejects_empty_device_name() {
        let value = json!({"deviceName": "", "channelIndex": 3, "channelType": 0});
        assert!(matches!(
            LinkedChannel::decode(&value),
            Err(CodecError::EmptyField { field: "deviceName" })
        ));
    }

    #[test]
    fn decode_rejects_missing_channel() {
        let value = json!({"deviceName": "StageBox-01"});
        assert!(LinkedChannel::decode(&value).is_err());
    }

    #[test]
    fn encode_decode_roundtrip() {
        let link = LinkedChannel::new("Console", ChannelId::new(8, LinkType::Receive)).unwrap();
        let value = link.encode().unwrap();
        assert_eq!(
            value,
            json!({"deviceName": "Console", "channelIndex": 8, "channelType": 1})
        );
        assert_eq!(LinkedChannel::decode(&value).unwrap(), link);
    }

    #[test]
    fn encode_rejects_empty_device_name() {
        let mut link = LinkedChannel::new("Console", ChannelId::new(0, LinkType::Transmit)).unwrap();
        link.device_name.clear();
        assert!(matches!(
            link.encode(),
            Err(CodecError::EmptyField { field: "deviceName" })
        ));
    }
}
