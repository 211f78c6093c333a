//! The Virgil message hierarchy and dispatcher.
//!
//! Each protocol message is one JSON object tagged by `messageType`. The
//! closed [`Message`] sum type covers every variant; [`Message::from_json`]
//! dispatches on the tag and [`Message::to_json`] produces the wire object.
//! Messages are terminal, immutable values — request/response correlation
//! and transport concerns live outside this crate.
//!
//! Direction is never inferred from a payload: decoders take the caller's
//! `outbound` flag as-is, and sending/receiving channels are always from
//! the sender's perspective regardless of it.

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use tracing::{debug, trace};

use virgil_core::{
    ChannelId, Clock, CodecError, CodecResult, LinkedChannel, MessageId, MessageIdGenerator,
    Parameter, json,
};

/// The closed set of wire tags, in dispatch order.
pub const MESSAGE_TYPES: &[&str] = &[
    "channelLink",
    "channelUnlink",
    "endResponse",
    "errorResponse",
    "infoRequest",
    "infoResponse",
];

/// Wire field names for the sending end of a link message.
const SENDING_INDEX_FIELD: &str = "sendingChannelIndex";
const SENDING_TYPE_FIELD: &str = "sendingChannelType";

/// InfoResponse keys that are not parameter names.
const INFO_RESPONSE_KEYS: &[&str] = &[
    "messageType",
    "messageID",
    "responseID",
    "channelIndex",
    "channelType",
    "linkedChannels",
];

fn id_field(obj: &Map<String, Value>, field: &str) -> CodecResult<MessageId> {
    MessageId::parse(json::str_field(obj, field)?)
}

fn opt_id_field(obj: &Map<String, Value>, field: &str) -> CodecResult<Option<MessageId>> {
    match json::opt_str_field(obj, field)? {
        Some(text) => Ok(Some(MessageId::parse(text)?)),
        None => Ok(None),
    }
}

/// Returns the message's own id, minting a fresh one if it is still unset.
fn effective_id<C: Clock>(id: &MessageId, generator: &MessageIdGenerator<C>) -> MessageId {
    if id.is_set() { *id } else { generator.generate() }
}

/// Links two devices' channels together.
///
/// The receiving channel may be omitted only for an auxiliary sending
/// channel, whose far end is the device itself.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelLink {
    /// This message's identifier; unset means "mint at encode time".
    pub id: MessageId,
    /// Identifier of the message this responds to, if any.
    pub response_id: Option<MessageId>,
    /// Caller-supplied direction marker.
    pub outbound: bool,
    /// The sending end of the link.
    pub sending_channel: ChannelId,
    /// The receiving end; optional for auxiliary senders.
    pub receiving_channel: Option<ChannelId>,
}

/// Tears down a link established by [`ChannelLink`]. Same payload shape.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelUnlink {
    /// This message's identifier; unset means "mint at encode time".
    pub id: MessageId,
    /// Identifier of the message this responds to, if any.
    pub response_id: Option<MessageId>,
    /// Caller-supplied direction marker.
    pub outbound: bool,
    /// The sending end of the link.
    pub sending_channel: ChannelId,
    /// The receiving end; optional for auxiliary senders.
    pub receiving_channel: Option<ChannelId>,
}

/// Marks the end of a response sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct EndResponse {
    /// This message's identifier; unset means "mint at encode time".
    pub id: MessageId,
    /// Identifier of the message this responds to. Mandatory here.
    pub response_id: MessageId,
    /// Caller-supplied direction marker.
    pub outbound: bool,
}

/// Reports an error in a response sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorResponse {
    /// This message's identifier; unset means "mint at encode time".
    pub id: MessageId,
    /// Identifier of the message this responds to.
    pub response_id: MessageId,
    /// Caller-supplied direction marker.
    pub outbound: bool,
    /// Predefined error type.
    pub error_value: String,
    /// Human-readable error message.
    pub error_string: String,
}

/// Requests information about a channel.
#[derive(Debug, Clone, PartialEq)]
pub struct InfoRequest {
    /// This message's identifier; unset means "mint at encode time".
    pub id: MessageId,
    /// Identifier of the message this responds to, if any.
    pub response_id: Option<MessageId>,
    /// Caller-supplied direction marker.
    pub outbound: bool,
    /// The channel information is requested about.
    pub channel: ChannelId,
}

/// Answers an [`InfoRequest`] with a channel's links and parameters.
///
/// Every top-level key that is not part of the fixed schema is one of the
/// channel's parameters, embedded under its own name.
#[derive(Debug, Clone, PartialEq)]
pub struct InfoResponse {
    /// This message's identifier; unset means "mint at encode time".
    pub id: MessageId,
    /// Identifier of the message this responds to. Mandatory here.
    pub response_id: MessageId,
    /// Caller-supplied direction marker.
    pub outbound: bool,
    /// The channel being described.
    pub channel: ChannelId,
    /// Far ends of the channel's established links. Absent on the wire
    /// means empty.
    pub linked_channels: Vec<LinkedChannel>,
    /// The channel's parameters, keyed by name. Keying makes the
    /// decode/encode round trip independent of wire key order.
    pub parameters: BTreeMap<String, Parameter>,
}

/// One Virgil protocol message.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// Link two channels.
    ChannelLink(ChannelLink),
    /// Unlink two channels.
    ChannelUnlink(ChannelUnlink),
    /// End of a response sequence.
    EndResponse(EndResponse),
    /// Error in a response sequence.
    ErrorResponse(ErrorResponse),
    /// Request channel information.
    InfoRequest(InfoRequest),
    /// Channel information.
    InfoResponse(InfoResponse),
}

impl Message {
    /// Decodes one message, dispatching on its `messageType` tag.
    ///
    /// The tag match is exact and case-sensitive. A missing, non-string,
    /// or unknown tag fails with an error listing the payload's top-level
    /// keys and the supported tag set.
    pub fn from_json(value: &Value, outbound: bool) -> CodecResult<Self> {
        let obj = json::as_object(value, "message")?;
        let Some(tag) = obj.get("messageType").and_then(Value::as_str) else {
            debug!(keys = ?obj.keys().collect::<Vec<_>>(), "payload has no messageType tag");
            return Err(unknown_type(None, obj));
        };
        trace!(message_type = tag, outbound, "decoding message");
        match tag {
            "channelLink" => Ok(Self::ChannelLink(ChannelLink::decode(obj, outbound)?)),
            "channelUnlink" => Ok(Self::ChannelUnlink(ChannelUnlink::decode(obj, outbound)?)),
            "endResponse" => Ok(Self::EndResponse(EndResponse::decode(obj, outbound)?)),
            "errorResponse" => Ok(Self::ErrorResponse(ErrorResponse::decode(obj, outbound)?)),
            "infoRequest" => Ok(Self::InfoRequest(InfoRequest::decode(obj, outbound)?)),
            "infoResponse" => Ok(Self::InfoResponse(InfoResponse::decode(obj, outbound)?)),
            other => {
                debug!(message_type = other, "unknown messageType tag");
                Err(unknown_type(Some(other), obj))
            }
        }
    }

    /// Encodes this message to its wire object.
    ///
    /// A message whose own id is unset gets a fresh identifier from
    /// `generator`, so encoding such a message advances the generator's
    /// shared state and is not reproducible across calls.
    pub fn to_json<C: Clock>(&self, generator: &MessageIdGenerator<C>) -> CodecResult<Value> {
        match self {
            Self::ChannelLink(m) => m.encode(generator),
            Self::ChannelUnlink(m) => m.encode(generator),
            Self::EndResponse(m) => m.encode(generator),
            Self::ErrorResponse(m) => m.encode(generator),
            Self::InfoRequest(m) => m.encode(generator),
            Self::InfoResponse(m) => m.encode(generator),
        }
    }

    /// Returns this message's wire tag.
    pub fn message_type(&self) -> &'static str {
        match self {
            Self::ChannelLink(_) => "channelLink",
            Self::ChannelUnlink(_) => "channelUnlink",
            Self::EndResponse(_) => "endResponse",
            Self::ErrorResponse(_) => "errorResponse",
            Self::InfoRequest(_) => "infoRequest",
            Self::InfoResponse(_) => "infoResponse",
        }
    }

    /// Returns this message's own identifier.
    pub fn id(&self) -> MessageId {
        match self {
            Self::ChannelLink(m) => m.id,
            Self::ChannelUnlink(m) => m.id,
            Self::EndResponse(m) => m.id,
            Self::ErrorResponse(m) => m.id,
            Self::InfoRequest(m) => m.id,
            Self::InfoResponse(m) => m.id,
        }
    }

    /// Returns the identifier of the message this responds to, if any.
    pub fn response_id(&self) -> Option<MessageId> {
        match self {
            Self::ChannelLink(m) => m.response_id,
            Self::ChannelUnlink(m) => m.response_id,
            Self::EndResponse(m) => Some(m.response_id),
            Self::ErrorResponse(m) => Some(m.response_id),
            Self::InfoRequest(m) => m.response_id,
            Self::InfoResponse(m) => Some(m.response_id),
        }
    }

    /// Returns the caller-supplied direction marker.
    pub fn outbound(&self) -> bool {
        match self {
            Self::ChannelLink(m) => m.outbound,
            Self::ChannelUnlink(m) => m.outbound,
            Self::EndResponse(m) => m.outbound,
            Self::ErrorResponse(m) => m.outbound,
            Self::InfoRequest(m) => m.outbound,
            Self::InfoResponse(m) => m.outbound,
        }
    }
}

fn unknown_type(found: Option<&str>, obj: &Map<String, Value>) -> CodecError {
    CodecError::UnknownMessageType {
        found: found.map(str::to_string),
        keys: obj.keys().cloned().collect(),
        supported: MESSAGE_TYPES,
    }
}

/// Shared decode for the two link-shaped payloads.
fn decode_link_fields(
    obj: &Map<String, Value>,
) -> CodecResult<(MessageId, Option<MessageId>, ChannelId, Option<ChannelId>)> {
    let id = id_field(obj, "messageID")?;
    let response_id = opt_id_field(obj, "responseID")?;
    let sending = ChannelId::from_object_fields(obj, SENDING_INDEX_FIELD, SENDING_TYPE_FIELD)?;
    // A half-present receiving channel is still an error: mentioning either
    // field commits the sender to both.
    let receiving = if obj.contains_key(virgil_core::CHANNEL_INDEX_FIELD)
        || obj.contains_key(virgil_core::CHANNEL_TYPE_FIELD)
    {
        Some(ChannelId::from_object(obj)?)
    } else {
        None
    };
    Ok((id, response_id, sending, receiving))
}

/// Shared encode for the two link-shaped payloads.
fn encode_link_fields<C: Clock>(
    tag: &str,
    id: &MessageId,
    response_id: &Option<MessageId>,
    sending: &ChannelId,
    receiving: &Option<ChannelId>,
    generator: &MessageIdGenerator<C>,
) -> CodecResult<Value> {
    if !sending.is_aux() && receiving.is_none() {
        return Err(CodecError::CrossField {
            detail: "only an auxiliary sending channel may omit the receiving channel",
        });
    }
    let mut obj = Map::new();
    obj.insert("messageType".to_string(), Value::from(tag));
    obj.insert(
        "messageID".to_string(),
        Value::from(effective_id(id, generator).to_string()),
    );
    if let Some(response_id) = response_id {
        obj.insert("responseID".to_string(), Value::from(response_id.to_string()));
    }
    sending.append_to_fields(&mut obj, SENDING_INDEX_FIELD, SENDING_TYPE_FIELD);
    if let Some(receiving) = receiving {
        receiving.append_to(&mut obj);
    }
    Ok(Value::Object(obj))
}

impl ChannelLink {
    fn decode(obj: &Map<String, Value>, outbound: bool) -> CodecResult<Self> {
        let (id, response_id, sending_channel, receiving_channel) = decode_link_fields(obj)?;
        Ok(Self {
            id,
            response_id,
            outbound,
            sending_channel,
            receiving_channel,
        })
    }

    fn encode<C: Clock>(&self, generator: &MessageIdGenerator<C>) -> CodecResult<Value> {
        encode_link_fields(
            "channelLink",
            &self.id,
            &self.response_id,
            &self.sending_channel,
            &self.receiving_channel,
            generator,
        )
    }
}

impl ChannelUnlink {
    fn decode(obj: &Map<String, Value>, outbound: bool) -> CodecResult<Self> {
        let (id, response_id, sending_channel, receiving_channel) = decode_link_fields(obj)?;
        Ok(Self {
            id,
            response_id,
            outbound,
            sending_channel,
            receiving_channel,
        })
    }

    fn encode<C: Clock>(&self, generator: &MessageIdGenerator<C>) -> CodecResult<Value> {
        encode_link_fields(
            "channelUnlink",
            &self.id,
            &self.response_id,
            &self.sending_channel,
            &self.receiving_channel,
            generator,
        )
    }
}

impl EndResponse {
    fn decode(obj: &Map<String, Value>, outbound: bool) -> CodecResult<Self> {
        Ok(Self {
            id: id_field(obj, "messageID")?,
            response_id: id_field(obj, "responseID")?,
            outbound,
        })
    }

    fn encode<C: Clock>(&self, generator: &MessageIdGenerator<C>) -> CodecResult<Value> {
        let mut obj = Map::new();
        obj.insert("messageType".to_string(), Value::from("endResponse"));
        obj.insert(
            "messageID".to_string(),
            Value::from(effective_id(&self.id, generator).to_string()),
        );
        obj.insert(
            "responseID".to_string(),
            Value::from(self.response_id.to_string()),
        );
        Ok(Value::Object(obj))
    }
}

impl ErrorResponse {
    fn decode(obj: &Map<String, Value>, outbound: bool) -> CodecResult<Self> {
        Ok(Self {
            id: id_field(obj, "messageID")?,
            response_id: id_field(obj, "responseID")?,
            outbound,
            error_value: json::str_field(obj, "errorValue")?.to_string(),
            error_string: json::str_field(obj, "errorString")?.to_string(),
        })
    }

    fn encode<C: Clock>(&self, generator: &MessageIdGenerator<C>) -> CodecResult<Value> {
        let mut obj = Map::new();
        obj.insert("messageType".to_string(), Value::from("errorResponse"));
        obj.insert(
            "messageID".to_string(),
            Value::from(effective_id(&self.id, generator).to_string()),
        );
        obj.insert(
            "responseID".to_string(),
            Value::from(self.response_id.to_string()),
        );
        obj.insert("errorValue".to_string(), Value::from(self.error_value.clone()));
        obj.insert(
            "errorString".to_string(),
            Value::from(self.error_string.clone()),
        );
        Ok(Value::Object(obj))
    }
}

impl InfoRequest {
    fn decode(obj: &Map<String, Value>, outbound: bool) -> CodecResult<Self> {
        Ok(Self {
            id: id_field(obj, "messageID")?,
            response_id: opt_id_field(obj, "responseID")?,
            outbound,
            channel: ChannelId::from_object(obj)?,
        })
    }

    fn encode<C: Clock>(&self, generator: &MessageIdGenerator<C>) -> CodecResult<Value> {
        let mut obj = Map::new();
        obj.insert("messageType".to_string(), Value::from("infoRequest"));
        obj.insert(
            "messageID".to_string(),
            Value::from(effective_id(&self.id, generator).to_string()),
        );
        if let Some(response_id) = &self.response_id {
            obj.insert("responseID".to_string(), Value::from(response_id.to_string()));
        }
        self.channel.append_to(&mut obj);
        Ok(Value::Object(obj))
    }
}

impl InfoResponse {
    fn decode(obj: &Map<String, Value>, outbound: bool) -> CodecResult<Self> {
        let id = id_field(obj, "messageID")?;
        let response_id = id_field(obj, "responseID")?;
        let channel = ChannelId::from_object(obj)?;

        let linked_channels = match obj.get("linkedChannels") {
            None => Vec::new(),
            Some(value) => {
                let items = value.as_array().ok_or_else(|| CodecError::WrongType {
                    field: "linkedChannels".to_string(),
                    expected: "an array",
                    found: json::type_name(value),
                })?;
                items
                    .iter()
                    .map(LinkedChannel::decode)
                    .collect::<CodecResult<Vec<_>>>()?
            }
        };

        let mut parameters = BTreeMap::new();
        for (key, value) in obj {
            if INFO_RESPONSE_KEYS.contains(&key.as_str()) {
                continue;
            }
            let parameter = Parameter::decode(key, value)?;
            parameters.insert(parameter.name.clone(), parameter);
        }

        Ok(Self {
            id,
            response_id,
            outbound,
            channel,
            linked_channels,
            parameters,
        })
    }

    fn encode<C: Clock>(&self, generator: &MessageIdGenerator<C>) -> CodecResult<Value> {
        let mut obj = Map::new();
        obj.insert("messageType".to_string(), Value::from("infoResponse"));
        obj.insert(
            "messageID".to_string(),
            Value::from(effective_id(&self.id, generator).to_string()),
        );
        obj.insert(
            "responseID".to_string(),
            Value::from(self.response_id.to_string()),
        );
        self.channel.append_to(&mut obj);
        if !self.linked_channels.is_empty() {
            let items = self
                .linked_channels
                .iter()
                .map(LinkedChannel::encode)
                .collect::<CodecResult<Vec<_>>>()?;
            obj.insert("linkedChannels".to_string(), Value::Array(items));
        }
        for parameter in self.parameters.values() {
            parameter.append_to(&mut obj)?;
        }
        Ok(Value::Object(obj))
    }
}
