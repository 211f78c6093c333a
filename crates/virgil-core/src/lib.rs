//! Core value types for the Virgil device-control protocol.
//!
//! Virgil links and parameterizes audio channels across independent
//! devices over JSON messages. This crate holds the leaf types those
//! messages are built from, each one validating its own invariants:
//!
//! - [`MessageId`]: the 12-digit `HHMMSSmmm###` message identifier, plus
//!   the clock-injected [`MessageIdGenerator`] that mints fresh ones.
//! - [`ChannelId`] / [`LinkType`]: a channel index plus its
//!   transmit/receive/auxiliary direction.
//! - [`Parameter`] and friends: named, typed, range-constrained values.
//! - [`LinkedChannel`]: one endpoint of an established audio link.
//! - [`CodecError`]: the closed taxonomy every validation failure maps to.
//!
//! The message hierarchy and dispatcher built on these live in
//! `virgil-protocol`.

mod channel;
mod error;
mod id;
pub mod json;
mod link;
mod param;

pub use channel::{CHANNEL_INDEX_FIELD, CHANNEL_TYPE_FIELD, ChannelId, LinkType};
pub use error::{CodecError, CodecResult};
pub use id::{Clock, ID_DIGITS, MessageId, MessageIdGenerator, SystemClock};
pub use link::LinkedChannel;
pub use param::{
    DataType, EnumValue, FloatRange, IntRange, ParamRange, ParamValue, Parameter,
};
