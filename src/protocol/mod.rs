//! Wire messages exchanged over the interpreter WebSocket
//!
//! Every frame is a JSON envelope `{"event": "<name>", "data": {...}}` with
//! camelCase payload keys. Inbound frames are validated here, before they
//! reach the router.

mod inbound;
mod outbound;

pub use inbound::{parse_inbound, InboundEvent};
pub use outbound::{
    ErrorMessage, OutboundEvent, SessionJoined, SessionTimeout, SignLanguageAnimation,
    SignLanguageResult, TextMessage, TextToSpeech, UserJoined, UserLeft,
};
