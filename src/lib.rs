pub mod collaborators;
pub mod config;
pub mod connection;
pub mod coordinator;
pub mod error;
pub mod http;
pub mod protocol;
pub mod reaper;
pub mod router;
pub mod session;

pub use collaborators::{
    AnimationFormat, AnimationPayload, Collaborators, GestureInfo, SignInterpretation,
    SignRecognition, SignRecognizer, SignTranslator, SpeechRecognition, SpeechRecognizer,
    SpeechSynthesizer,
};
pub use config::Config;
pub use connection::{Binding, ConnectionId, ConnectionRegistry};
pub use coordinator::Coordinator;
pub use error::RelayError;
pub use http::{create_router, AppState};
pub use protocol::{parse_inbound, InboundEvent, OutboundEvent};
pub use reaper::Reaper;
pub use router::EventRouter;
pub use session::{LeaveOutcome, Role, SessionStore, SessionSummary};
