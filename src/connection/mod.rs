//! Live transport connections and their session bindings

mod registry;

pub use registry::{Binding, ConnectionId, ConnectionRegistry};
