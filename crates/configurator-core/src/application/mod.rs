//! Application layer for configurator-core.
//!
//! What the harness does with protocol messages, independent of how they
//! travel:
//!
//! - Keeping the newest-first message log and the held configuration
//! - Flattening the configuration into selectable (and image) nodes
//! - Shaping form state into outbound commands
//!
//! Transport, tasks, and the console live in `configurator-bridge`.

pub mod data_url;
pub mod dispatch;
pub mod flatten;
pub mod harness_state;
pub mod message_log;

pub use data_url::{encode_data_url, mime_for_extension};
pub use dispatch::{
    CommandDispatcher, CommandSender, DispatchOptions, FormState, ImageValueForm,
    LinkedCardinalityForm, RemoveLinkedForm, RequirementForm, SendError, TextValueForm,
};
pub use flatten::{flatten_nodes, image_nodes};
pub use harness_state::{HarnessState, InboundKind};
pub use message_log::MessageLog;
