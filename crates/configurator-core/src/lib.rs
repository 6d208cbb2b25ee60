//! # configurator-core
//!
//! Shared library for the configurator harness: the configuration tree model,
//! the embedding-protocol envelopes and commands, and the pure harness state
//! (message log, held configuration, node flattening, command dispatch).
//!
//! This crate has no dependency on async runtimes, sockets, or terminals.
//! The `configurator-bridge` crate supplies the transport and the console.
//!
//! # Architecture overview
//!
//! An Elfsquad configurator is embedded in a page.  The page and the harness
//! talk across the *embedding boundary* using small JSON envelopes of the form
//! `{ "name": "...", "args": ... }`:
//!
//! - **`domain`** – The configuration tree (steps → feature nodes → nested
//!   feature nodes) as the configurator sends it.
//!
//! - **`protocol`** – The envelope type, the recognised inbound tag, and the
//!   outbound commands with their fixed argument shapes.
//!
//! - **`application`** – What the harness does with those messages: keep a
//!   newest-first log, hold the latest configuration, flatten it into
//!   selectable nodes, and shape form state into outbound commands.

pub mod application;
pub mod domain;
pub mod protocol;

pub use application::dispatch::{
    CommandDispatcher, CommandSender, DispatchOptions, FormState, SendError,
};
pub use application::flatten::{flatten_nodes, image_nodes};
pub use application::harness_state::{HarnessState, InboundKind};
pub use application::message_log::MessageLog;
pub use domain::configuration::{
    Configuration, ConfigurationSnapshot, FeatureNode, FeatureType, LinkedConfigurationModel, Step,
};
pub use protocol::commands::Command;
pub use protocol::envelope::{Envelope, CONFIGURATION_UPDATED, NAMESPACE};
