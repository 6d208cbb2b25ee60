//! State the harness keeps about the embedded configurator.
//!
//! Two pieces of state change on every delivery:
//!
//! - the [`MessageLog`], which records every payload, and
//! - the held [`ConfigurationSnapshot`], which is replaced wholesale whenever
//!   a `configurationUpdated` envelope arrives.
//!
//! The selectable node lists are derived on demand from the current snapshot
//! and never updated incrementally.

use serde_json::Value;
use tracing::debug;

use crate::application::flatten::{flatten_nodes, image_nodes};
use crate::application::message_log::MessageLog;
use crate::domain::configuration::{Configuration, ConfigurationSnapshot, FeatureNode};
use crate::protocol::envelope::Envelope;

/// What a delivered payload did to the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InboundKind {
    /// The payload was a `configurationUpdated` envelope; the held
    /// configuration was replaced (or cleared when `args` was absent).
    ConfigurationUpdated,
    /// Anything else; logged only.
    Other,
}

#[derive(Debug, Default)]
pub struct HarnessState {
    log: MessageLog,
    configuration: Option<ConfigurationSnapshot>,
}

impl HarnessState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handles one payload delivered across the embedding boundary.
    ///
    /// The payload is always logged.  When its `name` is
    /// `elfsquad.configurationUpdated`, its `args` become the held
    /// configuration.  Sender origin is not checked.
    pub fn receive(&mut self, payload: Value) -> InboundKind {
        let kind = if Envelope::is_configuration_updated(&payload) {
            self.configuration = ConfigurationSnapshot::from_args(Envelope::args_of(&payload));
            debug!(
                "configuration replaced (id={})",
                self.configuration_id().unwrap_or("<none>")
            );
            InboundKind::ConfigurationUpdated
        } else {
            debug!(
                "message logged: {}",
                Envelope::name_of(&payload).unwrap_or("<unnamed>")
            );
            InboundKind::Other
        };

        self.log.record(payload);
        kind
    }

    pub fn message_log(&self) -> &MessageLog {
        &self.log
    }

    pub fn configuration(&self) -> Option<&ConfigurationSnapshot> {
        self.configuration.as_ref()
    }

    /// Typed view of the held configuration, when it has the tree's shape.
    pub fn configuration_tree(&self) -> Option<&Configuration> {
        self.configuration.as_ref().and_then(ConfigurationSnapshot::tree)
    }

    pub fn configuration_id(&self) -> Option<&str> {
        self.configuration.as_ref().and_then(ConfigurationSnapshot::id)
    }

    /// Every node of the held configuration; `None` without one.
    pub fn selectable_nodes(&self) -> Option<Vec<&FeatureNode>> {
        flatten_nodes(self.configuration_tree())
    }

    /// The image nodes among [`HarnessState::selectable_nodes`].
    pub fn selectable_image_nodes(&self) -> Vec<&FeatureNode> {
        let nodes = self.selectable_nodes();
        image_nodes(nodes.as_deref())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
