//! Command dispatch: held form state → fixed-shape command → sender.
//!
//! Dispatch is a pure data-shaping step.  Whatever the form currently holds
//! is packaged as-is; unset fields go out as `null`.  Nothing is validated,
//! retried, or correlated with a reply.
//!
//! # Sender seam
//!
//! [`CommandSender`] is the only thing that knows how an [`Envelope`] crosses
//! the embedding boundary.  The bridge implements it over WebSocket; tests
//! implement it by recording envelopes.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::protocol::commands::{
    Command, ImageValueArgs, LinkedCardinalityArgs, RemoveLinkedArgs, RequirementArgs,
    RequirementRow, RequirementsArgs, TextValueArgs,
};
use crate::protocol::envelope::Envelope;

/// Errors raised by a [`CommandSender`] while delivering an envelope.
#[derive(Debug, Error)]
pub enum SendError {
    /// The envelope could not be turned into a wire frame.
    #[error("failed to encode envelope: {0}")]
    Encode(String),

    /// The transport is gone.
    #[error("embedding boundary is closed")]
    Closed,
}

/// Delivers envelopes across the embedding boundary.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommandSender: Send + Sync {
    async fn send(&self, envelope: Envelope) -> Result<(), SendError>;
}

/// Fixed flags attached to requirement updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchOptions {
    pub ignore_conflicts: bool,
    pub include_searchbar_results: bool,
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self {
            ignore_conflicts: true,
            include_searchbar_results: true,
        }
    }
}

// ── Held form state ───────────────────────────────────────────────────────────

/// Fields behind the "update requirement(s)" controls.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequirementForm {
    pub node_id: Option<String>,
    pub value: Value,
    pub is_selection: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextValueForm {
    pub node_id: Option<String>,
    pub value: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImageValueForm {
    pub node_id: Option<String>,
    /// Data URL produced by the last completed file read.
    pub image: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinkedCardinalityForm {
    /// Overrides the held configuration's id when set.
    pub configuration_id: Option<String>,
    pub parent_node_id: Option<String>,
    pub cardinality: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemoveLinkedForm {
    pub linked_configuration_id: Option<String>,
}

/// Every form of the control panel.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormState {
    pub requirement: RequirementForm,
    pub requirements: RequirementForm,
    pub text_value: TextValueForm,
    pub image_value: ImageValueForm,
    pub cardinality: LinkedCardinalityForm,
    pub remove_linked: RemoveLinkedForm,
}

impl RequirementForm {
    pub fn to_update_requirement(
        &self,
        options: DispatchOptions,
        configuration_id: Option<&str>,
    ) -> Command {
        Command::UpdateRequirement(RequirementArgs {
            node_id: self.node_id.clone(),
            value: self.value.clone(),
            is_selection: self.is_selection,
            ignore_conflicts: options.ignore_conflicts,
            configuration_id: configuration_id.map(str::to_string),
        })
    }

    /// A batch holding this form as its single row.
    pub fn to_update_requirements(
        &self,
        options: DispatchOptions,
        configuration_id: Option<&str>,
    ) -> Command {
        Command::UpdateRequirements(RequirementsArgs {
            requirements: vec![RequirementRow {
                node_id: self.node_id.clone(),
                value: self.value.clone(),
                is_selection: self.is_selection,
            }],
            ignore_conflicts: options.ignore_conflicts,
            include_searchbar_results: options.include_searchbar_results,
            configuration_id: configuration_id.map(str::to_string),
        })
    }
}

impl TextValueForm {
    pub fn to_command(&self, configuration_id: Option<&str>) -> Command {
        Command::UpdateTextValue(TextValueArgs {
            node_id: self.node_id.clone(),
            value: self.value.clone(),
            configuration_id: configuration_id.map(str::to_string),
        })
    }
}

impl ImageValueForm {
    pub fn to_command(&self, configuration_id: Option<&str>) -> Command {
        Command::UpdateImageValue(ImageValueArgs {
            node_id: self.node_id.clone(),
            image: self.image.clone(),
            configuration_id: configuration_id.map(str::to_string),
        })
    }
}

impl LinkedCardinalityForm {
    pub fn to_command(&self, configuration_id: Option<&str>) -> Command {
        Command::UpdateLinkedConfigurationCardinality(LinkedCardinalityArgs {
            configuration_id: self
                .configuration_id
                .clone()
                .or_else(|| configuration_id.map(str::to_string)),
            parent_node_id: self.parent_node_id.clone(),
            cardinality: self.cardinality,
        })
    }
}

impl RemoveLinkedForm {
    pub fn to_command(&self) -> Command {
        Command::RemoveLinkedConfiguration(RemoveLinkedArgs {
            linked_configuration_id: self.linked_configuration_id.clone(),
        })
    }
}

// ── Dispatcher ────────────────────────────────────────────────────────────────

/// Shapes form state into commands and hands them to a [`CommandSender`].
pub struct CommandDispatcher<S> {
    sender: S,
    options: DispatchOptions,
}

impl<S: CommandSender> CommandDispatcher<S> {
    pub fn new(sender: S, options: DispatchOptions) -> Self {
        Self { sender, options }
    }

    pub fn sender(&self) -> &S {
        &self.sender
    }

    /// Sends one command.  Only the command name is logged; argument values
    /// (image data URLs in particular) are not.
    pub async fn dispatch(&self, command: &Command) -> Result<(), SendError> {
        debug!("dispatching {}", command.name());
        self.sender.send(command.to_envelope()).await
    }

    pub async fn trigger_configuration_updated(&self) -> Result<(), SendError> {
        self.dispatch(&Command::TriggerConfigurationUpdated).await
    }

    pub async fn update_requirement(
        &self,
        form: &RequirementForm,
        configuration_id: Option<&str>,
    ) -> Result<(), SendError> {
        self.dispatch(&form.to_update_requirement(self.options, configuration_id))
            .await
    }

    pub async fn update_requirements(
        &self,
        form: &RequirementForm,
        configuration_id: Option<&str>,
    ) -> Result<(), SendError> {
        self.dispatch(&form.to_update_requirements(self.options, configuration_id))
            .await
    }

    pub async fn update_text_value(
        &self,
        form: &TextValueForm,
        configuration_id: Option<&str>,
    ) -> Result<(), SendError> {
        self.dispatch(&form.to_command(configuration_id)).await
    }

    pub async fn update_image_value(
        &self,
        form: &ImageValueForm,
        configuration_id: Option<&str>,
    ) -> Result<(), SendError> {
        self.dispatch(&form.to_command(configuration_id)).await
    }

    pub async fn update_linked_configuration_cardinality(
        &self,
        form: &LinkedCardinalityForm,
        configuration_id: Option<&str>,
    ) -> Result<(), SendError> {
        self.dispatch(&form.to_command(configuration_id)).await
    }

    pub async fn remove_linked_configuration(
        &self,
        form: &RemoveLinkedForm,
    ) -> Result<(), SendError> {
        self.dispatch(&form.to_command()).await
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
