//! Outbound commands and their fixed argument shapes.
//!
//! Every command becomes an [`Envelope`] named `elfsquad.<command>`.  The
//! argument objects always carry every key of their shape; a field the form
//! never filled in is sent as `null` rather than omitted.
//!
//! | Command                                | Arguments                                                                  |
//! |----------------------------------------|----------------------------------------------------------------------------|
//! | `triggerConfigurationUpdated`          | `{}`                                                                       |
//! | `updateRequirement`                    | `nodeId, value, isSelection, ignoreConflicts, configurationId`             |
//! | `updateRequirements`                   | `requirements[], ignoreConflicts, includeSearchbarResults, configurationId`|
//! | `updateTextValue`                      | `nodeId, value, configurationId`                                           |
//! | `updateImageValue`                     | `nodeId, image, configurationId`                                           |
//! | `updateLinkedConfigurationCardinality` | `configurationId, parentNodeId, cardinality`                               |
//! | `removeLinkedConfiguration`            | `linkedConfigurationId`                                                    |

use serde_json::{json, Value};

use crate::protocol::envelope::Envelope;

/// Arguments of `updateRequirement`.
#[derive(Debug, Clone, PartialEq)]
pub struct RequirementArgs {
    pub node_id: Option<String>,
    /// Sent verbatim; the configurator interprets it per node type.
    pub value: Value,
    pub is_selection: Option<bool>,
    pub ignore_conflicts: bool,
    pub configuration_id: Option<String>,
}

/// One row of an `updateRequirements` batch.
#[derive(Debug, Clone, PartialEq)]
pub struct RequirementRow {
    pub node_id: Option<String>,
    pub value: Value,
    pub is_selection: Option<bool>,
}

/// Arguments of `updateRequirements`.
#[derive(Debug, Clone, PartialEq)]
pub struct RequirementsArgs {
    pub requirements: Vec<RequirementRow>,
    pub ignore_conflicts: bool,
    pub include_searchbar_results: bool,
    pub configuration_id: Option<String>,
}

/// Arguments of `updateTextValue`.
#[derive(Debug, Clone, PartialEq)]
pub struct TextValueArgs {
    pub node_id: Option<String>,
    pub value: Option<String>,
    pub configuration_id: Option<String>,
}

/// Arguments of `updateImageValue`.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageValueArgs {
    pub node_id: Option<String>,
    /// `data:<mime>;base64,<payload>` URL.
    pub image: Option<String>,
    pub configuration_id: Option<String>,
}

/// Arguments of `updateLinkedConfigurationCardinality`.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkedCardinalityArgs {
    pub configuration_id: Option<String>,
    pub parent_node_id: Option<String>,
    pub cardinality: Option<i64>,
}

/// Arguments of `removeLinkedConfiguration`.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoveLinkedArgs {
    pub linked_configuration_id: Option<String>,
}

/// A command the harness sends to the embedded configurator.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    TriggerConfigurationUpdated,
    UpdateRequirement(RequirementArgs),
    UpdateRequirements(RequirementsArgs),
    UpdateTextValue(TextValueArgs),
    UpdateImageValue(ImageValueArgs),
    UpdateLinkedConfigurationCardinality(LinkedCardinalityArgs),
    RemoveLinkedConfiguration(RemoveLinkedArgs),
}

impl Command {
    /// Bare command name, without the namespace.
    pub fn name(&self) -> &'static str {
        match self {
            Command::TriggerConfigurationUpdated => "triggerConfigurationUpdated",
            Command::UpdateRequirement(_) => "updateRequirement",
            Command::UpdateRequirements(_) => "updateRequirements",
            Command::UpdateTextValue(_) => "updateTextValue",
            Command::UpdateImageValue(_) => "updateImageValue",
            Command::UpdateLinkedConfigurationCardinality(_) => {
                "updateLinkedConfigurationCardinality"
            }
            Command::RemoveLinkedConfiguration(_) => "removeLinkedConfiguration",
        }
    }

    /// The argument object, with every key of the command's shape present.
    pub fn args(&self) -> Value {
        match self {
            Command::TriggerConfigurationUpdated => json!({}),

            Command::UpdateRequirement(a) => json!({
                "nodeId": a.node_id,
                "value": a.value,
                "isSelection": a.is_selection,
                "ignoreConflicts": a.ignore_conflicts,
                "configurationId": a.configuration_id,
            }),

            Command::UpdateRequirements(a) => {
                let rows: Vec<Value> = a
                    .requirements
                    .iter()
                    .map(|r| {
                        json!({
                            "nodeId": r.node_id,
                            "value": r.value,
                            "isSelection": r.is_selection,
                        })
                    })
                    .collect();
                json!({
                    "requirements": rows,
                    "ignoreConflicts": a.ignore_conflicts,
                    "includeSearchbarResults": a.include_searchbar_results,
                    "configurationId": a.configuration_id,
                })
            }

            Command::UpdateTextValue(a) => json!({
                "nodeId": a.node_id,
                "value": a.value,
                "configurationId": a.configuration_id,
            }),

            Command::UpdateImageValue(a) => json!({
                "nodeId": a.node_id,
                "image": a.image,
                "configurationId": a.configuration_id,
            }),

            Command::UpdateLinkedConfigurationCardinality(a) => json!({
                "configurationId": a.configuration_id,
                "parentNodeId": a.parent_node_id,
                "cardinality": a.cardinality,
            }),

            Command::RemoveLinkedConfiguration(a) => json!({
                "linkedConfigurationId": a.linked_configuration_id,
            }),
        }
    }

    pub fn to_envelope(&self) -> Envelope {
        Envelope::new(Envelope::qualified(self.name()), self.args())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
