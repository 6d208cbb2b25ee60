//! The configuration tree reported by the embedded configurator.
//!
//! A configuration is an ordered list of steps.  Each step holds an ordered
//! list of feature nodes, and every feature node may hold further feature
//! nodes, to any depth:
//!
//! ```text
//! Configuration
//!   ├── Step "Frame"
//!   │     ├── FeatureNode "Colour"
//!   │     │     ├── FeatureNode "Red"
//!   │     │     └── FeatureNode "Blue"
//!   │     └── FeatureNode "Logo" (featureType = 4, image)
//!   └── Step "Wheels"
//!         └── FeatureNode "Size"
//! ```
//!
//! # JSON shape
//!
//! The configurator speaks camelCase JSON.  Only the keys the harness reads
//! are modelled as fields; every other key is kept in an `extra` map so the
//! tree serializes back without losing anything.
//!
//! Reading is lenient, field by field.  A collection that is absent, `null`,
//! or not a list reads as empty, and list entries that are not nodes are
//! skipped.  A numeric id or name reads as its decimal text; any other
//! non-string reads as unset.  One malformed node therefore never hides the
//! rest of the tree.
//!
//! ```json
//! {
//!   "id": "c-1",
//!   "steps": [{ "features": [{ "id": "n1", "name": "Colour", "featureType": 1 }] }],
//!   "linkedConfigurations": [],
//!   "linkedConfigurationModels": []
//! }
//! ```

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

// ── Lenient field readers ─────────────────────────────────────────────────────

/// Reads a list, keeping the entries that parse as `T`.
fn lenient_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(lenient_opt_vec(deserializer)?.unwrap_or_default())
}

/// Like [`lenient_vec`], but `None` when there is no list at all.
fn lenient_opt_vec<'de, D, T>(deserializer: D) -> Result<Option<Vec<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let items = match Value::deserialize(deserializer)? {
        Value::Array(items) => items,
        Value::Null => return Ok(None),
        other => {
            warn!("expected a list in configuration, got {other}; reading as empty");
            return Ok(None);
        }
    };

    let parsed = items
        .into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("skipping malformed configuration entry: {e}");
                None
            }
        })
        .collect();
    Ok(Some(parsed))
}

fn text_of(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(text_of(Value::deserialize(deserializer)?))
}

/// Node ids are always text; an unusable id reads as empty.
fn lenient_node_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(text_of(Value::deserialize(deserializer)?).unwrap_or_default())
}

fn lenient_feature_type<'de, D>(deserializer: D) -> Result<Option<FeatureType>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Value::deserialize(deserializer)?.as_i64().map(FeatureType))
}

/// Numeric feature-type discriminant as sent by the configurator.
///
/// Only [`FeatureType::IMAGE`] has meaning to the harness; other values are
/// carried through untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureType(pub i64);

impl FeatureType {
    /// Feature nodes that accept an uploaded image.
    pub const IMAGE: FeatureType = FeatureType(4);

    pub fn is_image(self) -> bool {
        self == Self::IMAGE
    }
}

/// A selectable/configurable unit within a configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureNode {
    /// Node identifier used as `nodeId` in outbound commands.  Empty when
    /// the configurator sent no usable id.
    #[serde(default, deserialize_with = "lenient_node_id")]
    pub id: String,

    /// Display name shown in node-selection controls.
    #[serde(default, deserialize_with = "lenient_text")]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "lenient_feature_type")]
    pub feature_type: Option<FeatureType>,

    /// Nested feature nodes.
    #[serde(default, deserialize_with = "lenient_vec")]
    pub features: Vec<FeatureNode>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FeatureNode {
    /// `true` when this node's feature type is [`FeatureType::IMAGE`].
    pub fn is_image(&self) -> bool {
        self.feature_type.is_some_and(FeatureType::is_image)
    }

    /// The name to show for this node, falling back to its id.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}

/// One step of a configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    #[serde(default, deserialize_with = "lenient_text")]
    pub id: Option<String>,

    #[serde(default, deserialize_with = "lenient_vec")]
    pub features: Vec<FeatureNode>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Descriptor of a configuration model that can be linked to the current one.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkedConfigurationModel {
    #[serde(default, deserialize_with = "lenient_text")]
    pub id: Option<String>,

    #[serde(default, deserialize_with = "lenient_text")]
    pub name: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A product's configurable state: steps of feature nodes plus linked
/// configurations.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Configuration {
    #[serde(default, deserialize_with = "lenient_text")]
    pub id: Option<String>,

    #[serde(default, deserialize_with = "lenient_vec")]
    pub steps: Vec<Step>,

    /// Secondary configurations attached to this one.
    #[serde(
        default,
        deserialize_with = "lenient_opt_vec",
        skip_serializing_if = "Option::is_none"
    )]
    pub linked_configurations: Option<Vec<Configuration>>,

    #[serde(
        default,
        deserialize_with = "lenient_opt_vec",
        skip_serializing_if = "Option::is_none"
    )]
    pub linked_configuration_models: Option<Vec<LinkedConfigurationModel>>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Configuration {
    /// Total number of feature nodes reachable from any step.
    pub fn node_count(&self) -> usize {
        fn count(nodes: &[FeatureNode]) -> usize {
            nodes.iter().map(|n| 1 + count(&n.features)).sum()
        }
        self.steps.iter().map(|s| count(&s.features)).sum()
    }

    /// Linked configurations, or an empty slice when none were sent.
    pub fn linked(&self) -> &[Configuration] {
        self.linked_configurations.as_deref().unwrap_or_default()
    }

    pub fn linked_models(&self) -> &[LinkedConfigurationModel] {
        self.linked_configuration_models.as_deref().unwrap_or_default()
    }
}

// ── Snapshot held by the harness ──────────────────────────────────────────────

/// The configuration the harness currently holds.
///
/// `raw` is the `args` value exactly as it arrived; `tree` is the typed view
/// parsed from it.  Any JSON object yields a tree.  A payload that is not an
/// object is still held (and displayed) but has no typed view, so nothing
/// can be flattened from it.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigurationSnapshot {
    raw: Value,
    tree: Option<Configuration>,
}

impl ConfigurationSnapshot {
    /// Builds a snapshot from a `configurationUpdated` envelope's `args`.
    ///
    /// Returns `None` for `null`: an update without a configuration clears
    /// the held one.
    pub fn from_args(args: Value) -> Option<Self> {
        if args.is_null() {
            return None;
        }

        let tree = match Configuration::deserialize(&args) {
            Ok(tree) => Some(tree),
            Err(e) => {
                warn!("configuration payload does not match the expected tree shape: {e}");
                None
            }
        };

        Some(Self { raw: args, tree })
    }

    pub fn raw(&self) -> &Value {
        &self.raw
    }

    pub fn tree(&self) -> Option<&Configuration> {
        self.tree.as_ref()
    }

    /// The configuration's `id`, when it is a string.
    pub fn id(&self) -> Option<&str> {
        self.raw.get("id").and_then(Value::as_str)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
