//! The `{ name, args }` envelope carried across the embedding boundary.
//!
//! Both directions use the same shape.  `name` is a dotted tag in the
//! `elfsquad` namespace; `args` is any JSON value.
//!
//! ```json
//! {"name":"elfsquad.configurationUpdated","args":{"id":"c-1","steps":[]}}
//! {"name":"elfsquad.updateRequirement","args":{"nodeId":"n1","value":5,...}}
//! ```
//!
//! Inbound payloads are not required to be envelopes at all: anything the
//! page relays is logged, and only a payload whose `name` equals
//! [`CONFIGURATION_UPDATED`] changes harness state.  That is why the harness
//! inspects raw [`Value`]s through [`Envelope::name_of`] / [`Envelope::args_of`]
//! instead of deserializing into [`Envelope`] first.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Tag namespace shared by every message of the embedding protocol.
pub const NAMESPACE: &str = "elfsquad";

/// Inbound tag whose `args` carry the full current configuration.
pub const CONFIGURATION_UPDATED: &str = "elfsquad.configurationUpdated";

/// A named message with arbitrary JSON arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub name: String,
    #[serde(default)]
    pub args: Value,
}

impl Envelope {
    pub fn new(name: impl Into<String>, args: Value) -> Self {
        Self { name: name.into(), args }
    }

    /// Builds the fully-qualified tag for a bare command name,
    /// e.g. `updateRequirement` → `elfsquad.updateRequirement`.
    pub fn qualified(command: &str) -> String {
        format!("{NAMESPACE}.{command}")
    }

    /// The `name` field of a raw payload, when it is a string.
    pub fn name_of(payload: &Value) -> Option<&str> {
        payload.get("name").and_then(Value::as_str)
    }

    /// The `args` field of a raw payload; `Null` when absent.
    pub fn args_of(payload: &Value) -> Value {
        payload.get("args").cloned().unwrap_or(Value::Null)
    }

    pub fn is_configuration_updated(payload: &Value) -> bool {
        Self::name_of(payload) == Some(CONFIGURATION_UPDATED)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_qualified_prefixes_namespace() {
        assert_eq!(Envelope::qualified("updateRequirement"), "elfsquad.updateRequirement");
    }

    #[test]
    fn test_configuration_updated_is_detected() {
        let payload = json!({ "name": "elfsquad.configurationUpdated", "args": {} });
        assert!(Envelope::is_configuration_updated(&payload));
    }

    #[test]
    fn test_other_names_are_not_configuration_updated() {
        let payload = json!({ "name": "elfsquad.requirementsUpdated", "args": {} });
        assert!(!Envelope::is_configuration_updated(&payload));
    }

    #[test]
    fn test_non_object_payload_has_no_name() {
        assert_eq!(Envelope::name_of(&json!("just text")), None);
        assert_eq!(Envelope::name_of(&json!(42)), None);
        assert_eq!(Envelope::name_of(&json!({ "name": 7 })), None);
    }

    #[test]
    fn test_args_of_missing_args_is_null() {
        assert_eq!(Envelope::args_of(&json!({ "name": "x" })), Value::Null);
    }

    #[test]
    fn test_envelope_deserializes_without_args() {
        let env: Envelope = serde_json::from_str(r#"{"name":"elfsquad.ping"}"#).unwrap();
        assert_eq!(env.name, "elfsquad.ping");
        assert_eq!(env.args, Value::Null);
    }

    #[test]
    fn test_missing_name_field_returns_error() {
        let result: Result<Envelope, _> = serde_json::from_str(r#"{"args":{}}"#);
        assert!(result.is_err(), "an envelope without a name must not deserialize");
    }
}
