//! Embedding-protocol types.
//!
//! ```text
//! Configurator → Harness:  Envelope { name: "elfsquad.configurationUpdated", args: Configuration }
//!                          Envelope { name: <anything else>, args: ... }   (logged only)
//! Harness → Configurator:  Command  →  Envelope { name: "elfsquad.<command>", args: {...} }
//! ```

pub mod commands;
pub mod envelope;

pub use commands::{
    Command, ImageValueArgs, LinkedCardinalityArgs, RemoveLinkedArgs, RequirementArgs,
    RequirementRow, RequirementsArgs, TextValueArgs,
};
pub use envelope::{Envelope, CONFIGURATION_UPDATED, NAMESPACE};
