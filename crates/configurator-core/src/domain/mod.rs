//! Domain layer for configurator-core.
//!
//! Pure data types describing what the embedded configurator reports about a
//! product: the configuration tree and the snapshot the harness holds of it.
//! Nothing in here performs I/O or knows about the embedding transport.

pub mod configuration;

pub use configuration::{
    Configuration, ConfigurationSnapshot, FeatureNode, FeatureType, LinkedConfigurationModel, Step,
};
