//! tfplug - Terraform Plugin Framework for Rust
//!
//! A framework for building Terraform providers in Rust: the Terraform value
//! model, schemas, validators, plan modifiers, the provider/resource/data
//! source traits and an in-process host that plans and applies changes.

// Core modules
pub mod context;
pub mod error;
pub mod schema;
pub mod types;
pub mod value;

// Provider API modules
pub mod data_source;
pub mod provider;
pub mod resource;

// Helper modules
pub mod plan_modifier;
pub mod validator;

// Host
pub mod server;

// Re-exports for convenience
pub use context::Context;
pub use data_source::{DataSource, DataSourceWithConfigure};
pub use error::{Result, TfplugError};
pub use provider::{DataSourceFactory, Provider, ResourceFactory};
pub use resource::{Resource, ResourceWithConfigure};
pub use schema::{AttributeBuilder, AttributeType, Schema, SchemaBuilder};
pub use server::ProviderServer;
pub use types::{AttributePath, Diagnostic, Diagnostics, Dynamic, DynamicValue};
pub use value::{AttributeValue, List, Model, ObjectReader, Value};
