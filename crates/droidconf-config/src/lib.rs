//! Descriptor parsing and resolution for droidconf.
//!
//! This crate handles:
//! - Tokenizing and parsing Gradle Kotlin DSL module descriptors
//! - Resolving them into a validated `BuildDescriptor`
//! - Plugin ordering checks
//! - Canonical rendering
//! - SDK info from Flutter's `local.properties`

pub mod ast;
pub mod error;
pub mod lexer;
pub mod local_properties;
pub mod parser;
pub mod plugins;
pub mod render;
pub mod resolver;

pub use error::{ConfigError, ConfigResult, Location};
pub use local_properties::LocalPropertiesProvider;
pub use parser::parse_document;
pub use render::render;
pub use resolver::{CompatibilityPolicy, ResolveOptions, Resolver, resolve};
