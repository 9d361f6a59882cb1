//! Core domain types and capabilities for droidconf.
//!
//! This crate contains:
//! - The resolved build descriptor model
//! - Validated package names and Java language levels
//! - The SDK info provider capability
//! - The signing config store capability

pub mod descriptor;
pub mod error;
pub mod identifier;
pub mod java;
pub mod sdk;
pub mod signing;

pub use error::{Error, Result};
pub use identifier::PackageName;
pub use java::JavaVersion;
pub use sdk::{SdkInfoProvider, SdkProperty, StaticSdkInfo};
pub use signing::{SigningConfigStore, StaticSigningConfigStore};
