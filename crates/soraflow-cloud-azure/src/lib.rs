//! Azure provider for soraflow
//!
//! This crate implements the CloudProvider trait for Microsoft Azure,
//! enabling soraflow to manage a web stack (resource group, storage,
//! App Service plan, web apps, SQL server) through the `az` CLI.
//!
//! # Requirements
//!
//! - The `az` CLI must be installed and logged in (`az login`)
//! - All resources live in a single resource group; resources other
//!   than the group itself inherit its location
//!
//! # Example
//!
//! ```ignore
//! use soraflow_cloud_azure::AzureProvider;
//! use soraflow_cloud::CloudProvider;
//!
//! let provider = AzureProvider::new("webstack-rg", "southeastasia");
//!
//! // Check authentication
//! let auth = provider.check_auth().await?;
//! if !auth.authenticated {
//!     panic!("Not authenticated: {:?}", auth.error);
//! }
//!
//! // Get current state
//! let state = provider.get_state().await?;
//! ```

pub mod azcli;
pub mod error;
pub mod provider;

pub use azcli::{AzCli, StorageKey, runtime_cli_form};
pub use error::{AzureError, Result};
pub use provider::AzureProvider;
