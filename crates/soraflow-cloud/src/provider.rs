//! Cloud provider trait definition

use crate::action::{ApplyResult, Plan};
use crate::error::Result;
use crate::state::ProviderState;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Cloud provider abstraction trait
///
/// Providers implement this trait to expose a unified plan/apply
/// interface for resource management.
#[async_trait]
pub trait CloudProvider: Send + Sync {
    /// Returns the provider name (e.g., "azure")
    fn name(&self) -> &str;

    /// Returns the provider display name for UI
    fn display_name(&self) -> &str;

    /// Check if the provider is properly configured and authenticated
    async fn check_auth(&self) -> Result<AuthStatus>;

    /// Get the current state of all resources managed by this provider
    async fn get_state(&self) -> Result<ProviderState>;

    /// Calculate the diff between desired and current state
    ///
    /// The returned plan preserves the declaration order of `desired`.
    async fn plan(&self, desired: &ResourceSet) -> Result<Plan>;

    /// Apply the planned actions
    ///
    /// Actions run sequentially in plan order. Execution stops at the
    /// first failure; no action is retried.
    async fn apply(&self, plan: &Plan) -> Result<ApplyResult>;

    /// Destroy a specific resource
    async fn destroy(&self, resource_id: &str) -> Result<()>;

    /// Destroy all resources managed by this provider
    async fn destroy_all(&self) -> Result<ApplyResult>;
}

/// Authentication status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthStatus {
    /// Whether authentication is valid
    pub authenticated: bool,

    /// Account/user information if available
    pub account_info: Option<String>,

    /// Error message if not authenticated
    pub error: Option<String>,
}

impl AuthStatus {
    pub fn ok(account_info: impl Into<String>) -> Self {
        Self {
            authenticated: true,
            account_info: Some(account_info.into()),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            authenticated: false,
            account_info: None,
            error: Some(error.into()),
        }
    }
}

/// Set of resources to be managed
///
/// Resources keep their declaration order: providers create them in
/// this order and destroy them in reverse.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceSet {
    resources: Vec<ResourceConfig>,
}

impl ResourceSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, resource: ResourceConfig) {
        self.resources.push(resource);
    }

    pub fn get(&self, resource_type: &str, id: &str) -> Option<&ResourceConfig> {
        self.resources
            .iter()
            .find(|r| r.resource_type == resource_type && r.id == id)
    }

    /// Iterate in declaration order
    pub fn iter(&self) -> impl Iterator<Item = &ResourceConfig> {
        self.resources.iter()
    }

    pub fn by_type(&self, resource_type: &str) -> Vec<&ResourceConfig> {
        self.resources
            .iter()
            .filter(|r| r.resource_type == resource_type)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

/// Configuration for a cloud resource
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceConfig {
    /// Resource type (e.g., "resource-group", "web-app")
    pub resource_type: String,

    /// Resource identifier (logical name within the topology)
    pub id: String,

    /// Provider name
    pub provider: String,

    /// Resource-specific configuration
    pub config: serde_json::Value,
}

impl ResourceConfig {
    pub fn new(
        resource_type: impl Into<String>,
        id: impl Into<String>,
        provider: impl Into<String>,
        config: serde_json::Value,
    ) -> Self {
        Self {
            resource_type: resource_type.into(),
            id: id.into(),
            provider: provider.into(),
            config,
        }
    }

    /// Get the full resource key (type:id)
    pub fn key(&self) -> String {
        format!("{}:{}", self.resource_type, self.id)
    }

    /// Get a configuration value as a specific type
    pub fn get_config<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.config
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(resource_type: &str, id: &str) -> ResourceConfig {
        ResourceConfig::new(resource_type, id, "azure", serde_json::json!({}))
    }

    #[test]
    fn test_resource_set_preserves_declaration_order() {
        let mut set = ResourceSet::new();
        set.add(config("resource-group", "main"));
        set.add(config("storage-account", "storage"));
        set.add(config("app-service-plan", "plan"));
        set.add(config("web-app", "frontend"));

        let ids: Vec<&str> = set.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["main", "storage", "plan", "frontend"]);
        assert_eq!(set.len(), 4);
    }

    #[test]
    fn test_resource_set_get_by_type_and_id() {
        let mut set = ResourceSet::new();
        set.add(config("web-app", "frontend"));
        set.add(config("web-app", "backend"));

        assert!(set.get("web-app", "backend").is_some());
        assert!(set.get("web-app", "missing").is_none());
        assert!(set.get("sql-server", "frontend").is_none());
        assert_eq!(set.by_type("web-app").len(), 2);
    }

    #[test]
    fn test_get_config_typed() {
        let resource = ResourceConfig::new(
            "sql-database",
            "database",
            "azure",
            serde_json::json!({ "capacity": 5, "collation": "SQL_Latin1_General_CP1_CI_AS" }),
        );

        assert_eq!(resource.get_config::<u32>("capacity"), Some(5));
        assert_eq!(
            resource.get_config::<String>("collation").as_deref(),
            Some("SQL_Latin1_General_CP1_CI_AS")
        );
        assert_eq!(resource.get_config::<u32>("missing"), None);
        assert_eq!(resource.key(), "sql-database:database");
    }
}
