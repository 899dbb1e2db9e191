//! az CLI wrapper
//!
//! Wraps the Azure CLI for resource operations. Every wrapper is scoped
//! to a single resource group; resources other than the group itself
//! inherit its location, so only `group create` takes `--location`.

use crate::error::{AzureError, Result};
use serde::{Deserialize, Serialize};
use std::process::Stdio;
use tokio::process::Command;

/// az CLI wrapper
pub struct AzCli {
    resource_group: String,
}

impl AzCli {
    pub fn new(resource_group: impl Into<String>) -> Self {
        Self {
            resource_group: resource_group.into(),
        }
    }

    /// Check if az is installed and logged in
    pub async fn check_auth(&self) -> Result<AccountInfo> {
        // Check if az exists
        let which = Command::new("which").arg("az").output().await?;

        if !which.status.success() {
            return Err(AzureError::AzNotFound);
        }

        self.account_show().await
    }

    /// Current account (`az account show`)
    ///
    /// Fails with AuthenticationFailed when no login session exists.
    pub async fn account_show(&self) -> Result<AccountInfo> {
        let output = self
            .run_command(&["account", "show", "--output", "json"])
            .await
            .map_err(|e| match e {
                AzureError::CommandFailed(msg) => AzureError::AuthenticationFailed(msg),
                other => other,
            })?;

        let account: AccountInfo = serde_json::from_str(&output)?;
        Ok(account)
    }

    /// Run an az command and return stdout
    async fn run_command(&self, args: &[&str]) -> Result<String> {
        let mut cmd = Command::new("az");
        cmd.args(args);
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        tracing::debug!("Running: az {}", display_args(args));

        let output = cmd.output().await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AzureError::CommandFailed(stderr.to_string()));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    // --- Resource group ---

    /// Whether the resource group exists (`az group exists` prints true/false)
    pub async fn group_exists(&self) -> Result<bool> {
        let output = self
            .run_command(&["group", "exists", "--name", &self.resource_group])
            .await?;
        Ok(output.trim() == "true")
    }

    pub async fn create_resource_group(&self, location: &str) -> Result<ResourceGroupInfo> {
        let output = self
            .run_command(&[
                "group",
                "create",
                "--name",
                &self.resource_group,
                "--location",
                location,
                "--output",
                "json",
            ])
            .await?;

        let group: ResourceGroupInfo = serde_json::from_str(&output)?;
        Ok(group)
    }

    /// Delete the resource group and everything in it
    pub async fn delete_resource_group(&self) -> Result<()> {
        self.run_command(&["group", "delete", "--name", &self.resource_group, "--yes"])
            .await?;
        Ok(())
    }

    // --- Storage accounts ---

    pub async fn list_storage_accounts(&self) -> Result<Vec<StorageAccountInfo>> {
        let output = self
            .run_command(&[
                "storage",
                "account",
                "list",
                "--resource-group",
                &self.resource_group,
                "--output",
                "json",
            ])
            .await?;

        parse_list(&output)
    }

    pub async fn create_storage_account(
        &self,
        name: &str,
        sku: &str,
        kind: &str,
    ) -> Result<StorageAccountInfo> {
        let output = self
            .run_command(&[
                "storage",
                "account",
                "create",
                "--name",
                name,
                "--resource-group",
                &self.resource_group,
                "--sku",
                sku,
                "--kind",
                kind,
                "--output",
                "json",
            ])
            .await?;

        let account: StorageAccountInfo = serde_json::from_str(&output)?;
        Ok(account)
    }

    pub async fn delete_storage_account(&self, name: &str) -> Result<()> {
        self.run_command(&[
            "storage",
            "account",
            "delete",
            "--name",
            name,
            "--resource-group",
            &self.resource_group,
            "--yes",
        ])
        .await?;
        Ok(())
    }

    /// List access keys for a storage account
    pub async fn list_storage_keys(&self, account: &str) -> Result<Vec<StorageKey>> {
        let output = self
            .run_command(&[
                "storage",
                "account",
                "keys",
                "list",
                "--account-name",
                account,
                "--resource-group",
                &self.resource_group,
                "--output",
                "json",
            ])
            .await?;

        parse_list(&output)
    }

    /// First access key of a storage account
    ///
    /// Azure returns the keys as an ordered list; the first entry is
    /// key1. A rotation that reorders the list would change which key
    /// this returns.
    pub async fn primary_storage_key(&self, account: &str) -> Result<String> {
        let keys = self.list_storage_keys(account).await?;
        keys.into_iter()
            .next()
            .map(|k| k.value)
            .ok_or_else(|| AzureError::ResourceNotFound(format!("no keys for account {account}")))
    }

    // --- App Service plans ---

    pub async fn list_app_service_plans(&self) -> Result<Vec<AppServicePlanInfo>> {
        let output = self
            .run_command(&[
                "appservice",
                "plan",
                "list",
                "--resource-group",
                &self.resource_group,
                "--output",
                "json",
            ])
            .await?;

        parse_list(&output)
    }

    pub async fn create_app_service_plan(
        &self,
        name: &str,
        sku: &str,
    ) -> Result<AppServicePlanInfo> {
        let output = self
            .run_command(&[
                "appservice",
                "plan",
                "create",
                "--name",
                name,
                "--resource-group",
                &self.resource_group,
                "--is-linux",
                "--sku",
                sku,
                "--output",
                "json",
            ])
            .await?;

        let plan: AppServicePlanInfo = serde_json::from_str(&output)?;
        Ok(plan)
    }

    pub async fn delete_app_service_plan(&self, name: &str) -> Result<()> {
        self.run_command(&[
            "appservice",
            "plan",
            "delete",
            "--name",
            name,
            "--resource-group",
            &self.resource_group,
            "--yes",
        ])
        .await?;
        Ok(())
    }

    // --- Web apps ---

    pub async fn list_webapps(&self) -> Result<Vec<WebAppInfo>> {
        let output = self
            .run_command(&[
                "webapp",
                "list",
                "--resource-group",
                &self.resource_group,
                "--output",
                "json",
            ])
            .await?;

        parse_list(&output)
    }

    pub async fn create_webapp(
        &self,
        name: &str,
        plan: &str,
        linux_fx_version: &str,
    ) -> Result<WebAppInfo> {
        let runtime = runtime_cli_form(linux_fx_version);

        let output = self
            .run_command(&[
                "webapp",
                "create",
                "--name",
                name,
                "--resource-group",
                &self.resource_group,
                "--plan",
                plan,
                "--runtime",
                &runtime,
                "--output",
                "json",
            ])
            .await?;

        let app: WebAppInfo = serde_json::from_str(&output)?;
        Ok(app)
    }

    pub async fn delete_webapp(&self, name: &str) -> Result<()> {
        self.run_command(&[
            "webapp",
            "delete",
            "--name",
            name,
            "--resource-group",
            &self.resource_group,
        ])
        .await?;
        Ok(())
    }

    // --- SQL servers ---

    pub async fn list_sql_servers(&self) -> Result<Vec<SqlServerInfo>> {
        let output = self
            .run_command(&[
                "sql",
                "server",
                "list",
                "--resource-group",
                &self.resource_group,
                "--output",
                "json",
            ])
            .await?;

        parse_list(&output)
    }

    pub async fn create_sql_server(
        &self,
        name: &str,
        admin_user: &str,
        admin_password: &str,
    ) -> Result<SqlServerInfo> {
        let output = self
            .run_command(&[
                "sql",
                "server",
                "create",
                "--name",
                name,
                "--resource-group",
                &self.resource_group,
                "--admin-user",
                admin_user,
                "--admin-password",
                admin_password,
                "--output",
                "json",
            ])
            .await?;

        let server: SqlServerInfo = serde_json::from_str(&output)?;
        Ok(server)
    }

    pub async fn delete_sql_server(&self, name: &str) -> Result<()> {
        self.run_command(&[
            "sql",
            "server",
            "delete",
            "--name",
            name,
            "--resource-group",
            &self.resource_group,
            "--yes",
        ])
        .await?;
        Ok(())
    }

    // --- SQL databases ---

    pub async fn list_sql_databases(&self, server: &str) -> Result<Vec<SqlDatabaseInfo>> {
        let output = self
            .run_command(&[
                "sql",
                "db",
                "list",
                "--server",
                server,
                "--resource-group",
                &self.resource_group,
                "--output",
                "json",
            ])
            .await?;

        parse_list(&output)
    }

    pub async fn create_sql_database(
        &self,
        config: &CreateSqlDatabaseConfig,
    ) -> Result<SqlDatabaseInfo> {
        // Store string conversions to extend their lifetime
        let capacity_str = config.capacity.to_string();
        let max_size_str = config.max_size_bytes.to_string();

        let output = self
            .run_command(&[
                "sql",
                "db",
                "create",
                "--name",
                config.name.as_str(),
                "--server",
                config.server.as_str(),
                "--resource-group",
                &self.resource_group,
                "--edition",
                config.edition.as_str(),
                "--capacity",
                capacity_str.as_str(),
                "--max-size",
                max_size_str.as_str(),
                "--collation",
                config.collation.as_str(),
                "--output",
                "json",
            ])
            .await?;

        let database: SqlDatabaseInfo = serde_json::from_str(&output)?;
        Ok(database)
    }

    pub async fn delete_sql_database(&self, name: &str, server: &str) -> Result<()> {
        self.run_command(&[
            "sql",
            "db",
            "delete",
            "--name",
            name,
            "--server",
            server,
            "--resource-group",
            &self.resource_group,
            "--yes",
        ])
        .await?;
        Ok(())
    }

    // --- SQL firewall rules ---

    pub async fn list_firewall_rules(&self, server: &str) -> Result<Vec<FirewallRuleInfo>> {
        let output = self
            .run_command(&[
                "sql",
                "server",
                "firewall-rule",
                "list",
                "--server",
                server,
                "--resource-group",
                &self.resource_group,
                "--output",
                "json",
            ])
            .await?;

        parse_list(&output)
    }

    pub async fn create_firewall_rule(
        &self,
        name: &str,
        server: &str,
        start_ip: &str,
        end_ip: &str,
    ) -> Result<FirewallRuleInfo> {
        let output = self
            .run_command(&[
                "sql",
                "server",
                "firewall-rule",
                "create",
                "--name",
                name,
                "--server",
                server,
                "--resource-group",
                &self.resource_group,
                "--start-ip-address",
                start_ip,
                "--end-ip-address",
                end_ip,
                "--output",
                "json",
            ])
            .await?;

        let rule: FirewallRuleInfo = serde_json::from_str(&output)?;
        Ok(rule)
    }

    pub async fn delete_firewall_rule(&self, name: &str, server: &str) -> Result<()> {
        self.run_command(&[
            "sql",
            "server",
            "firewall-rule",
            "delete",
            "--name",
            name,
            "--server",
            server,
            "--resource-group",
            &self.resource_group,
        ])
        .await?;
        Ok(())
    }
}

/// Convert a linuxFxVersion runtime id to the form `az webapp create` expects
///
/// ARM templates use `NODE|16-lts`; the CLI wants `NODE:16-lts`.
pub fn runtime_cli_form(linux_fx_version: &str) -> String {
    linux_fx_version.replace('|', ":")
}

/// Render args for logging with the admin password masked
fn display_args(args: &[&str]) -> String {
    let mut rendered: Vec<&str> = Vec::with_capacity(args.len());
    let mut mask_next = false;
    for arg in args {
        if mask_next {
            rendered.push("********");
            mask_next = false;
            continue;
        }
        if *arg == "--admin-password" {
            mask_next = true;
        }
        rendered.push(arg);
    }
    rendered.join(" ")
}

/// Parse a JSON array, treating empty output as an empty list
fn parse_list<T: serde::de::DeserializeOwned>(output: &str) -> Result<Vec<T>> {
    let trimmed = output.trim();
    if trimmed.is_empty() || trimmed == "[]" {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_str(trimmed)?)
}

/// Account information from `az account show`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountInfo {
    pub id: String,
    pub name: String,
    pub user: Option<AccountUser>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountUser {
    pub name: String,
}

/// Resource group information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceGroupInfo {
    pub name: String,
    pub location: String,
}

/// SKU block shared by several resource kinds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkuInfo {
    pub name: String,
    pub tier: Option<String>,
    pub capacity: Option<u32>,
}

/// Storage account information
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageAccountInfo {
    pub name: String,
    pub kind: Option<String>,
    pub sku: Option<SkuInfo>,
    pub provisioning_state: Option<String>,
}

/// Storage access key from `az storage account keys list`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageKey {
    pub key_name: String,
    pub value: String,
    pub permissions: Option<String>,
}

/// App Service plan information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppServicePlanInfo {
    pub name: String,
    pub kind: Option<String>,
    pub reserved: Option<bool>,
    pub sku: Option<SkuInfo>,
    pub status: Option<String>,
}

/// Web app information
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebAppInfo {
    pub name: String,
    pub default_host_name: Option<String>,
    pub state: Option<String>,
}

impl WebAppInfo {
    /// Check if the app is running
    pub fn is_running(&self) -> bool {
        self.state.as_deref() == Some("Running")
    }
}

/// SQL server information
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SqlServerInfo {
    pub name: String,
    pub fully_qualified_domain_name: Option<String>,
    pub administrator_login: Option<String>,
    pub version: Option<String>,
    pub state: Option<String>,
}

/// SQL database information
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SqlDatabaseInfo {
    pub name: String,
    pub status: Option<String>,
    pub collation: Option<String>,
    pub max_size_bytes: Option<i64>,
    pub sku: Option<SkuInfo>,
}

/// SQL firewall rule information
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FirewallRuleInfo {
    pub name: String,
    pub start_ip_address: Option<String>,
    pub end_ip_address: Option<String>,
}

/// Configuration for creating a SQL database
#[derive(Debug, Clone)]
pub struct CreateSqlDatabaseConfig {
    pub name: String,
    pub server: String,
    pub edition: String,
    pub capacity: u32,
    pub max_size_bytes: i64,
    pub collation: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runtime_cli_form() {
        assert_eq!(runtime_cli_form("NODE|16-lts"), "NODE:16-lts");
        assert_eq!(runtime_cli_form("PYTHON|3.11"), "PYTHON:3.11");
        assert_eq!(runtime_cli_form("NODE:16-lts"), "NODE:16-lts");
    }

    #[test]
    fn test_display_args_masks_admin_password() {
        let args = [
            "sql",
            "server",
            "create",
            "--admin-user",
            "sqladminuser",
            "--admin-password",
            "s3cret_@%value",
            "--output",
            "json",
        ];

        let rendered = display_args(&args);

        assert!(!rendered.contains("s3cret_@%value"));
        assert!(rendered.contains("--admin-password ********"));
        assert!(rendered.contains("--admin-user sqladminuser"));
    }

    #[test]
    fn test_parse_storage_keys() {
        let json = r#"[
            {"creationTime": "2024-01-01T00:00:00Z", "keyName": "key1", "permissions": "FULL", "value": "base64key1=="},
            {"creationTime": "2024-01-01T00:00:00Z", "keyName": "key2", "permissions": "FULL", "value": "base64key2=="}
        ]"#;

        let keys: Vec<StorageKey> = parse_list(json).unwrap();

        assert_eq!(keys.len(), 2);
        assert_eq!(keys[0].key_name, "key1");
        assert_eq!(keys[0].value, "base64key1==");
    }

    #[test]
    fn test_parse_empty_list() {
        let keys: Vec<StorageKey> = parse_list("  \n").unwrap();
        assert!(keys.is_empty());

        let keys: Vec<StorageKey> = parse_list("[]").unwrap();
        assert!(keys.is_empty());
    }

    #[test]
    fn test_parse_webapp_info() {
        let json = r#"{
            "name": "webstack-frontend",
            "defaultHostName": "webstack-frontend.azurewebsites.net",
            "state": "Running",
            "enabled": true
        }"#;

        let app: WebAppInfo = serde_json::from_str(json).unwrap();

        assert_eq!(app.name, "webstack-frontend");
        assert_eq!(
            app.default_host_name.as_deref(),
            Some("webstack-frontend.azurewebsites.net")
        );
        assert!(app.is_running());
    }

    #[test]
    fn test_parse_sql_server_info() {
        let json = r#"{
            "name": "webstack-sql",
            "fullyQualifiedDomainName": "webstack-sql.database.windows.net",
            "administratorLogin": "sqladminuser",
            "version": "12.0",
            "state": "Ready"
        }"#;

        let server: SqlServerInfo = serde_json::from_str(json).unwrap();

        assert_eq!(server.name, "webstack-sql");
        assert_eq!(
            server.fully_qualified_domain_name.as_deref(),
            Some("webstack-sql.database.windows.net")
        );
        assert_eq!(server.version.as_deref(), Some("12.0"));
    }

    #[test]
    fn test_parse_firewall_rule_info() {
        let json = r#"{
            "name": "allow-azure-services",
            "startIpAddress": "0.0.0.0",
            "endIpAddress": "0.0.0.0"
        }"#;

        let rule: FirewallRuleInfo = serde_json::from_str(json).unwrap();

        assert_eq!(rule.name, "allow-azure-services");
        assert_eq!(rule.start_ip_address.as_deref(), Some("0.0.0.0"));
        assert_eq!(rule.end_ip_address.as_deref(), Some("0.0.0.0"));
    }

    #[test]
    fn test_parse_account_info() {
        let json = r#"{
            "environmentName": "AzureCloud",
            "id": "00000000-0000-0000-0000-000000000000",
            "isDefault": true,
            "name": "My Subscription",
            "user": {"name": "mito@chronista.club", "type": "user"}
        }"#;

        let account: AccountInfo = serde_json::from_str(json).unwrap();

        assert_eq!(account.name, "My Subscription");
        assert_eq!(account.user.unwrap().name, "mito@chronista.club");
    }
}
