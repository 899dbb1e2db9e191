//! Azure provider implementation

use crate::azcli::{AzCli, CreateSqlDatabaseConfig};
use crate::error::{AzureError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use soraflow_cloud::{
    Action, ActionType, ApplyResult, AuthStatus, CloudProvider, Plan, ProviderState, ResourceSet,
    ResourceState, ResourceStatus,
};

/// Japanese label for plan descriptions and apply messages
fn type_label(resource_type: &str) -> &str {
    match resource_type {
        "resource-group" => "リソースグループ",
        "storage-account" => "ストレージアカウント",
        "app-service-plan" => "App Serviceプラン",
        "web-app" => "Webアプリ",
        "sql-server" => "SQLサーバー",
        "sql-database" => "SQLデータベース",
        "firewall-rule" => "ファイアウォールルール",
        other => other,
    }
}

/// Split a composite destroy id into (kind, name, server)
///
/// Plain resources use `kind:name`. Resources that live under a SQL
/// server use `kind:server/name`.
fn parse_destroy_id(resource_id: &str) -> Option<(&str, &str, Option<&str>)> {
    let (kind, rest) = resource_id.split_once(':')?;
    match rest.split_once('/') {
        Some((server, name)) => Some((kind, name, Some(server))),
        None => Some((kind, rest, None)),
    }
}

/// Deserialize the `config` detail of an action
fn parse_payload<T: serde::de::DeserializeOwned>(action: &Action) -> Result<T> {
    let config = action
        .details
        .get("config")
        .cloned()
        .unwrap_or(serde_json::Value::Null);
    Ok(serde_json::from_value(config)?)
}

/// Azure provider
///
/// Manages all resources inside a single resource group. Only the
/// group itself carries a location; everything else inherits it.
pub struct AzureProvider {
    azcli: AzCli,
    resource_group: String,
    location: String,
}

impl AzureProvider {
    pub fn new(resource_group: impl Into<String>, location: impl Into<String>) -> Self {
        let resource_group = resource_group.into();
        Self {
            azcli: AzCli::new(&resource_group),
            resource_group,
            location: location.into(),
        }
    }

    /// First access key of a storage account
    ///
    /// Exposed for output resolution; the key never enters the state
    /// file and is fetched on demand.
    pub async fn primary_storage_key(&self, account: &str) -> Result<String> {
        self.azcli.primary_storage_key(account).await
    }

    /// Collect the live state of everything in the resource group
    ///
    /// A missing resource group yields an empty state rather than an
    /// error, so planning against a fresh subscription works.
    async fn live_state(&self) -> Result<ProviderState> {
        let mut state = ProviderState::new();

        if !self.azcli.group_exists().await? {
            return Ok(state);
        }

        let mut group = ResourceState::new(self.resource_group.clone(), "resource-group")
            .with_status(ResourceStatus::Running);
        group.set_attribute("location", serde_json::json!(self.location));
        state.add(self.resource_group.clone(), group);

        for account in self.azcli.list_storage_accounts().await? {
            let mut resource = ResourceState::new(account.name.clone(), "storage-account")
                .with_status(ResourceStatus::Running);
            if let Some(sku) = &account.sku {
                resource.set_attribute("sku", serde_json::json!(sku.name));
            }
            if let Some(kind) = &account.kind {
                resource.set_attribute("kind", serde_json::json!(kind));
            }
            state.add(account.name, resource);
        }

        for plan in self.azcli.list_app_service_plans().await? {
            let mut resource = ResourceState::new(plan.name.clone(), "app-service-plan")
                .with_status(ResourceStatus::Running);
            if let Some(sku) = &plan.sku {
                resource.set_attribute("sku", serde_json::json!(sku.name));
            }
            state.add(plan.name, resource);
        }

        for app in self.azcli.list_webapps().await? {
            let status = if app.is_running() {
                ResourceStatus::Running
            } else {
                ResourceStatus::Stopped
            };
            let mut resource =
                ResourceState::new(app.name.clone(), "web-app").with_status(status);
            if let Some(host) = &app.default_host_name {
                resource.set_attribute("default_hostname", serde_json::json!(host));
            }
            state.add(app.name, resource);
        }

        for server in self.azcli.list_sql_servers().await? {
            let mut resource = ResourceState::new(server.name.clone(), "sql-server")
                .with_status(ResourceStatus::Running);
            if let Some(fqdn) = &server.fully_qualified_domain_name {
                resource.set_attribute("fqdn", serde_json::json!(fqdn));
            }
            if let Some(version) = &server.version {
                resource.set_attribute("version", serde_json::json!(version));
            }
            state.add(server.name.clone(), resource);

            for database in self.azcli.list_sql_databases(&server.name).await? {
                // master is a system database
                if database.name == "master" {
                    continue;
                }
                let status = if database.status.as_deref() == Some("Online") {
                    ResourceStatus::Running
                } else {
                    ResourceStatus::Unknown
                };
                let mut resource =
                    ResourceState::new(database.name.clone(), "sql-database").with_status(status);
                resource.set_attribute("server", serde_json::json!(server.name));
                if let Some(collation) = &database.collation {
                    resource.set_attribute("collation", serde_json::json!(collation));
                }
                state.add(database.name, resource);
            }

            for rule in self.azcli.list_firewall_rules(&server.name).await? {
                let mut resource = ResourceState::new(rule.name.clone(), "firewall-rule")
                    .with_status(ResourceStatus::Running);
                resource.set_attribute("server", serde_json::json!(server.name));
                if let Some(start) = &rule.start_ip_address {
                    resource.set_attribute("start_ip_address", serde_json::json!(start));
                }
                if let Some(end) = &rule.end_ip_address {
                    resource.set_attribute("end_ip_address", serde_json::json!(end));
                }
                state.add(rule.name, resource);
            }
        }

        Ok(state)
    }

    /// Execute a Create action and return the success message
    async fn apply_create(&self, action: &Action) -> Result<String> {
        match action.resource_type.as_str() {
            "resource-group" => {
                let payload: ResourceGroupPayload = parse_payload(action)?;
                let group = self.azcli.create_resource_group(&payload.location).await?;
                Ok(format!(
                    "リソースグループ {} を作成しました ({})",
                    group.name, group.location
                ))
            }
            "storage-account" => {
                let payload: StorageAccountPayload = parse_payload(action)?;
                let account = self
                    .azcli
                    .create_storage_account(&payload.name, &payload.sku, &payload.kind)
                    .await?;
                Ok(format!(
                    "ストレージアカウント {} を作成しました",
                    account.name
                ))
            }
            "app-service-plan" => {
                let payload: AppServicePlanPayload = parse_payload(action)?;
                let plan = self
                    .azcli
                    .create_app_service_plan(&payload.name, &payload.sku)
                    .await?;
                Ok(format!("App Serviceプラン {} を作成しました", plan.name))
            }
            "web-app" => {
                let payload: WebAppPayload = parse_payload(action)?;
                let app = self
                    .azcli
                    .create_webapp(&payload.name, &payload.server_farm, &payload.linux_fx_version)
                    .await?;
                match app.default_host_name {
                    Some(host) => Ok(format!(
                        "Webアプリ {} を作成しました (https://{})",
                        app.name, host
                    )),
                    None => Ok(format!("Webアプリ {} を作成しました", app.name)),
                }
            }
            "sql-server" => {
                let payload: SqlServerPayload = parse_payload(action)?;
                let server = self
                    .azcli
                    .create_sql_server(
                        &payload.name,
                        &payload.administrator_login,
                        &payload.administrator_password,
                    )
                    .await?;
                Ok(format!("SQLサーバー {} を作成しました", server.name))
            }
            "sql-database" => {
                let payload: SqlDatabasePayload = parse_payload(action)?;
                let config = CreateSqlDatabaseConfig {
                    name: payload.name,
                    server: payload.server,
                    edition: payload.tier,
                    capacity: payload.capacity,
                    max_size_bytes: payload.max_size_bytes,
                    collation: payload.collation,
                };
                let database = self.azcli.create_sql_database(&config).await?;
                Ok(format!("SQLデータベース {} を作成しました", database.name))
            }
            "firewall-rule" => {
                let payload: FirewallRulePayload = parse_payload(action)?;
                let rule = self
                    .azcli
                    .create_firewall_rule(
                        &payload.name,
                        &payload.server,
                        &payload.start_ip_address,
                        &payload.end_ip_address,
                    )
                    .await?;
                Ok(format!("ファイアウォールルール {} を作成しました", rule.name))
            }
            other => Err(AzureError::UnsupportedResource(other.to_string())),
        }
    }

    /// Execute a Delete action and return the success message
    async fn apply_delete(&self, action: &Action) -> Result<String> {
        let payload: DeletePayload = parse_payload(action)?;
        self.delete_by_kind(&action.resource_type, &payload.name, payload.server.as_deref())
            .await?;
        Ok(format!(
            "{} {} を削除しました",
            type_label(&action.resource_type),
            payload.name
        ))
    }

    /// Delete a single resource by kind and physical name
    async fn delete_by_kind(&self, kind: &str, name: &str, server: Option<&str>) -> Result<()> {
        match kind {
            "resource-group" => self.azcli.delete_resource_group().await,
            "storage-account" => self.azcli.delete_storage_account(name).await,
            "app-service-plan" => self.azcli.delete_app_service_plan(name).await,
            "web-app" => self.azcli.delete_webapp(name).await,
            "sql-server" => self.azcli.delete_sql_server(name).await,
            "sql-database" => {
                let server = server.ok_or_else(|| {
                    AzureError::ResourceNotFound(format!("no server given for database {name}"))
                })?;
                self.azcli.delete_sql_database(name, server).await
            }
            "firewall-rule" => {
                let server = server.ok_or_else(|| {
                    AzureError::ResourceNotFound(format!(
                        "no server given for firewall rule {name}"
                    ))
                })?;
                self.azcli.delete_firewall_rule(name, server).await
            }
            other => Err(AzureError::UnsupportedResource(other.to_string())),
        }
    }
}

#[async_trait]
impl CloudProvider for AzureProvider {
    fn name(&self) -> &str {
        "azure"
    }

    fn display_name(&self) -> &str {
        "Microsoft Azure"
    }

    async fn check_auth(&self) -> soraflow_cloud::Result<AuthStatus> {
        match self.azcli.check_auth().await {
            Ok(account) => Ok(AuthStatus::ok(format!("{} ({})", account.name, account.id))),
            Err(AzureError::AzNotFound) => {
                Ok(AuthStatus::failed("az CLI がインストールされていません"))
            }
            Err(e) => Ok(AuthStatus::failed(e.to_string())),
        }
    }

    async fn get_state(&self) -> soraflow_cloud::Result<ProviderState> {
        self.live_state()
            .await
            .map_err(|e| soraflow_cloud::CloudError::ApiError(e.to_string()))
    }

    async fn plan(&self, desired: &ResourceSet) -> soraflow_cloud::Result<Plan> {
        let current = self
            .live_state()
            .await
            .map_err(|e| soraflow_cloud::CloudError::ApiError(e.to_string()))?;

        let mut actions = Vec::new();

        for resource in desired.iter() {
            if resource.provider != "azure" {
                continue;
            }

            let Some(name) = resource.get_config::<String>("name") else {
                return Err(soraflow_cloud::CloudError::InvalidConfig(format!(
                    "resource {} has no name",
                    resource.key()
                )));
            };

            let exists = current
                .get(&name)
                .is_some_and(|r| r.resource_type == resource.resource_type);

            if exists {
                actions.push(Action {
                    id: format!("noop-{}", resource.id),
                    action_type: ActionType::NoOp,
                    resource_type: resource.resource_type.clone(),
                    resource_id: resource.id.clone(),
                    description: format!(
                        "{} {} は既に存在します",
                        type_label(&resource.resource_type),
                        name
                    ),
                    details: Default::default(),
                });
            } else {
                actions.push(Action {
                    id: format!("create-{}", resource.id),
                    action_type: ActionType::Create,
                    resource_type: resource.resource_type.clone(),
                    resource_id: resource.id.clone(),
                    description: format!(
                        "{} {} を作成",
                        type_label(&resource.resource_type),
                        name
                    ),
                    details: [("config".to_string(), resource.config.clone())]
                        .into_iter()
                        .collect(),
                });
            }
        }

        Ok(Plan::new(actions))
    }

    async fn apply(&self, plan: &Plan) -> soraflow_cloud::Result<ApplyResult> {
        let mut result = ApplyResult::new();
        let start = std::time::Instant::now();

        for action in &plan.actions {
            match action.action_type {
                ActionType::Create => {
                    tracing::info!("Creating {}: {}", action.resource_type, action.resource_id);

                    match self.apply_create(action).await {
                        Ok(message) => result.add_success(action.id.clone(), message),
                        Err(e) => {
                            result.add_failure(action.id.clone(), e.to_string());
                            break;
                        }
                    }
                }
                ActionType::Delete => {
                    tracing::info!("Deleting {}: {}", action.resource_type, action.resource_id);

                    match self.apply_delete(action).await {
                        Ok(message) => result.add_success(action.id.clone(), message),
                        Err(e) => {
                            result.add_failure(action.id.clone(), e.to_string());
                            break;
                        }
                    }
                }
                ActionType::Update => {
                    result.add_failure(
                        action.id.clone(),
                        "更新操作には対応していません".to_string(),
                    );
                    break;
                }
                ActionType::NoOp => {
                    // Nothing to do
                }
            }
        }

        result.duration_ms = start.elapsed().as_millis() as u64;
        Ok(result)
    }

    async fn destroy(&self, resource_id: &str) -> soraflow_cloud::Result<()> {
        let (kind, name, server) = parse_destroy_id(resource_id).ok_or_else(|| {
            soraflow_cloud::CloudError::InvalidConfig(format!(
                "invalid resource id: {resource_id} (expected kind:name)"
            ))
        })?;

        self.delete_by_kind(kind, name, server)
            .await
            .map_err(|e| soraflow_cloud::CloudError::ApiError(e.to_string()))
    }

    async fn destroy_all(&self) -> soraflow_cloud::Result<ApplyResult> {
        let mut result = ApplyResult::new();
        let start = std::time::Instant::now();

        let exists = self
            .azcli
            .group_exists()
            .await
            .map_err(|e| soraflow_cloud::CloudError::ApiError(e.to_string()))?;
        if !exists {
            return Ok(result);
        }

        // Children before parents. Deleting a SQL server cascades its
        // databases and firewall rules, so those need no entries here.
        let mut targets: Vec<(&str, String)> = Vec::new();
        for app in self
            .azcli
            .list_webapps()
            .await
            .map_err(|e| soraflow_cloud::CloudError::ApiError(e.to_string()))?
        {
            targets.push(("web-app", app.name));
        }
        for plan in self
            .azcli
            .list_app_service_plans()
            .await
            .map_err(|e| soraflow_cloud::CloudError::ApiError(e.to_string()))?
        {
            targets.push(("app-service-plan", plan.name));
        }
        for server in self
            .azcli
            .list_sql_servers()
            .await
            .map_err(|e| soraflow_cloud::CloudError::ApiError(e.to_string()))?
        {
            targets.push(("sql-server", server.name));
        }
        for account in self
            .azcli
            .list_storage_accounts()
            .await
            .map_err(|e| soraflow_cloud::CloudError::ApiError(e.to_string()))?
        {
            targets.push(("storage-account", account.name));
        }
        targets.push(("resource-group", self.resource_group.clone()));

        for (kind, name) in targets {
            tracing::info!("Deleting {}: {}", kind, name);

            match self.delete_by_kind(kind, &name, None).await {
                Ok(()) => result.add_success(
                    format!("delete-{name}"),
                    format!("{} {} を削除しました", type_label(kind), name),
                ),
                Err(e) => {
                    result.add_failure(format!("delete-{name}"), e.to_string());
                    break;
                }
            }
        }

        result.duration_ms = start.elapsed().as_millis() as u64;
        Ok(result)
    }
}

/// Payloads deserialized from a Create action's config
///
/// Unknown fields are ignored, so each payload lists only what its
/// az invocation needs.
#[derive(Debug, Deserialize)]
struct ResourceGroupPayload {
    location: String,
}

#[derive(Debug, Deserialize)]
struct StorageAccountPayload {
    name: String,
    sku: String,
    kind: String,
}

#[derive(Debug, Deserialize)]
struct AppServicePlanPayload {
    name: String,
    sku: String,
}

#[derive(Debug, Deserialize)]
struct WebAppPayload {
    name: String,
    server_farm: String,
    linux_fx_version: String,
}

#[derive(Debug, Deserialize)]
struct SqlServerPayload {
    name: String,
    administrator_login: String,
    administrator_password: String,
}

#[derive(Debug, Deserialize)]
struct SqlDatabasePayload {
    name: String,
    server: String,
    tier: String,
    capacity: u32,
    max_size_bytes: i64,
    collation: String,
}

#[derive(Debug, Deserialize)]
struct FirewallRulePayload {
    name: String,
    server: String,
    start_ip_address: String,
    end_ip_address: String,
}

#[derive(Debug, Deserialize)]
struct DeletePayload {
    name: String,
    #[serde(default)]
    server: Option<String>,
}
