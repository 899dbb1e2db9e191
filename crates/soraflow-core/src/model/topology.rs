//! トポロジー定義
//!
//! スタック設定から固定形状のリソースグラフ（リソースグループ、
//! ストレージ、App Serviceプラン、Webアプリ×2、SQLサーバー一式）を
//! 構築し、参照整合性を検証します。

use crate::error::{Result, TopologyError};
use crate::model::resource::{
    AppServicePlanSpec, FirewallRuleSpec, RandomPasswordSpec, ResourceGroupSpec, ResourceKind,
    ResourceNode, ResourceSpec, SqlDatabaseSpec, SqlServerSpec, StorageAccountSpec, WebAppSpec,
};
use crate::model::stack::StackConfig;
use crate::naming;
use crate::password::{PasswordPolicy, Secret};
use serde::Serialize;
use std::collections::HashSet;

/// SQLデータベースの最大サイズ（2GB）
const SQL_DATABASE_MAX_SIZE_BYTES: i64 = 2_147_483_648;

/// SQLデータベースの照合順序
const SQL_DATABASE_COLLATION: &str = "SQL_Latin1_General_CP1_CI_AS";

/// Azureプラットフォームサービスからのアクセスを許可する番兵アドレス
const AZURE_SERVICES_SENTINEL: &str = "0.0.0.0";

/// 名前付き出力
#[derive(Debug, Clone, Serialize)]
pub struct Output {
    /// 出力名
    pub name: &'static str,

    /// 秘密値かどうか（表示時にマスクされる）
    pub secret: bool,

    /// 値の取得元
    pub source: OutputSource,
}

/// 出力値の取得元
///
/// 出力の解決は純粋な読み取りであり、リソースを作成しません。
#[derive(Debug, Clone, Serialize)]
pub enum OutputSource {
    /// 宣言時に確定する値
    Value(String),

    /// 適用後にステートへ記録される属性
    Attribute {
        /// 参照先リソースの論理名
        resource: String,
        /// 属性キー
        key: &'static str,
        /// 表示時に前置する文字列（URLスキームなど）
        prefix: Option<&'static str>,
    },

    /// ストレージアカウントのキー一覧の先頭キー（ライブ読み取り）
    PrimaryStorageKey {
        /// 参照先ストレージアカウントの論理名
        account: String,
    },
}

/// Azureリソースのトポロジー
///
/// ノードは宣言順に保持され、作成もこの順序で行われます。
/// 削除は逆順です。
#[derive(Debug, Clone, Serialize)]
pub struct Topology {
    pub project: String,
    pub location: String,
    pub nodes: Vec<ResourceNode>,
    pub outputs: Vec<Output>,
}

impl Topology {
    /// 固定形状のトポロジーを宣言
    ///
    /// パスワードは呼び出し側で一度だけ確定させます。ここで
    /// パスワードノードとSQLサーバーの両方へ同じ値が引き渡されるため、
    /// 再導出による不整合は起こりません。
    pub fn declare(stack: &StackConfig, sql_password: Secret) -> Result<Self> {
        let group = naming::resource_group_name(&stack.name);
        let storage = naming::storage_account_name(&stack.name);
        let plan = naming::service_plan_name(&stack.name);
        let frontend = naming::web_app_name(&stack.name, "frontend");
        let backend = naming::web_app_name(&stack.name, "backend");
        let sql_server = naming::sql_server_name(&stack.name);
        let sql_database = naming::sql_database_name(&stack.name);

        let nodes = vec![
            ResourceNode {
                id: "main".to_string(),
                kind: ResourceKind::ResourceGroup,
                depends_on: vec![],
                provider: "azure",
                spec: ResourceSpec::ResourceGroup(ResourceGroupSpec {
                    name: group.clone(),
                    location: stack.location.clone(),
                }),
            },
            ResourceNode {
                id: "storage".to_string(),
                kind: ResourceKind::StorageAccount,
                depends_on: vec!["main".to_string()],
                provider: "azure",
                spec: ResourceSpec::StorageAccount(StorageAccountSpec {
                    name: storage,
                    resource_group: group.clone(),
                    sku: "Standard_LRS".to_string(),
                    kind: "StorageV2".to_string(),
                }),
            },
            ResourceNode {
                id: "plan".to_string(),
                kind: ResourceKind::AppServicePlan,
                depends_on: vec!["main".to_string()],
                provider: "azure",
                spec: ResourceSpec::AppServicePlan(AppServicePlanSpec {
                    name: plan.clone(),
                    resource_group: group.clone(),
                    sku: "B1".to_string(),
                    tier: "Basic".to_string(),
                    kind: "Linux".to_string(),
                    reserved: true,
                }),
            },
            ResourceNode {
                id: "frontend".to_string(),
                kind: ResourceKind::WebApp,
                depends_on: vec!["main".to_string(), "plan".to_string()],
                provider: "azure",
                spec: ResourceSpec::WebApp(WebAppSpec {
                    name: frontend,
                    resource_group: group.clone(),
                    server_farm: plan.clone(),
                    linux_fx_version: stack.runtime.clone(),
                }),
            },
            ResourceNode {
                id: "backend".to_string(),
                kind: ResourceKind::WebApp,
                depends_on: vec!["main".to_string(), "plan".to_string()],
                provider: "azure",
                spec: ResourceSpec::WebApp(WebAppSpec {
                    name: backend,
                    resource_group: group.clone(),
                    server_farm: plan,
                    linux_fx_version: stack.runtime.clone(),
                }),
            },
            ResourceNode {
                id: "sql-admin-password".to_string(),
                kind: ResourceKind::RandomPassword,
                depends_on: vec![],
                provider: "local",
                spec: ResourceSpec::RandomPassword(RandomPasswordSpec {
                    name: "sql-admin-password".to_string(),
                    policy: PasswordPolicy::default(),
                    value: sql_password.clone(),
                }),
            },
            ResourceNode {
                id: "sqlserver".to_string(),
                kind: ResourceKind::SqlServer,
                depends_on: vec!["main".to_string(), "sql-admin-password".to_string()],
                provider: "azure",
                spec: ResourceSpec::SqlServer(SqlServerSpec {
                    name: sql_server.clone(),
                    resource_group: group.clone(),
                    administrator_login: stack.sql_admin.clone(),
                    administrator_password: sql_password,
                    version: "12.0".to_string(),
                }),
            },
            ResourceNode {
                id: "database".to_string(),
                kind: ResourceKind::SqlDatabase,
                depends_on: vec!["main".to_string(), "sqlserver".to_string()],
                provider: "azure",
                spec: ResourceSpec::SqlDatabase(SqlDatabaseSpec {
                    name: sql_database.clone(),
                    server: sql_server.clone(),
                    sku: "Basic".to_string(),
                    tier: "Basic".to_string(),
                    capacity: 5,
                    max_size_bytes: SQL_DATABASE_MAX_SIZE_BYTES,
                    collation: SQL_DATABASE_COLLATION.to_string(),
                }),
            },
            ResourceNode {
                id: "allow-azure-services".to_string(),
                kind: ResourceKind::FirewallRule,
                depends_on: vec!["main".to_string(), "sqlserver".to_string()],
                provider: "azure",
                spec: ResourceSpec::FirewallRule(FirewallRuleSpec {
                    name: "allow-azure-services".to_string(),
                    server: sql_server.clone(),
                    start_ip_address: AZURE_SERVICES_SENTINEL.to_string(),
                    end_ip_address: AZURE_SERVICES_SENTINEL.to_string(),
                }),
            },
        ];

        let outputs = vec![
            Output {
                name: "primaryStorageKey",
                secret: true,
                source: OutputSource::PrimaryStorageKey {
                    account: "storage".to_string(),
                },
            },
            Output {
                name: "webAppEndpoint",
                secret: false,
                source: OutputSource::Attribute {
                    resource: "frontend".to_string(),
                    key: "default_hostname",
                    prefix: Some("https://"),
                },
            },
            Output {
                name: "backendAppEndpoint",
                secret: false,
                source: OutputSource::Attribute {
                    resource: "backend".to_string(),
                    key: "default_hostname",
                    prefix: Some("https://"),
                },
            },
            Output {
                name: "sqlServerName",
                secret: false,
                source: OutputSource::Value(sql_server),
            },
            Output {
                name: "sqlDatabaseName",
                secret: false,
                source: OutputSource::Value(sql_database),
            },
            Output {
                name: "sqlAdminUser",
                secret: false,
                source: OutputSource::Value(stack.sql_admin.clone()),
            },
            Output {
                name: "sqlAdminPasswordOut",
                secret: true,
                source: OutputSource::Attribute {
                    resource: "sql-admin-password".to_string(),
                    key: "value",
                    prefix: None,
                },
            },
            Output {
                name: "sqlServerFqdn",
                secret: false,
                source: OutputSource::Attribute {
                    resource: "sqlserver".to_string(),
                    key: "fqdn",
                    prefix: None,
                },
            },
        ];

        let topology = Self {
            project: stack.name.clone(),
            location: stack.location.clone(),
            nodes,
            outputs,
        };

        topology.validate()?;
        Ok(topology)
    }

    /// 論理名でノードを取得
    pub fn node(&self, id: &str) -> Option<&ResourceNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// 参照整合性と種別ごとの制約を検証
    ///
    /// - 論理名の重複禁止
    /// - 依存先は先に宣言されたノードのみ（前方参照・自己参照・未定義参照の禁止）
    /// - 出力の参照先が存在すること
    pub fn validate(&self) -> Result<()> {
        let all: HashSet<&str> = self.nodes.iter().map(|n| n.id.as_str()).collect();
        let mut seen: HashSet<&str> = HashSet::new();

        for node in &self.nodes {
            for dep in &node.depends_on {
                if seen.contains(dep.as_str()) {
                    continue;
                }
                if dep == &node.id {
                    return Err(TopologyError::CircularDependency(node.id.clone()));
                }
                if all.contains(dep.as_str()) {
                    return Err(TopologyError::ForwardReference {
                        resource: node.id.clone(),
                        dependency: dep.clone(),
                    });
                }
                return Err(TopologyError::UnknownReference {
                    resource: node.id.clone(),
                    dependency: dep.clone(),
                });
            }

            if !seen.insert(node.id.as_str()) {
                return Err(TopologyError::DuplicateResource(node.id.clone()));
            }

            self.validate_spec(node)?;
        }

        for output in &self.outputs {
            let referenced = match &output.source {
                OutputSource::Attribute { resource, .. } => Some(resource),
                OutputSource::PrimaryStorageKey { account } => Some(account),
                OutputSource::Value(_) => None,
            };
            if let Some(resource) = referenced
                && !all.contains(resource.as_str())
            {
                return Err(TopologyError::UnknownReference {
                    resource: format!("output:{}", output.name),
                    dependency: resource.clone(),
                });
            }
        }

        Ok(())
    }

    fn validate_spec(&self, node: &ResourceNode) -> Result<()> {
        match &node.spec {
            ResourceSpec::ResourceGroup(spec) if spec.location.trim().is_empty() => {
                Err(TopologyError::InvalidResource {
                    resource: node.id.clone(),
                    message: "location が空です".to_string(),
                })
            }
            ResourceSpec::AppServicePlan(spec) if !spec.reserved => {
                Err(TopologyError::InvalidResource {
                    resource: node.id.clone(),
                    message: "Linuxプランでは reserved は true でなければなりません".to_string(),
                })
            }
            ResourceSpec::RandomPassword(spec) if spec.policy.length == 0 => {
                Err(TopologyError::InvalidResource {
                    resource: node.id.clone(),
                    message: "パスワード長が0です".to_string(),
                })
            }
            _ => Ok(()),
        }
    }
}
