//! リソース記述子モデル
//!
//! トポロジーを構成する各Azureリソースの型付き定義

use crate::password::{PasswordPolicy, Secret};
use serde::Serialize;

/// リソース種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceKind {
    ResourceGroup,
    StorageAccount,
    AppServicePlan,
    WebApp,
    RandomPassword,
    SqlServer,
    SqlDatabase,
    FirewallRule,
}

impl ResourceKind {
    /// ステートキーやアクションで使用する種別文字列
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::ResourceGroup => "resource-group",
            ResourceKind::StorageAccount => "storage-account",
            ResourceKind::AppServicePlan => "app-service-plan",
            ResourceKind::WebApp => "web-app",
            ResourceKind::RandomPassword => "random-password",
            ResourceKind::SqlServer => "sql-server",
            ResourceKind::SqlDatabase => "sql-database",
            ResourceKind::FirewallRule => "firewall-rule",
        }
    }

    /// 表示用の日本語ラベル
    pub fn label(&self) -> &'static str {
        match self {
            ResourceKind::ResourceGroup => "リソースグループ",
            ResourceKind::StorageAccount => "ストレージアカウント",
            ResourceKind::AppServicePlan => "App Serviceプラン",
            ResourceKind::WebApp => "Webアプリ",
            ResourceKind::RandomPassword => "管理者パスワード",
            ResourceKind::SqlServer => "SQLサーバー",
            ResourceKind::SqlDatabase => "SQLデータベース",
            ResourceKind::FirewallRule => "ファイアウォールルール",
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// トポロジー内の1ノード
///
/// `depends_on` は同一トポロジー内で先に宣言されたノードの論理名のみを
/// 指すことができます（前方参照の禁止は検証で保証）。
#[derive(Debug, Clone, Serialize)]
pub struct ResourceNode {
    /// 論理名（トポロジー内で一意）
    pub id: String,

    /// リソース種別
    pub kind: ResourceKind,

    /// 依存先の論理名
    pub depends_on: Vec<String>,

    /// プロバイダー名（azure / local）
    pub provider: &'static str,

    /// 型付き設定
    pub spec: ResourceSpec,
}

impl ResourceNode {
    /// リソースの物理名
    pub fn physical_name(&self) -> &str {
        self.spec.name()
    }
}

/// リソース種別ごとの設定
///
/// untagged でシリアライズされるため、JSON化するとフィールドが
/// そのままフラットに展開されます（プロバイダーへの受け渡し形式）。
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ResourceSpec {
    ResourceGroup(ResourceGroupSpec),
    StorageAccount(StorageAccountSpec),
    AppServicePlan(AppServicePlanSpec),
    WebApp(WebAppSpec),
    RandomPassword(RandomPasswordSpec),
    SqlServer(SqlServerSpec),
    SqlDatabase(SqlDatabaseSpec),
    FirewallRule(FirewallRuleSpec),
}

impl ResourceSpec {
    pub fn name(&self) -> &str {
        match self {
            ResourceSpec::ResourceGroup(s) => &s.name,
            ResourceSpec::StorageAccount(s) => &s.name,
            ResourceSpec::AppServicePlan(s) => &s.name,
            ResourceSpec::WebApp(s) => &s.name,
            ResourceSpec::RandomPassword(s) => &s.name,
            ResourceSpec::SqlServer(s) => &s.name,
            ResourceSpec::SqlDatabase(s) => &s.name,
            ResourceSpec::FirewallRule(s) => &s.name,
        }
    }
}

/// リソースグループ
#[derive(Debug, Clone, Serialize)]
pub struct ResourceGroupSpec {
    pub name: String,
    pub location: String,
}

/// ストレージアカウント（Standard_LRS / StorageV2 固定）
#[derive(Debug, Clone, Serialize)]
pub struct StorageAccountSpec {
    pub name: String,
    pub resource_group: String,
    pub sku: String,
    pub kind: String,
}

/// App Serviceプラン
///
/// Linuxプランでは `reserved` はtrueでなければなりません（検証で強制）。
#[derive(Debug, Clone, Serialize)]
pub struct AppServicePlanSpec {
    pub name: String,
    pub resource_group: String,
    pub sku: String,
    pub tier: String,
    pub kind: String,
    pub reserved: bool,
}

/// Webアプリ
#[derive(Debug, Clone, Serialize)]
pub struct WebAppSpec {
    pub name: String,
    pub resource_group: String,
    /// 所属するApp Serviceプランの物理名
    pub server_farm: String,
    /// ランタイムID（プロバイダー形式: "NODE|16-lts"）
    pub linux_fx_version: String,
}

/// ランダムパスワード（ローカルリソース）
#[derive(Debug, Clone, Serialize)]
pub struct RandomPasswordSpec {
    pub name: String,
    #[serde(flatten)]
    pub policy: PasswordPolicy,
    /// 宣言時に一度だけ確定した値
    pub value: Secret,
}

/// SQLサーバー
#[derive(Debug, Clone, Serialize)]
pub struct SqlServerSpec {
    pub name: String,
    pub resource_group: String,
    pub administrator_login: String,
    pub administrator_password: Secret,
    /// エンジンバージョン（Azureは12.0のみプロビジョニング可能）
    pub version: String,
}

/// SQLデータベース（DTUベースのBasicティア固定）
#[derive(Debug, Clone, Serialize)]
pub struct SqlDatabaseSpec {
    pub name: String,
    /// 所属するSQLサーバーの物理名
    pub server: String,
    pub sku: String,
    pub tier: String,
    pub capacity: u32,
    pub max_size_bytes: i64,
    pub collation: String,
}

/// SQLファイアウォールルール
///
/// 開始・終了ともに 0.0.0.0 はAzureプラットフォームサービスからの
/// アクセスを許可するプロバイダーの番兵値です。実際のIPレンジとして
/// 解釈・書き換えしてはいけません。
#[derive(Debug, Clone, Serialize)]
pub struct FirewallRuleSpec {
    pub name: String,
    /// 所属するSQLサーバーの物理名
    pub server: String,
    pub start_ip_address: String,
    pub end_ip_address: String,
}
