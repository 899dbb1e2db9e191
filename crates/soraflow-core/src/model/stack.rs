//! スタック設定モデル
//!
//! sora.kdl で宣言されるデプロイパラメータの定義

use serde::{Deserialize, Serialize};

/// デプロイ先リージョンのデフォルト
pub const DEFAULT_LOCATION: &str = "southeastasia";

/// SQL管理者ユーザー名のデフォルト
pub const DEFAULT_SQL_ADMIN: &str = "sqladminuser";

/// WebアプリランタイムIDのデフォルト
pub const DEFAULT_RUNTIME: &str = "NODE|16-lts";

/// スタック設定
///
/// トポロジーの形状はコードで固定されており、設定ファイルは
/// デプロイ先リージョンなどのパラメータのみを供給します。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackConfig {
    /// スタック名（物理名の導出に使用）
    pub name: String,

    /// Azureリージョン（southeastasia など）
    pub location: String,

    /// SQL管理者ユーザー名
    pub sql_admin: String,

    /// WebアプリのランタイムID（linuxFxVersion 形式）
    pub runtime: String,
}

impl StackConfig {
    /// デフォルト値を適用してスタック設定を作成
    pub fn new(name: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            location: location.into(),
            sql_admin: DEFAULT_SQL_ADMIN.to_string(),
            runtime: DEFAULT_RUNTIME.to_string(),
        }
    }
}
