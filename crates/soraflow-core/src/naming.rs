//! 物理リソース名の導出
//!
//! 物理名はプロジェクト名から決定的に導出されます。同じ入力からは
//! 常に同じ名前が得られるため、再実行しても同一のグラフになります。

/// ストレージアカウント名の最大長（Azureの制約）
const STORAGE_ACCOUNT_MAX_LEN: usize = 24;

/// リソースグループ名
pub fn resource_group_name(project: &str) -> String {
    format!("{}-rg", project)
}

/// ストレージアカウント名
///
/// Azureの命名規則（3〜24文字、英小文字と数字のみ）に合わせて
/// プロジェクト名を正規化します。
pub fn storage_account_name(project: &str) -> String {
    let base: String = project
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .take(STORAGE_ACCOUNT_MAX_LEN - 2)
        .collect();
    format!("{}sa", base)
}

/// App Serviceプラン名
pub fn service_plan_name(project: &str) -> String {
    format!("{}-plan", project)
}

/// Webアプリ名（role は "frontend" / "backend"）
pub fn web_app_name(project: &str, role: &str) -> String {
    format!("{}-{}", project, role)
}

/// SQLサーバー名（Azureの制約により小文字のみ）
pub fn sql_server_name(project: &str) -> String {
    format!("{}-sql", project.to_ascii_lowercase())
}

/// SQLデータベース名
pub fn sql_database_name(project: &str) -> String {
    format!("{}-db", project)
}
