//! スタックとクラウド層の橋渡し
//!
//! トポロジーをプロバイダーへ渡すリソース集合へ変換し、
//! ステートキー・削除ID・SQL管理者パスワードの再利用を解決します。

use soraflow_cloud::{GlobalState, ResourceConfig, ResourceSet};
use soraflow_core::{
    PasswordPolicy, ResourceNode, ResourceSpec, Secret, Topology, generate_password,
};

/// SQL管理者パスワードのステートキー
pub const PASSWORD_STATE_KEY: &str = "local:random-password:sql-admin-password";

/// リソースのステートキー（provider:種別:論理名）
pub fn state_key(node: &ResourceNode) -> String {
    format!("{}:{}:{}", node.provider, node.kind.as_str(), node.id)
}

/// destroy に渡す複合ID
///
/// 通常は `種別:物理名`。SQLサーバー配下のリソースは
/// `種別:サーバー名/物理名` になります。
pub fn destroy_id(node: &ResourceNode) -> String {
    match &node.spec {
        ResourceSpec::SqlDatabase(spec) => {
            format!("{}:{}/{}", node.kind.as_str(), spec.server, spec.name)
        }
        ResourceSpec::FirewallRule(spec) => {
            format!("{}:{}/{}", node.kind.as_str(), spec.server, spec.name)
        }
        spec => format!("{}:{}", node.kind.as_str(), spec.name()),
    }
}

/// SQL管理者パスワードを確定する
///
/// ステートに記録済みの値があればそれを再利用し、なければ新規生成します。
/// 戻り値の bool は再利用されたかどうか。
pub fn ensure_password(state: &GlobalState) -> (Secret, bool) {
    if let Some(recorded) = state.get_resource(PASSWORD_STATE_KEY)
        && let Some(value) = recorded.get_attribute::<String>("value")
    {
        return (Secret::new(value), true);
    }

    (generate_password(&PasswordPolicy::default()), false)
}

/// トポロジーをプロバイダーへ渡すリソース集合へ変換
///
/// ノードの宣言順がそのまま保たれます。
pub fn to_resource_set(topology: &Topology) -> anyhow::Result<ResourceSet> {
    let mut set = ResourceSet::new();

    for node in &topology.nodes {
        let config = serde_json::to_value(&node.spec)?;
        set.add(ResourceConfig::new(
            node.kind.as_str(),
            node.id.clone(),
            node.provider,
            config,
        ));
    }

    Ok(set)
}

#[cfg(test)]
mod tests {
    use super::*;
    use soraflow_cloud::{ResourceState, ResourceStatus};
    use soraflow_core::StackConfig;

    fn topology() -> Topology {
        let stack = StackConfig::new("webstack", "southeastasia");
        let password = Secret::new("test-password_@%");
        Topology::declare(&stack, password).unwrap()
    }

    #[test]
    fn test_state_key_format() {
        let topology = topology();

        let main = topology.node("main").unwrap();
        assert_eq!(state_key(main), "azure:resource-group:main");

        let password = topology.node("sql-admin-password").unwrap();
        assert_eq!(state_key(password), PASSWORD_STATE_KEY);
    }

    #[test]
    fn test_destroy_id_is_composite_for_server_scoped_resources() {
        let topology = topology();

        let frontend = topology.node("frontend").unwrap();
        assert_eq!(destroy_id(frontend), "web-app:webstack-frontend");

        let database = topology.node("database").unwrap();
        assert_eq!(destroy_id(database), "sql-database:webstack-sql/webstack-db");

        let rule = topology.node("allow-azure-services").unwrap();
        assert_eq!(
            destroy_id(rule),
            "firewall-rule:webstack-sql/allow-azure-services"
        );
    }

    #[test]
    fn test_ensure_password_reuses_recorded_value() {
        let mut state = GlobalState::new();
        state.set_resource(
            PASSWORD_STATE_KEY.to_string(),
            ResourceState::new("sql-admin-password", "random-password")
                .with_status(ResourceStatus::Running)
                .with_attribute("value", serde_json::json!("recorded-pass_@%1")),
        );

        let (password, reused) = ensure_password(&state);

        assert!(reused);
        assert_eq!(password.expose(), "recorded-pass_@%1");
    }

    #[test]
    fn test_ensure_password_generates_when_absent() {
        let state = GlobalState::new();

        let (password, reused) = ensure_password(&state);

        assert!(!reused);
        assert_eq!(password.expose().len(), 16);
    }

    #[test]
    fn test_to_resource_set_preserves_order_and_providers() {
        let topology = topology();
        let set = to_resource_set(&topology).unwrap();

        assert_eq!(set.len(), topology.nodes.len());

        let ids: Vec<&str> = set.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids[0], "main");
        assert_eq!(*ids.last().unwrap(), "allow-azure-services");

        let password = set.get("random-password", "sql-admin-password").unwrap();
        assert_eq!(password.provider, "local");
        // パスワード値は設定ごとプロバイダーへ渡る
        assert_eq!(
            password.get_config::<String>("value").as_deref(),
            Some("test-password_@%")
        );

        let database = set.get("sql-database", "database").unwrap();
        assert_eq!(database.provider, "azure");
        assert_eq!(database.get_config::<u32>("capacity"), Some(5));
    }
}
