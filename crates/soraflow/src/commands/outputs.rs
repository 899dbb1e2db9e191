use crate::stack;
use colored::Colorize;
use soraflow_cloud::{GlobalState, StateManager};
use soraflow_cloud_azure::AzureProvider;
use soraflow_core::{Output, OutputSource, Topology, naming};
use std::path::Path;

/// 出力を一覧表示する（up と共用）
///
/// 秘密値は `show_secrets` が false の間マスクされ、値の取得自体を
/// 行いません。ストレージキーの取得はライブ読み取りです。
pub async fn print_outputs(
    provider: &AzureProvider,
    topology: &Topology,
    state: &GlobalState,
    show_secrets: bool,
) -> anyhow::Result<()> {
    println!();
    println!("{}", "出力:".bold());

    for output in &topology.outputs {
        if output.secret && !show_secrets {
            println!("  {} = {}", output.name.bold(), "********".dimmed());
            continue;
        }

        match resolve_output(provider, topology, state, output).await? {
            Some(value) => println!("  {} = {}", output.name.bold(), value.cyan()),
            None => println!("  {} = {}", output.name.bold(), "(未解決)".dimmed()),
        }
    }

    Ok(())
}

/// 出力値を解決する
///
/// 解決は読み取りのみで、リソースを作成・変更しません。
async fn resolve_output(
    provider: &AzureProvider,
    topology: &Topology,
    state: &GlobalState,
    output: &Output,
) -> anyhow::Result<Option<String>> {
    match &output.source {
        OutputSource::Value(value) => Ok(Some(value.clone())),

        OutputSource::Attribute {
            resource,
            key,
            prefix,
        } => {
            let Some(node) = topology.node(resource) else {
                return Ok(None);
            };

            let value = state
                .get_resource(&stack::state_key(node))
                .and_then(|r| r.get_attribute::<String>(key));

            Ok(value.map(|v| match prefix {
                Some(p) => format!("{p}{v}"),
                None => v,
            }))
        }

        OutputSource::PrimaryStorageKey { account } => {
            let Some(node) = topology.node(account) else {
                return Ok(None);
            };

            match provider.primary_storage_key(node.physical_name()).await {
                Ok(key) => Ok(Some(key)),
                Err(e) => {
                    tracing::warn!("Failed to fetch storage key: {}", e);
                    Ok(None)
                }
            }
        }
    }
}

pub async fn handle(project_root: &Path, show_secrets: bool) -> anyhow::Result<()> {
    let stack_config = soraflow_core::load_stack(project_root)?;

    println!(
        "{}",
        format!("スタック '{}' の出力:", stack_config.name).blue().bold()
    );

    let manager = StateManager::new(project_root);
    let state = manager.load().await?;

    // 記録済みパスワードがあれば sqlAdminPasswordOut の解決に使われる
    let (password, _) = stack::ensure_password(&state);
    let topology = Topology::declare(&stack_config, password)?;

    let provider = AzureProvider::new(
        naming::resource_group_name(&stack_config.name),
        stack_config.location.clone(),
    );

    print_outputs(&provider, &topology, &state, show_secrets).await
}
