use crate::stack;
use colored::Colorize;
use soraflow_cloud::{CloudProvider, ResourceState, ResourceStatus, StateManager};
use soraflow_cloud_azure::AzureProvider;
use soraflow_core::{Topology, naming};
use std::path::Path;

use super::outputs::print_outputs;
use super::plan::print_plan;

pub async fn handle(project_root: &Path, yes: bool) -> anyhow::Result<()> {
    let stack_config = soraflow_core::load_stack(project_root)?;

    println!(
        "{}",
        format!("スタック '{}' を適用中...", stack_config.name)
            .blue()
            .bold()
    );
    println!("  ロケーション: {}", stack_config.location);

    let manager = StateManager::new(project_root);
    let lock = manager.acquire_lock().await?;
    let mut state = manager.load().await?;

    // SQL管理者パスワードの確定（記録済みがあれば再利用）
    let (password, reused) = stack::ensure_password(&state);
    if reused {
        println!(
            "  {} 記録済みのSQL管理者パスワードを再利用します",
            "✓".green()
        );
    } else {
        println!("  {} SQL管理者パスワードを生成しました", "✓".green());
    }

    let topology = Topology::declare(&stack_config, password.clone())?;

    let provider = AzureProvider::new(
        naming::resource_group_name(&stack_config.name),
        stack_config.location.clone(),
    );

    // 認証確認
    let auth = provider.check_auth().await?;
    if auth.authenticated {
        if let Some(account) = &auth.account_info {
            println!("  {} Azure: {}", "✓".green(), account);
        }
    } else {
        eprintln!();
        eprintln!(
            "{} {}",
            "✗".red().bold(),
            auth.error.as_deref().unwrap_or("Azureの認証に失敗しました")
        );
        eprintln!("  {} を実行してからやり直してください", "az login".cyan());
        lock.release().await?;
        std::process::exit(1);
    }

    // 適用が途中で失敗しても再実行で同じパスワードを使えるよう、先に記録する
    state.set_resource(
        stack::PASSWORD_STATE_KEY.to_string(),
        ResourceState::new("sql-admin-password", "random-password")
            .with_status(ResourceStatus::Running)
            .with_attribute("value", serde_json::json!(password.expose())),
    );
    manager.save(&state).await?;

    // プラン作成
    let resources = stack::to_resource_set(&topology)?;
    let plan = provider.plan(&resources).await?;

    print_plan(&plan);

    if !plan.has_changes {
        println!();
        println!("{}", "変更はありません。すべてのリソースが最新です。".green());
        print_outputs(&provider, &topology, &state, false).await?;
        lock.release().await?;
        return Ok(());
    }

    if !yes {
        println!();
        println!(
            "  実行するには {} オプションを指定してください",
            "--yes".cyan()
        );
        lock.release().await?;
        return Ok(());
    }

    // 適用（宣言順に作成、最初の失敗で停止）
    println!();
    println!("{}", "適用中:".bold());

    let result = provider.apply(&plan).await?;

    for success in &result.succeeded {
        println!("  {} {}", "✓".green(), success.message);
    }

    // ライブ状態をステートへ反映（部分適用でも成功した分は記録する）
    let live = provider.get_state().await?;
    for node in &topology.nodes {
        if node.provider != "azure" {
            continue;
        }
        if let Some(resource) = live.get(node.physical_name()) {
            state.set_resource(stack::state_key(node), resource.clone());
        }
    }
    manager.save(&state).await?;

    if !result.is_success() {
        eprintln!();
        eprintln!("{}", "✗ 適用に失敗しました".red().bold());
        for failure in &result.failed {
            if let Some(error) = &failure.error {
                eprintln!("  {} {}: {}", "✗".red(), failure.action_id, error);
            }
        }
        lock.release().await?;
        std::process::exit(1);
    }

    print_outputs(&provider, &topology, &state, false).await?;

    println!();
    println!(
        "{}",
        format!("✓ スタック '{}' を適用しました！", stack_config.name)
            .green()
            .bold()
    );

    lock.release().await?;
    Ok(())
}
