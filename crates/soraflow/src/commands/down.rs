use crate::stack;
use colored::Colorize;
use soraflow_cloud::{CloudProvider, StateManager};
use soraflow_cloud_azure::AzureProvider;
use soraflow_core::{ResourceNode, Topology, naming};
use std::path::Path;

pub async fn handle(project_root: &Path, yes: bool) -> anyhow::Result<()> {
    let stack_config = soraflow_core::load_stack(project_root)?;

    println!(
        "{}",
        format!("スタック '{}' を削除します...", stack_config.name)
            .yellow()
            .bold()
    );

    let manager = StateManager::new(project_root);
    let lock = manager.acquire_lock().await?;
    let mut state = manager.load().await?;

    if state.resources.is_empty() {
        println!("{}", "リソースは記録されていません".dimmed());
        lock.release().await?;
        return Ok(());
    }

    let (password, _) = stack::ensure_password(&state);
    let topology = Topology::declare(&stack_config, password)?;

    // 削除対象は記録済みのノードのみ。宣言の逆順で削除する。
    let targets: Vec<&ResourceNode> = topology
        .nodes
        .iter()
        .rev()
        .filter(|node| state.get_resource(&stack::state_key(node)).is_some())
        .collect();

    if targets.is_empty() {
        println!("{}", "このスタックのリソースは記録されていません".dimmed());
        lock.release().await?;
        return Ok(());
    }

    println!();
    println!("{}", format!("削除対象 ({}個):", targets.len()).bold());
    for node in &targets {
        println!(
            "  {} {} ({})",
            "-".red().bold(),
            node.physical_name(),
            node.kind.label()
        );
    }

    if !yes {
        println!();
        println!("{}", "⚠ この操作はリソースを完全に削除します".yellow().bold());
        println!("  実行するには --yes オプションを指定してください");
        lock.release().await?;
        return Ok(());
    }

    let provider = AzureProvider::new(
        naming::resource_group_name(&stack_config.name),
        stack_config.location.clone(),
    );

    let auth = provider.check_auth().await?;
    if !auth.authenticated {
        eprintln!();
        eprintln!(
            "{} {}",
            "✗".red().bold(),
            auth.error.as_deref().unwrap_or("Azureの認証に失敗しました")
        );
        lock.release().await?;
        std::process::exit(1);
    }

    println!();
    for node in targets {
        let key = stack::state_key(node);

        // ローカルリソースはステートから取り除くだけ
        if node.provider == "local" {
            state.remove_resource(&key);
            manager.save(&state).await?;
            println!("  {} {} を削除しました", "✓".green(), node.id);
            continue;
        }

        print!("  {} {} ... ", "■".yellow(), node.physical_name());

        match provider.destroy(&stack::destroy_id(node)).await {
            Ok(()) => {
                state.remove_resource(&key);
                manager.save(&state).await?;
                println!("{}", "削除".green());
            }
            Err(e) => {
                println!("{}", "失敗".red());
                eprintln!();
                eprintln!("{} {}", "✗".red().bold(), e);
                lock.release().await?;
                std::process::exit(1);
            }
        }
    }

    println!();
    println!(
        "{}",
        format!("✓ スタック '{}' を削除しました", stack_config.name)
            .green()
            .bold()
    );

    lock.release().await?;
    Ok(())
}
