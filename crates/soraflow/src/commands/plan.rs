use crate::stack;
use colored::Colorize;
use soraflow_cloud::{ActionType, CloudProvider, Plan, StateManager};
use soraflow_cloud_azure::AzureProvider;
use soraflow_core::{Topology, naming};
use std::path::Path;

/// 実行計画を色付きで表示する（up と共用）
pub fn print_plan(plan: &Plan) {
    println!();
    println!("{}", "実行計画:".bold());

    for action in &plan.actions {
        match action.action_type {
            ActionType::Create => {
                println!("  {} {}", "+".green().bold(), action.description);
            }
            ActionType::Update => {
                println!("  {} {}", "~".yellow().bold(), action.description);
            }
            ActionType::Delete => {
                println!("  {} {}", "-".red().bold(), action.description);
            }
            ActionType::NoOp => {
                println!("  {} {}", "·".dimmed(), action.description.dimmed());
            }
        }
    }

    println!();
    println!("  {}", plan.summary().to_string().bold());
}

pub async fn handle(project_root: &Path) -> anyhow::Result<()> {
    let stack_config = soraflow_core::load_stack(project_root)?;

    println!(
        "{}",
        format!("スタック '{}' の実行計画を作成中...", stack_config.name)
            .blue()
            .bold()
    );

    let manager = StateManager::new(project_root);
    let state = manager.load().await?;

    // プランでは値を使わないため、未記録なら使い捨てのパスワードで組み立てる
    let (password, _) = stack::ensure_password(&state);
    let topology = Topology::declare(&stack_config, password)?;

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
        eprintln!("  {} を実行してからやり直してください", "az login".cyan());
        std::process::exit(1);
    }

    let resources = stack::to_resource_set(&topology)?;
    let plan = provider.plan(&resources).await?;

    print_plan(&plan);

    if plan.has_changes {
        println!();
        println!("適用するには {} を実行してください", "sora up --yes".cyan());
    } else {
        println!();
        println!("{}", "変更はありません。すべてのリソースが最新です。".green());
    }

    Ok(())
}
