use colored::Colorize;
use soraflow_cloud::{ResourceStatus, StateManager};
use std::path::Path;

pub async fn handle(project_root: &Path) -> anyhow::Result<()> {
    let stack_config = soraflow_core::load_stack(project_root)?;

    let manager = StateManager::new(project_root);
    let state = manager.load().await?;

    println!(
        "{}",
        format!("スタック '{}' の状態:", stack_config.name).blue().bold()
    );
    println!();

    if state.resources.is_empty() {
        println!("{}", "リソースは記録されていません".dimmed());
        println!("  {} でスタックを適用できます", "sora up --yes".cyan());
        return Ok(());
    }

    println!("{}", "TYPE\t\t\tNAME\t\t\tSTATUS\tUPDATED".bold());
    println!("{}", "----\t\t\t----\t\t\t------\t-------".dimmed());

    // BTreeMapなのでキー順（provider:種別:論理名）で安定して並ぶ
    for resource in state.resources.values() {
        let status_colored = match resource.status {
            ResourceStatus::Running => resource.status.to_string().green().to_string(),
            ResourceStatus::Stopped => resource.status.to_string().yellow().to_string(),
            ResourceStatus::Error => resource.status.to_string().red().to_string(),
            _ => resource.status.to_string().dimmed().to_string(),
        };

        println!(
            "{}\t{}\t{}\t{}",
            resource.resource_type.cyan(),
            resource.id,
            status_colored,
            resource.updated_at.format("%Y-%m-%d %H:%M")
        );
    }

    println!();
    println!("{}個のリソースが記録されています", state.resources.len());

    Ok(())
}
