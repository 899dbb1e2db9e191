use colored::Colorize;
use soraflow_core::{PasswordPolicy, StackConfig, Topology, generate_password};
use std::path::Path;

/// 設定を読み込み、検証用のトポロジーを組み立てる
///
/// パスワードは形状の検証にしか使わないため使い捨てです。
fn build(project_root: &Path) -> soraflow_core::Result<(StackConfig, Topology)> {
    let stack = soraflow_core::load_stack(project_root)?;
    let password = generate_password(&PasswordPolicy::default());
    let topology = Topology::declare(&stack, password)?;
    Ok((stack, topology))
}

pub async fn handle(project_root: &Path) -> anyhow::Result<()> {
    println!("{}", "設定を検証中...".blue());
    println!(
        "プロジェクトルート: {}",
        project_root.display().to_string().cyan()
    );

    match build(project_root) {
        Ok((stack, topology)) => {
            println!("{}", "✓ 設定ファイルは正常です！".green().bold());
            println!();
            println!("サマリー:");
            println!("  スタック: {}", stack.name.cyan());
            println!("  ロケーション: {}", stack.location);
            println!("  ランタイム: {}", stack.runtime);
            println!("  SQL管理者: {}", stack.sql_admin);
            println!();
            println!("  リソース: {}個", topology.nodes.len());
            for node in &topology.nodes {
                println!(
                    "    - {} → {} ({})",
                    node.id.cyan(),
                    node.physical_name(),
                    node.kind.label()
                );
            }
            println!("  出力: {}個", topology.outputs.len());
            for output in &topology.outputs {
                let secret_mark = if output.secret { " (secret)" } else { "" };
                println!("    - {}{}", output.name.cyan(), secret_mark.dimmed());
            }
        }
        Err(e) => {
            eprintln!();
            eprintln!("{}", "✗ 設定エラー".red().bold());
            eprintln!("  {}", e);
            std::process::exit(1);
        }
    }

    Ok(())
}
