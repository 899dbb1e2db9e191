mod commands;
mod stack;

use clap::{Parser, Subcommand};
use colored::Colorize;

#[derive(Parser)]
#[command(name = "sora")]
#[command(about = "宣言されたトポロジーを、そのままAzureへ。", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// スタックを適用（プラン表示後にリソースを作成）
    Up {
        /// 確認なしで実行
        #[arg(short, long)]
        yes: bool,
    },
    /// スタックを削除（記録済みリソースを宣言の逆順で削除）
    Down {
        /// 確認なしで実行
        #[arg(short, long)]
        yes: bool,
    },
    /// 適用せずに実行計画を表示
    Plan,
    /// スタックの出力を表示
    Outputs {
        /// 秘密値をマスクせずに表示
        #[arg(long)]
        show_secrets: bool,
    },
    /// 記録済みリソースの状態を表示
    Status,
    /// 設定を検証
    Validate,
    /// バージョン情報を表示
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt::init();

    // Versionコマンドは設定ファイル不要
    if matches!(cli.command, Commands::Version) {
        println!("soraflow {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    // プロジェクトルートを検索
    let project_root = match soraflow_core::find_project_root() {
        Ok(root) => root,
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            std::process::exit(1);
        }
    };

    // コマンドディスパッチ
    match cli.command {
        Commands::Up { yes } => {
            commands::up::handle(&project_root, yes).await?;
        }
        Commands::Down { yes } => {
            commands::down::handle(&project_root, yes).await?;
        }
        Commands::Plan => {
            commands::plan::handle(&project_root).await?;
        }
        Commands::Outputs { show_secrets } => {
            commands::outputs::handle(&project_root, show_secrets).await?;
        }
        Commands::Status => {
            commands::status::handle(&project_root).await?;
        }
        Commands::Validate => {
            commands::validate::handle(&project_root).await?;
        }
        Commands::Version => unreachable!(),
    }

    Ok(())
}
