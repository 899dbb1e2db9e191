//! ファイル自動発見機能
//!
//! 規約ベースのディレクトリ構造からスタック定義ファイルを自動的に発見します。

use crate::error::{Result, TopologyError};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// 発見されたファイル群
#[derive(Debug, Clone, Default)]
pub struct DiscoveredFiles {
    /// スタック定義ファイル (sora.kdl)
    pub stack: Option<PathBuf>,
    /// ローカルオーバーライドファイル (sora.local.kdl)
    pub local_override: Option<PathBuf>,
    /// 環境変数ファイル (.env)
    pub env_file: Option<PathBuf>,
}

/// プロジェクトルートを検出
///
/// 以下の優先順位で検索:
/// 1. 環境変数 SORA_PROJECT_ROOT
/// 2. カレントディレクトリから上に向かって以下を探す:
///    - sora.kdl
///    - .soraflow/sora.kdl
#[tracing::instrument]
pub fn find_project_root() -> Result<PathBuf> {
    // 1. 環境変数
    if let Ok(root) = std::env::var("SORA_PROJECT_ROOT") {
        let path = PathBuf::from(&root);
        debug!(env_root = %root, "Checking SORA_PROJECT_ROOT");
        if path.join("sora.kdl").exists() || path.join(".soraflow/sora.kdl").exists() {
            info!(project_root = %path.display(), "Found project root from environment variable");
            return Ok(path);
        }
    }

    // 2. カレントディレクトリから上に向かって探す
    let start_dir = std::env::current_dir()?;
    let mut current = start_dir.clone();
    debug!(start_dir = %start_dir.display(), "Searching for project root");

    loop {
        // sora.kdl をチェック
        let stack_file = current.join("sora.kdl");
        debug!(checking = %current.display(), "Looking for sora.kdl");
        if stack_file.exists() {
            info!(project_root = %current.display(), "Found project root (sora.kdl)");
            return Ok(current);
        }

        // .soraflow/sora.kdl をチェック
        let soraflow_dir_file = current.join(".soraflow/sora.kdl");
        if soraflow_dir_file.exists() {
            info!(project_root = %current.display(), "Found project root (.soraflow/sora.kdl)");
            return Ok(current);
        }

        // 親ディレクトリへ
        if !current.pop() {
            break;
        }
    }

    warn!(start_dir = %start_dir.display(), "Project root not found");
    Err(TopologyError::ProjectRootNotFound(start_dir))
}

/// プロジェクトルートからファイルを自動発見
#[tracing::instrument(skip(project_root), fields(project_root = %project_root.display()))]
pub fn discover_files(project_root: &Path) -> Result<DiscoveredFiles> {
    debug!("Starting file discovery");
    let mut discovered = DiscoveredFiles::default();

    // sora.kdl または .soraflow/sora.kdl
    let stack_file = project_root.join("sora.kdl");
    let soraflow_stack_file = project_root.join(".soraflow/sora.kdl");
    if stack_file.exists() {
        debug!(file = %stack_file.display(), "Found stack file");
        discovered.stack = Some(stack_file);
    } else if soraflow_stack_file.exists() {
        debug!(file = %soraflow_stack_file.display(), "Found stack file in .soraflow/");
        discovered.stack = Some(soraflow_stack_file);
    }

    // sora.local.kdl または .soraflow/sora.local.kdl
    let local_override = project_root.join("sora.local.kdl");
    let soraflow_local_override = project_root.join(".soraflow/sora.local.kdl");
    if local_override.exists() {
        discovered.local_override = Some(local_override);
    } else if soraflow_local_override.exists() {
        discovered.local_override = Some(soraflow_local_override);
    }

    // .env または .soraflow/.env
    let env_file = project_root.join(".env");
    let soraflow_env_file = project_root.join(".soraflow/.env");
    if env_file.exists() {
        debug!(file = %env_file.display(), "Found .env file");
        discovered.env_file = Some(env_file);
    } else if soraflow_env_file.exists() {
        debug!(file = %soraflow_env_file.display(), "Found .env file in .soraflow/");
        discovered.env_file = Some(soraflow_env_file);
    }

    Ok(discovered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_discover_files() -> Result<()> {
        let temp_dir = tempfile::tempdir().unwrap();
        let project_root = temp_dir.path();

        fs::write(project_root.join("sora.kdl"), "// stack")?;
        fs::write(project_root.join("sora.local.kdl"), "// local override")?;
        fs::write(project_root.join(".env"), "SORA_LOCATION=southeastasia")?;

        let discovered = discover_files(project_root)?;

        assert!(discovered.stack.is_some());
        assert!(discovered.local_override.is_some());
        assert!(discovered.env_file.is_some());

        Ok(())
    }

    #[test]
    fn test_discover_files_minimal() -> Result<()> {
        let temp_dir = tempfile::tempdir().unwrap();
        let project_root = temp_dir.path();

        // 最小構成: sora.kdl のみ
        fs::write(project_root.join("sora.kdl"), "// stack")?;

        let discovered = discover_files(project_root)?;

        assert!(discovered.stack.is_some());
        assert!(discovered.local_override.is_none());
        assert!(discovered.env_file.is_none());

        Ok(())
    }

    #[test]
    fn test_discover_files_in_soraflow_dir() -> Result<()> {
        let temp_dir = tempfile::tempdir().unwrap();
        let project_root = temp_dir.path();

        // .soraflow/ ディレクトリに sora.kdl を配置
        fs::create_dir_all(project_root.join(".soraflow"))?;
        fs::write(
            project_root.join(".soraflow/sora.kdl"),
            "// stack in .soraflow",
        )?;
        fs::write(
            project_root.join(".soraflow/sora.local.kdl"),
            "// local override",
        )?;
        fs::write(project_root.join(".soraflow/.env"), "X=1")?;

        let discovered = discover_files(project_root)?;

        assert!(discovered.stack.is_some());
        assert!(
            discovered
                .stack
                .as_ref()
                .unwrap()
                .ends_with(".soraflow/sora.kdl")
        );

        assert!(discovered.local_override.is_some());
        assert!(
            discovered
                .local_override
                .as_ref()
                .unwrap()
                .ends_with(".soraflow/sora.local.kdl")
        );

        assert!(discovered.env_file.is_some());
        assert!(
            discovered
                .env_file
                .as_ref()
                .unwrap()
                .ends_with(".soraflow/.env")
        );

        Ok(())
    }

    #[test]
    fn test_root_file_priority_over_soraflow_dir() -> Result<()> {
        let temp_dir = tempfile::tempdir().unwrap();
        let project_root = temp_dir.path();

        // 両方に sora.kdl を配置
        fs::write(project_root.join("sora.kdl"), "// stack")?;
        fs::create_dir_all(project_root.join(".soraflow"))?;
        fs::write(
            project_root.join(".soraflow/sora.kdl"),
            "// stack in .soraflow",
        )?;

        let discovered = discover_files(project_root)?;

        // ./sora.kdl が優先される
        assert!(discovered.stack.is_some());
        assert!(discovered.stack.as_ref().unwrap().ends_with("sora.kdl"));
        assert!(
            !discovered
                .stack
                .as_ref()
                .unwrap()
                .to_string_lossy()
                .contains(".soraflow")
        );

        Ok(())
    }

    #[test]
    fn test_discover_files_empty_dir() -> Result<()> {
        let temp_dir = tempfile::tempdir().unwrap();

        let discovered = discover_files(temp_dir.path())?;

        // 何も見つからないのはエラーではない（ローダー側で判断する）
        assert!(discovered.stack.is_none());

        Ok(())
    }
}
