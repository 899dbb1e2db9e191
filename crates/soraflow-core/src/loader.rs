//! 統合ローダー
//!
//! ファイル発見、テンプレート展開、パースを統合

use crate::discovery::{DiscoveredFiles, discover_files};
use crate::error::{Result, TopologyError};
use crate::model::StackConfig;
use crate::parser::parse_stack_document;
use crate::template::TemplateProcessor;
use std::path::Path;
use tracing::{debug, info, instrument};

/// プロジェクトルートからスタック設定をロード
///
/// 以下の処理を実行:
/// 1. ファイルの自動発見
/// 2. テンプレート展開（.env と環境変数を供給）
/// 3. KDLパース
/// 4. ローカルオーバーライドのマージ
#[instrument(skip(project_root), fields(project_root = %project_root.display()))]
pub fn load_stack(project_root: &Path) -> Result<StackConfig> {
    // 1. ファイル発見
    debug!("Step 1: Discovering files");
    let discovered = discover_files(project_root)?;

    let stack_file = discovered.stack.as_ref().ok_or_else(|| {
        TopologyError::InvalidConfig(format!(
            "sora.kdl が見つかりません: {}",
            project_root.display()
        ))
    })?;

    // 2. テンプレート準備
    debug!("Step 2: Preparing template processor");
    let mut processor = prepare_template_processor(&discovered, project_root)?;

    // 3. スタック定義の展開とパース
    debug!(file = %stack_file.display(), "Step 3: Rendering stack file");
    let rendered = processor.render_file(stack_file)?;
    let mut declaration = parse_stack_document(&rendered)?;

    // 4. ローカルオーバーライドのマージ
    if let Some(local_file) = &discovered.local_override {
        debug!(file = %local_file.display(), "Step 4: Merging local override");
        let rendered = processor.render_file(local_file)?;
        declaration = declaration.merge(parse_stack_document(&rendered)?);
    }

    let config = declaration.into_config()?;
    info!(
        stack = %config.name,
        location = %config.location,
        "Stack config loaded successfully"
    );

    Ok(config)
}

/// テンプレートプロセッサを準備
///
/// 変数の優先順位（後から追加されたものが優先）:
/// 1. ビルトイン変数（PROJECT_ROOT）
/// 2. .env ファイル
/// 3. 環境変数（SORA_*, CI_*, APP_* プレフィックスのみ）
fn prepare_template_processor(
    discovered: &DiscoveredFiles,
    project_root: &Path,
) -> Result<TemplateProcessor> {
    let mut processor = TemplateProcessor::new();

    processor.add_variable(
        "PROJECT_ROOT",
        serde_json::Value::String(project_root.to_string_lossy().to_string()),
    );

    if let Some(env_file) = &discovered.env_file {
        processor.add_env_file_variables(env_file)?;
    }

    processor.add_env_variables();

    Ok(processor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_load_stack_basic() -> Result<()> {
        let temp_dir = tempfile::tempdir().unwrap();
        let project_root = temp_dir.path();

        fs::write(
            project_root.join("sora.kdl"),
            r#"
stack "webstack" {
    location "southeastasia"
    sql-admin "sqladminuser"
    runtime "NODE|16-lts"
}
"#,
        )?;

        let config = load_stack(project_root)?;

        assert_eq!(config.name, "webstack");
        assert_eq!(config.location, "southeastasia");
        assert_eq!(config.sql_admin, "sqladminuser");
        assert_eq!(config.runtime, "NODE|16-lts");

        Ok(())
    }

    #[test]
    fn test_load_stack_applies_defaults() -> Result<()> {
        let temp_dir = tempfile::tempdir().unwrap();
        let project_root = temp_dir.path();

        fs::write(project_root.join("sora.kdl"), r#"stack "minimal""#)?;

        let config = load_stack(project_root)?;

        assert_eq!(config.name, "minimal");
        assert_eq!(config.location, "southeastasia");
        assert_eq!(config.sql_admin, "sqladminuser");
        assert_eq!(config.runtime, "NODE|16-lts");

        Ok(())
    }

    #[test]
    fn test_load_stack_with_local_override() -> Result<()> {
        let temp_dir = tempfile::tempdir().unwrap();
        let project_root = temp_dir.path();

        fs::write(
            project_root.join("sora.kdl"),
            r#"
stack "webstack" {
    location "southeastasia"
}
"#,
        )?;

        // sora.local.kdl の定義が優先される
        fs::write(
            project_root.join("sora.local.kdl"),
            r#"
stack {
    location "japaneast"
}
"#,
        )?;

        let config = load_stack(project_root)?;

        assert_eq!(config.name, "webstack");
        assert_eq!(config.location, "japaneast");

        Ok(())
    }

    #[test]
    fn test_load_stack_with_env_file() -> Result<()> {
        let temp_dir = tempfile::tempdir().unwrap();
        let project_root = temp_dir.path();

        fs::create_dir_all(project_root.join(".soraflow"))?;
        fs::write(
            project_root.join(".soraflow/.env"),
            "DEPLOY_LOCATION=japaneast\n",
        )?;
        fs::write(
            project_root.join(".soraflow/sora.kdl"),
            r#"
stack "webstack" {
    location "{{ DEPLOY_LOCATION }}"
}
"#,
        )?;

        let config = load_stack(project_root)?;

        assert_eq!(config.location, "japaneast");

        Ok(())
    }

    #[test]
    fn test_load_stack_with_env_variable() -> Result<()> {
        let temp_dir = tempfile::tempdir().unwrap();
        let project_root = temp_dir.path();

        fs::write(
            project_root.join("sora.kdl"),
            r#"
stack "webstack" {
    location "{{ SORA_DEPLOY_LOCATION }}"
}
"#,
        )?;

        let config = temp_env::with_var("SORA_DEPLOY_LOCATION", Some("eastasia"), || {
            load_stack(project_root)
        })?;

        assert_eq!(config.location, "eastasia");

        Ok(())
    }

    #[test]
    fn test_load_stack_missing_file() {
        let temp_dir = tempfile::tempdir().unwrap();

        let result = load_stack(temp_dir.path());

        assert!(matches!(result, Err(TopologyError::InvalidConfig(_))));
    }

    #[test]
    fn test_load_stack_undefined_template_variable() -> Result<()> {
        let temp_dir = tempfile::tempdir().unwrap();
        let project_root = temp_dir.path();

        fs::write(
            project_root.join("sora.kdl"),
            r#"
stack "webstack" {
    location "{{ NOT_DEFINED_ANYWHERE }}"
}
"#,
        )?;

        let result = load_stack(project_root);

        assert!(matches!(result, Err(TopologyError::TemplateError { .. })));

        Ok(())
    }
}
