//! SoraFlow Core
//!
//! KDLで宣言されたスタック設定を読み込み、Azureリソースの
//! トポロジー（依存関係を持つリソースグラフ）を構築するコア機能を提供します。
//!
//! - 設定ファイルの発見とテンプレート展開 ([`discovery`], [`template`])
//! - KDLパース ([`parser`], [`loader`])
//! - リソースモデルとトポロジー検証 ([`model`])
//! - 決定的な物理名の導出 ([`naming`])
//! - SQL管理者パスワードの生成 ([`password`])

pub mod discovery;
pub mod error;
pub mod loader;
pub mod model;
pub mod naming;
pub mod parser;
pub mod password;
pub mod template;

// Re-exports
pub use discovery::{DiscoveredFiles, discover_files, find_project_root};
pub use error::{Result, TopologyError};
pub use loader::load_stack;
pub use model::*;
pub use password::{PasswordPolicy, Secret, generate_password};
pub use template::TemplateProcessor;
