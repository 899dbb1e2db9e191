use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TopologyError {
    #[error("KDLパースエラー: {0}")]
    KdlParse(#[from] kdl::KdlError),

    #[error("ファイル読み込みエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error("IO エラー: {path}\n理由: {message}")]
    IoError { path: PathBuf, message: String },

    #[error("無効な設定: {0}")]
    InvalidConfig(String),

    #[error("テンプレート展開エラー: {0}")]
    TemplateRenderError(String),

    #[error("テンプレートエラー: {file}\n理由: {message}")]
    TemplateError { file: PathBuf, message: String },

    #[error(
        "プロジェクトルートが見つかりません\n探索開始位置: {0}\nヒント: sora.kdl ファイルを含むディレクトリで実行してください"
    )]
    ProjectRootNotFound(PathBuf),

    #[error("リソース名が重複しています: {0}")]
    DuplicateResource(String),

    #[error("リソース '{resource}' が未定義のリソース '{dependency}' を参照しています")]
    UnknownReference { resource: String, dependency: String },

    #[error(
        "リソース '{resource}' が後方で宣言されるリソース '{dependency}' を参照しています（前方参照は許可されません）"
    )]
    ForwardReference { resource: String, dependency: String },

    #[error("循環依存が検出されました: {0}")]
    CircularDependency(String),

    #[error("リソース '{resource}' の定義が不正です: {message}")]
    InvalidResource { resource: String, message: String },
}

pub type Result<T> = std::result::Result<T, TopologyError>;
