//! モデル定義
//!
//! soraflowで使用されるデータモデルを定義します。
//! スタック設定、リソースノード、トポロジーをモジュールに分離しています。

mod resource;
mod stack;
mod topology;

// Re-exports
pub use resource::*;
pub use stack::*;
pub use topology::*;
