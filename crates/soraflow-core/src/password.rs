//! SQL管理者パスワードの生成
//!
//! パスワードはデプロイごとに一度だけ生成され、ステートに記録された値が
//! 以降の実行で再利用されます。生成にはOSの乱数源を使用します。

use rand::Rng;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};

/// ログに出力してはならない秘密値
///
/// `Debug`/`Display` は常にマスクされた表現を返します。
/// 実際の値が必要な場面（CLIコマンドへの受け渡しなど）では
/// [`Secret::expose`] を明示的に呼び出します。
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// 秘密値そのものを返す
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Secret(********)")
    }
}

impl std::fmt::Display for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "********")
    }
}

/// パスワード生成ポリシー
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordPolicy {
    /// パスワード長
    pub length: usize,

    /// 記号を含めるか
    pub special: bool,

    /// 使用を許可する記号（`special` が有効な場合のみ）
    pub override_special: String,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            length: 16,
            special: true,
            override_special: "_@%".to_string(),
        }
    }
}

/// ポリシーに従ってパスワードを生成
///
/// 文字種は英大小文字・数字に加え、`override_special` の記号のみ。
pub fn generate_password(policy: &PasswordPolicy) -> Secret {
    let mut charset: Vec<char> = ('A'..='Z').chain('a'..='z').chain('0'..='9').collect();
    if policy.special {
        charset.extend(policy.override_special.chars());
    }

    let mut rng = OsRng;
    let value: String = (0..policy.length)
        .map(|_| charset[rng.gen_range(0..charset.len())])
        .collect();

    Secret::new(value)
}
