//! スタック宣言のパース
//!
//! テンプレート展開済みのKDL文字列から stack ノードを読み取ります。

use crate::error::{Result, TopologyError};
use crate::model::{DEFAULT_LOCATION, DEFAULT_RUNTIME, DEFAULT_SQL_ADMIN, StackConfig};
use kdl::{KdlDocument, KdlNode};

/// パース直後のスタック宣言
///
/// すべてのフィールドが省略可能です。オーバーライドファイルは
/// 上書きしたい項目だけを宣言できます。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StackDeclaration {
    pub name: Option<String>,
    pub location: Option<String>,
    pub sql_admin: Option<String>,
    pub runtime: Option<String>,
}

impl StackDeclaration {
    /// オーバーレイをマージ（オーバーレイ側の宣言が優先）
    pub fn merge(self, overlay: Self) -> Self {
        Self {
            name: overlay.name.or(self.name),
            location: overlay.location.or(self.location),
            sql_admin: overlay.sql_admin.or(self.sql_admin),
            runtime: overlay.runtime.or(self.runtime),
        }
    }

    /// 宣言を確定してスタック設定に変換
    ///
    /// スタック名は必須。その他の項目にはデフォルトが適用されます。
    pub fn into_config(self) -> Result<StackConfig> {
        let name = self.name.ok_or_else(|| {
            TopologyError::InvalidConfig(
                "stack 宣言が見つかりません。sora.kdl に stack \"名前\" { ... } を定義してください".to_string(),
            )
        })?;

        if name.trim().is_empty() {
            return Err(TopologyError::InvalidConfig(
                "スタック名が空です".to_string(),
            ));
        }

        Ok(StackConfig {
            name,
            location: self.location.unwrap_or_else(|| DEFAULT_LOCATION.to_string()),
            sql_admin: self
                .sql_admin
                .unwrap_or_else(|| DEFAULT_SQL_ADMIN.to_string()),
            runtime: self.runtime.unwrap_or_else(|| DEFAULT_RUNTIME.to_string()),
        })
    }
}

/// KDL文字列からスタック宣言をパース
///
/// stack ノードが複数ある場合は後の宣言が優先されます。
/// stack ノードが無い文書も有効です（空の宣言を返す）。
pub fn parse_stack_document(content: &str) -> Result<StackDeclaration> {
    let doc: KdlDocument = content.parse()?;

    let mut declaration = StackDeclaration::default();
    for node in doc.nodes() {
        if node.name().value() == "stack" {
            declaration = declaration.merge(parse_stack_node(node));
        }
    }

    Ok(declaration)
}

/// stack ノードをパース
fn parse_stack_node(node: &KdlNode) -> StackDeclaration {
    let mut declaration = StackDeclaration {
        name: node
            .entries()
            .first()
            .and_then(|e| e.value().as_string())
            .map(|s| s.to_string()),
        ..Default::default()
    };

    if let Some(children) = node.children() {
        for child in children.nodes() {
            match child.name().value() {
                "location" => {
                    declaration.location = child
                        .entries()
                        .first()
                        .and_then(|e| e.value().as_string())
                        .map(|s| s.to_string());
                }
                "sql_admin" | "sql-admin" => {
                    declaration.sql_admin = child
                        .entries()
                        .first()
                        .and_then(|e| e.value().as_string())
                        .map(|s| s.to_string());
                }
                "runtime" => {
                    declaration.runtime = child
                        .entries()
                        .first()
                        .and_then(|e| e.value().as_string())
                        .map(|s| s.to_string());
                }
                // 未知のキーは無視（将来の拡張やコメント用途）
                _ => {}
            }
        }
    }

    declaration
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_stack_full() {
        let kdl = r#"
            stack "webstack" {
                location "southeastasia"
                sql-admin "sqladminuser"
                runtime "NODE|16-lts"
            }
        "#;

        let declaration = parse_stack_document(kdl).unwrap();

        assert_eq!(declaration.name, Some("webstack".to_string()));
        assert_eq!(declaration.location, Some("southeastasia".to_string()));
        assert_eq!(declaration.sql_admin, Some("sqladminuser".to_string()));
        assert_eq!(declaration.runtime, Some("NODE|16-lts".to_string()));
    }

    #[test]
    fn test_parse_stack_minimal() {
        let kdl = r#"stack "webstack""#;

        let declaration = parse_stack_document(kdl).unwrap();

        assert_eq!(declaration.name, Some("webstack".to_string()));
        assert!(declaration.location.is_none());
        assert!(declaration.sql_admin.is_none());
        assert!(declaration.runtime.is_none());
    }

    #[test]
    fn test_parse_snake_case_keys() {
        let kdl = r#"
            stack "webstack" {
                sql_admin "dbadmin"
            }
        "#;

        let declaration = parse_stack_document(kdl).unwrap();

        assert_eq!(declaration.sql_admin, Some("dbadmin".to_string()));
    }

    #[test]
    fn test_parse_document_without_stack_node() {
        let kdl = r#"// コメントのみ"#;

        let declaration = parse_stack_document(kdl).unwrap();

        assert_eq!(declaration, StackDeclaration::default());
    }

    #[test]
    fn test_parse_unknown_keys_are_ignored() {
        let kdl = r#"
            stack "webstack" {
                location "southeastasia"
                future-setting "ignored"
            }
        "#;

        let declaration = parse_stack_document(kdl).unwrap();

        assert_eq!(declaration.name, Some("webstack".to_string()));
        assert_eq!(declaration.location, Some("southeastasia".to_string()));
    }

    #[test]
    fn test_last_stack_declaration_wins() {
        let kdl = r#"
            stack "first" {
                location "japaneast"
            }
            stack "second"
        "#;

        let declaration = parse_stack_document(kdl).unwrap();

        // 名前は後勝ち、locationは後の宣言が省略しているため維持される
        assert_eq!(declaration.name, Some("second".to_string()));
        assert_eq!(declaration.location, Some("japaneast".to_string()));
    }

    #[test]
    fn test_parse_invalid_kdl() {
        let kdl = r#"stack "webstack" { location"#;

        let result = parse_stack_document(kdl);

        assert!(matches!(result, Err(TopologyError::KdlParse(_))));
    }

    #[test]
    fn test_merge_overlay_wins() {
        let base = StackDeclaration {
            name: Some("webstack".to_string()),
            location: Some("southeastasia".to_string()),
            sql_admin: None,
            runtime: None,
        };
        let overlay = StackDeclaration {
            name: None,
            location: Some("japaneast".to_string()),
            sql_admin: Some("localadmin".to_string()),
            runtime: None,
        };

        let merged = base.merge(overlay);

        assert_eq!(merged.name, Some("webstack".to_string()));
        assert_eq!(merged.location, Some("japaneast".to_string()));
        assert_eq!(merged.sql_admin, Some("localadmin".to_string()));
        assert!(merged.runtime.is_none());
    }

    #[test]
    fn test_into_config_applies_defaults() {
        let declaration = StackDeclaration {
            name: Some("webstack".to_string()),
            ..Default::default()
        };

        let config = declaration.into_config().unwrap();

        assert_eq!(config.name, "webstack");
        assert_eq!(config.location, "southeastasia");
        assert_eq!(config.sql_admin, "sqladminuser");
        assert_eq!(config.runtime, "NODE|16-lts");
    }

    #[test]
    fn test_into_config_requires_name() {
        let declaration = StackDeclaration::default();

        let result = declaration.into_config();

        assert!(matches!(result, Err(TopologyError::InvalidConfig(_))));
    }

    #[test]
    fn test_into_config_rejects_blank_name() {
        let declaration = StackDeclaration {
            name: Some("   ".to_string()),
            ..Default::default()
        };

        let result = declaration.into_config();

        assert!(matches!(result, Err(TopologyError::InvalidConfig(_))));
    }
}
