// ==========================================
// 商品目录导入导出 - 领域枚举类型
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// ImportMode - 导入模式
// ==========================================
// Overwrite: 清空记录/属性/表头顺序后导入，本批表头成为新的表头顺序
// Append:    保留已有数据，按编码 upsert；表头顺序维持上一次覆盖导入的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImportMode {
    Overwrite,
    Append,
}

impl ImportMode {
    /// 由“是否覆盖”开关转换
    pub fn from_overwrite_flag(overwrite: bool) -> Self {
        if overwrite {
            ImportMode::Overwrite
        } else {
            ImportMode::Append
        }
    }

    pub fn to_db_str(self) -> &'static str {
        match self {
            ImportMode::Overwrite => "OVERWRITE",
            ImportMode::Append => "APPEND",
        }
    }

    pub fn from_db_str(raw: &str) -> Option<Self> {
        match raw.trim().to_uppercase().as_str() {
            "OVERWRITE" => Some(ImportMode::Overwrite),
            "APPEND" => Some(ImportMode::Append),
            _ => None,
        }
    }
}

impl fmt::Display for ImportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_str())
    }
}

// ==========================================
// CanonicalField - 规范字段
// ==========================================
// 每批次每个规范字段最多绑定一列；未绑定的列仅作为属性保存
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalField {
    Identifier,
    Name,
    Description,
    Category,
    Unit,
}

impl CanonicalField {
    /// 列解析顺序（同时也是列独占的优先顺序）
    pub const RESOLUTION_ORDER: [CanonicalField; 5] = [
        CanonicalField::Identifier,
        CanonicalField::Name,
        CanonicalField::Description,
        CanonicalField::Category,
        CanonicalField::Unit,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CanonicalField::Identifier => "identifier",
            CanonicalField::Name => "name",
            CanonicalField::Description => "description",
            CanonicalField::Category => "category",
            CanonicalField::Unit => "unit",
        }
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_import_mode_db_str_roundtrip() {
        for mode in [ImportMode::Overwrite, ImportMode::Append] {
            assert_eq!(ImportMode::from_db_str(mode.to_db_str()), Some(mode));
        }
        assert_eq!(ImportMode::from_db_str(" append "), Some(ImportMode::Append));
        assert_eq!(ImportMode::from_db_str("MERGE"), None);
    }

    #[test]
    fn test_overwrite_flag() {
        assert_eq!(ImportMode::from_overwrite_flag(true), ImportMode::Overwrite);
        assert_eq!(ImportMode::from_overwrite_flag(false), ImportMode::Append);
    }

    #[test]
    fn test_resolution_order_starts_with_identifier() {
        assert_eq!(CanonicalField::RESOLUTION_ORDER[0], CanonicalField::Identifier);
        assert_eq!(CanonicalField::RESOLUTION_ORDER.len(), 5);
    }
}
