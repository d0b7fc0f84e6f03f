// ==========================================
// 商品目录导入导出 - 目录领域模型
// ==========================================
// 职责: 记录 / 属性 / 表头顺序 / 导入批次 等实体
// ==========================================

use crate::domain::types::ImportMode;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 单条记录的动态属性：规范列名 → 单元格原文（None = 空/缺失）
///
/// 使用 IndexMap 保持源文件中的列顺序
pub type AttributeMap = IndexMap<String, Option<String>>;

// ==========================================
// CatalogRecord - 目录记录
// ==========================================
// 主键: code（非空、全库唯一）
// name 缺失时取 code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogRecord {
    pub code: String,                 // 编码（Identifier）
    pub name: String,                 // 名称
    pub description: Option<String>,  // 描述
    pub category: Option<String>,     // 分类
    pub unit: Option<String>,         // 单位

    // ===== 审计字段 =====
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CatalogRecord {
    /// 仅含编码的记录（名称回退为编码）
    pub fn new(code: impl Into<String>) -> Self {
        let code = code.into();
        let now = Utc::now();
        Self {
            name: code.clone(),
            code,
            description: None,
            category: None,
            unit: None,
            created_at: now,
            updated_at: now,
        }
    }
}

// ==========================================
// HeaderColumn - 表头顺序中的一列
// ==========================================
// raw_header: 源文件第一行原文（导出时原样输出）
// canonical_key: 导入时分配的去重规范列名（导出时按此键取属性，避免重新推导）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderColumn {
    pub position: usize,
    pub raw_header: String,
    pub canonical_key: String,
}

// ==========================================
// ImportBatch - 导入批次历史
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportBatch {
    pub batch_id: String,                 // 批次 ID（UUID）
    pub mode: ImportMode,                 // 导入模式
    pub total_rows: usize,                // 数据行总数（不含表头）
    pub imported_rows: usize,             // 落库记录数
    pub skipped_blank_rows: usize,        // 编码为空而跳过的行
    pub duplicate_rows: usize,            // 批内重复编码而丢弃的行
    pub decode_failures: usize,           // 无法解码的单元格数
    pub identifier_fallback: bool,        // 编码列是否回退到第 0 列
    pub unexported_columns: Vec<String>,  // 追加导入中不在表头顺序内的列（不会出现在导出中）
    pub imported_at: DateTime<Utc>,
    pub elapsed_ms: Option<i64>,
}

// ==========================================
// ImportSummary - 导入结果
// ==========================================
// 用途: 导入接口返回值
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportSummary {
    pub batch_id: String,
    pub mode: ImportMode,
    pub total_rows: usize,
    pub imported: usize,               // 成功落库的不同记录数
    pub skipped_blank: usize,
    pub duplicates: usize,
    pub decode_failures: usize,
    pub identifier_fallback: bool,
    pub unexported_columns: Vec<String>,
    pub elapsed_ms: i64,
}

impl From<&ImportBatch> for ImportSummary {
    fn from(batch: &ImportBatch) -> Self {
        Self {
            batch_id: batch.batch_id.clone(),
            mode: batch.mode,
            total_rows: batch.total_rows,
            imported: batch.imported_rows,
            skipped_blank: batch.skipped_blank_rows,
            duplicates: batch.duplicate_rows,
            decode_failures: batch.decode_failures,
            identifier_fallback: batch.identifier_fallback,
            unexported_columns: batch.unexported_columns.clone(),
            elapsed_ms: batch.elapsed_ms.unwrap_or_default(),
        }
    }
}

// ==========================================
// CatalogWriteBatch - 一次导入的完整写入内容
// ==========================================
// 仓储在单个事务内落库，失败则整体回滚
#[derive(Debug, Clone)]
pub struct CatalogWriteBatch {
    pub clear_existing: bool,                        // Overwrite: 先清空
    pub header_order: Option<Vec<HeaderColumn>>,     // Some: 写入表头顺序
    pub header_order_if_empty: bool,                 // true: 仅在已有表头顺序为空时写入（Append）
    pub records: Vec<(CatalogRecord, AttributeMap)>, // 记录 + 该记录的全部属性
    pub batch: ImportBatch,                          // 批次历史
}

// ==========================================
// ExportSnapshot - 导出只读快照
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct ExportSnapshot {
    pub header_order: Vec<HeaderColumn>,
    pub records: Vec<CatalogRecord>,
    pub attributes: HashMap<String, HashMap<String, Option<String>>>, // code → key → value
}
