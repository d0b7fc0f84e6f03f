// ==========================================
// 商品目录导入导出 - 领域模型层
// ==========================================
// 职责: 定义领域实体与类型
// 红线: 不含数据访问逻辑,不含导入/导出流程
// ==========================================

pub mod catalog;
pub mod types;

// 重导出核心类型
pub use catalog::{
    AttributeMap, CatalogRecord, CatalogWriteBatch, ExportSnapshot, HeaderColumn, ImportBatch,
    ImportSummary,
};
pub use types::{CanonicalField, ImportMode};
