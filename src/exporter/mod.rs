// ==========================================
// 商品目录导入导出 - 导出层
// ==========================================
// 职责: 表头顺序 + 记录 + 属性 → 工作簿字节流（只读）
// ==========================================

pub mod catalog_exporter;
pub mod error;

pub use catalog_exporter::{CatalogExporter, ExportOptions};
pub use error::{ExportError, ExportResult};
