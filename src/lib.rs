// ==========================================
// 商品目录导入导出 - 核心库
// ==========================================
// 技术栈: Rust + SQLite + XLSX (calamine / rust_xlsxwriter)
// 系统定位: 动态表头的商品目录电子表格导入导出引擎
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 导入层 - 工作簿 → 记录
pub mod importer;

// 导出层 - 记录 → 工作簿
pub mod exporter;

// 配置层 - 同义词表与导入导出配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{CanonicalField, ImportMode};

// 领域实体
pub use domain::{
    AttributeMap, CatalogRecord, ExportSnapshot, HeaderColumn, ImportBatch, ImportSummary,
};

// 导入导出
pub use exporter::{CatalogExporter, ExportError};
pub use importer::{CancelFlag, CatalogImporter, CatalogImporterImpl, ImportError, ProgressSink};

// API
pub use api::{ApiError, CatalogApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "商品目录导入导出";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
