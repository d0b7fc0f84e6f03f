// ==========================================
// 商品目录导入导出 - API 层
// ==========================================
// 职责: 提供库级业务接口，供宿主应用调用
// ==========================================

pub mod catalog_api;
pub mod error;

// 重导出核心类型
pub use catalog_api::CatalogApi;
pub use error::{ApiError, ApiResult};
