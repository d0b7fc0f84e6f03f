// ==========================================
// 商品目录导入导出 - 数据仓储层
// ==========================================
// 职责: 数据访问,不含业务逻辑
// 红线: Repository 不含业务规则
// ==========================================

pub mod catalog_repo;
pub mod catalog_repo_impl;
pub mod error;

// 重导出核心仓储
pub use catalog_repo::{AttributeLookup, CatalogRepository};
pub use catalog_repo_impl::CatalogRepositoryImpl;
pub use error::{RepositoryError, RepositoryResult};
