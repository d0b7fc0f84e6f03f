// ==========================================
// 商品目录导入导出 - 目录 Repository Trait
// ==========================================
// 职责: 定义记录 / 属性 / 表头顺序 / 批次历史 的数据访问接口
// 红线: Repository 不含业务规则，只做数据 CRUD
// ==========================================

use crate::domain::{
    AttributeMap, CatalogRecord, CatalogWriteBatch, ExportSnapshot, HeaderColumn, ImportBatch,
};
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;
use std::collections::HashMap;

/// code → (规范列名 → 值)
pub type AttributeLookup = HashMap<String, HashMap<String, Option<String>>>;

// ==========================================
// CatalogRepository Trait
// ==========================================
// 用途: 导入管道与导出管道的记录存储
// 实现者: CatalogRepositoryImpl（使用 rusqlite）
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    // ===== 单项操作 =====

    /// 按编码新建或替换记录（保留原 created_at）
    ///
    /// # 返回
    /// - Err(ValidationError): 编码为空
    async fn upsert_record(&self, record: &CatalogRecord) -> RepositoryResult<()>;

    /// 整体替换某记录的属性集合（先删后插）
    ///
    /// # 返回
    /// - Ok(usize): 写入的属性条数
    async fn replace_attributes(
        &self,
        code: &str,
        attributes: &AttributeMap,
    ) -> RepositoryResult<usize>;

    /// 表头顺序（按 position 升序）
    async fn get_header_order(&self) -> RepositoryResult<Vec<HeaderColumn>>;

    /// 整体替换表头顺序
    async fn set_header_order(&self, columns: &[HeaderColumn]) -> RepositoryResult<()>;

    /// 清空记录、属性与表头顺序（批次历史保留）
    async fn clear_all(&self) -> RepositoryResult<()>;

    // ===== 查询 =====

    /// 全部记录（按名称、编码排序）
    async fn list_records(&self) -> RepositoryResult<Vec<CatalogRecord>>;

    async fn find_record(&self, code: &str) -> RepositoryResult<Option<CatalogRecord>>;

    /// 按编码与列名批量取属性
    ///
    /// # 说明
    /// - codes 或 keys 为空时返回空表
    /// - 结果只包含实际存在的 (code, key) 组合
    async fn get_attributes(
        &self,
        codes: &[String],
        keys: &[String],
    ) -> RepositoryResult<AttributeLookup>;

    async fn count_records(&self) -> RepositoryResult<usize>;

    /// 已知的全部属性键（表头顺序 ∪ 已存储属性，去重排序）
    async fn list_attribute_keys(&self) -> RepositoryResult<Vec<String>>;

    // ===== 批量（事务化）=====

    /// 单事务提交一次导入：可选清空 → 可选替换表头顺序 → 逐条 upsert + 替换属性 → 批次历史
    ///
    /// # 返回
    /// - Ok(usize): 写入的记录数
    /// - Err: 数据库错误（整个事务回滚）
    async fn commit_import(&self, batch: CatalogWriteBatch) -> RepositoryResult<usize>;

    /// 导出只读快照（表头顺序 + 记录 + 属性在同一读事务内读取）
    async fn load_export_snapshot(&self) -> RepositoryResult<ExportSnapshot>;

    // ===== 批次历史 =====

    async fn insert_batch(&self, batch: &ImportBatch) -> RepositoryResult<()>;

    /// 最近的导入批次（按导入时间倒序）
    async fn get_recent_batches(&self, limit: usize) -> RepositoryResult<Vec<ImportBatch>>;
}
