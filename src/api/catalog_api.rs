// ==========================================
// 商品目录导入导出 - 目录API
// ==========================================
// 职责: 供宿主应用调用的库入口（导入 / 导出 / 查询 / 配置）
// 说明: 仓储与配置管理器共用同一 SQLite 连接
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::{ConfigManager, SynonymTable};
use crate::db::open_shared_connection;
use crate::domain::types::ImportMode;
use crate::domain::{CatalogRecord, ImportBatch, ImportSummary};
use crate::exporter::CatalogExporter;
use crate::importer::{CancelFlag, CatalogImporter, CatalogImporterImpl, ProgressSink};
use crate::repository::{AttributeLookup, CatalogRepository, CatalogRepositoryImpl};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// 最近批次查询上限
const MAX_RECENT_BATCHES: usize = 200;

// ==========================================
// CatalogApi - 目录API
// ==========================================
pub struct CatalogApi {
    repo: CatalogRepositoryImpl,
    config: Arc<ConfigManager>,
    importer: CatalogImporterImpl<CatalogRepositoryImpl, Arc<ConfigManager>>,
    exporter: CatalogExporter<CatalogRepositoryImpl, Arc<ConfigManager>>,
}

impl CatalogApi {
    /// 打开（必要时创建）数据库并组装导入/导出管道
    ///
    /// # 参数
    /// - db_path: SQLite 数据库文件路径
    pub fn new(db_path: &str) -> ApiResult<Self> {
        let conn = open_shared_connection(db_path).map_err(|e| {
            ApiError::DatabaseConnectionError(format!("打开数据库失败 ({}): {}", db_path, e))
        })?;

        let config = Arc::new(ConfigManager::from_connection(conn.clone())?);
        let repo = CatalogRepositoryImpl::from_connection(conn);

        info!(db_path = %db_path, "CatalogApi 初始化完成");
        Ok(Self {
            importer: CatalogImporterImpl::new(repo.clone(), config.clone()),
            exporter: CatalogExporter::new(repo.clone(), config.clone()),
            repo,
            config,
        })
    }

    // ==========================================
    // 导入
    // ==========================================

    /// 从 XLSX 字节流导入
    ///
    /// # 参数
    /// - bytes: 工作簿字节流
    /// - overwrite: true = 覆盖导入；false = 追加导入
    /// - progress: 进度接收方
    /// - cancel: 取消标记（可选）
    pub async fn import_xlsx(
        &self,
        bytes: &[u8],
        overwrite: bool,
        progress: &dyn ProgressSink,
        cancel: Option<&CancelFlag>,
    ) -> ApiResult<ImportSummary> {
        let mode = ImportMode::from_overwrite_flag(overwrite);
        Ok(self.importer.import_xlsx(bytes, mode, progress, cancel).await?)
    }

    /// 从磁盘上的 .xlsx 文件导入
    pub async fn import_xlsx_file(
        &self,
        file_path: &Path,
        overwrite: bool,
        progress: &dyn ProgressSink,
        cancel: Option<&CancelFlag>,
    ) -> ApiResult<ImportSummary> {
        let mode = ImportMode::from_overwrite_flag(overwrite);
        Ok(self
            .importer
            .import_xlsx_file(file_path, mode, progress, cancel)
            .await?)
    }

    // ==========================================
    // 导出
    // ==========================================

    /// 导出为 XLSX 字节流
    pub async fn export_xlsx(&self) -> ApiResult<Vec<u8>> {
        Ok(self.exporter.export_xlsx().await?)
    }

    /// 导出到目录（None = 配置的默认导出目录）
    pub async fn export_xlsx_to_file(&self, dir: Option<&Path>) -> ApiResult<PathBuf> {
        Ok(self.exporter.export_xlsx_to_file(dir).await?)
    }

    // ==========================================
    // 查询
    // ==========================================

    /// 按编码与列名批量取属性
    ///
    /// # 说明
    /// - codes 或 keys 为空时直接返回空表（不访问数据库）
    /// - 编码与列名会先去除首尾空白并丢弃空串
    pub async fn get_attributes_for(
        &self,
        codes: &[String],
        keys: &[String],
    ) -> ApiResult<AttributeLookup> {
        let codes = clean_inputs(codes);
        let keys = clean_inputs(keys);
        if codes.is_empty() || keys.is_empty() {
            debug!("编码或列名为空，返回空结果");
            return Ok(AttributeLookup::new());
        }

        Ok(self.repo.get_attributes(&codes, &keys).await?)
    }

    /// 全部记录（按名称、编码排序）
    pub async fn list_records(&self) -> ApiResult<Vec<CatalogRecord>> {
        Ok(self.repo.list_records().await?)
    }

    /// 按编码查询记录
    pub async fn get_record(&self, code: &str) -> ApiResult<CatalogRecord> {
        let code = code.trim();
        if code.is_empty() {
            return Err(ApiError::InvalidInput("编码不能为空".to_string()));
        }
        self.repo
            .find_record(code)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("记录(code={})不存在", code)))
    }

    /// 记录总数
    pub async fn count_records(&self) -> ApiResult<usize> {
        Ok(self.repo.count_records().await?)
    }

    /// 已知的全部属性键（供宿主应用选择要查询的列）
    pub async fn available_keys(&self) -> ApiResult<Vec<String>> {
        Ok(self.repo.list_attribute_keys().await?)
    }

    /// 最近的导入批次
    pub async fn recent_batches(&self, limit: usize) -> ApiResult<Vec<ImportBatch>> {
        if limit == 0 {
            return Err(ApiError::InvalidInput("limit 必须 ≥ 1".to_string()));
        }
        Ok(self
            .repo
            .get_recent_batches(limit.min(MAX_RECENT_BATCHES))
            .await?)
    }

    // ==========================================
    // 配置
    // ==========================================

    /// 保存同义词覆盖表（下一次导入生效）
    pub fn set_synonym_table(&self, table: &SynonymTable) -> ApiResult<()> {
        Ok(self.config.set_synonym_table(table)?)
    }

    /// 写入全局配置项
    pub fn set_config_value(&self, key: &str, value: &str) -> ApiResult<()> {
        if key.trim().is_empty() {
            return Err(ApiError::InvalidInput("配置键不能为空".to_string()));
        }
        Ok(self.config.set_global_value(key, value)?)
    }

    /// 读取全局配置项
    pub fn get_config_value(&self, key: &str) -> ApiResult<Option<String>> {
        Ok(self.config.get_global_value(key)?)
    }
}

/// 去除首尾空白、丢弃空串、保持顺序去重
fn clean_inputs(values: &[String]) -> Vec<String> {
    let mut cleaned: Vec<String> = Vec::with_capacity(values.len());
    for value in values {
        let value = value.trim();
        if !value.is_empty() && !cleaned.iter().any(|v| v == value) {
            cleaned.push(value.to_string());
        }
    }
    cleaned
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::importer::NoProgress;
    use rust_xlsxwriter::Workbook;
    use tempfile::NamedTempFile;

    fn create_api() -> (NamedTempFile, CatalogApi) {
        let temp_file = NamedTempFile::new().unwrap();
        let api = CatalogApi::new(temp_file.path().to_str().unwrap()).unwrap();
        (temp_file, api)
    }

    fn workbook(rows: &[&[&str]]) -> Vec<u8> {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        for (r, row) in rows.iter().enumerate() {
            for (c, value) in row.iter().enumerate() {
                sheet.write_string(r as u32, c as u16, *value).unwrap();
            }
        }
        workbook.save_to_buffer().unwrap()
    }

    #[test]
    fn test_clean_inputs() {
        let values = vec![
            " sku ".to_string(),
            "".to_string(),
            "sku".to_string(),
            "cor".to_string(),
        ];
        assert_eq!(clean_inputs(&values), vec!["sku", "cor"]);
    }

    #[tokio::test]
    async fn test_get_attributes_for_empty_inputs() {
        let (_tmp, api) = create_api();

        let result = api
            .get_attributes_for(&[], &["sku".to_string()])
            .await
            .unwrap();
        assert!(result.is_empty());

        let result = api
            .get_attributes_for(&["P1".to_string()], &["  ".to_string()])
            .await
            .unwrap();
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_import_then_query() {
        let (_tmp, api) = create_api();
        let bytes = workbook(&[&["Produto", "Nome", "Cor"], &["P1", "Caneta", "Azul"]]);

        let summary = api.import_xlsx(&bytes, true, &NoProgress, None).await.unwrap();
        assert_eq!(summary.imported, 1);

        let record = api.get_record("P1").await.unwrap();
        assert_eq!(record.name, "Caneta");

        let lookup = api
            .get_attributes_for(&["P1".to_string()], &["cor".to_string()])
            .await
            .unwrap();
        assert_eq!(lookup["P1"]["cor"], Some("Azul".to_string()));

        let keys = api.available_keys().await.unwrap();
        assert!(keys.contains(&"sku".to_string()));
        assert!(keys.contains(&"cor".to_string()));

        let batches = api.recent_batches(10).await.unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].mode, ImportMode::Overwrite);
    }

    #[tokio::test]
    async fn test_get_record_errors() {
        let (_tmp, api) = create_api();
        assert!(matches!(
            api.get_record("  ").await,
            Err(ApiError::InvalidInput(_))
        ));
        assert!(matches!(
            api.get_record("NOPE").await,
            Err(ApiError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_unreadable_bytes_surface_as_workbook_unreadable() {
        let (_tmp, api) = create_api();
        let result = api.import_xlsx(b"not a workbook", true, &NoProgress, None).await;
        assert!(matches!(result, Err(ApiError::WorkbookUnreadable(_))));
        assert_eq!(api.count_records().await.unwrap(), 0);
    }
}
