// ==========================================
// 商品目录导入导出 - 目录导入器实现
// ==========================================
// 职责: 整合导入流程，从工作簿字节流到数据库
// 流程: 解析 → 表头规范化/去重/字段解析 → 逐行解析 + 批内去重 → 单事务落库
// ==========================================

use crate::config::ImportConfigReader;
use crate::domain::types::ImportMode;
use crate::domain::{AttributeMap, CatalogRecord, CatalogWriteBatch, ImportBatch, ImportSummary};
use crate::importer::catalog_importer_trait::{CatalogImporter, SheetParser};
use crate::importer::column_resolver::{BatchSchema, ColumnResolver};
use crate::importer::conflict_handler::Deduplicator;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::{SheetGrid, XlsxSheetParser};
use crate::importer::progress::{CancelFlag, ProgressSink, ProgressTicker};
use crate::importer::row_parser::{RowOutcome, RowParser};
use crate::repository::CatalogRepository;
use chrono::Utc;
use std::collections::HashSet;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

// ==========================================
// ParsedBatch - 解析阶段产出（尚未落库）
// ==========================================
#[derive(Debug, Default)]
struct ParsedBatch {
    records: Vec<(CatalogRecord, AttributeMap)>,
    skipped_blank: usize,
    duplicates: usize,
    decode_failures: usize,
}

// ==========================================
// CatalogImporterImpl - 目录导入器实现
// ==========================================
pub struct CatalogImporterImpl<R, C>
where
    R: CatalogRepository,
    C: ImportConfigReader,
{
    // 数据访问层
    repo: R,

    // 配置读取器
    config: C,

    // 工作簿解析器
    sheet_parser: Box<dyn SheetParser>,
}

impl<R, C> CatalogImporterImpl<R, C>
where
    R: CatalogRepository,
    C: ImportConfigReader,
{
    /// 创建新的 CatalogImporter 实例（XLSX 解析器）
    ///
    /// # 参数
    /// - repo: 记录存储
    /// - config: 配置读取器
    pub fn new(repo: R, config: C) -> Self {
        Self::with_parser(repo, config, Box::new(XlsxSheetParser))
    }

    /// 使用自定义解析器创建实例
    pub fn with_parser(repo: R, config: C, sheet_parser: Box<dyn SheetParser>) -> Self {
        Self {
            repo,
            config,
            sheet_parser,
        }
    }

    /// 逐行解析 + 批内去重
    ///
    /// 每 interval 行检查一次取消标记并上报进度；取消时不产出任何结果
    fn parse_rows(
        &self,
        schema: &BatchSchema,
        grid: &SheetGrid,
        ticker: &ProgressTicker<'_>,
        interval: usize,
        cancel: Option<&CancelFlag>,
    ) -> ImportResult<ParsedBatch> {
        let total = grid.total_rows();
        let is_cancelled = || cancel.is_some_and(CancelFlag::is_cancelled);

        let parser = RowParser::new(schema);
        let mut dedup = Deduplicator::new();
        let mut parsed = ParsedBatch::default();

        for (idx, outcome) in parser.stream(&grid.rows).enumerate() {
            if idx % interval == 0 && is_cancelled() {
                return Err(ImportError::Cancelled {
                    processed: idx,
                    total,
                });
            }

            match outcome {
                RowOutcome::Parsed {
                    draft,
                    decode_failures,
                } => {
                    if decode_failures > 0 {
                        warn!(
                            row_number = draft.row_number,
                            cells = decode_failures,
                            "单元格无法解码，按空值保存"
                        );
                    }
                    parsed.decode_failures += decode_failures;
                    if let Some(draft) = dedup.accept(draft) {
                        parsed.records.push(draft.into_record());
                    }
                }
                RowOutcome::SkippedBlankIdentifier { row_number } => {
                    debug!(row_number, "编码为空，跳过该行");
                    parsed.skipped_blank += 1;
                }
            }

            ticker.tick(idx + 1);
        }

        // 最后一个行批之后再检查一次，取消总是发生在写入之前
        if is_cancelled() {
            return Err(ImportError::Cancelled {
                processed: total,
                total,
            });
        }

        parsed.duplicates = dedup.duplicate_count();
        if parsed.duplicates > 0 {
            debug!(duplicates = ?dedup.duplicates(), "批内重复编码已丢弃");
        }
        Ok(parsed)
    }

    /// 追加导入时不在表头顺序中的列（不会出现在导出中）
    async fn find_unexported_columns(&self, schema: &BatchSchema) -> ImportResult<Vec<String>> {
        let existing = self.repo.get_header_order().await?;
        if existing.is_empty() {
            // 尚无表头顺序：本批表头将成为表头顺序
            return Ok(Vec::new());
        }

        let known: HashSet<&str> = existing.iter().map(|c| c.canonical_key.as_str()).collect();
        Ok(schema
            .keys
            .iter()
            .filter(|key| !known.contains(key.as_str()))
            .cloned()
            .collect())
    }
}

#[async_trait::async_trait]
impl<R, C> CatalogImporter for CatalogImporterImpl<R, C>
where
    R: CatalogRepository + Send + Sync,
    C: ImportConfigReader + Send + Sync,
{
    #[instrument(skip(self, bytes, progress, cancel), fields(mode = %mode, size = bytes.len()))]
    async fn import_xlsx(
        &self,
        bytes: &[u8],
        mode: ImportMode,
        progress: &dyn ProgressSink,
        cancel: Option<&CancelFlag>,
    ) -> ImportResult<ImportSummary> {
        let start_time = Instant::now();
        let batch_id = Uuid::new_v4().to_string();
        info!(batch_id = %batch_id, "开始导入目录");

        // === 步骤 1: 读取配置 ===
        let synonyms = self.config.get_synonym_table().await?;
        let interval = self.config.get_progress_interval().await?.max(1);

        // === 步骤 2: 解析工作簿 ===
        debug!("步骤 2: 解析工作簿");
        let grid = self.sheet_parser.parse_bytes(bytes).map_err(|e| {
            error!(batch_id = %batch_id, error = %e, "工作簿解析失败，未写入任何数据");
            e
        })?;
        let total_rows = grid.total_rows();
        info!(sheet = %grid.sheet_name, columns = grid.raw_headers.len(), total_rows, "工作簿解析完成");

        // === 步骤 3: 批次结构（每批一次）===
        let schema = ColumnResolver::new(&synonyms).build_schema(grid.raw_headers.clone());
        if schema.identifier_fallback {
            warn!(
                batch_id = %batch_id,
                header = %schema.raw_headers.first().map(String::as_str).unwrap_or(""),
                "未找到编码列，回退使用第 1 列作为编码"
            );
        }
        debug!(keys = ?schema.keys, fields = ?schema.fields, "批次结构解析完成");

        let unexported_columns = match mode {
            ImportMode::Overwrite => Vec::new(),
            ImportMode::Append => self.find_unexported_columns(&schema).await?,
        };
        if !unexported_columns.is_empty() {
            warn!(
                columns = ?unexported_columns,
                "追加导入出现表头顺序之外的列：仅作为属性保存，不会出现在导出中"
            );
        }

        // === 步骤 4: 逐行解析 + 批内去重 ===
        debug!("步骤 4: 逐行解析");
        let ticker = ProgressTicker::new(progress, interval, total_rows);
        let parsed = self
            .parse_rows(&schema, &grid, &ticker, interval, cancel)
            .map_err(|e| {
                warn!(batch_id = %batch_id, error = %e, "导入中止");
                e
            })?;
        info!(
            accepted = parsed.records.len(),
            skipped_blank = parsed.skipped_blank,
            duplicates = parsed.duplicates,
            decode_failures = parsed.decode_failures,
            "行解析完成"
        );

        // === 步骤 5: 单事务落库 ===
        debug!("步骤 5: 落库");
        let batch = ImportBatch {
            batch_id: batch_id.clone(),
            mode,
            total_rows,
            imported_rows: parsed.records.len(),
            skipped_blank_rows: parsed.skipped_blank,
            duplicate_rows: parsed.duplicates,
            decode_failures: parsed.decode_failures,
            identifier_fallback: schema.identifier_fallback,
            unexported_columns,
            imported_at: Utc::now(),
            elapsed_ms: Some(start_time.elapsed().as_millis() as i64),
        };

        let write = CatalogWriteBatch {
            clear_existing: mode == ImportMode::Overwrite,
            header_order: Some(schema.header_columns()),
            header_order_if_empty: mode == ImportMode::Append,
            records: parsed.records,
            batch: batch.clone(),
        };

        let imported = self.repo.commit_import(write).await.map_err(|e| {
            error!(batch_id = %batch_id, error = %e, "落库失败，事务已回滚");
            ImportError::StoreWriteFailure(e)
        })?;

        ticker.finish();

        let elapsed_ms = start_time.elapsed().as_millis() as i64;
        info!(
            batch_id = %batch_id,
            total = total_rows,
            imported,
            elapsed_ms,
            "目录导入完成"
        );

        let mut summary = ImportSummary::from(&batch);
        summary.imported = imported;
        summary.elapsed_ms = elapsed_ms;
        Ok(summary)
    }

    async fn import_xlsx_file(
        &self,
        file_path: &Path,
        mode: ImportMode,
        progress: &dyn ProgressSink,
        cancel: Option<&CancelFlag>,
    ) -> ImportResult<ImportSummary> {
        info!(file_path = %file_path.display(), "读取导入文件");
        let bytes = XlsxSheetParser.read_file(file_path)?;
        self.import_xlsx(&bytes, mode, progress, cancel).await
    }
}
