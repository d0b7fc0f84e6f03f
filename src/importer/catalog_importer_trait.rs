// ==========================================
// 商品目录导入导出 - 目录导入 Trait
// ==========================================
// 职责: 定义目录导入接口（不包含实现）
// ==========================================

use crate::domain::types::ImportMode;
use crate::domain::ImportSummary;
use crate::importer::error::ImportResult;
use crate::importer::file_parser::SheetGrid;
use crate::importer::progress::{CancelFlag, NoProgress, ProgressSink};
use async_trait::async_trait;
use std::path::Path;

// ==========================================
// CatalogImporter Trait
// ==========================================
// 用途: 目录导入主接口
// 实现者: CatalogImporterImpl
#[async_trait]
pub trait CatalogImporter: Send + Sync {
    /// 从 XLSX 字节流导入目录
    ///
    /// # 参数
    /// - bytes: 工作簿字节流（只读第一个工作表，第一行为表头）
    /// - mode: Overwrite 先清空再导入；Append 按编码 upsert
    /// - progress: 进度接收方（有界频率，最后一次为 (total, total)）
    /// - cancel: 取消标记（在行批之间检查）
    ///
    /// # 返回
    /// - Ok(ImportSummary): 导入结果（imported = 成功落库的不同记录数）
    /// - Err: 批次不可读 / 写入失败 / 已取消；任何错误都不会留下部分写入
    ///
    /// # 导入流程
    /// 1. 工作簿解析（第一个工作表）
    /// 2. 表头规范化 → 去重 → 字段列解析（每批一次）
    /// 3. 逐行解析 + 批内去重
    /// 4. 单事务落库（清空 / 表头顺序 / 记录 + 属性 / 批次历史）
    async fn import_xlsx(
        &self,
        bytes: &[u8],
        mode: ImportMode,
        progress: &dyn ProgressSink,
        cancel: Option<&CancelFlag>,
    ) -> ImportResult<ImportSummary>;

    /// 从 XLSX 字节流导入（不上报进度、不可取消）
    async fn import(&self, bytes: &[u8], mode: ImportMode) -> ImportResult<ImportSummary> {
        self.import_xlsx(bytes, mode, &NoProgress, None).await
    }

    /// 从磁盘上的 .xlsx 文件导入
    async fn import_xlsx_file(
        &self,
        file_path: &Path,
        mode: ImportMode,
        progress: &dyn ProgressSink,
        cancel: Option<&CancelFlag>,
    ) -> ImportResult<ImportSummary>;
}

// ==========================================
// SheetParser Trait
// ==========================================
// 用途: 工作簿解析接口（阶段 0）
// 实现者: XlsxSheetParser
pub trait SheetParser: Send + Sync {
    /// 解析字节流为第一个工作表的网格
    ///
    /// # 返回
    /// - Ok(SheetGrid): 表头 + 数据行
    /// - Err: WorkbookUnreadable / EmptyWorkbook / MissingHeaderRow
    fn parse_bytes(&self, bytes: &[u8]) -> ImportResult<SheetGrid>;
}
