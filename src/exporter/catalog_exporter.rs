// ==========================================
// 商品目录导入导出 - 目录导出器
// ==========================================
// 规则:
// - 表头行按表头顺序原样输出原始表头
// - 每条记录一行；第 i 列取导入时为该列分配的去重键对应的属性（不重新推导）
// - 所有值按文本写入（"00123" 保持原样）；缺失值为空单元格
// - 读取使用同一读事务内的快照，不会看到导入的中间状态
// ==========================================

use crate::config::ImportConfigReader;
use crate::domain::ExportSnapshot;
use crate::exporter::error::{ExportError, ExportResult};
use crate::repository::CatalogRepository;
use chrono::Local;
use rust_xlsxwriter::{Format, Workbook};
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

/// 工作表最大行数（含表头）
pub const MAX_SHEET_ROWS: usize = 1_048_576;

/// 工作表最大列数
pub const MAX_SHEET_COLUMNS: usize = 16_384;

// ==========================================
// ExportOptions - 外观选项（不影响功能）
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct ExportOptions {
    pub sheet_name: String,
    pub column_width: f64,
}

// ==========================================
// CatalogExporter - 目录导出器
// ==========================================
pub struct CatalogExporter<R, C>
where
    R: CatalogRepository,
    C: ImportConfigReader,
{
    repo: R,
    config: C,
}

impl<R, C> CatalogExporter<R, C>
where
    R: CatalogRepository,
    C: ImportConfigReader,
{
    pub fn new(repo: R, config: C) -> Self {
        Self { repo, config }
    }

    async fn load_options(&self) -> ExportResult<ExportOptions> {
        Ok(ExportOptions {
            sheet_name: self.config.get_export_sheet_name().await?,
            column_width: self.config.get_export_column_width().await?,
        })
    }

    /// 导出为 XLSX 字节流
    #[instrument(skip(self))]
    pub async fn export_xlsx(&self) -> ExportResult<Vec<u8>> {
        let options = self.load_options().await?;
        let snapshot = self.repo.load_export_snapshot().await?;

        info!(
            columns = snapshot.header_order.len(),
            records = snapshot.records.len(),
            "开始导出目录"
        );
        if snapshot.header_order.is_empty() {
            warn!("表头顺序为空（尚未进行覆盖导入），导出空工作表");
        }

        let bytes = render_snapshot(&snapshot, &options)?;
        info!(size = bytes.len(), "目录导出完成");
        Ok(bytes)
    }

    /// 导出到目录下的 products_<yyyyMMddHHmmss>.xlsx
    ///
    /// # 参数
    /// - dir: 目标目录；None 时使用配置 export/dir
    ///
    /// # 返回
    /// - Ok(PathBuf): 写入的文件路径
    pub async fn export_xlsx_to_file(&self, dir: Option<&Path>) -> ExportResult<PathBuf> {
        let dir = match dir {
            Some(dir) => dir.to_path_buf(),
            None => self.config.get_export_dir().await?,
        };

        let bytes = self.export_xlsx().await?;

        tokio::fs::create_dir_all(&dir).await?;
        let file_path = dir.join(export_file_name());
        tokio::fs::write(&file_path, &bytes).await?;

        info!(file_path = %file_path.display(), "导出文件已写入");
        Ok(file_path)
    }
}

/// 导出文件名: products_<本地时间 yyyyMMddHHmmss>.xlsx
pub fn export_file_name() -> String {
    format!("products_{}.xlsx", Local::now().format("%Y%m%d%H%M%S"))
}

/// 快照 → XLSX 字节流（纯函数）
pub fn render_snapshot(snapshot: &ExportSnapshot, options: &ExportOptions) -> ExportResult<Vec<u8>> {
    let columns = snapshot.header_order.len();
    if columns > MAX_SHEET_COLUMNS {
        return Err(ExportError::TooManyColumns {
            columns,
            max: MAX_SHEET_COLUMNS,
        });
    }
    let rows = snapshot.records.len() + 1;
    if rows > MAX_SHEET_ROWS {
        return Err(ExportError::TooManyRows {
            rows,
            max: MAX_SHEET_ROWS,
        });
    }

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(&options.sheet_name)?;

    // 表头行（加粗）
    let header_format = Format::new().set_bold();
    for column in &snapshot.header_order {
        let col = column.position as u16;
        sheet.write_string_with_format(0, col, &column.raw_header, &header_format)?;
        sheet.set_column_width(col, options.column_width)?;
    }

    // 数据行
    for (idx, record) in snapshot.records.iter().enumerate() {
        let row = (idx + 1) as u32;
        let Some(attributes) = snapshot.attributes.get(&record.code) else {
            debug!(code = %record.code, "记录没有属性，导出空行");
            continue;
        };

        for column in &snapshot.header_order {
            if let Some(Some(value)) = attributes.get(&column.canonical_key) {
                sheet.write_string(row, column.position as u16, value)?;
            }
        }
    }

    Ok(workbook.save_to_buffer()?)
}
