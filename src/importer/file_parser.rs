// ==========================================
// 商品目录导入导出 - 工作簿解析器
// ==========================================
// 阶段 0: 字节流 → 第一个工作表的单元格网格
// 支持: Excel (.xlsx)
// ==========================================

use crate::importer::catalog_importer_trait::SheetParser;
use crate::importer::cell_text::{CellText, CellTextExtractor, SheetCell};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::sheet_styles::CellFormats;
use calamine::{open_workbook_from_rs, Data, Range, Reader, Xlsx};
use std::io::Cursor;
use std::path::Path;
use tracing::{debug, warn};

// ==========================================
// SheetGrid - 工作表网格
// ==========================================
// 每行从第 0 列（A 列）开始，列号与表头列号一致
#[derive(Debug, Clone)]
pub struct SheetGrid {
    pub sheet_name: String,
    /// 表头原文（去首尾空白；尾部空表头已裁掉）
    pub raw_headers: Vec<String>,
    /// 数据行（表头之后的所有行，包括空行）
    pub rows: Vec<Vec<SheetCell>>,
}

impl SheetGrid {
    pub fn total_rows(&self) -> usize {
        self.rows.len()
    }

    /// 从 calamine Range 构建网格
    ///
    /// 第一条有数据的行为表头行；表头行全空时返回 MissingHeaderRow
    pub fn from_range(
        sheet_name: &str,
        range: &Range<Data>,
        formats: &CellFormats,
    ) -> ImportResult<Self> {
        let missing_header = || ImportError::MissingHeaderRow {
            sheet: sheet_name.to_string(),
        };

        let (start, end) = match (range.start(), range.end()) {
            (Some(start), Some(end)) => (start, end),
            _ => return Err(missing_header()),
        };

        let width = end.1 as usize + 1;
        let absolute_row = |row: u32| -> Vec<SheetCell> {
            (0..width as u32)
                .map(|col| {
                    let value = range.get_value((row, col)).cloned().unwrap_or(Data::Empty);
                    SheetCell::new(value, formats.get(row, col))
                })
                .collect()
        };

        let extractor = CellTextExtractor;
        let header_cells = absolute_row(start.0);
        let mut raw_headers: Vec<String> = header_cells
            .iter()
            .map(|cell| match extractor.display_text(cell) {
                CellText::Present(text) => text,
                _ => String::new(),
            })
            .collect();

        while raw_headers.last().is_some_and(|h| h.is_empty()) {
            raw_headers.pop();
        }
        if raw_headers.is_empty() {
            return Err(missing_header());
        }

        let rows = ((start.0 + 1)..=end.0).map(absolute_row).collect();

        Ok(Self {
            sheet_name: sheet_name.to_string(),
            raw_headers,
            rows,
        })
    }
}

// ==========================================
// XlsxSheetParser - XLSX 解析实现
// ==========================================
pub struct XlsxSheetParser;

impl SheetParser for XlsxSheetParser {
    fn parse_bytes(&self, bytes: &[u8]) -> ImportResult<SheetGrid> {
        if bytes.is_empty() {
            return Err(ImportError::WorkbookUnreadable("空字节流".to_string()));
        }

        let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes))?;

        // 读取第一个 sheet
        let sheet_name = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or(ImportError::EmptyWorkbook)?;

        let range = workbook.worksheet_range(&sheet_name)?;

        // 数字格式读不出来时按常规格式继续，不影响批次
        let formats = CellFormats::read(bytes, &sheet_name).unwrap_or_else(|e| {
            warn!(sheet = %sheet_name, error = %e, "单元格数字格式读取失败，按常规格式处理");
            CellFormats::default()
        });
        debug!(sheet = %sheet_name, formatted_cells = formats.len(), "单元格数字格式已读取");

        SheetGrid::from_range(&sheet_name, &range, &formats)
    }
}

impl XlsxSheetParser {
    /// 读取磁盘上的 .xlsx 文件
    pub fn read_file(&self, file_path: &Path) -> ImportResult<Vec<u8>> {
        // 检查文件存在
        if !file_path.exists() {
            return Err(ImportError::FileNotFound(file_path.display().to_string()));
        }

        // 检查扩展名
        let ext = file_path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        if ext != "xlsx" {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        Ok(std::fs::read(file_path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_xlsxwriter::{Format, Workbook};
    use std::io::Write;

    fn build_xlsx(rows: &[&[&str]]) -> Vec<u8> {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        for (r, row) in rows.iter().enumerate() {
            for (c, value) in row.iter().enumerate() {
                if !value.is_empty() {
                    sheet.write_string(r as u32, c as u16, *value).unwrap();
                }
            }
        }
        workbook.save_to_buffer().unwrap()
    }

    #[test]
    fn test_parse_first_sheet() {
        let bytes = build_xlsx(&[&["SKU", "Nome", ""], &["00123", "Caneta", ""], &["P2", "", "x"]]);
        let grid = XlsxSheetParser.parse_bytes(&bytes).unwrap();

        assert_eq!(grid.raw_headers, vec!["SKU", "Nome"]);
        assert_eq!(grid.total_rows(), 2);
        assert_eq!(grid.rows[0][0].value, Data::String("00123".to_string()));
        // 数据行宽度可以超出表头
        assert_eq!(grid.rows[1][2].value, Data::String("x".to_string()));
    }

    #[test]
    fn test_leading_empty_columns_keep_positions() {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 1, "SKU").unwrap();
        sheet.write_string(1, 1, "P1").unwrap();
        let bytes = workbook.save_to_buffer().unwrap();

        let grid = XlsxSheetParser.parse_bytes(&bytes).unwrap();
        assert_eq!(grid.raw_headers, vec!["", "SKU"]);
        assert_eq!(grid.rows[0][1].value, Data::String("P1".to_string()));
    }

    #[test]
    fn test_cells_carry_number_formats() {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "Código").unwrap();
        sheet.write_string(0, 1, "Estoque").unwrap();
        sheet
            .write_number_with_format(1, 0, 42.0, &Format::new().set_num_format("000000"))
            .unwrap();
        sheet.write_number(1, 1, 3.0).unwrap();
        let bytes = workbook.save_to_buffer().unwrap();

        let grid = XlsxSheetParser.parse_bytes(&bytes).unwrap();
        let extractor = CellTextExtractor;
        assert_eq!(
            extractor.extract(&grid.rows[0], 0),
            CellText::Present("000042".to_string())
        );
        assert_eq!(
            extractor.extract(&grid.rows[0], 1),
            CellText::Present("3".to_string())
        );
        assert!(grid.rows[0][1].format.is_none());
    }

    #[test]
    fn test_garbage_bytes_unreadable() {
        let err = XlsxSheetParser.parse_bytes(b"definitely not a zip").unwrap_err();
        assert!(err.is_batch_unreadable());

        let err = XlsxSheetParser.parse_bytes(&[]).unwrap_err();
        assert!(err.is_batch_unreadable());
    }

    #[test]
    fn test_empty_sheet_has_no_header_row() {
        let mut workbook = Workbook::new();
        workbook.add_worksheet();
        let bytes = workbook.save_to_buffer().unwrap();

        let err = XlsxSheetParser.parse_bytes(&bytes).unwrap_err();
        assert!(matches!(err, ImportError::MissingHeaderRow { .. }));
    }

    #[test]
    fn test_read_file_checks() {
        let err = XlsxSheetParser
            .read_file(Path::new("/nonexistent/catalog.xlsx"))
            .unwrap_err();
        assert!(matches!(err, ImportError::FileNotFound(_)));

        let mut temp_file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(temp_file, "sku,nome").unwrap();
        let err = XlsxSheetParser.read_file(temp_file.path()).unwrap_err();
        assert!(matches!(err, ImportError::UnsupportedFormat(_)));
    }
}
