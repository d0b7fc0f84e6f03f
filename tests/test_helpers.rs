// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 临时数据库、内存 XLSX 工作簿、导入/导出器组装
// ==========================================
#![allow(dead_code)]

use calamine::{open_workbook_from_rs, Data, Reader, Xlsx};
use catalog_sheet::config::ConfigManager;
use catalog_sheet::exporter::CatalogExporter;
use catalog_sheet::importer::CatalogImporterImpl;
use catalog_sheet::repository::CatalogRepositoryImpl;
use rust_xlsxwriter::{Format, Workbook};
use std::error::Error;
use std::io::Cursor;
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;

/// 测试工作簿中的单元格
#[derive(Debug, Clone)]
pub enum Cell {
    Text(&'static str),
    Number(f64),
    /// 数值 + 数字格式代码
    Formatted(f64, &'static str),
    Empty,
}

pub use Cell::{Empty, Formatted, Number, Text};

/// 创建临时测试数据库（建表由连接初始化完成）
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file.path().to_str().unwrap().to_string();

    let conn = catalog_sheet::db::open_sqlite_connection(&db_path)?;
    drop(conn);

    Ok((temp_file, db_path))
}

/// 组装共享同一连接的 仓储 + 配置 + 导入器 + 导出器
pub struct TestPipeline {
    pub repo: CatalogRepositoryImpl,
    pub config: Arc<ConfigManager>,
    pub importer: CatalogImporterImpl<CatalogRepositoryImpl, Arc<ConfigManager>>,
    pub exporter: CatalogExporter<CatalogRepositoryImpl, Arc<ConfigManager>>,
}

pub fn create_test_pipeline(db_path: &str) -> TestPipeline {
    let conn = catalog_sheet::db::open_shared_connection(db_path)
        .expect("Failed to open shared connection");
    let config = Arc::new(
        ConfigManager::from_connection(Arc::clone(&conn)).expect("Failed to create ConfigManager"),
    );
    let repo = CatalogRepositoryImpl::from_connection(conn);

    TestPipeline {
        importer: CatalogImporterImpl::new(repo.clone(), config.clone()),
        exporter: CatalogExporter::new(repo.clone(), config.clone()),
        repo,
        config,
    }
}

/// 构造只有一个工作表的 XLSX 字节流（第一行为表头）
pub fn build_xlsx(rows: &[Vec<Cell>]) -> Vec<u8> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();

    for (r, row) in rows.iter().enumerate() {
        for (c, cell) in row.iter().enumerate() {
            match cell {
                Cell::Text(value) => {
                    sheet.write_string(r as u32, c as u16, *value).unwrap();
                }
                Cell::Number(value) => {
                    sheet.write_number(r as u32, c as u16, *value).unwrap();
                }
                Cell::Formatted(value, code) => {
                    let format = Format::new().set_num_format(*code);
                    sheet
                        .write_number_with_format(r as u32, c as u16, *value, &format)
                        .unwrap();
                }
                Cell::Empty => {}
            }
        }
    }

    workbook.save_to_buffer().unwrap()
}

/// 纯文本工作簿的简写
pub fn build_text_xlsx(rows: &[&[&'static str]]) -> Vec<u8> {
    let rows: Vec<Vec<Cell>> = rows
        .iter()
        .map(|row| row.iter().map(|v| Cell::Text(*v)).collect())
        .collect();
    build_xlsx(&rows)
}

/// 读回工作簿第一个工作表（单元格转为文本，空单元格为 ""）
pub fn read_first_sheet(bytes: &[u8]) -> (String, Vec<Vec<String>>) {
    let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes.to_vec())).unwrap();
    let name = workbook.sheet_names()[0].clone();
    let range = workbook.worksheet_range(&name).unwrap();

    let rows = range
        .rows()
        .map(|row| {
            row.iter()
                .map(|cell| match cell {
                    Data::Empty => String::new(),
                    other => other.to_string(),
                })
                .collect()
        })
        .collect();
    (name, rows)
}

/// 记录进度上报序列
#[derive(Default, Clone)]
pub struct ProgressRecorder {
    pub reports: Arc<Mutex<Vec<(usize, usize)>>>,
}

impl ProgressRecorder {
    pub fn sink(&self) -> impl Fn(usize, usize) + Send + Sync {
        let reports = Arc::clone(&self.reports);
        move |processed, total| reports.lock().unwrap().push((processed, total))
    }

    pub fn snapshot(&self) -> Vec<(usize, usize)> {
        self.reports.lock().unwrap().clone()
    }
}
