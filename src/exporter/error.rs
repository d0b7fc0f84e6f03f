// ==========================================
// 商品目录导入导出 - 导出模块错误类型
// ==========================================

use crate::config::error::ConfigError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// 导出模块错误类型
#[derive(Error, Debug)]
pub enum ExportError {
    // ===== 读取错误 =====
    #[error("导出快照读取失败: {0}")]
    SnapshotReadFailure(#[from] RepositoryError),

    // ===== 工作簿错误 =====
    #[error("工作簿生成失败: {0}")]
    WorkbookWriteError(String),

    #[error("记录数超出工作表上限: {rows} 行（上限 {max} 行，含表头）")]
    TooManyRows { rows: usize, max: usize },

    #[error("列数超出工作表上限: {columns} 列（上限 {max} 列）")]
    TooManyColumns { columns: usize, max: usize },

    // ===== 文件错误 =====
    #[error("导出文件写入失败: {0}")]
    FileWriteError(String),

    // ===== 配置错误 =====
    #[error(transparent)]
    Config(#[from] ConfigError),

    // ===== 通用错误 =====
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// 实现 From<rust_xlsxwriter::XlsxError>
impl From<rust_xlsxwriter::XlsxError> for ExportError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        ExportError::WorkbookWriteError(err.to_string())
    }
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ExportError {
    fn from(err: std::io::Error) -> Self {
        ExportError::FileWriteError(err.to_string())
    }
}

/// Result 类型别名
pub type ExportResult<T> = Result<T, ExportError>;
