// ==========================================
// 商品目录导入导出 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 说明: 单元格解码失败 / 编码为空 / 批内重复 不属于错误，只计数
// ==========================================

use crate::config::error::ConfigError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 批次不可读（整批中止，不写入任何数据） =====
    #[error("工作簿无法解析: {0}")]
    WorkbookUnreadable(String),

    #[error("工作簿不含任何工作表")]
    EmptyWorkbook,

    #[error("找不到表头行（工作表 {sheet} 的第一行为空）")]
    MissingHeaderRow { sheet: String },

    // ===== 文件相关错误 =====
    #[error("文件不存在: {0}")]
    FileNotFound(String),

    #[error("文件格式不支持: {0}（仅支持 .xlsx）")]
    UnsupportedFormat(String),

    #[error("文件读取失败: {0}")]
    FileReadError(String),

    // ===== 写入错误 =====
    #[error("记录写入失败: {0}")]
    StoreWriteFailure(#[from] RepositoryError),

    // ===== 取消 =====
    #[error("导入已取消（已处理 {processed}/{total} 行，未写入任何数据）")]
    Cancelled { processed: usize, total: usize },

    // ===== 配置错误 =====
    #[error(transparent)]
    Config(#[from] ConfigError),

    // ===== 通用错误 =====
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ImportError {
    /// 是否属于“批次不可读”类错误
    pub fn is_batch_unreadable(&self) -> bool {
        matches!(
            self,
            ImportError::WorkbookUnreadable(_)
                | ImportError::EmptyWorkbook
                | ImportError::MissingHeaderRow { .. }
        )
    }
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

// 实现 From<calamine::XlsxError>
impl From<calamine::XlsxError> for ImportError {
    fn from(err: calamine::XlsxError) -> Self {
        ImportError::WorkbookUnreadable(err.to_string())
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;
