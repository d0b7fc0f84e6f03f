// ==========================================
// 商品目录导入导出 - 导入/导出配置读取 Trait
// ==========================================
// 职责: 定义导入导出管道所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::config::error::ConfigResult;
use crate::config::synonym_table::SynonymTable;
use async_trait::async_trait;
use std::path::PathBuf;

/// 进度上报默认间隔（行）
pub const DEFAULT_PROGRESS_INTERVAL: usize = 100;

/// 导出工作表默认名称
pub const DEFAULT_EXPORT_SHEET_NAME: &str = "Produtos";

/// 导出列默认宽度（字符单位）
pub const DEFAULT_EXPORT_COLUMN_WIDTH: f64 = 13.67;

// ==========================================
// ImportConfigReader Trait
// ==========================================
// 实现者: ConfigManager（config_kv 表）、ImportSettings（内存默认值）
#[async_trait]
pub trait ImportConfigReader: Send + Sync {
    /// 获取同义词表（内置表 + 覆盖项）
    async fn get_synonym_table(&self) -> ConfigResult<SynonymTable>;

    /// 获取进度上报间隔（行，≥1）
    ///
    /// # 默认值
    /// - 100
    async fn get_progress_interval(&self) -> ConfigResult<usize>;

    /// 获取导出工作表名称
    ///
    /// # 默认值
    /// - "Produtos"
    async fn get_export_sheet_name(&self) -> ConfigResult<String>;

    /// 获取导出列宽（仅影响外观）
    async fn get_export_column_width(&self) -> ConfigResult<f64>;

    /// 获取导出文件默认目录
    async fn get_export_dir(&self) -> ConfigResult<PathBuf>;
}

/// 平台默认导出目录: <data_local_dir>/catalog-sheet/export
pub fn default_export_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("catalog-sheet")
        .join("export")
}

// ==========================================
// ImportSettings - 内存配置
// ==========================================
// 用途: 不依赖数据库的场景（嵌入调用、单元测试）
#[derive(Debug, Clone)]
pub struct ImportSettings {
    pub synonym_table: SynonymTable,
    pub progress_interval: usize,
    pub export_sheet_name: String,
    pub export_column_width: f64,
    pub export_dir: PathBuf,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            synonym_table: SynonymTable::default(),
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            export_sheet_name: DEFAULT_EXPORT_SHEET_NAME.to_string(),
            export_column_width: DEFAULT_EXPORT_COLUMN_WIDTH,
            export_dir: default_export_dir(),
        }
    }
}

#[async_trait]
impl ImportConfigReader for ImportSettings {
    async fn get_synonym_table(&self) -> ConfigResult<SynonymTable> {
        Ok(self.synonym_table.clone())
    }

    async fn get_progress_interval(&self) -> ConfigResult<usize> {
        Ok(self.progress_interval.max(1))
    }

    async fn get_export_sheet_name(&self) -> ConfigResult<String> {
        Ok(self.export_sheet_name.clone())
    }

    async fn get_export_column_width(&self) -> ConfigResult<f64> {
        Ok(self.export_column_width)
    }

    async fn get_export_dir(&self) -> ConfigResult<PathBuf> {
        Ok(self.export_dir.clone())
    }
}

// 共享配置（导入器与导出器共用同一个 ConfigManager）
#[async_trait]
impl<T> ImportConfigReader for std::sync::Arc<T>
where
    T: ImportConfigReader + ?Sized,
{
    async fn get_synonym_table(&self) -> ConfigResult<SynonymTable> {
        (**self).get_synonym_table().await
    }

    async fn get_progress_interval(&self) -> ConfigResult<usize> {
        (**self).get_progress_interval().await
    }

    async fn get_export_sheet_name(&self) -> ConfigResult<String> {
        (**self).get_export_sheet_name().await
    }

    async fn get_export_column_width(&self) -> ConfigResult<f64> {
        (**self).get_export_column_width().await
    }

    async fn get_export_dir(&self) -> ConfigResult<PathBuf> {
        (**self).get_export_dir().await
    }
}
