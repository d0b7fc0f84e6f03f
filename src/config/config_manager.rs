// ==========================================
// 商品目录导入导出 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::error::{ConfigError, ConfigResult};
use crate::config::import_config_trait::{
    default_export_dir, ImportConfigReader, DEFAULT_EXPORT_COLUMN_WIDTH,
    DEFAULT_EXPORT_SHEET_NAME, DEFAULT_PROGRESS_INTERVAL,
};
use crate::config::synonym_table::SynonymTable;
use crate::db::{configure_sqlite_connection, open_sqlite_connection};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::warn;

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> ConfigResult<Self> {
        let conn = open_sqlite_connection(db_path).map_err(|e| ConfigError::ConfigReadError {
            key: "*".to_string(),
            message: e.to_string(),
        })?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> ConfigResult<Self> {
        {
            let guard = conn.lock().map_err(|e| ConfigError::ConfigReadError {
                key: "*".to_string(),
                message: format!("锁获取失败: {}", e),
            })?;
            configure_sqlite_connection(&guard).map_err(|e| ConfigError::ConfigReadError {
                key: "*".to_string(),
                message: e.to_string(),
            })?;
        }

        Ok(Self { conn })
    }

    fn get_conn(&self, key: &str) -> ConfigResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| ConfigError::ConfigReadError {
            key: key.to_string(),
            message: format!("锁获取失败: {}", e),
        })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_global_value(&self, key: &str) -> ConfigResult<Option<String>> {
        let conn = self.get_conn(key)?;

        conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        )
        .optional()
        .map_err(|e| ConfigError::ConfigReadError {
            key: key.to_string(),
            message: e.to_string(),
        })
    }

    /// 写入 global scope 配置（UPSERT）
    pub fn set_global_value(&self, key: &str, value: &str) -> ConfigResult<()> {
        let conn = self.get_conn(key)?;

        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )
        .map_err(|e| ConfigError::ConfigWriteError {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// 保存同义词覆盖表（与内置表合并后生效）
    pub fn set_synonym_table(&self, table: &SynonymTable) -> ConfigResult<()> {
        let json = serde_json::to_string(table).map_err(|e| ConfigError::ConfigWriteError {
            key: config_keys::SYNONYM_TABLE.to_string(),
            message: e.to_string(),
        })?;
        self.set_global_value(config_keys::SYNONYM_TABLE, &json)
    }

    /// 读取并解析数值配置，缺失时取默认值
    fn get_parsed_or<T>(&self, key: &str, default: T) -> ConfigResult<T>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get_global_value(key)? {
            None => Ok(default),
            Some(raw) => raw.trim().parse::<T>().map_err(|e| ConfigError::ConfigValueError {
                key: key.to_string(),
                value: raw.clone(),
                message: e.to_string(),
            }),
        }
    }
}

// ==========================================
// ImportConfigReader Trait 实现
// ==========================================
#[async_trait]
impl ImportConfigReader for ConfigManager {
    async fn get_synonym_table(&self) -> ConfigResult<SynonymTable> {
        let base = SynonymTable::default();
        let raw = match self.get_global_value(config_keys::SYNONYM_TABLE)? {
            Some(v) => v,
            None => return Ok(base),
        };

        let overrides: SynonymTable =
            serde_json::from_str(&raw).map_err(|e| ConfigError::ConfigValueError {
                key: config_keys::SYNONYM_TABLE.to_string(),
                value: raw.clone(),
                message: e.to_string(),
            })?;

        let merged = base.merge(overrides);
        let chained = merged.chained_entries();
        if !chained.is_empty() {
            // 链式映射会破坏规范化幂等性，仅告警（映射只做一跳）
            warn!(entries = ?chained, "同义词表存在链式映射");
        }
        Ok(merged)
    }

    async fn get_progress_interval(&self) -> ConfigResult<usize> {
        let interval = self.get_parsed_or(config_keys::PROGRESS_INTERVAL, DEFAULT_PROGRESS_INTERVAL)?;
        if interval == 0 {
            return Err(ConfigError::ConfigValueError {
                key: config_keys::PROGRESS_INTERVAL.to_string(),
                value: "0".to_string(),
                message: "进度间隔必须 ≥ 1".to_string(),
            });
        }
        Ok(interval)
    }

    async fn get_export_sheet_name(&self) -> ConfigResult<String> {
        let name = self
            .get_global_value(config_keys::EXPORT_SHEET_NAME)?
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_EXPORT_SHEET_NAME.to_string());
        Ok(name)
    }

    async fn get_export_column_width(&self) -> ConfigResult<f64> {
        self.get_parsed_or(config_keys::EXPORT_COLUMN_WIDTH, DEFAULT_EXPORT_COLUMN_WIDTH)
    }

    async fn get_export_dir(&self) -> ConfigResult<PathBuf> {
        Ok(self
            .get_global_value(config_keys::EXPORT_DIR)?
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(default_export_dir))
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 导入
    pub const SYNONYM_TABLE: &str = "import/synonym_table"; // 同义词覆盖表 (JSON)
    pub const PROGRESS_INTERVAL: &str = "import/progress_interval";

    // 导出
    pub const EXPORT_SHEET_NAME: &str = "export/sheet_name";
    pub const EXPORT_COLUMN_WIDTH: &str = "export/column_width";
    pub const EXPORT_DIR: &str = "export/dir";
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::CanonicalField;
    use tempfile::NamedTempFile;

    fn create_manager() -> (NamedTempFile, ConfigManager) {
        let temp_file = NamedTempFile::new().unwrap();
        let manager = ConfigManager::new(temp_file.path().to_str().unwrap()).unwrap();
        (temp_file, manager)
    }

    #[tokio::test]
    async fn test_defaults_when_empty() {
        let (_tmp, manager) = create_manager();

        assert_eq!(manager.get_progress_interval().await.unwrap(), 100);
        assert_eq!(manager.get_export_sheet_name().await.unwrap(), "Produtos");
        assert_eq!(manager.get_synonym_table().await.unwrap(), SynonymTable::default());
    }

    #[tokio::test]
    async fn test_progress_interval_override_and_invalid() {
        let (_tmp, manager) = create_manager();

        manager.set_global_value(config_keys::PROGRESS_INTERVAL, "25").unwrap();
        assert_eq!(manager.get_progress_interval().await.unwrap(), 25);

        manager.set_global_value(config_keys::PROGRESS_INTERVAL, "abc").unwrap();
        assert!(matches!(
            manager.get_progress_interval().await,
            Err(ConfigError::ConfigValueError { .. })
        ));

        manager.set_global_value(config_keys::PROGRESS_INTERVAL, "0").unwrap();
        assert!(manager.get_progress_interval().await.is_err());
    }

    #[tokio::test]
    async fn test_synonym_table_override_is_merged() {
        let (_tmp, manager) = create_manager();

        manager
            .set_global_value(
                config_keys::SYNONYM_TABLE,
                r#"{"headers": {"marca": "fabricante"}, "fields": {"unit": ["medida"]}}"#,
            )
            .unwrap();

        let table = manager.get_synonym_table().await.unwrap();
        assert_eq!(table.canonical_for("marca"), Some("fabricante"));
        assert_eq!(table.canonical_for("gtin"), Some("ean"));
        assert_eq!(table.field_synonyms(CanonicalField::Unit), &["medida".to_string()]);
    }

    #[tokio::test]
    async fn test_invalid_synonym_json_is_reported() {
        let (_tmp, manager) = create_manager();
        manager.set_global_value(config_keys::SYNONYM_TABLE, "{not json").unwrap();

        assert!(matches!(
            manager.get_synonym_table().await,
            Err(ConfigError::ConfigValueError { .. })
        ));
    }

    #[tokio::test]
    async fn test_export_dir_override() {
        let (_tmp, manager) = create_manager();
        manager.set_global_value(config_keys::EXPORT_DIR, "/tmp/catalog-out").unwrap();

        assert_eq!(
            manager.get_export_dir().await.unwrap(),
            PathBuf::from("/tmp/catalog-out")
        );
    }
}
