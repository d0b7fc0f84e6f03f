// ==========================================
// 商品目录导入导出 - 配置层
// ==========================================
// 职责: 同义词表、进度间隔、导出外观等配置
// 存储: config_kv 表（内置默认值兜底）
// ==========================================

pub mod config_manager;
pub mod error;
pub mod import_config_trait;
pub mod synonym_table;

// 重导出核心配置管理器
pub use config_manager::{config_keys, ConfigManager};
pub use error::{ConfigError, ConfigResult};
pub use import_config_trait::{ImportConfigReader, ImportSettings};
pub use synonym_table::{FieldSynonyms, SynonymTable};
