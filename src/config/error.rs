// ==========================================
// 商品目录导入导出 - 配置层错误类型
// ==========================================

use thiserror::Error;

/// 配置读取错误
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置读取失败 (key: {key}): {message}")]
    ConfigReadError { key: String, message: String },

    #[error("配置值格式错误 (key: {key}, value: {value}): {message}")]
    ConfigValueError {
        key: String,
        value: String,
        message: String,
    },

    #[error("配置写入失败 (key: {key}): {message}")]
    ConfigWriteError { key: String, message: String },
}

/// Result 类型别名
pub type ConfigResult<T> = Result<T, ConfigError>;
