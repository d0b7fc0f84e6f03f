// ==========================================
// 商品目录导入导出 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 建表（CREATE TABLE IF NOT EXISTS，可重复执行）
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启（属性表依赖级联删除）
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置 + 建表
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    ensure_catalog_schema(&conn)?;
    Ok(conn)
}

/// 打开共享连接（仓储与配置管理器共用同一连接）
pub fn open_shared_connection(db_path: &str) -> rusqlite::Result<Arc<Mutex<Connection>>> {
    Ok(Arc::new(Mutex::new(open_sqlite_connection(db_path)?)))
}

/// 创建目录相关表
///
/// - catalog_record: 商品主记录
/// - record_attribute: 动态属性（按去重后的规范列名存储）
/// - header_order: 原始表头顺序（导出列布局的唯一来源）
/// - import_batch: 导入批次历史
/// - config_kv: 全局配置
pub fn ensure_catalog_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS catalog_record (
            code TEXT PRIMARY KEY CHECK (length(code) > 0),
            name TEXT NOT NULL,
            description TEXT,
            category TEXT,
            unit TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS record_attribute (
            record_code TEXT NOT NULL REFERENCES catalog_record(code) ON DELETE CASCADE,
            attr_key TEXT NOT NULL,
            attr_value TEXT,
            updated_at TEXT NOT NULL,
            PRIMARY KEY (record_code, attr_key)
        );

        CREATE INDEX IF NOT EXISTS idx_record_attribute_key
            ON record_attribute(attr_key);

        CREATE TABLE IF NOT EXISTS header_order (
            position INTEGER PRIMARY KEY,
            raw_header TEXT NOT NULL,
            canonical_key TEXT NOT NULL UNIQUE
        );

        CREATE TABLE IF NOT EXISTS import_batch (
            batch_id TEXT PRIMARY KEY,
            mode TEXT NOT NULL,
            total_rows INTEGER NOT NULL,
            imported_rows INTEGER NOT NULL,
            skipped_blank_rows INTEGER NOT NULL,
            duplicate_rows INTEGER NOT NULL,
            decode_failures INTEGER NOT NULL,
            identifier_fallback INTEGER NOT NULL DEFAULT 0,
            unexported_columns_json TEXT,
            imported_at TEXT NOT NULL,
            elapsed_ms INTEGER
        );

        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL,
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (scope_id, key)
        );
        "#,
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;
    Ok(())
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}
