// ==========================================
// 商品目录导入导出 - 目录 Repository 实现
// ==========================================
// 职责: 实现记录存储（使用 rusqlite）
// 红线: Repository 不含业务规则，只做数据 CRUD
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::types::ImportMode;
use crate::domain::{
    AttributeMap, CatalogRecord, CatalogWriteBatch, ExportSnapshot, HeaderColumn, ImportBatch,
};
use crate::repository::catalog_repo::{AttributeLookup, CatalogRepository};
use crate::repository::error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row, Transaction};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

/// IN (...) 查询单次绑定的编码数上限
const IN_CLAUSE_CHUNK: usize = 500;

/// 读取 RFC3339 时间戳列；格式损坏时返回列转换错误（不静默替换）
fn timestamp_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn begin_transaction(conn: &mut Connection) -> RepositoryResult<Transaction<'_>> {
    conn.transaction()
        .map_err(|e| RepositoryError::DatabaseTransactionError(format!("开启事务失败: {}", e)))
}

fn commit_transaction(tx: Transaction<'_>) -> RepositoryResult<()> {
    tx.commit()
        .map_err(|e| RepositoryError::DatabaseTransactionError(format!("提交事务失败: {}", e)))
}

fn map_record_row(row: &Row<'_>) -> rusqlite::Result<CatalogRecord> {
    Ok(CatalogRecord {
        code: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        category: row.get(3)?,
        unit: row.get(4)?,
        created_at: timestamp_column(row, 5)?,
        updated_at: timestamp_column(row, 6)?,
    })
}

fn map_batch_row(row: &Row<'_>) -> rusqlite::Result<ImportBatch> {
    let mode_raw: String = row.get(1)?;
    let unexported_json: Option<String> = row.get(8)?;
    Ok(ImportBatch {
        batch_id: row.get(0)?,
        mode: ImportMode::from_db_str(&mode_raw).unwrap_or(ImportMode::Append),
        total_rows: row.get::<_, i64>(2)? as usize,
        imported_rows: row.get::<_, i64>(3)? as usize,
        skipped_blank_rows: row.get::<_, i64>(4)? as usize,
        duplicate_rows: row.get::<_, i64>(5)? as usize,
        decode_failures: row.get::<_, i64>(6)? as usize,
        identifier_fallback: row.get::<_, i64>(7)? != 0,
        unexported_columns: unexported_json
            .and_then(|json| serde_json::from_str(&json).ok())
            .unwrap_or_default(),
        imported_at: timestamp_column(row, 9)?,
        elapsed_ms: row.get(10)?,
    })
}

const SELECT_RECORD_COLUMNS: &str =
    "SELECT code, name, description, category, unit, created_at, updated_at FROM catalog_record";

// ==========================================
// CatalogRepositoryImpl
// ==========================================
#[derive(Clone)]
pub struct CatalogRepositoryImpl {
    conn: Arc<Mutex<Connection>>,
}

impl CatalogRepositoryImpl {
    /// 创建新的 Repository 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ===== 连接/事务内的 CRUD 原语 =====

    fn upsert_record_on(conn: &Connection, record: &CatalogRecord) -> RepositoryResult<()> {
        if record.code.trim().is_empty() {
            return Err(RepositoryError::ValidationError(
                "记录编码不能为空".to_string(),
            ));
        }

        conn.execute(
            r#"
            INSERT INTO catalog_record (
                code, name, description, category, unit, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(code) DO UPDATE SET
                name = excluded.name,
                description = excluded.description,
                category = excluded.category,
                unit = excluded.unit,
                updated_at = excluded.updated_at
            "#,
            params![
                record.code,
                record.name,
                record.description,
                record.category,
                record.unit,
                record.created_at.to_rfc3339(),
                record.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn replace_attributes_on(
        conn: &Connection,
        code: &str,
        attributes: &AttributeMap,
    ) -> RepositoryResult<usize> {
        conn.execute(
            "DELETE FROM record_attribute WHERE record_code = ?1",
            params![code],
        )?;

        let now = Utc::now().to_rfc3339();
        let mut stmt = conn.prepare_cached(
            r#"
            INSERT INTO record_attribute (record_code, attr_key, attr_value, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )?;

        let mut count = 0;
        for (key, value) in attributes {
            stmt.execute(params![code, key, value, now])?;
            count += 1;
        }
        Ok(count)
    }

    fn set_header_order_on(conn: &Connection, columns: &[HeaderColumn]) -> RepositoryResult<()> {
        conn.execute("DELETE FROM header_order", [])?;

        let mut stmt = conn.prepare_cached(
            "INSERT INTO header_order (position, raw_header, canonical_key) VALUES (?1, ?2, ?3)",
        )?;
        for column in columns {
            stmt.execute(params![
                column.position as i64,
                column.raw_header,
                column.canonical_key
            ])?;
        }
        Ok(())
    }

    fn get_header_order_on(conn: &Connection) -> RepositoryResult<Vec<HeaderColumn>> {
        let mut stmt = conn.prepare(
            "SELECT position, raw_header, canonical_key FROM header_order ORDER BY position",
        )?;
        let columns = stmt
            .query_map([], |row| {
                Ok(HeaderColumn {
                    position: row.get::<_, i64>(0)? as usize,
                    raw_header: row.get(1)?,
                    canonical_key: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(columns)
    }

    fn clear_all_on(conn: &Connection) -> RepositoryResult<()> {
        conn.execute_batch(
            r#"
            DELETE FROM record_attribute;
            DELETE FROM catalog_record;
            DELETE FROM header_order;
            "#,
        )?;
        Ok(())
    }

    fn list_records_on(conn: &Connection) -> RepositoryResult<Vec<CatalogRecord>> {
        let mut stmt = conn.prepare(&format!("{} ORDER BY name, code", SELECT_RECORD_COLUMNS))?;
        let records = stmt
            .query_map([], map_record_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    fn insert_batch_on(conn: &Connection, batch: &ImportBatch) -> RepositoryResult<()> {
        let unexported_json = serde_json::to_string(&batch.unexported_columns)?;
        conn.execute(
            r#"
            INSERT INTO import_batch (
                batch_id, mode, total_rows, imported_rows, skipped_blank_rows,
                duplicate_rows, decode_failures, identifier_fallback,
                unexported_columns_json, imported_at, elapsed_ms
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            params![
                batch.batch_id,
                batch.mode.to_db_str(),
                batch.total_rows as i64,
                batch.imported_rows as i64,
                batch.skipped_blank_rows as i64,
                batch.duplicate_rows as i64,
                batch.decode_failures as i64,
                batch.identifier_fallback as i64,
                unexported_json,
                batch.imported_at.to_rfc3339(),
                batch.elapsed_ms,
            ],
        )?;
        Ok(())
    }
}

#[async_trait]
impl CatalogRepository for CatalogRepositoryImpl {
    async fn upsert_record(&self, record: &CatalogRecord) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        Self::upsert_record_on(&conn, record)
    }

    async fn replace_attributes(
        &self,
        code: &str,
        attributes: &AttributeMap,
    ) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = begin_transaction(&mut conn)?;
        let count = Self::replace_attributes_on(&tx, code, attributes)?;
        commit_transaction(tx)?;
        Ok(count)
    }

    async fn get_header_order(&self) -> RepositoryResult<Vec<HeaderColumn>> {
        let conn = self.get_conn()?;
        Self::get_header_order_on(&conn)
    }

    async fn set_header_order(&self, columns: &[HeaderColumn]) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = begin_transaction(&mut conn)?;
        Self::set_header_order_on(&tx, columns)?;
        commit_transaction(tx)?;
        Ok(())
    }

    async fn clear_all(&self) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = begin_transaction(&mut conn)?;
        Self::clear_all_on(&tx)?;
        commit_transaction(tx)?;
        Ok(())
    }

    async fn list_records(&self) -> RepositoryResult<Vec<CatalogRecord>> {
        let conn = self.get_conn()?;
        Self::list_records_on(&conn)
    }

    async fn find_record(&self, code: &str) -> RepositoryResult<Option<CatalogRecord>> {
        let conn = self.get_conn()?;
        let record = conn
            .query_row(
                &format!("{} WHERE code = ?1", SELECT_RECORD_COLUMNS),
                params![code],
                map_record_row,
            )
            .optional()?;
        Ok(record)
    }

    async fn get_attributes(
        &self,
        codes: &[String],
        keys: &[String],
    ) -> RepositoryResult<AttributeLookup> {
        let mut result = AttributeLookup::new();
        if codes.is_empty() || keys.is_empty() {
            return Ok(result);
        }

        let wanted_keys: HashSet<&str> = keys.iter().map(String::as_str).collect();
        let conn = self.get_conn()?;

        for chunk in codes.chunks(IN_CLAUSE_CHUNK) {
            let placeholders = vec!["?"; chunk.len()].join(", ");
            let sql = format!(
                "SELECT record_code, attr_key, attr_value FROM record_attribute WHERE record_code IN ({})",
                placeholders
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(chunk.iter()), |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<String>>(2)?,
                ))
            })?;

            for row in rows {
                let (code, key, value) = row?;
                if wanted_keys.contains(key.as_str()) {
                    result.entry(code).or_default().insert(key, value);
                }
            }
        }

        Ok(result)
    }

    async fn count_records(&self) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM catalog_record", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    async fn list_attribute_keys(&self) -> RepositoryResult<Vec<String>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT canonical_key FROM header_order
            UNION
            SELECT DISTINCT attr_key FROM record_attribute
            ORDER BY 1
            "#,
        )?;
        let keys = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(keys)
    }

    async fn commit_import(&self, batch: CatalogWriteBatch) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = begin_transaction(&mut conn)?;

        if batch.clear_existing {
            Self::clear_all_on(&tx)?;
        }
        if let Some(columns) = &batch.header_order {
            let keep_existing =
                batch.header_order_if_empty && !Self::get_header_order_on(&tx)?.is_empty();
            if !keep_existing {
                Self::set_header_order_on(&tx, columns)?;
            }
        }

        let mut count = 0;
        for (record, attributes) in &batch.records {
            Self::upsert_record_on(&tx, record)?;
            Self::replace_attributes_on(&tx, &record.code, attributes)?;
            count += 1;
        }

        Self::insert_batch_on(&tx, &batch.batch)?;
        commit_transaction(tx)?;

        debug!(batch_id = %batch.batch.batch_id, records = count, "导入批次已提交");
        Ok(count)
    }

    async fn load_export_snapshot(&self) -> RepositoryResult<ExportSnapshot> {
        let mut conn = self.get_conn()?;
        // 读事务：三张表在同一快照内读取
        let tx = begin_transaction(&mut conn)?;

        let header_order = Self::get_header_order_on(&tx)?;
        let records = Self::list_records_on(&tx)?;

        let header_keys: HashSet<&str> = header_order
            .iter()
            .map(|c| c.canonical_key.as_str())
            .collect();
        let mut attributes: HashMap<String, HashMap<String, Option<String>>> = HashMap::new();
        {
            let mut stmt =
                tx.prepare("SELECT record_code, attr_key, attr_value FROM record_attribute")?;
            let rows = stmt.query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<String>>(2)?,
                ))
            })?;
            for row in rows {
                let (code, key, value) = row?;
                if header_keys.contains(key.as_str()) {
                    attributes.entry(code).or_default().insert(key, value);
                }
            }
        }

        commit_transaction(tx)?;

        Ok(ExportSnapshot {
            header_order,
            records,
            attributes,
        })
    }

    async fn insert_batch(&self, batch: &ImportBatch) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        Self::insert_batch_on(&conn, batch)
    }

    async fn get_recent_batches(&self, limit: usize) -> RepositoryResult<Vec<ImportBatch>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT batch_id, mode, total_rows, imported_rows, skipped_blank_rows,
                   duplicate_rows, decode_failures, identifier_fallback,
                   unexported_columns_json, imported_at, elapsed_ms
            FROM import_batch
            ORDER BY imported_at DESC
            LIMIT ?1
            "#,
        )?;
        let batches = stmt
            .query_map(params![limit as i64], map_batch_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(batches)
    }
}
