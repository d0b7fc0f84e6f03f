// ==========================================
// 商品目录导入导出 - 列解析（批次结构）
// ==========================================
// 职责: 表头 → 批次结构 BatchSchema（去重后的键 + 规范字段列号），每批只算一次
// 规则:
// - 每个规范字段按同义词优先级查找，取第一个键匹配（忽略大小写）且未被占用的列
// - 字段按 Identifier → Name → Description → Category → Unit 依次占用列
// - Identifier 无匹配时回退到第 0 列，并标记 identifier_fallback
// ==========================================

use crate::config::synonym_table::SynonymTable;
use crate::domain::types::CanonicalField;
use crate::domain::HeaderColumn;
use crate::importer::header_deduplicator::HeaderDeduplicator;
use crate::importer::header_normalizer::HeaderNormalizer;
use std::collections::HashSet;

// ==========================================
// ResolvedFields - 规范字段列号
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResolvedFields {
    pub identifier: usize,
    pub name: Option<usize>,
    pub description: Option<usize>,
    pub category: Option<usize>,
    pub unit: Option<usize>,
}

impl ResolvedFields {
    pub fn get(&self, field: CanonicalField) -> Option<usize> {
        match field {
            CanonicalField::Identifier => Some(self.identifier),
            CanonicalField::Name => self.name,
            CanonicalField::Description => self.description,
            CanonicalField::Category => self.category,
            CanonicalField::Unit => self.unit,
        }
    }

    fn set(&mut self, field: CanonicalField, column: Option<usize>) {
        match field {
            CanonicalField::Identifier => self.identifier = column.unwrap_or(0),
            CanonicalField::Name => self.name = column,
            CanonicalField::Description => self.description = column,
            CanonicalField::Category => self.category = column,
            CanonicalField::Unit => self.unit = column,
        }
    }
}

// ==========================================
// BatchSchema - 批次结构（不可变）
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchSchema {
    /// 第一行原文（去首尾空白），与 keys 位置一一对应
    pub raw_headers: Vec<String>,
    /// 去重后的规范列名
    pub keys: Vec<String>,
    pub fields: ResolvedFields,
    /// Identifier 是否回退到第 0 列
    pub identifier_fallback: bool,
}

impl BatchSchema {
    pub fn width(&self) -> usize {
        self.keys.len()
    }

    /// 转为持久化的表头顺序
    pub fn header_columns(&self) -> Vec<HeaderColumn> {
        self.raw_headers
            .iter()
            .zip(self.keys.iter())
            .enumerate()
            .map(|(position, (raw, key))| HeaderColumn {
                position,
                raw_header: raw.clone(),
                canonical_key: key.clone(),
            })
            .collect()
    }
}

// ==========================================
// ColumnResolver - 列解析器
// ==========================================
pub struct ColumnResolver<'a> {
    synonyms: &'a SynonymTable,
}

impl<'a> ColumnResolver<'a> {
    pub fn new(synonyms: &'a SynonymTable) -> Self {
        Self { synonyms }
    }

    /// 原始表头 → 批次结构（规范化 + 去重 + 字段解析）
    pub fn build_schema(&self, raw_headers: Vec<String>) -> BatchSchema {
        let normalized = HeaderNormalizer::new(self.synonyms).normalize_all(&raw_headers);
        let keys = HeaderDeduplicator.dedupe(&normalized);
        let (fields, identifier_fallback) = self.resolve(&keys);

        BatchSchema {
            raw_headers,
            keys,
            fields,
            identifier_fallback,
        }
    }

    /// 在去重后的键上解析规范字段列号
    ///
    /// # 返回
    /// - (字段列号, Identifier 是否回退)
    pub fn resolve(&self, keys: &[String]) -> (ResolvedFields, bool) {
        let mut fields = ResolvedFields::default();
        let mut taken: HashSet<usize> = HashSet::new();
        let mut identifier_fallback = false;

        for field in CanonicalField::RESOLUTION_ORDER {
            let column = self.find_column(keys, self.synonyms.field_synonyms(field), &taken);

            let column = match (field, column) {
                (CanonicalField::Identifier, None) => {
                    identifier_fallback = true;
                    Some(0)
                }
                (_, column) => column,
            };

            if let Some(idx) = column {
                taken.insert(idx);
            }
            fields.set(field, column);
        }

        (fields, identifier_fallback)
    }

    /// 按同义词优先级查找第一个未占用列
    fn find_column(
        &self,
        keys: &[String],
        synonyms: &[String],
        taken: &HashSet<usize>,
    ) -> Option<usize> {
        synonyms.iter().find_map(|synonym| {
            keys.iter()
                .enumerate()
                .find(|(idx, key)| !taken.contains(idx) && key.eq_ignore_ascii_case(synonym))
                .map(|(idx, _)| idx)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_identifier_prefers_sku_over_ean() {
        let table = SynonymTable::default();
        let schema = ColumnResolver::new(&table)
            .build_schema(headers(&["Código de Barras", "Produto", "Preço"]));

        assert_eq!(schema.keys, headers(&["ean", "sku", "preco"]));
        assert_eq!(schema.fields.identifier, 1);
        assert!(!schema.identifier_fallback);
        assert_eq!(schema.fields.name, None);
    }

    #[test]
    fn test_synonym_priority_beats_column_order() {
        let table = SynonymTable::default();
        // "id" 在前，但 "sku" 优先级更高
        let (fields, fallback) =
            ColumnResolver::new(&table).resolve(&headers(&["id", "nome", "sku"]));

        assert_eq!(fields.identifier, 2);
        assert_eq!(fields.name, Some(1));
        assert!(!fallback);
    }

    #[test]
    fn test_exclusive_column_assignment() {
        let table = SynonymTable::default();
        // 只有一个 descricao 列：Name 先占用，Description 不再使用该列
        let (fields, _) = ColumnResolver::new(&table).resolve(&headers(&["sku", "descricao"]));

        assert_eq!(fields.name, Some(1));
        assert_eq!(fields.description, None);
    }

    #[test]
    fn test_identifier_falls_back_to_first_column() {
        let table = SynonymTable::default();
        let (fields, fallback) =
            ColumnResolver::new(&table).resolve(&headers(&["cor", "tamanho"]));

        assert_eq!(fields.identifier, 0);
        assert!(fallback);
    }

    #[test]
    fn test_fallback_column_not_reused() {
        let table = SynonymTable::default();
        // 回退占用第 0 列后，Name 不能再取第 0 列
        let (fields, fallback) = ColumnResolver::new(&table).resolve(&headers(&["nome", "x"]));

        assert!(fallback);
        assert_eq!(fields.identifier, 0);
        assert_eq!(fields.name, None);
    }

    #[test]
    fn test_all_fields_resolved() {
        let table = SynonymTable::default();
        let schema = ColumnResolver::new(&table).build_schema(headers(&[
            "SKU",
            "Nome",
            "Descrição",
            "Categoria",
            "UN",
            "Preço",
        ]));

        assert_eq!(
            schema.fields,
            ResolvedFields {
                identifier: 0,
                name: Some(1),
                description: Some(2),
                category: Some(3),
                unit: Some(4),
            }
        );
        assert_eq!(schema.header_columns()[4].canonical_key, "unidade");
        assert_eq!(schema.header_columns()[4].raw_header, "UN");
    }

    #[test]
    fn test_duplicate_headers_resolve_first_occurrence() {
        let table = SynonymTable::default();
        let schema = ColumnResolver::new(&table).build_schema(headers(&["SKU", "Código", "Nome"]));

        // "Código" → sku → 去重为 sku_2
        assert_eq!(schema.keys, headers(&["sku", "sku_2", "nome"]));
        assert_eq!(schema.fields.identifier, 0);
    }
}
