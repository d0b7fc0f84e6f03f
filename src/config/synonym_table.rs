// ==========================================
// 商品目录导入导出 - 同义词表
// ==========================================
// 职责: 表头同义词（清洗后的列名 → 规范列名）+ 规范字段优先级列表
// 存储: 内置默认值；config_kv 中的 `import/synonym_table` 可覆盖/扩展
// ==========================================

use crate::domain::types::CanonicalField;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ==========================================
// FieldSynonyms - 规范字段的优先级同义词列表
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldSynonyms {
    pub identifier: Vec<String>,
    pub name: Vec<String>,
    pub description: Vec<String>,
    pub category: Vec<String>,
    pub unit: Vec<String>,
}

impl FieldSynonyms {
    pub fn for_field(&self, field: CanonicalField) -> &[String] {
        match field {
            CanonicalField::Identifier => &self.identifier,
            CanonicalField::Name => &self.name,
            CanonicalField::Description => &self.description,
            CanonicalField::Category => &self.category,
            CanonicalField::Unit => &self.unit,
        }
    }

    fn for_field_mut(&mut self, field: CanonicalField) -> &mut Vec<String> {
        match field {
            CanonicalField::Identifier => &mut self.identifier,
            CanonicalField::Name => &mut self.name,
            CanonicalField::Description => &mut self.description,
            CanonicalField::Category => &mut self.category,
            CanonicalField::Unit => &mut self.unit,
        }
    }
}

impl Default for FieldSynonyms {
    fn default() -> Self {
        Self {
            identifier: strings(&["sku", "codigo", "code", "id", "produto", "item"]),
            name: strings(&["nome", "name", "titulo", "title", "descricao"]),
            description: strings(&["descricao", "desc", "details"]),
            category: strings(&["categoria", "category", "grupo", "setor"]),
            unit: strings(&["unidade", "unit", "und", "uni"]),
        }
    }
}

// ==========================================
// SynonymTable - 同义词表
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynonymTable {
    /// 清洗后的列名 → 规范列名
    pub headers: BTreeMap<String, String>,
    /// 规范字段 → 优先级同义词
    pub fields: FieldSynonyms,
}

impl Default for SynonymTable {
    fn default() -> Self {
        let groups: [(&str, &[&str]); 8] = [
            ("ean", &["codigo_de_barras", "barcode", "ean13", "ean8", "gtin"]),
            ("sku", &["codigo", "cod", "item", "produto", "ref", "referencia"]),
            ("nome", &["nome_do_produto", "produto_nome", "descricao_produto", "titulo", "title"]),
            ("descricao", &["description", "desc", "details"]),
            ("preco", &["price", "valor", "vlr", "custo"]),
            ("quantidade", &["qtd", "qty", "estoque", "stock", "saldo"]),
            ("categoria", &["cat", "category", "grupo", "setor", "departamento"]),
            ("unidade", &["un", "unit", "und", "uni"]),
        ];

        let mut headers = BTreeMap::new();
        for (canonical, aliases) in groups {
            for alias in aliases {
                headers.insert(alias.to_string(), canonical.to_string());
            }
        }

        Self {
            headers,
            fields: FieldSynonyms::default(),
        }
    }
}

impl SynonymTable {
    /// 查找清洗后列名对应的规范列名
    pub fn canonical_for(&self, cleaned: &str) -> Option<&str> {
        self.headers.get(cleaned).map(String::as_str)
    }

    /// 规范字段的优先级同义词
    pub fn field_synonyms(&self, field: CanonicalField) -> &[String] {
        self.fields.for_field(field)
    }

    /// 合并覆盖表：
    /// - 表头同义词逐项覆盖
    /// - 字段列表非空时整体替换（顺序即优先级）
    pub fn merge(mut self, overrides: SynonymTable) -> Self {
        for (alias, canonical) in overrides.headers {
            self.headers.insert(alias.trim().to_lowercase(), canonical.trim().to_lowercase());
        }
        for field in CanonicalField::RESOLUTION_ORDER {
            let list = overrides.fields.for_field(field);
            if !list.is_empty() {
                *self.fields.for_field_mut(field) = list.to_vec();
            }
        }
        self
    }

    /// 链条校验：同义词的目标不能再被映射（保证规范化幂等）
    ///
    /// # 返回
    /// - 冲突的 (alias, canonical) 列表
    pub fn chained_entries(&self) -> Vec<(String, String)> {
        self.headers
            .iter()
            .filter(|(_, canonical)| {
                self.headers
                    .get(canonical.as_str())
                    .is_some_and(|next| next != *canonical)
            })
            .map(|(a, c)| (a.clone(), c.clone()))
            .collect()
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table_maps_barcode_family() {
        let table = SynonymTable::default();
        assert_eq!(table.canonical_for("codigo_de_barras"), Some("ean"));
        assert_eq!(table.canonical_for("gtin"), Some("ean"));
        assert_eq!(table.canonical_for("produto"), Some("sku"));
        assert_eq!(table.canonical_for("valor"), Some("preco"));
        assert_eq!(table.canonical_for("cor"), None);
    }

    #[test]
    fn test_default_table_has_no_chains() {
        assert!(SynonymTable::default().chained_entries().is_empty());
    }

    #[test]
    fn test_identifier_priority() {
        let table = SynonymTable::default();
        let ids = table.field_synonyms(CanonicalField::Identifier);
        assert_eq!(ids.first().map(String::as_str), Some("sku"));
        assert!(ids.iter().any(|s| s == "item"));
    }

    #[test]
    fn test_merge_overrides_headers_and_replaces_field_list() {
        let mut overrides = SynonymTable {
            headers: BTreeMap::new(),
            fields: FieldSynonyms {
                identifier: vec![],
                name: vec![],
                description: vec![],
                category: vec![],
                unit: vec!["medida".to_string()],
            },
        };
        overrides.headers.insert("Marca".to_string(), "fabricante".to_string());

        let merged = SynonymTable::default().merge(overrides);

        assert_eq!(merged.canonical_for("marca"), Some("fabricante"));
        assert_eq!(merged.canonical_for("gtin"), Some("ean"));
        assert_eq!(merged.field_synonyms(CanonicalField::Unit), &["medida".to_string()]);
        assert_eq!(merged.field_synonyms(CanonicalField::Identifier)[0], "sku");
    }

    #[test]
    fn test_deserialize_partial_json() {
        let table: SynonymTable =
            serde_json::from_str(r#"{"headers": {"fornecedor": "marca"}}"#).unwrap();
        assert_eq!(table.canonical_for("fornecedor"), Some("marca"));
        // 未给出的字段列表取默认值
        assert_eq!(table.field_synonyms(CanonicalField::Identifier)[0], "sku");
    }

    #[test]
    fn test_chained_entries_detected() {
        let mut table = SynonymTable::default();
        table.headers.insert("sku".to_string(), "codigo_interno".to_string());
        assert!(!table.chained_entries().is_empty());
    }
}
