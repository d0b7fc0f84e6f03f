// ==========================================
// 商品目录导入导出 - 行解析
// ==========================================
// 职责: (批次结构, 原始行) → 记录草稿
// 形式: 惰性、有限、不可重启的行结果迭代器；上报节奏与取消由管道驱动方决定
// ==========================================

use crate::domain::{AttributeMap, CatalogRecord};
use crate::importer::cell_text::{CellText, CellTextExtractor, SheetCell};
use crate::importer::column_resolver::BatchSchema;

// ==========================================
// RecordDraft - 记录草稿
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct RecordDraft {
    pub row_number: usize, // 工作表行号（1 起，表头为第 1 行）
    pub code: String,
    pub name: String, // 缺失时取 code
    pub description: Option<String>,
    pub category: Option<String>,
    pub unit: Option<String>,
    pub attributes: AttributeMap, // 全部去重键 → 单元格文本
}

impl RecordDraft {
    pub fn into_record(self) -> (CatalogRecord, AttributeMap) {
        let mut record = CatalogRecord::new(self.code);
        record.name = self.name;
        record.description = self.description;
        record.category = self.category;
        record.unit = self.unit;
        (record, self.attributes)
    }
}

// ==========================================
// RowOutcome - 单行解析结果
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome {
    Parsed {
        draft: RecordDraft,
        decode_failures: usize,
    },
    /// 编码列为空：整行跳过（不是错误）
    SkippedBlankIdentifier { row_number: usize },
}

// ==========================================
// RowParser - 行解析器（纯函数）
// ==========================================
pub struct RowParser<'a> {
    schema: &'a BatchSchema,
    extractor: CellTextExtractor,
}

impl<'a> RowParser<'a> {
    pub fn new(schema: &'a BatchSchema) -> Self {
        Self {
            schema,
            extractor: CellTextExtractor,
        }
    }

    /// 解析一行
    ///
    /// # 参数
    /// - row_number: 工作表行号（仅用于日志/诊断）
    /// - row: 从第 0 列开始的单元格
    pub fn parse_row(&self, row_number: usize, row: &[SheetCell]) -> RowOutcome {
        let fields = &self.schema.fields;

        let code = match self.extractor.extract(row, fields.identifier) {
            CellText::Present(code) => code,
            _ => return RowOutcome::SkippedBlankIdentifier { row_number },
        };

        let mut decode_failures = 0;
        let mut attributes = AttributeMap::with_capacity(self.schema.width());
        for (col, key) in self.schema.keys.iter().enumerate() {
            let text = self.extractor.extract(row, col);
            if text.is_undecodable() {
                decode_failures += 1;
            }
            attributes.insert(key.clone(), text.into_value());
        }

        let lookup = |col: Option<usize>| -> Option<String> {
            col.and_then(|c| attributes.get(&self.schema.keys[c]).cloned().flatten())
        };

        let draft = RecordDraft {
            row_number,
            name: lookup(fields.name).unwrap_or_else(|| code.clone()),
            description: lookup(fields.description),
            category: lookup(fields.category),
            unit: lookup(fields.unit),
            code,
            attributes,
        };

        RowOutcome::Parsed {
            draft,
            decode_failures,
        }
    }

    /// 构建惰性行迭代器
    pub fn stream<'r>(&'r self, rows: &'r [Vec<SheetCell>]) -> RowStream<'r, 'a> {
        RowStream {
            parser: self,
            rows: rows.iter().enumerate(),
        }
    }
}

// ==========================================
// RowStream - 行结果迭代器
// ==========================================
pub struct RowStream<'r, 'a> {
    parser: &'r RowParser<'a>,
    rows: std::iter::Enumerate<std::slice::Iter<'r, Vec<SheetCell>>>,
}

impl Iterator for RowStream<'_, '_> {
    type Item = RowOutcome;

    fn next(&mut self) -> Option<Self::Item> {
        let (idx, row) = self.rows.next()?;
        // 数据行从工作表第 2 行开始
        Some(self.parser.parse_row(idx + 2, row))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.rows.size_hint()
    }
}

impl ExactSizeIterator for RowStream<'_, '_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::synonym_table::SynonymTable;
    use crate::importer::column_resolver::ColumnResolver;
    use crate::importer::number_format::NumberFormat;
    use calamine::{CellErrorType, Data};
    use std::sync::Arc;

    fn schema(headers: &[&str]) -> BatchSchema {
        let table = SynonymTable::default();
        ColumnResolver::new(&table).build_schema(headers.iter().map(|s| s.to_string()).collect())
    }

    fn text(s: &str) -> SheetCell {
        Data::String(s.to_string()).into()
    }

    #[test]
    fn test_parse_row_with_all_fields() {
        let schema = schema(&["SKU", "Nome", "Categoria", "Preço"]);
        let parser = RowParser::new(&schema);

        let outcome = parser.parse_row(2, &[text("00123"), text(" Caneta "), text("Papelaria"), Data::Float(2.5).into()]);
        let RowOutcome::Parsed { draft, decode_failures } = outcome else {
            panic!("row should parse");
        };

        assert_eq!(decode_failures, 0);
        assert_eq!(draft.code, "00123");
        assert_eq!(draft.name, "Caneta");
        assert_eq!(draft.category.as_deref(), Some("Papelaria"));
        assert_eq!(draft.unit, None);
        assert_eq!(draft.attributes.get("preco"), Some(&Some("2.5".to_string())));
        assert_eq!(
            draft.attributes.keys().collect::<Vec<_>>(),
            vec!["sku", "nome", "categoria", "preco"]
        );
    }

    #[test]
    fn test_name_defaults_to_identifier() {
        let schema = schema(&["SKU", "Nome"]);
        let parser = RowParser::new(&schema);

        let RowOutcome::Parsed { draft, .. } = parser.parse_row(2, &[text("P1")]) else {
            panic!("row should parse");
        };
        assert_eq!(draft.name, "P1");
        // 缺失的列仍然出现在属性中（值为空）
        assert_eq!(draft.attributes.get("nome"), Some(&None));
    }

    #[test]
    fn test_blank_identifier_skipped() {
        let schema = schema(&["SKU", "Nome"]);
        let parser = RowParser::new(&schema);

        assert_eq!(
            parser.parse_row(3, &[text("   "), text("Sem código")]),
            RowOutcome::SkippedBlankIdentifier { row_number: 3 }
        );
        assert_eq!(
            parser.parse_row(4, &[]),
            RowOutcome::SkippedBlankIdentifier { row_number: 4 }
        );
    }

    #[test]
    fn test_undecodable_cell_counted_not_fatal() {
        let schema = schema(&["SKU", "Preço"]);
        let parser = RowParser::new(&schema);

        let RowOutcome::Parsed { draft, decode_failures } =
            parser.parse_row(2, &[text("P1"), Data::Error(CellErrorType::Div0).into()])
        else {
            panic!("row should parse");
        };
        assert_eq!(decode_failures, 1);
        assert_eq!(draft.attributes.get("preco"), Some(&None));
    }

    #[test]
    fn test_formatted_numeric_identifier_keeps_displayed_digits() {
        let schema = schema(&["Código", "Preço"]);
        let parser = RowParser::new(&schema);
        let code = SheetCell::new(Data::Float(123.0), Some(Arc::new(NumberFormat::parse("00000"))));
        let price = SheetCell::new(Data::Float(9.9), Some(Arc::new(NumberFormat::parse("0.00"))));

        let RowOutcome::Parsed { draft, .. } = parser.parse_row(2, &[code, price]) else {
            panic!("row should parse");
        };
        assert_eq!(draft.code, "00123");
        assert_eq!(draft.attributes.get("preco"), Some(&Some("9.90".to_string())));
    }

    #[test]
    fn test_stream_preserves_file_order() {
        let schema = schema(&["SKU"]);
        let parser = RowParser::new(&schema);
        let rows = vec![vec![text("B")], vec![Data::Empty.into()], vec![text("A")]];

        let stream = parser.stream(&rows);
        assert_eq!(stream.len(), 3);

        let codes: Vec<String> = stream
            .filter_map(|o| match o {
                RowOutcome::Parsed { draft, .. } => Some(draft.code),
                RowOutcome::SkippedBlankIdentifier { .. } => None,
            })
            .collect();
        assert_eq!(codes, vec!["B", "A"]);
    }
}
