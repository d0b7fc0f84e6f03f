// ==========================================
// 商品目录导入导出 - 表头规范化
// ==========================================
// 流程: 小写 → 去重音（含分解形式的组合附加符）→ 非字母数字/下划线连续段替换为 "_"
//       → 去首尾 "_" → 同义词查表
// 性质: 确定、全函数（任何输入都产出非空键）、对自身输出幂等
// ==========================================

use crate::config::synonym_table::SynonymTable;

/// 清洗后为空的表头使用的键
pub const EMPTY_HEADER_KEY: &str = "coluna";

pub struct HeaderNormalizer<'a> {
    synonyms: &'a SynonymTable,
}

impl<'a> HeaderNormalizer<'a> {
    pub fn new(synonyms: &'a SynonymTable) -> Self {
        Self { synonyms }
    }

    /// 原始表头 → 规范列名
    pub fn normalize(&self, raw_header: &str) -> String {
        let cleaned = clean_header(raw_header);
        match self.synonyms.canonical_for(&cleaned) {
            Some(canonical) => canonical.to_string(),
            None => cleaned,
        }
    }

    /// 批量规范化（保持位置一一对应）
    pub fn normalize_all<S: AsRef<str>>(&self, raw_headers: &[S]) -> Vec<String> {
        raw_headers
            .iter()
            .map(|h| self.normalize(h.as_ref()))
            .collect()
    }
}

/// 清洗表头为 slug（不查同义词）
pub fn clean_header(raw_header: &str) -> String {
    let mut slug = String::with_capacity(raw_header.len());
    let mut pending_separator = false;

    for ch in raw_header.chars().flat_map(char::to_lowercase) {
        if is_combining_mark(ch) {
            continue;
        }
        let ch = fold_diacritic(ch);
        if ch.is_alphanumeric() || ch == '_' {
            if ch == '_' {
                pending_separator = true;
                continue;
            }
            if pending_separator && !slug.is_empty() {
                slug.push('_');
            }
            pending_separator = false;
            slug.push(ch);
        } else {
            pending_separator = true;
        }
    }

    if slug.is_empty() {
        EMPTY_HEADER_KEY.to_string()
    } else {
        slug
    }
}

/// 组合附加符（NFD 形式的重音，如 "o\u{301}"）
fn is_combining_mark(ch: char) -> bool {
    ('\u{0300}'..='\u{036F}').contains(&ch)
}

/// 常见拉丁字母重音折叠（葡语/西语表头）
fn fold_diacritic(ch: char) -> char {
    match ch {
        'á' | 'à' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'ç' => 'c',
        'ñ' => 'n',
        'ý' | 'ÿ' => 'y',
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_header_basic() {
        assert_eq!(clean_header("  Nome do Produto "), "nome_do_produto");
        assert_eq!(clean_header("Preço (R$)"), "preco_r");
        assert_eq!(clean_header("__SKU__"), "sku");
        assert_eq!(clean_header("a - - b"), "a_b");
        assert_eq!(clean_header("a__b"), "a_b");
    }

    #[test]
    fn test_decomposed_accents_fold_like_precomposed() {
        assert_eq!(clean_header("Co\u{301}digo"), "codigo");
        assert_eq!(clean_header("Prec\u{327}o"), "preco");
        assert_eq!(clean_header("Descric\u{327}a\u{303}o"), clean_header("Descrição"));

        let table = SynonymTable::default();
        let normalizer = HeaderNormalizer::new(&table);
        assert_eq!(normalizer.normalize("Co\u{301}digo"), "sku");
    }

    #[test]
    fn test_clean_header_empty_is_total() {
        assert_eq!(clean_header(""), EMPTY_HEADER_KEY);
        assert_eq!(clean_header(" $%# "), EMPTY_HEADER_KEY);
    }

    #[test]
    fn test_synonym_resolution() {
        let table = SynonymTable::default();
        let normalizer = HeaderNormalizer::new(&table);

        assert_eq!(
            normalizer.normalize_all(&["Código de Barras", "Produto", "Preço"]),
            vec!["ean", "sku", "preco"]
        );
        assert_eq!(normalizer.normalize("GTIN"), "ean");
        assert_eq!(normalizer.normalize("Valor"), "preco");
        assert_eq!(normalizer.normalize("Cor"), "cor");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let table = SynonymTable::default();
        let normalizer = HeaderNormalizer::new(&table);

        for header in [
            "Código de Barras",
            "Qtd.",
            "Descrição Produto",
            "  ",
            "Departamento",
            "Cor / Tamanho",
            "规格",
        ] {
            let once = normalizer.normalize(header);
            assert_eq!(normalizer.normalize(&once), once, "header {:?}", header);
        }
    }

    #[test]
    fn test_non_latin_alphanumerics_kept() {
        assert_eq!(clean_header("规格 型号"), "规格_型号");
    }
}
