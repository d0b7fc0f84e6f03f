// ==========================================
// 商品目录导入导出 - 表头去重
// ==========================================
// 规则: 首次出现保留原键，之后依次追加 "_2"、"_3" ...
// 输出与输入等长且位置一一对应（后续按列号查找依赖这一点）
// ==========================================

use std::collections::{HashMap, HashSet};

pub struct HeaderDeduplicator;

impl HeaderDeduplicator {
    /// 为规范列名序列分配唯一键
    ///
    /// 若追加后缀的候选键恰好与其他列的原键相同（如 ["a", "a", "a_2"]），
    /// 计数继续递增，保证输出键两两不同
    pub fn dedupe(&self, keys: &[String]) -> Vec<String> {
        let original: HashSet<&str> = keys.iter().map(String::as_str).collect();
        let mut counters: HashMap<&str, usize> = HashMap::new();
        let mut emitted: HashSet<String> = HashSet::with_capacity(keys.len());
        let mut result = Vec::with_capacity(keys.len());

        for key in keys {
            let count = counters.entry(key.as_str()).or_insert(0);
            *count += 1;

            let mut candidate = if *count == 1 {
                key.clone()
            } else {
                format!("{}_{}", key, count)
            };

            while emitted.contains(&candidate)
                || (*count > 1 && original.contains(candidate.as_str()))
            {
                *count += 1;
                candidate = format!("{}_{}", key, count);
            }

            emitted.insert(candidate.clone());
            result.push(candidate);
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_suffixes_in_order() {
        let result = HeaderDeduplicator.dedupe(&keys(&["sku", "nome", "sku", "sku", "nome"]));
        assert_eq!(result, keys(&["sku", "nome", "sku_2", "sku_3", "nome_2"]));
    }

    #[test]
    fn test_unique_input_unchanged() {
        let input = keys(&["ean", "sku", "preco"]);
        assert_eq!(HeaderDeduplicator.dedupe(&input), input);
    }

    #[test]
    fn test_collision_with_existing_suffix() {
        let result = HeaderDeduplicator.dedupe(&keys(&["a", "a", "a_2"]));
        assert_eq!(result.len(), 3);
        assert_eq!(result[0], "a");
        assert_eq!(result[2], "a_2");
        assert_eq!(result[1], "a_3");
    }

    #[test]
    fn test_output_always_unique() {
        let input = keys(&["x", "x_2", "x", "x", "x_3", "coluna", "coluna"]);
        let result = HeaderDeduplicator.dedupe(&input);
        let unique: HashSet<&String> = result.iter().collect();
        assert_eq!(result.len(), input.len());
        assert_eq!(unique.len(), input.len());
    }

    #[test]
    fn test_empty_input() {
        assert!(HeaderDeduplicator.dedupe(&[]).is_empty());
    }
}
