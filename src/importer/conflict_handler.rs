// ==========================================
// 商品目录导入导出 - 批内重复处理
// ==========================================
// 职责: 同批次内重复编码去重（首次出现保留，之后的重复行静默丢弃并计数）
// ==========================================

use crate::importer::row_parser::RecordDraft;
use std::collections::HashMap;

// ==========================================
// Deduplicator - 批内去重器
// ==========================================
// 每个批次新建一个实例；跨批次依赖仓储 upsert 语义
#[derive(Debug, Default)]
pub struct Deduplicator {
    first_occurrence: HashMap<String, usize>, // code → 首次出现行号
    duplicates: Vec<(usize, String)>,         // (行号, code)，不包括第一次出现
}

impl Deduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// 接收草稿：首次出现返回 Some，重复返回 None
    pub fn accept(&mut self, draft: RecordDraft) -> Option<RecordDraft> {
        if self.first_occurrence.contains_key(&draft.code) {
            // 发现重复：记录当前行号
            self.duplicates.push((draft.row_number, draft.code));
            None
        } else {
            self.first_occurrence
                .insert(draft.code.clone(), draft.row_number);
            Some(draft)
        }
    }

    /// 已接收的不同编码数
    pub fn accepted_count(&self) -> usize {
        self.first_occurrence.len()
    }

    pub fn duplicate_count(&self) -> usize {
        self.duplicates.len()
    }

    /// 重复记录列表
    ///
    /// # 返回
    /// - Vec<(行号, code)>
    pub fn duplicates(&self) -> &[(usize, String)] {
        &self.duplicates
    }

    /// 某编码首次出现的行号
    pub fn first_row_of(&self, code: &str) -> Option<usize> {
        self.first_occurrence.get(code).copied()
    }
}
