// ==========================================
// 商品目录导入导出 - 进度上报与取消
// ==========================================

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

// ==========================================
// ProgressSink - 进度接收方
// ==========================================
// 以有界频率接收 (已处理行数, 总行数)；最后一次必为 (total, total)
pub trait ProgressSink: Send + Sync {
    fn report(&self, processed: usize, total: usize);
}

impl<F> ProgressSink for F
where
    F: Fn(usize, usize) + Send + Sync,
{
    fn report(&self, processed: usize, total: usize) {
        self(processed, total)
    }
}

/// 不关心进度时使用
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&self, _processed: usize, _total: usize) {}
}

// ==========================================
// ProgressTicker - 上报节奏控制
// ==========================================
pub struct ProgressTicker<'a> {
    sink: &'a dyn ProgressSink,
    interval: usize,
    total: usize,
}

impl<'a> ProgressTicker<'a> {
    pub fn new(sink: &'a dyn ProgressSink, interval: usize, total: usize) -> Self {
        Self {
            sink,
            interval: interval.max(1),
            total,
        }
    }

    /// 处理完第 processed 行后调用；到达间隔时上报，返回是否为检查点
    pub fn tick(&self, processed: usize) -> bool {
        if processed % self.interval == 0 && processed < self.total {
            self.sink.report(processed, self.total);
            true
        } else {
            false
        }
    }

    /// 最终上报 (total, total)
    pub fn finish(&self) {
        self.sink.report(self.total, self.total);
    }
}

// ==========================================
// CancelFlag - 取消标记
// ==========================================
// 在行批之间检查；取消发生在写入之前，不会留下部分写入
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
