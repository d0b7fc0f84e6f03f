// ==========================================
// 商品目录导入导出 - 单元格文本提取
// ==========================================
// 职责: 单元格 → 人眼可见的文本（去首尾空白）或显式“缺失”标记
// 约束:
// - 文本单元格原样保留（"00123" 不得变成 "123"）
// - 带数字格式的数值/日期按格式渲染（00000、R$ #,##0.00、dd/mm/yyyy …）
// - 常规格式的数值不输出科学计数法，整数值不带 ".0"
// - 单个单元格解码失败只降级为缺失，不中止批次
// ==========================================

use crate::importer::number_format::NumberFormat;
use calamine::{Data, ExcelDateTime};
use std::sync::Arc;

/// 数值最多保留的有效数字（与表格软件“常规”格式一致）
const SIGNIFICANT_DIGITS: i32 = 15;

// ==========================================
// CellText - 单元格提取结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellText {
    /// 非空文本（已去首尾空白）
    Present(String),
    /// 单元格存在但内容为空白
    Blank,
    /// 该行在此列没有单元格
    Missing,
    /// 单元格无法解码（错误值、非法日期等）
    Undecodable,
}

impl CellText {
    /// 转为存储值：仅 Present 有值
    pub fn into_value(self) -> Option<String> {
        match self {
            CellText::Present(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellText::Present(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn is_present(&self) -> bool {
        matches!(self, CellText::Present(_))
    }

    pub fn is_undecodable(&self) -> bool {
        matches!(self, CellText::Undecodable)
    }

    fn from_text(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            CellText::Blank
        } else {
            CellText::Present(trimmed.to_string())
        }
    }
}

// ==========================================
// SheetCell - 单元格值 + 数字格式
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct SheetCell {
    pub value: Data,
    /// 非“常规”的数字格式
    pub format: Option<Arc<NumberFormat>>,
}

impl SheetCell {
    pub fn new(value: Data, format: Option<Arc<NumberFormat>>) -> Self {
        Self { value, format }
    }
}

impl From<Data> for SheetCell {
    fn from(value: Data) -> Self {
        Self {
            value,
            format: None,
        }
    }
}

// ==========================================
// CellTextExtractor - 单元格文本提取器
// ==========================================
pub struct CellTextExtractor;

impl CellTextExtractor {
    /// 按列号提取一行中的单元格文本
    ///
    /// # 参数
    /// - row: 从第 0 列开始的整行单元格
    /// - col: 列号（0 起）
    pub fn extract(&self, row: &[SheetCell], col: usize) -> CellText {
        match row.get(col) {
            Some(cell) => self.display_text(cell),
            None => CellText::Missing,
        }
    }

    /// 单元格 → 显示文本（应用数字格式）
    ///
    /// 格式不受支持时回退到常规格式
    pub fn display_text(&self, cell: &SheetCell) -> CellText {
        let Some(format) = cell.format.as_deref() else {
            return self.cell_text(&cell.value);
        };

        let serial = match &cell.value {
            Data::Float(f) => *f,
            Data::Int(i) => *i as f64,
            Data::DateTime(dt) => dt.as_f64(),
            other => return self.cell_text(other),
        };

        match format.format(serial) {
            Some(text) => CellText::from_text(&text),
            None => self.cell_text(&cell.value),
        }
    }

    /// 单个单元格 → 常规格式文本
    pub fn cell_text(&self, cell: &Data) -> CellText {
        match cell {
            Data::Empty => CellText::Blank,
            Data::String(s) => CellText::from_text(s),
            Data::Int(i) => CellText::Present(i.to_string()),
            Data::Float(f) => match format_number(*f) {
                Some(text) => CellText::Present(text),
                None => CellText::Undecodable,
            },
            Data::Bool(b) => CellText::Present(if *b { "TRUE" } else { "FALSE" }.to_string()),
            Data::DateTime(dt) => match format_excel_datetime(dt) {
                Some(text) => CellText::Present(text),
                None => CellText::Undecodable,
            },
            Data::DateTimeIso(s) | Data::DurationIso(s) => CellText::from_text(s),
            Data::Error(_) => CellText::Undecodable,
        }
    }
}

/// 数值 → 文本（不使用科学计数法）
///
/// 非有限值（NaN / ∞）视为无法解码
pub fn format_number(value: f64) -> Option<String> {
    if !value.is_finite() {
        return None;
    }
    if value == 0.0 {
        return Some("0".to_string());
    }

    let magnitude = value.abs().log10().floor() as i32;
    if magnitude >= SIGNIFICANT_DIGITS {
        // 超出有效数字范围的大数直接按整数输出
        return Some(format!("{:.0}", value));
    }

    let decimals = (SIGNIFICANT_DIGITS - 1 - magnitude).clamp(0, 30) as usize;
    let fixed = format!("{:.*}", decimals, value);
    let text = if fixed.contains('.') {
        fixed.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        fixed
    };

    if text == "-0" {
        Some("0".to_string())
    } else {
        Some(text)
    }
}

/// Excel 日期/时长序列值 → ISO 文本
///
/// - 日期（无时间部分）: YYYY-MM-DD
/// - 日期时间: YYYY-MM-DD HH:MM:SS
/// - 时长: H:MM:SS（小时不折返）
fn format_excel_datetime(value: &ExcelDateTime) -> Option<String> {
    if value.is_duration() {
        let duration = value.as_duration()?;
        let total_secs = duration.num_seconds();
        let sign = if total_secs < 0 { "-" } else { "" };
        let secs = total_secs.abs();
        return Some(format!(
            "{}{}:{:02}:{:02}",
            sign,
            secs / 3600,
            (secs % 3600) / 60,
            secs % 60
        ));
    }

    let datetime = value.as_datetime()?;
    if datetime.time() == chrono::NaiveTime::MIN {
        Some(datetime.format("%Y-%m-%d").to_string())
    } else {
        Some(datetime.format("%Y-%m-%d %H:%M:%S").to_string())
    }
}
