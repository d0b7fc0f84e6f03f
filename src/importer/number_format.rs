// ==========================================
// 商品目录导入导出 - 数字格式
// ==========================================
// 职责: 按单元格的数字格式代码渲染数值，得到与表格软件一致的显示文本
// 支持: 0 / # / ? 占位、千分位、定长小数、百分比、字面量与货币符号、
//       日期时间、经过时长（[h]:mm:ss）
// 约束: 条件段（[>100]）、科学计数、分数 → format 返回 None，
//       调用方按“常规”格式渲染
// ==========================================

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Timelike};

const MONTH_ABBR: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];
const MONTH_FULL: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];
const WEEKDAY_ABBR: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];
const WEEKDAY_FULL: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// 内置格式编号 → 格式代码（未在 styles.xml 中声明的编号）
pub fn builtin_format_code(id: u32) -> Option<&'static str> {
    let code = match id {
        0 => "General",
        1 => "0",
        2 => "0.00",
        3 => "#,##0",
        4 => "#,##0.00",
        5 => "$#,##0_);($#,##0)",
        6 => "$#,##0_);[Red]($#,##0)",
        7 => "$#,##0.00_);($#,##0.00)",
        8 => "$#,##0.00_);[Red]($#,##0.00)",
        9 => "0%",
        10 => "0.00%",
        11 => "0.00E+00",
        12 => "# ?/?",
        13 => "# ??/??",
        14 => "m/d/yy",
        15 => "d-mmm-yy",
        16 => "d-mmm",
        17 => "mmm-yy",
        18 => "h:mm AM/PM",
        19 => "h:mm:ss AM/PM",
        20 => "h:mm",
        21 => "h:mm:ss",
        22 => "m/d/yy h:mm",
        37 => "#,##0 ;(#,##0)",
        38 => "#,##0 ;[Red](#,##0)",
        39 => "#,##0.00;(#,##0.00)",
        40 => "#,##0.00;[Red](#,##0.00)",
        41 => r#"_(* #,##0_);_(* \(#,##0\);_(* "-"_);_(@_)"#,
        42 => r#"_("$"* #,##0_);_("$"* \(#,##0\);_("$"* "-"_);_(@_)"#,
        43 => r#"_(* #,##0.00_);_(* \(#,##0.00\);_(* "-"??_);_(@_)"#,
        44 => r#"_("$"* #,##0.00_);_("$"* \(#,##0.00\);_("$"* "-"??_);_(@_)"#,
        45 => "mm:ss",
        46 => "[h]:mm:ss",
        47 => "mm:ss.0",
        48 => "##0.0E+0",
        49 => "@",
        _ => return None,
    };
    Some(code)
}

// ==========================================
// 词法单元
// ==========================================
#[derive(Debug, Clone, PartialEq)]
enum Raw {
    Literal(String),
    /// 日期时间字母串（已转小写）: y / m / d / h / s
    Run(char, usize),
    /// 经过时长: [h] / [mm] / [ss]
    Elapsed(char, usize),
    AmPm,
    AP,
    General,
    Zero,
    Hash,
    Question,
    Point,
    Comma,
    Percent,
    At,
    Slash,
    Exponent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placeholder {
    Zero,
    Hash,
    Space,
}

#[derive(Debug, Clone, PartialEq)]
enum NumToken {
    Literal(String),
    Digit(Placeholder),
    Point,
    Percent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DatePart {
    Year(usize),
    Month(usize),
    Minute(usize),
    Day(usize),
    Hour(usize),
    Second(usize),
    ElapsedHours(usize),
    ElapsedMinutes(usize),
    ElapsedSeconds(usize),
    SubSecond(usize),
    AmPm,
    AP,
}

#[derive(Debug, Clone, PartialEq)]
enum DateToken {
    Literal(String),
    Part(DatePart),
}

#[derive(Debug, Clone, PartialEq)]
struct NumberSection {
    tokens: Vec<NumToken>,
    grouping: bool,
    /// 10 的幂: 每个 % +2，每个尾随逗号 -3
    scale: i32,
    decimals: usize,
}

#[derive(Debug, Clone, PartialEq)]
struct DateSection {
    tokens: Vec<DateToken>,
    twelve_hour: bool,
    sub_second: bool,
}

#[derive(Debug, Clone, PartialEq)]
enum Section {
    General,
    Text,
    Number(NumberSection),
    Date(DateSection),
    Unsupported,
}

// ==========================================
// NumberFormat - 已解析的数字格式
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct NumberFormat {
    code: String,
    sections: Vec<Section>,
}

impl NumberFormat {
    pub fn parse(code: &str) -> Self {
        let sections = split_sections(code)
            .iter()
            .map(|section| parse_section(section))
            .collect();
        Self {
            code: code.to_string(),
            sections,
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    /// “常规”或文本格式：数值按常规规则显示
    pub fn is_general(&self) -> bool {
        self.code.trim().is_empty()
            || self
                .sections
                .iter()
                .all(|s| matches!(s, Section::General | Section::Text))
    }

    pub fn is_date(&self) -> bool {
        matches!(self.sections.first(), Some(Section::Date(_)))
    }

    /// 按格式渲染数值（日期为 1900 日期系统的序列值）
    ///
    /// 返回 None 表示该格式不受支持，调用方应回退到常规格式
    pub fn format(&self, value: f64) -> Option<String> {
        if !value.is_finite() {
            return None;
        }

        // 段选择: 正;负;零;文本
        let (section, auto_sign) = match self.sections.len() {
            0 => return None,
            1 => (&self.sections[0], true),
            2 if value < 0.0 => (&self.sections[1], false),
            2 => (&self.sections[0], false),
            _ if value > 0.0 => (&self.sections[0], false),
            _ if value < 0.0 => (&self.sections[1], false),
            _ => (&self.sections[2], false),
        };

        match section {
            Section::Number(number) => number.render(value, auto_sign),
            Section::Date(date) if value >= 0.0 => date.render(value),
            _ => None,
        }
    }
}

/// 按 ';' 拆分格式段（引号、方括号、转义内的分号不算）
fn split_sections(code: &str) -> Vec<String> {
    let mut sections = Vec::new();
    let mut current = String::new();
    let mut chars = code.chars();
    let mut in_quote = false;
    let mut in_bracket = false;

    while let Some(ch) = chars.next() {
        match ch {
            '"' if !in_bracket => in_quote = !in_quote,
            '[' if !in_quote => in_bracket = true,
            ']' if !in_quote => in_bracket = false,
            '\\' if !in_quote => {
                current.push(ch);
                if let Some(next) = chars.next() {
                    current.push(next);
                }
                continue;
            }
            ';' if !in_quote && !in_bracket => {
                sections.push(std::mem::take(&mut current));
                continue;
            }
            _ => {}
        }
        current.push(ch);
    }
    sections.push(current);
    sections
}

fn parse_section(section: &str) -> Section {
    let Some(raw) = tokenize(section) else {
        return Section::Unsupported;
    };

    let is_date = raw.iter().any(|t| {
        matches!(
            t,
            Raw::Run(..) | Raw::Elapsed(..) | Raw::AmPm | Raw::AP
        )
    });
    if is_date {
        return DateSection::build(raw).map_or(Section::Unsupported, Section::Date);
    }
    if raw.iter().any(|t| matches!(t, Raw::General)) {
        return Section::General;
    }
    if raw.iter().any(|t| matches!(t, Raw::At)) {
        return Section::Text;
    }
    NumberSection::build(raw).map_or(Section::Unsupported, Section::Number)
}

/// 格式段 → 词法单元；条件段等不支持的写法返回 None
fn tokenize(section: &str) -> Option<Vec<Raw>> {
    let chars: Vec<char> = section.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];
        match ch {
            '"' => {
                let mut literal = String::new();
                i += 1;
                while i < chars.len() && chars[i] != '"' {
                    literal.push(chars[i]);
                    i += 1;
                }
                tokens.push(Raw::Literal(literal));
            }
            '\\' => {
                i += 1;
                if let Some(next) = chars.get(i) {
                    tokens.push(Raw::Literal(next.to_string()));
                }
            }
            // 对齐占位: 输出一个空格
            '_' => {
                i += 1;
                tokens.push(Raw::Literal(" ".to_string()));
            }
            // 填充字符: 不输出
            '*' => {
                i += 1;
            }
            '[' => {
                let mut content = String::new();
                i += 1;
                while i < chars.len() && chars[i] != ']' {
                    content.push(chars[i]);
                    i += 1;
                }
                tokens.extend(bracket_token(&content)?);
            }
            '0' => tokens.push(Raw::Zero),
            '#' => tokens.push(Raw::Hash),
            '?' => tokens.push(Raw::Question),
            '.' => tokens.push(Raw::Point),
            ',' => tokens.push(Raw::Comma),
            '%' => tokens.push(Raw::Percent),
            '@' => tokens.push(Raw::At),
            '/' => tokens.push(Raw::Slash),
            'E' | 'e' if matches!(chars.get(i + 1), Some('+') | Some('-')) => {
                tokens.push(Raw::Exponent);
                i += 1;
            }
            'G' | 'g' if starts_with_ignore_case(&chars[i..], "general") => {
                tokens.push(Raw::General);
                i += "general".len() - 1;
            }
            'A' | 'a' if starts_with_ignore_case(&chars[i..], "am/pm") => {
                tokens.push(Raw::AmPm);
                i += "am/pm".len() - 1;
            }
            'A' | 'a' if starts_with_ignore_case(&chars[i..], "a/p") => {
                tokens.push(Raw::AP);
                i += "a/p".len() - 1;
            }
            _ if "ymdhsYMDHS".contains(ch) => {
                let lower = ch.to_ascii_lowercase();
                let mut len = 1;
                while chars
                    .get(i + len)
                    .is_some_and(|c| c.to_ascii_lowercase() == lower)
                {
                    len += 1;
                }
                tokens.push(Raw::Run(lower, len));
                i += len - 1;
            }
            _ => tokens.push(Raw::Literal(ch.to_string())),
        }
        i += 1;
    }

    Some(tokens)
}

/// 方括号内容: 货币/区域 [$R$-416]、颜色 [Red]、经过时长 [h]；条件段不支持
fn bracket_token(content: &str) -> Option<Vec<Raw>> {
    if let Some(currency) = content.strip_prefix('$') {
        let symbol = currency.split('-').next().unwrap_or("");
        return Some(if symbol.is_empty() {
            Vec::new()
        } else {
            vec![Raw::Literal(symbol.to_string())]
        });
    }

    let lower = content.to_ascii_lowercase();
    if let Some(first) = lower.chars().next() {
        if "hms".contains(first) && lower.chars().all(|c| c == first) {
            return Some(vec![Raw::Elapsed(first, lower.len())]);
        }
    }

    const COLORS: [&str; 8] = [
        "black", "blue", "cyan", "green", "magenta", "red", "white", "yellow",
    ];
    if COLORS.contains(&lower.as_str()) || lower.starts_with("color") {
        return Some(Vec::new());
    }

    None
}

fn starts_with_ignore_case(chars: &[char], word: &str) -> bool {
    let len = word.chars().count();
    chars.len() >= len
        && chars[..len]
            .iter()
            .zip(word.chars())
            .all(|(a, b)| a.to_ascii_lowercase() == b)
}

// ==========================================
// 数值段
// ==========================================
impl NumberSection {
    fn build(raw: Vec<Raw>) -> Option<Self> {
        let point_at = raw.iter().position(|t| matches!(t, Raw::Point));
        let is_digit = |t: &Raw| matches!(t, Raw::Zero | Raw::Hash | Raw::Question);
        let int_end = point_at.unwrap_or(raw.len());
        let first_digit = raw.iter().position(is_digit);
        let last_int_digit = raw[..int_end].iter().rposition(is_digit);
        let last_digit = raw.iter().rposition(is_digit);

        let mut tokens = Vec::with_capacity(raw.len());
        let mut grouping = false;
        let mut scale = 0;
        let mut decimals = 0;

        for (idx, token) in raw.into_iter().enumerate() {
            let in_fraction = point_at.is_some_and(|p| idx > p);
            match token {
                Raw::Zero | Raw::Hash | Raw::Question => {
                    if in_fraction {
                        decimals += 1;
                    }
                    tokens.push(NumToken::Digit(match token {
                        Raw::Zero => Placeholder::Zero,
                        Raw::Hash => Placeholder::Hash,
                        _ => Placeholder::Space,
                    }));
                }
                Raw::Point if point_at == Some(idx) => tokens.push(NumToken::Point),
                Raw::Point => tokens.push(NumToken::Literal(".".to_string())),
                Raw::Comma => {
                    let between_int_digits = !in_fraction
                        && first_digit.is_some_and(|f| f < idx)
                        && last_int_digit.is_some_and(|l| l > idx);
                    if between_int_digits {
                        grouping = true;
                    } else if last_digit.is_some_and(|l| l < idx)
                        || (!in_fraction && last_int_digit.is_some_and(|l| l < idx))
                    {
                        scale -= 3;
                    }
                }
                Raw::Percent => {
                    scale += 2;
                    tokens.push(NumToken::Percent);
                }
                Raw::Literal(text) => tokens.push(NumToken::Literal(text)),
                Raw::Slash
                | Raw::Exponent
                | Raw::At
                | Raw::General
                | Raw::Run(..)
                | Raw::Elapsed(..)
                | Raw::AmPm
                | Raw::AP => return None,
            }
        }

        Some(Self {
            tokens,
            grouping,
            scale,
            decimals,
        })
    }

    fn render(&self, value: f64, auto_sign: bool) -> Option<String> {
        let scaled = value.abs() * 10f64.powi(self.scale);
        let fixed = format!("{:.*}", self.decimals, scaled);
        let (int_raw, frac_raw) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
        let is_zero = fixed.chars().all(|c| c == '0' || c == '.');
        let negative = auto_sign && value < 0.0 && !is_zero;

        let int_slots: Vec<Placeholder> = self
            .tokens
            .iter()
            .take_while(|t| !matches!(t, NumToken::Point))
            .filter_map(|t| match t {
                NumToken::Digit(p) => Some(*p),
                _ => None,
            })
            .collect();
        let frac_slots: Vec<Placeholder> = self
            .tokens
            .iter()
            .skip_while(|t| !matches!(t, NumToken::Point))
            .filter_map(|t| match t {
                NumToken::Digit(p) => Some(*p),
                _ => None,
            })
            .collect();

        let digits = if int_raw == "0" { "" } else { int_raw };
        let mut int_out = fill_integer(digits, &int_slots);
        if self.grouping && !int_out.is_empty() {
            let joined = int_out.concat();
            let padding = joined.len() - joined.trim_start().len();
            let grouped = group_thousands(joined.trim_start());
            int_out = vec![String::new(); int_slots.len()];
            int_out[0] = format!("{}{}", " ".repeat(padding), grouped);
        }
        let frac_out = fill_fraction(frac_raw, &frac_slots);

        let mut out = String::new();
        if negative {
            out.push('-');
        }
        let mut int_idx = 0;
        let mut frac_idx = 0;
        let mut after_point = false;
        // 格式里没有整数占位（如 .00）时，整数部分放在小数点前
        let mut int_pending = int_slots.is_empty() && !frac_slots.is_empty() && !digits.is_empty();

        for token in &self.tokens {
            match token {
                NumToken::Literal(text) => out.push_str(text),
                NumToken::Percent => out.push('%'),
                NumToken::Point => {
                    if int_pending {
                        out.push_str(digits);
                        int_pending = false;
                    }
                    out.push('.');
                    after_point = true;
                }
                NumToken::Digit(_) if after_point => {
                    out.push_str(&frac_out[frac_idx]);
                    frac_idx += 1;
                }
                NumToken::Digit(_) => {
                    out.push_str(&int_out[int_idx]);
                    int_idx += 1;
                }
            }
        }

        Some(out)
    }
}

/// 整数位右对齐填入占位；多出的高位全部放进第一个占位
fn fill_integer(digits: &str, slots: &[Placeholder]) -> Vec<String> {
    let chars: Vec<char> = digits.chars().collect();
    let n = slots.len();
    let mut out = vec![String::new(); n];

    for (offset, slot) in (0..n).rev().enumerate() {
        out[slot] = if offset < chars.len() {
            chars[chars.len() - 1 - offset].to_string()
        } else {
            match slots[slot] {
                Placeholder::Zero => "0".to_string(),
                Placeholder::Space => " ".to_string(),
                Placeholder::Hash => String::new(),
            }
        };
    }
    if n > 0 && chars.len() > n {
        out[0] = chars[..=chars.len() - n].iter().collect();
    }
    out
}

/// 小数位左对齐填入；# 与 ? 位置上的尾随 0 省略
fn fill_fraction(digits: &str, slots: &[Placeholder]) -> Vec<String> {
    let chars: Vec<char> = digits.chars().collect();
    let mut out: Vec<String> = slots
        .iter()
        .enumerate()
        .map(|(j, _)| chars.get(j).map(|c| c.to_string()).unwrap_or_default())
        .collect();

    for j in (0..slots.len()).rev() {
        if chars.get(j) != Some(&'0') {
            break;
        }
        match slots[j] {
            Placeholder::Zero => break,
            Placeholder::Hash => out[j].clear(),
            Placeholder::Space => out[j] = " ".to_string(),
        }
    }
    out
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

// ==========================================
// 日期时间段
// ==========================================
impl DateSection {
    fn build(raw: Vec<Raw>) -> Option<Self> {
        let twelve_hour = raw.iter().any(|t| matches!(t, Raw::AmPm | Raw::AP));
        let mut tokens: Vec<DateToken> = Vec::with_capacity(raw.len());
        let mut iter = raw.into_iter().peekable();

        while let Some(token) = iter.next() {
            let next_is_zero = matches!(iter.peek(), Some(Raw::Zero));
            let part = match token {
                Raw::Run('y', n) => DatePart::Year(n),
                Raw::Run('m', n) => DatePart::Month(n),
                Raw::Run('d', n) => DatePart::Day(n),
                Raw::Run('h', n) => DatePart::Hour(n),
                Raw::Run('s', n) => DatePart::Second(n),
                Raw::Elapsed('h', n) => DatePart::ElapsedHours(n),
                Raw::Elapsed('m', n) => DatePart::ElapsedMinutes(n),
                Raw::Elapsed('s', n) => DatePart::ElapsedSeconds(n),
                Raw::AmPm => DatePart::AmPm,
                Raw::AP => DatePart::AP,
                // 秒后的 .0 / .00 / .000
                Raw::Point
                    if matches!(
                        tokens.last(),
                        Some(DateToken::Part(DatePart::Second(_)))
                            | Some(DateToken::Part(DatePart::ElapsedSeconds(_)))
                    ) && next_is_zero =>
                {
                    let mut places = 0;
                    while matches!(iter.peek(), Some(Raw::Zero)) {
                        iter.next();
                        places += 1;
                    }
                    tokens.push(DateToken::Literal(".".to_string()));
                    DatePart::SubSecond(places.min(3))
                }
                Raw::Literal(text) => {
                    tokens.push(DateToken::Literal(text));
                    continue;
                }
                Raw::Slash => {
                    tokens.push(DateToken::Literal("/".to_string()));
                    continue;
                }
                Raw::Point => {
                    tokens.push(DateToken::Literal(".".to_string()));
                    continue;
                }
                Raw::Comma => {
                    tokens.push(DateToken::Literal(",".to_string()));
                    continue;
                }
                Raw::Zero => {
                    tokens.push(DateToken::Literal("0".to_string()));
                    continue;
                }
                _ => return None,
            };
            tokens.push(DateToken::Part(part));
        }

        resolve_minutes(&mut tokens);
        let sub_second = tokens
            .iter()
            .any(|t| matches!(t, DateToken::Part(DatePart::SubSecond(_))));

        Some(Self {
            tokens,
            twelve_hour,
            sub_second,
        })
    }

    fn render(&self, serial: f64) -> Option<String> {
        let mut datetime = serial_to_datetime(serial)?;
        if !self.sub_second {
            datetime = round_to_second(datetime);
        }
        let total_seconds = (serial * 86_400.0).round() as i64;

        let mut out = String::new();
        for token in &self.tokens {
            match token {
                DateToken::Literal(text) => out.push_str(text),
                DateToken::Part(part) => out.push_str(&self.render_part(*part, &datetime, total_seconds)),
            }
        }
        Some(out)
    }

    fn render_part(&self, part: DatePart, dt: &NaiveDateTime, total_seconds: i64) -> String {
        let month_idx = dt.month0() as usize;
        let weekday_idx = dt.weekday().num_days_from_monday() as usize;

        match part {
            DatePart::Year(n) if n <= 2 => format!("{:02}", dt.year().rem_euclid(100)),
            DatePart::Year(_) => format!("{:04}", dt.year()),
            DatePart::Month(1) => dt.month().to_string(),
            DatePart::Month(2) => format!("{:02}", dt.month()),
            DatePart::Month(3) => MONTH_ABBR[month_idx].to_string(),
            DatePart::Month(5) => MONTH_FULL[month_idx][..1].to_string(),
            DatePart::Month(_) => MONTH_FULL[month_idx].to_string(),
            DatePart::Minute(n) => pad(dt.minute() as i64, n),
            DatePart::Day(1) => dt.day().to_string(),
            DatePart::Day(2) => format!("{:02}", dt.day()),
            DatePart::Day(3) => WEEKDAY_ABBR[weekday_idx].to_string(),
            DatePart::Day(_) => WEEKDAY_FULL[weekday_idx].to_string(),
            DatePart::Hour(n) => {
                let hour = if self.twelve_hour {
                    match dt.hour() % 12 {
                        0 => 12,
                        h => h,
                    }
                } else {
                    dt.hour()
                };
                pad(hour as i64, n)
            }
            DatePart::Second(n) => pad(dt.second() as i64, n),
            DatePart::ElapsedHours(n) => pad(total_seconds / 3600, n),
            DatePart::ElapsedMinutes(n) => pad(total_seconds / 60, n),
            DatePart::ElapsedSeconds(n) => pad(total_seconds, n),
            DatePart::SubSecond(places) => {
                let millis = format!("{:03}", dt.nanosecond() / 1_000_000);
                millis[..places].to_string()
            }
            DatePart::AmPm => (if dt.hour() < 12 { "AM" } else { "PM" }).to_string(),
            DatePart::AP => (if dt.hour() < 12 { "A" } else { "P" }).to_string(),
        }
    }
}

/// 'm' 紧跟在时之后或紧挨在秒之前时表示分钟
fn resolve_minutes(tokens: &mut [DateToken]) {
    let parts: Vec<(usize, DatePart)> = tokens
        .iter()
        .enumerate()
        .filter_map(|(i, t)| match t {
            DateToken::Part(p) => Some((i, *p)),
            DateToken::Literal(_) => None,
        })
        .collect();

    for (k, (idx, part)) in parts.iter().enumerate() {
        let DatePart::Month(n) = part else { continue };
        if *n > 2 {
            continue;
        }
        let after_hour = k > 0
            && matches!(
                parts[k - 1].1,
                DatePart::Hour(_) | DatePart::ElapsedHours(_)
            );
        let before_second = parts.get(k + 1).is_some_and(|(_, p)| {
            matches!(p, DatePart::Second(_) | DatePart::ElapsedSeconds(_))
        });
        if after_hour || before_second {
            tokens[*idx] = DateToken::Part(DatePart::Minute(*n));
        }
    }
}

fn pad(value: i64, width: usize) -> String {
    format!("{:0width$}", value, width = width.max(1))
}

/// 1900 日期系统序列值 → 日期时间
///
/// 序列值 60 是并不存在的 1900-02-29，之前的日期基准相差一天
pub fn serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || !(0.0..2_958_466.0).contains(&serial) {
        return None;
    }
    let base = if serial < 60.0 {
        NaiveDate::from_ymd_opt(1899, 12, 31)?
    } else {
        NaiveDate::from_ymd_opt(1899, 12, 30)?
    };
    let millis = (serial * 86_400_000.0).round() as i64;
    base.and_hms_opt(0, 0, 0)?
        .checked_add_signed(Duration::milliseconds(millis))
}

fn round_to_second(datetime: NaiveDateTime) -> NaiveDateTime {
    let carry = if datetime.nanosecond() >= 500_000_000 {
        Duration::seconds(1)
    } else {
        Duration::zero()
    };
    let truncated = datetime.with_nanosecond(0).unwrap_or(datetime);
    truncated.checked_add_signed(carry).unwrap_or(truncated)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fmt(code: &str, value: f64) -> Option<String> {
        NumberFormat::parse(code).format(value)
    }

    #[test]
    fn test_zero_padded_codes() {
        assert_eq!(fmt("00000", 123.0).as_deref(), Some("00123"));
        assert_eq!(fmt("00000", 1234567.0).as_deref(), Some("1234567"));
        assert_eq!(fmt("000-000", 12345.0).as_deref(), Some("012-345"));
        assert_eq!(fmt("0", 0.4).as_deref(), Some("0"));
        assert_eq!(fmt("#", 0.0).as_deref(), Some(""));
    }

    #[test]
    fn test_fixed_decimals_and_thousands() {
        assert_eq!(fmt("0.00", 2.5).as_deref(), Some("2.50"));
        assert_eq!(fmt("#,##0", 1234567.0).as_deref(), Some("1,234,567"));
        assert_eq!(fmt("#,##0.00", 1234.5).as_deref(), Some("1,234.50"));
        assert_eq!(fmt("#,##0.00", -1234.5).as_deref(), Some("-1,234.50"));
        assert_eq!(fmt("#.##", 3.1).as_deref(), Some("3.1"));
        assert_eq!(fmt("0.0#", 3.0).as_deref(), Some("3.0"));
        assert_eq!(fmt("#,##0,", 1_500_000.0).as_deref(), Some("1,500"));
    }

    #[test]
    fn test_currency_literals() {
        assert_eq!(
            fmt(r#""R$" #,##0.00"#, 1234.5).as_deref(),
            Some("R$ 1,234.50")
        );
        assert_eq!(
            fmt("[$R$-416] #,##0.00", 99.9).as_deref(),
            Some("R$ 99.90")
        );
        assert_eq!(fmt(r"\€0.00", 5.0).as_deref(), Some("€5.00"));
        assert_eq!(
            fmt("$#,##0.00_);($#,##0.00)", -12.0).as_deref(),
            Some("($12.00)")
        );
        assert_eq!(
            fmt("#,##0.00;[Red]-#,##0.00", -3.0).as_deref(),
            Some("-3.00")
        );
    }

    #[test]
    fn test_percent() {
        assert_eq!(fmt("0%", 0.5).as_deref(), Some("50%"));
        assert_eq!(fmt("0.0%", 0.125).as_deref(), Some("12.5%"));
    }

    #[test]
    fn test_zero_section() {
        let code = builtin_format_code(43).unwrap();
        assert_eq!(fmt(code, 0.0).map(|s| s.trim().to_string()).as_deref(), Some("-"));
        assert_eq!(
            fmt(code, 1234.5).map(|s| s.trim().to_string()).as_deref(),
            Some("1,234.50")
        );
    }

    #[test]
    fn test_date_patterns() {
        // 45366 = 2024-03-15
        assert_eq!(fmt("dd/mm/yyyy", 45366.0).as_deref(), Some("15/03/2024"));
        assert_eq!(fmt("m/d/yy", 45366.0).as_deref(), Some("3/15/24"));
        assert_eq!(fmt("d-mmm-yy", 45366.0).as_deref(), Some("15-Mar-24"));
        assert_eq!(fmt("dddd, mmmm d", 45366.0).as_deref(), Some("Friday, March 15"));
        assert_eq!(fmt("yyyy-mm-dd hh:mm", 45366.5).as_deref(), Some("2024-03-15 12:00"));
        assert_eq!(fmt("h:mm AM/PM", 0.75).as_deref(), Some("6:00 PM"));
        assert_eq!(fmt("mm:ss", 90.0 / 86_400.0).as_deref(), Some("01:30"));
        assert_eq!(fmt("[h]:mm:ss", 1.5).as_deref(), Some("36:00:00"));
        assert_eq!(fmt("dd/mm/yyyy", -1.0), None);
    }

    #[test]
    fn test_unsupported_falls_back() {
        assert_eq!(fmt("[>100]0;0.00", 5.0), None);
        assert_eq!(fmt("0.00E+00", 12345.0), None);
        assert_eq!(fmt("# ?/?", 1.5), None);
        assert_eq!(fmt("General", 1.5), None);
        assert!(NumberFormat::parse("General").is_general());
        assert!(NumberFormat::parse("@").is_general());
        assert!(!NumberFormat::parse("00000").is_general());
        assert!(NumberFormat::parse("dd/mm/yyyy").is_date());
    }

    #[test]
    fn test_serial_to_datetime_base() {
        let day_one = serial_to_datetime(1.0).unwrap();
        assert_eq!(day_one.date(), NaiveDate::from_ymd_opt(1900, 1, 1).unwrap());
        let march_first = serial_to_datetime(61.0).unwrap();
        assert_eq!(march_first.date(), NaiveDate::from_ymd_opt(1900, 3, 1).unwrap());
    }
}
