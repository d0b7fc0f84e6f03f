// ==========================================
// 商品目录导入导出 - 单元格数字格式索引
// ==========================================
// 职责: 从 xlsx 包中读取 styles.xml（numFmts + cellXfs）与工作表的
//       单元格样式号，得到 (行, 列) → 数字格式
// 说明: 只记录非“常规”格式的单元格；calamine 不暴露单元格样式
// ==========================================

use crate::importer::number_format::{builtin_format_code, NumberFormat};
use anyhow::{anyhow, Context, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;
use std::io::{Cursor, Read};
use std::sync::Arc;
use zip::result::ZipError;
use zip::ZipArchive;

type Archive<'a> = ZipArchive<Cursor<&'a [u8]>>;

// ==========================================
// CellFormats - 单元格格式索引
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct CellFormats {
    by_cell: HashMap<(u32, u32), Arc<NumberFormat>>,
}

impl CellFormats {
    /// 读取指定工作表的单元格格式
    ///
    /// # 参数
    /// - bytes: 整个 xlsx 包
    /// - sheet_name: 工作表名（与 calamine 的 sheet_names 一致）
    pub fn read(bytes: &[u8], sheet_name: &str) -> Result<Self> {
        let mut archive = ZipArchive::new(Cursor::new(bytes)).context("xlsx 包无法打开")?;

        let xf_formats = match read_part(&mut archive, "xl/styles.xml")? {
            Some(xml) => parse_cell_xfs(&xml)?,
            None => return Ok(Self::default()),
        };
        if xf_formats.iter().all(Option::is_none) {
            return Ok(Self::default());
        }

        let sheet_path = resolve_sheet_path(&mut archive, sheet_name)?;
        let sheet_xml = read_part(&mut archive, &sheet_path)?
            .ok_or_else(|| anyhow!("工作表部件不存在: {}", sheet_path))?;

        Ok(Self {
            by_cell: scan_cell_styles(&sheet_xml, &xf_formats)?,
        })
    }

    /// 绝对坐标（0 起）处单元格的数字格式；常规格式返回 None
    pub fn get(&self, row: u32, col: u32) -> Option<Arc<NumberFormat>> {
        self.by_cell.get(&(row, col)).cloned()
    }

    pub fn len(&self) -> usize {
        self.by_cell.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_cell.is_empty()
    }
}

fn read_part(archive: &mut Archive<'_>, name: &str) -> Result<Option<String>> {
    let mut file = match archive.by_name(name) {
        Ok(file) => file,
        Err(ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(e).with_context(|| format!("读取 {} 失败", name)),
    };
    let mut xml = String::new();
    file.read_to_string(&mut xml)
        .with_context(|| format!("读取 {} 失败", name))?;
    Ok(Some(xml))
}

fn attr_value(element: &BytesStart<'_>, name: &[u8]) -> Option<String> {
    element
        .attributes()
        .flatten()
        .find(|attr| attr.key.local_name().as_ref() == name)
        .and_then(|attr| {
            std::str::from_utf8(&attr.value)
                .ok()
                .and_then(|s| quick_xml::escape::unescape(s).ok())
                .map(|v| v.into_owned())
        })
}

/// styles.xml → 按 xf 序号排列的数字格式（常规格式为 None）
fn parse_cell_xfs(xml: &str) -> Result<Vec<Option<Arc<NumberFormat>>>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut custom: HashMap<u32, String> = HashMap::new();
    let mut resolved: HashMap<u32, Option<Arc<NumberFormat>>> = HashMap::new();
    let mut xfs = Vec::new();
    let mut in_cell_xfs = false;

    loop {
        match reader.read_event().context("styles.xml 解析失败")? {
            Event::Start(e) if e.local_name().as_ref() == b"cellXfs" => in_cell_xfs = true,
            Event::End(e) if e.local_name().as_ref() == b"cellXfs" => in_cell_xfs = false,
            Event::Start(e) | Event::Empty(e) => match e.local_name().as_ref() {
                b"numFmt" => {
                    let id = attr_value(&e, b"numFmtId").and_then(|v| v.parse::<u32>().ok());
                    if let (Some(id), Some(code)) = (id, attr_value(&e, b"formatCode")) {
                        custom.insert(id, code);
                    }
                }
                b"xf" if in_cell_xfs => {
                    let id = attr_value(&e, b"numFmtId")
                        .and_then(|v| v.parse::<u32>().ok())
                        .unwrap_or(0);
                    let format = resolved
                        .entry(id)
                        .or_insert_with(|| {
                            let code = custom
                                .get(&id)
                                .map(String::as_str)
                                .or_else(|| builtin_format_code(id))?;
                            let format = NumberFormat::parse(code);
                            (!format.is_general()).then(|| Arc::new(format))
                        })
                        .clone();
                    xfs.push(format);
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(xfs)
}

/// 工作表名 → 包内路径（workbook.xml 的 r:id → workbook.xml.rels 的 Target）
fn resolve_sheet_path(archive: &mut Archive<'_>, sheet_name: &str) -> Result<String> {
    let workbook_xml =
        read_part(archive, "xl/workbook.xml")?.ok_or_else(|| anyhow!("缺少 xl/workbook.xml"))?;

    let mut rel_id = None;
    let mut reader = Reader::from_str(&workbook_xml);
    loop {
        match reader.read_event().context("workbook.xml 解析失败")? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"sheet" => {
                if attr_value(&e, b"name").as_deref() == Some(sheet_name) {
                    rel_id = attr_value(&e, b"id");
                    break;
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    let rel_id = rel_id.ok_or_else(|| anyhow!("workbook.xml 中找不到工作表: {}", sheet_name))?;

    let rels_xml = read_part(archive, "xl/_rels/workbook.xml.rels")?
        .ok_or_else(|| anyhow!("缺少 xl/_rels/workbook.xml.rels"))?;
    let mut reader = Reader::from_str(&rels_xml);
    loop {
        match reader.read_event().context("workbook.xml.rels 解析失败")? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"Relationship" => {
                if attr_value(&e, b"Id").as_deref() == Some(rel_id.as_str()) {
                    let target = attr_value(&e, b"Target")
                        .ok_or_else(|| anyhow!("关系 {} 缺少 Target", rel_id))?;
                    return Ok(match target.strip_prefix('/') {
                        Some(absolute) => absolute.to_string(),
                        None => format!("xl/{}", target),
                    });
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Err(anyhow!("找不到关系: {}", rel_id))
}

/// 扫描工作表中带样式号的单元格（缺少 r 属性时按行内顺序推算列号）
fn scan_cell_styles(
    xml: &str,
    xf_formats: &[Option<Arc<NumberFormat>>],
) -> Result<HashMap<(u32, u32), Arc<NumberFormat>>> {
    let mut reader = Reader::from_str(xml);
    let mut by_cell = HashMap::new();
    let mut current_row = 0u32;
    let mut next_row = 0u32;
    let mut next_col = 0u32;

    loop {
        match reader.read_event().context("工作表 XML 解析失败")? {
            Event::Start(e) | Event::Empty(e) => match e.local_name().as_ref() {
                b"row" => {
                    current_row = attr_value(&e, b"r")
                        .and_then(|r| r.parse::<u32>().ok())
                        .map(|r| r.saturating_sub(1))
                        .unwrap_or(next_row);
                    next_row = current_row + 1;
                    next_col = 0;
                }
                b"c" => {
                    let (row, col) = attr_value(&e, b"r")
                        .and_then(|r| parse_cell_ref(&r))
                        .unwrap_or((current_row, next_col));
                    next_col = col + 1;

                    let format = attr_value(&e, b"s")
                        .and_then(|s| s.parse::<usize>().ok())
                        .and_then(|s| xf_formats.get(s).cloned().flatten());
                    if let Some(format) = format {
                        by_cell.insert((row, col), format);
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(by_cell)
}

/// "B12" → (11, 1)，0 起
fn parse_cell_ref(cell_ref: &str) -> Option<(u32, u32)> {
    let split = cell_ref.find(|c: char| c.is_ascii_digit())?;
    let (letters, digits) = cell_ref.split_at(split);
    if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }

    let col = letters
        .chars()
        .fold(0u32, |acc, c| acc * 26 + (c.to_ascii_uppercase() as u32 - 'A' as u32 + 1));
    let row = digits.parse::<u32>().ok()?;
    if row == 0 {
        return None;
    }
    Some((row - 1, col - 1))
}
