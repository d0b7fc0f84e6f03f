// ==========================================
// 商品目录导入导出 - 导入层
// ==========================================
// 职责: 工作簿字节流 → 记录 + 动态属性 + 表头顺序
// 支持: Excel (.xlsx)
// ==========================================

// 模块声明
pub mod catalog_importer_impl;
pub mod catalog_importer_trait;
pub mod cell_text;
pub mod column_resolver;
pub mod conflict_handler;
pub mod error;
pub mod file_parser;
pub mod header_deduplicator;
pub mod header_normalizer;
pub mod number_format;
pub mod progress;
pub mod row_parser;
pub mod sheet_styles;

// 重导出核心类型
pub use catalog_importer_impl::CatalogImporterImpl;
pub use cell_text::{CellText, CellTextExtractor, SheetCell};
pub use column_resolver::{BatchSchema, ColumnResolver, ResolvedFields};
pub use conflict_handler::Deduplicator;
pub use error::{ImportError, ImportResult};
pub use file_parser::{SheetGrid, XlsxSheetParser};
pub use header_deduplicator::HeaderDeduplicator;
pub use header_normalizer::HeaderNormalizer;
pub use number_format::NumberFormat;
pub use progress::{CancelFlag, NoProgress, ProgressSink};
pub use row_parser::{RecordDraft, RowOutcome, RowParser};
pub use sheet_styles::CellFormats;

// 重导出 Trait 接口
pub use catalog_importer_trait::{CatalogImporter, SheetParser};
