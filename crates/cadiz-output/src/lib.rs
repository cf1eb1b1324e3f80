#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/cadiz/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod export;
pub mod table;

pub use export::{
    ExportError, ExportFormat, Exporter, ReturnRow, ReturnsExport, SummaryExport, SummaryRow,
    WeightHistoryExport, WeightRow, export_report,
};
pub use table::{AllocationRow, allocation_table, summary_table};
