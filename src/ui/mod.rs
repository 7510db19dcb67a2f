//! UI rendering module
//!
//! Terminal charts for the enhanced search, drawn with ratatui.

pub mod report_view;

pub use report_view::render as render_report;
pub use report_view::show as show_report;
pub use report_view::restore_terminal;
