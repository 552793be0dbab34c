//! Plots and the HTML report of a cross-validation run.
//!
//! Plots are small helper functions converting numerical results into
//! `plotly::Plot`; `html` assembles them with summary tables into a single
//! page.
pub mod html;
pub mod plots;

pub use html::{build_report, render_report, Report, ReportSection};
