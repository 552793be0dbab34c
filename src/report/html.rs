//! Standalone HTML report of a cross-validation run.
use std::path::Path;

use anyhow::{Context, Result};
use maud::{html, Markup, PreEscaped, DOCTYPE};
use plotly::Plot;

use crate::report::plots::{plot_fold_metrics, plot_probability_histogram, plot_roc_curve};
use crate::validator::CrossValidationReport;

const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.12.1.min.js";

fn fmt_opt(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{:.4}", v))
}

/// A titled block of HTML content and plots.
pub struct ReportSection {
    title: String,
    content: Vec<Markup>,
}

impl ReportSection {
    pub fn new(title: &str) -> Self {
        ReportSection {
            title: title.to_string(),
            content: Vec::new(),
        }
    }

    pub fn add_content(&mut self, content: Markup) {
        self.content.push(content);
    }

    pub fn add_plot(&mut self, plot: Plot) {
        let div_id = format!(
            "plot-{}-{}",
            self.title.to_lowercase().replace(' ', "-"),
            self.content.len()
        );
        self.content
            .push(PreEscaped(plot.to_inline_html(Some(div_id.as_str()))));
    }
}

pub struct Report {
    title: String,
    generated: String,
    sections: Vec<ReportSection>,
}

impl Report {
    pub fn new(title: &str) -> Self {
        Report {
            title: title.to_string(),
            generated: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            sections: Vec::new(),
        }
    }

    pub fn add_section(&mut self, section: ReportSection) {
        self.sections.push(section);
    }

    pub fn render(&self) -> Markup {
        html! {
            (DOCTYPE)
            html {
                head {
                    meta charset="utf-8";
                    title { (self.title) }
                    script src=(PLOTLY_CDN) {}
                    style {
                        "body { font-family: sans-serif; margin: 2em; }
                        table { border-collapse: collapse; margin-bottom: 1em; }
                        th, td { border: 1px solid #ccc; padding: 4px 8px; text-align: right; }
                        th { background-color: #f5f5f5; }"
                    }
                }
                body {
                    h1 { (self.title) }
                    p { "Generated " (self.generated) " by fold-validator " (env!("CARGO_PKG_VERSION")) }
                    @for part in &self.sections {
                        section {
                            h2 { (part.title) }
                            @for block in &part.content {
                                (block)
                            }
                        }
                    }
                }
            }
        }
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(&path, self.render().into_string())
            .with_context(|| format!("Failed to write report to {}", path.as_ref().display()))
    }
}

fn summary_section(report: &CrossValidationReport) -> ReportSection {
    let mut section = ReportSection::new("Summary");
    section.add_content(html! {
        p {
            (report.n_rows) " rows, " (report.feature_names.len()) " predictors, "
            (report.n_folds()) " folds (sizes " (format!("{:?}", report.fold_sizes)) "), "
            (report.folds.len()) " succeeded, " (report.failures.len()) " failed."
        }
    });

    if let Some(summary) = &report.summary {
        section.add_content(html! {
            table {
                tr { th { "Metric" } th { "Mean" } th { "Std" } th { "Pooled" } }
                tr {
                    td { "Accuracy" }
                    td { (format!("{:.4}", summary.mean_accuracy)) }
                    td { (format!("{:.4}", summary.std_accuracy)) }
                    td { (format!("{:.4}", summary.pooled.accuracy)) }
                }
                tr {
                    td { "Log-loss" }
                    td { (format!("{:.4}", summary.mean_log_loss)) }
                    td { (format!("{:.4}", summary.std_log_loss)) }
                    td { (format!("{:.4}", summary.pooled.log_loss)) }
                }
                tr {
                    td { "ROC AUC" }
                    td { (fmt_opt(summary.mean_roc_auc)) }
                    td { "" }
                    td { (fmt_opt(summary.pooled.roc_auc)) }
                }
                tr {
                    td { "Brier score" }
                    td { "" }
                    td { "" }
                    td { (format!("{:.4}", summary.pooled.brier_score)) }
                }
            }
        });
    }

    if !report.failures.is_empty() {
        section.add_content(html! {
            h3 { "Failed folds" }
            ul {
                @for failure in &report.failures {
                    li { "Fold " (failure.fold) ": " (failure.message) }
                }
            }
        });
    }
    section
}

fn folds_section(report: &CrossValidationReport) -> ReportSection {
    let mut section = ReportSection::new("Folds");
    section.add_content(html! {
        table {
            tr {
                th { "Fold" } th { "Train" } th { "Test" } th { "Accuracy" } th { "Log-loss" }
                th { "AUC" } th { "Precision" } th { "Recall" } th { "F1" } th { "Iterations" }
            }
            @for result in &report.folds {
                tr {
                    td { (result.fold) }
                    td { (result.n_train) }
                    td { (result.n_test) }
                    td { (format!("{:.4}", result.metrics.accuracy)) }
                    td { (format!("{:.4}", result.metrics.log_loss)) }
                    td { (fmt_opt(result.metrics.roc_auc)) }
                    td { (fmt_opt(result.metrics.precision)) }
                    td { (fmt_opt(result.metrics.recall)) }
                    td { (fmt_opt(result.metrics.f1)) }
                    td { (result.fit.as_ref().map_or_else(String::new, |f| f.iterations.to_string())) }
                }
            }
        }
    });
    section.add_plot(plot_fold_metrics(report, "Per-fold metrics"));
    section
}

fn coefficients_section(report: &CrossValidationReport) -> Option<ReportSection> {
    let fits: Vec<_> = report
        .folds
        .iter()
        .filter_map(|r| r.fit.as_ref().map(|fit| (r.fold, fit)))
        .collect();
    let (_, first) = fits.first()?;

    let mut section = ReportSection::new("Coefficients");
    section.add_content(html! {
        table {
            tr {
                th { "Fold" }
                @for row in &first.coefficient_table { th { (row.name) } }
            }
            @for (fold, fit) in &fits {
                tr {
                    td { (fold) }
                    @for row in &fit.coefficient_table {
                        td {
                            (format!("{:.4}", row.estimate))
                            @if let Some(p) = row.p_value {
                                " (p=" (format!("{:.3}", p)) ")"
                            }
                        }
                    }
                }
            }
        }
    });
    Some(section)
}

/// Build the HTML report of a finished run.
///
/// `labels` are the dataset targets aligned with `report.out_of_fold`.
pub fn build_report(report: &CrossValidationReport, labels: &ndarray::Array1<f64>, title: &str) -> Report {
    let mut html_report = Report::new(title);
    html_report.add_section(summary_section(report));
    html_report.add_section(folds_section(report));
    if let Some(section) = coefficients_section(report) {
        html_report.add_section(section);
    }

    let mut predictions = ReportSection::new("Out-of-fold predictions");
    match plot_probability_histogram(&report.out_of_fold, labels, "Held-out probability by class") {
        Ok(plot) => predictions.add_plot(plot),
        Err(e) => log::warn!("Skipping probability histogram: {}", e),
    }
    let auc = report.summary.as_ref().and_then(|s| s.pooled.roc_auc);
    match plot_roc_curve(&report.out_of_fold, labels, auc, "ROC curve") {
        Ok(plot) => predictions.add_plot(plot),
        Err(e) => log::warn!("Skipping ROC curve: {}", e),
    }
    html_report.add_section(predictions);

    html_report
}

/// Render the report and write it to `path`.
pub fn render_report<P: AsRef<Path>>(
    report: &CrossValidationReport,
    labels: &ndarray::Array1<f64>,
    path: P,
) -> Result<()> {
    build_report(report, labels, "Cross-validation report").save_to_file(&path)?;
    log::info!("HTML report written to {}", path.as_ref().display());
    Ok(())
}
