//! HTML report export

use anyhow::{Context, Result};
use monitor_lib::{
    workbench::{render_report_html, report_cpu_cost, report_file_name, report_memory_cost},
    ReportData,
};
use serde::Serialize;
use std::path::{Path, PathBuf};

use super::AppContext;
use crate::output::{format_currency, print_json, print_success, OutputFormat};
use crate::PricingArgs;

#[derive(Serialize)]
struct ExportView<'a> {
    path: &'a Path,
    cpu_cost: f64,
    memory_cost: f64,
    report: &'a ReportData,
}

/// Where the report is written: an explicit file, or the default name inside a directory
fn resolve_output(output: Option<PathBuf>, report: &ReportData) -> PathBuf {
    match output {
        Some(path) if path.is_dir() => path.join(report_file_name(report)),
        Some(path) => path,
        None => PathBuf::from(report_file_name(report)),
    }
}

/// Generate a report for a container and save it as HTML
pub async fn export_report(
    ctx: &AppContext,
    id: &str,
    selection: &PricingArgs,
    output: Option<PathBuf>,
) -> Result<()> {
    let workbench = ctx.workbench(id, Some(selection))?;
    let report = workbench.generate_report().await?;

    let path = resolve_output(output, &report);
    std::fs::write(&path, render_report_html(&report))
        .with_context(|| format!("Failed to write report to {}", path.display()))?;

    match ctx.format {
        OutputFormat::Json => print_json(&ExportView {
            path: &path,
            cpu_cost: report_cpu_cost(&report),
            memory_cost: report_memory_cost(&report),
            report: &report,
        })?,
        OutputFormat::Table => {
            print_success(&format!(
                "Report for {} saved to {} (total {})",
                report.container_name,
                path.display(),
                format_currency(report.predicted_cost, "USD")
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use monitor_lib::{Provider, ProviderRate, SubjectId};

    fn report() -> ReportData {
        ReportData {
            timestamp: "2025-01-15T10:30:00".to_string(),
            container_id: SubjectId::new("abc123"),
            container_name: "web".to_string(),
            provider: Provider::Aws,
            duration_hours: 24.0,
            avg_cpu_percent: 50.0,
            avg_memory_gb: 1.0,
            avg_disk_io_mb_s: 0.1,
            avg_net_io_mb_s: 0.2,
            predicted_cost: 0.6,
            pricing_used: ProviderRate {
                cpu_hour: 0.0416,
                gb_memory_hour: 0.0045,
            },
        }
    }

    #[test]
    fn test_output_defaults_to_report_name() {
        assert_eq!(resolve_output(None, &report()), PathBuf::from("web_report.html"));
    }

    #[test]
    fn test_output_directory_gets_report_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = resolve_output(Some(dir.path().to_path_buf()), &report());
        assert_eq!(path, dir.path().join("web_report.html"));
    }

    #[test]
    fn test_output_file_used_as_is() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("custom.html");
        assert_eq!(resolve_output(Some(file.clone()), &report()), file);
    }
}
