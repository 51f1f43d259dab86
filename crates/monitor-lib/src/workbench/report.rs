//! HTML export of a container report

use crate::models::ReportData;
use std::fmt::Write;

/// CPU share of a report's cost, from the reported average CPU percentage
pub fn report_cpu_cost(report: &ReportData) -> f64 {
    report.pricing_used.cpu_hour * report.duration_hours * (report.avg_cpu_percent / 100.0)
}

/// Memory share of a report's cost
pub fn report_memory_cost(report: &ReportData) -> f64 {
    report.pricing_used.gb_memory_hour * report.duration_hours * report.avg_memory_gb
}

/// File name a report is saved under: `<container_name>_report.html`
pub fn report_file_name(report: &ReportData) -> String {
    let name: String = report
        .container_name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    let name = name.trim_matches('.');
    if name.is_empty() {
        format!("{}_report.html", report.container_id)
    } else {
        format!("{}_report.html", name)
    }
}

/// Render a standalone HTML document for a report
pub fn render_report_html(report: &ReportData) -> String {
    let mut html = String::with_capacity(2048);

    // Writing to a String cannot fail
    let _ = write!(
        html,
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Container Report: {name}</title>
</head>
<body style="background: #020617; margin: 0; padding: 2rem;">
<div style="font-family: monospace; background: #0f172a; color: #e6eef8; padding: 1rem; border-radius: 12px; max-width: 480px;">
  <h2 style="color: #38bdf8; margin: 0;">Container Report</h2>
  <p style="font-size: 0.9rem; color: #94a3b8;">Generated on {timestamp}</p>
  <hr style="border-color: #123148;">
  <p><b>Container:</b> {name}</p>
  <p><b>Cloud:</b> {provider}</p>
  <p><b>Duration:</b> {hours}h</p>
  <ul style="list-style: none; padding: 0;">
    <li>Avg CPU Usage: {cpu}%</li>
    <li>Avg Memory Usage: {mem} GB</li>
    <li>Avg Disk I/O: {disk} MB/s</li>
    <li>Avg Net I/O: {net} MB/s</li>
  </ul>
  <hr style="border-color: #123148;">
  <h3 style="color: #38bdf8;">Predicted Cost</h3>
  <p style="margin: 0;">CPU: ${cpu_cost:.4}</p>
  <p style="margin: 0;">Memory: ${mem_cost:.4}</p>
  <p style="font-weight: bold;">Total: ${total}</p>
  <hr style="border-color: #123148;">
  <p style="font-size: 0.8rem; color: #94a3b8; text-align: center;">Built with <b>MicroMonitor</b></p>
</div>
</body>
</html>
"#,
        name = escape_html(&report.container_name),
        timestamp = escape_html(&report.timestamp),
        provider = report.provider,
        hours = report.duration_hours,
        cpu = report.avg_cpu_percent,
        mem = report.avg_memory_gb,
        disk = report.avg_disk_io_mb_s,
        net = report.avg_net_io_mb_s,
        cpu_cost = report_cpu_cost(report),
        mem_cost = report_memory_cost(report),
        total = report.predicted_cost,
    );

    html
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Provider, ProviderRate, SubjectId};

    fn report(name: &str) -> ReportData {
        ReportData {
            timestamp: "2025-01-15 10:45:00 UTC".to_string(),
            container_id: SubjectId::new("3f2a9c1b7d4e"),
            container_name: name.to_string(),
            provider: Provider::Azure,
            duration_hours: 168.0,
            avg_cpu_percent: 30.0,
            avg_memory_gb: 0.75,
            avg_disk_io_mb_s: 0.12,
            avg_net_io_mb_s: 0.03,
            predicted_cost: 111.636,
            pricing_used: ProviderRate {
                cpu_hour: 0.022,
                gb_memory_hour: 0.006,
            },
        }
    }

    #[test]
    fn test_cost_split() {
        let r = report("web");
        assert!((report_cpu_cost(&r) - 1.1088).abs() < 1e-9);
        assert!((report_memory_cost(&r) - 0.756).abs() < 1e-9);
    }

    #[test]
    fn test_render_contains_report_fields() {
        let html = render_report_html(&report("web"));

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<b>Container:</b> web"));
        assert!(html.contains("<b>Cloud:</b> Azure"));
        assert!(html.contains("<b>Duration:</b> 168h"));
        assert!(html.contains("Avg CPU Usage: 30%"));
        assert!(html.contains("CPU: $1.1088"));
        assert!(html.contains("Memory: $0.7560"));
        assert!(html.contains("Total: $111.636"));
        assert!(html.contains("Built with <b>MicroMonitor</b>"));
    }

    #[test]
    fn test_render_escapes_container_name() {
        let html = render_report_html(&report("<script>alert(1)</script>"));
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_report_file_name() {
        assert_eq!(report_file_name(&report("web")), "web_report.html");
        assert_eq!(report_file_name(&report("team/api")), "team_api_report.html");
        assert_eq!(report_file_name(&report("")), "3f2a9c1b7d4e_report.html");
    }
}
