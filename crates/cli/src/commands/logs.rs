//! Log tail and stats commands
//!
//! One-shot mode prints a single fetch. Follow and watch modes reuse the
//! library's poller so overlapping log tails are reconciled and late stats
//! responses never overwrite newer ones.

use anyhow::Result;
use colored::Colorize;
use monitor_lib::{
    poller::PollingScheduler,
    reconcile::{LogPush, LogTailReconciler, MetricsWindow},
    StatSample, SubjectId,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tabled::Tabled;

use super::AppContext;
use crate::output::{color_percent, format_percent, print_info, print_json, print_table, OutputFormat};

#[derive(Serialize)]
struct LogChunk<'a> {
    subject: &'a SubjectId,
    text: &'a str,
}

/// Print a container's log tail, optionally following it
pub async fn show_logs(ctx: &AppContext, id: &str, follow: bool, interval_ms: u64) -> Result<()> {
    let subject = SubjectId::new(id);

    if !follow {
        let text = ctx.api.get_subject_log_tail(&subject).await?;
        match ctx.format {
            OutputFormat::Json => print_json(&LogChunk {
                subject: &subject,
                text: &text,
            })?,
            OutputFormat::Table => print!("{}", text),
        }
        return Ok(());
    }

    let scheduler = PollingScheduler::new(ctx.metrics.clone());
    let api = ctx.api.clone();
    let fetch_subject = subject.clone();
    let metrics = ctx.metrics.clone();
    let format = ctx.format;
    let mut reconciler = LogTailReconciler::new();

    let mut handle = scheduler.start(
        "logs",
        Duration::from_millis(interval_ms),
        move || {
            let api = api.clone();
            let subject = fetch_subject.clone();
            async move { api.get_subject_log_tail(&subject).await }
        },
        move |chunk: String| match reconciler.push(&chunk) {
            LogPush::Appended { appended_chars, .. } => {
                metrics.add_log_chars(appended_chars);
                match format {
                    OutputFormat::Json => {
                        if let Ok(line) = serde_json::to_string(&LogChunk {
                            subject: &subject,
                            text: &chunk,
                        }) {
                            println!("{}", line);
                        }
                    }
                    OutputFormat::Table => print!("{}", chunk),
                }
            }
            LogPush::Duplicate => metrics.inc_log_duplicates(),
            LogPush::Empty => {}
        },
    );

    tokio::signal::ctrl_c().await?;
    handle.stop();
    Ok(())
}

/// Row for the stats table
#[derive(Tabled)]
struct SampleRow {
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "CPU")]
    cpu: String,
    #[tabled(rename = "Memory")]
    memory: String,
    #[tabled(rename = "Mem Used (GB)")]
    memory_used: String,
    #[tabled(rename = "Net RX / TX (MB)")]
    network: String,
}

impl SampleRow {
    fn new(label: String, sample: &StatSample) -> Self {
        Self {
            time: label,
            cpu: color_percent(sample.cpu_percent),
            memory: format_percent(sample.memory_percent),
            memory_used: format!("{:.3}", sample.memory_used_gb),
            network: format!("{:.2} / {:.2}", sample.network_rx_mb, sample.network_tx_mb),
        }
    }
}

fn draw_window(subject: &SubjectId, window: &MetricsWindow) {
    // Clear the screen and home the cursor
    print!("\x1B[2J\x1B[H");
    println!("{} {}", "Stats for".bold(), subject.to_string().cyan());
    let rows: Vec<SampleRow> = window
        .iter()
        .map(|p| SampleRow::new(p.label.clone(), &p.sample))
        .collect();
    print_table(&rows);
}

/// Print a container's current stats, optionally watching a rolling window
pub async fn show_stats(ctx: &AppContext, id: &str, watch: bool, interval_ms: u64) -> Result<()> {
    let subject = SubjectId::new(id);

    if !watch {
        let sample = ctx.api.get_subject_stats(&subject).await?;
        match ctx.format {
            OutputFormat::Json => print_json(&sample)?,
            OutputFormat::Table => {
                let label = monitor_lib::reconcile::time_label(sample.timestamp);
                print_table(&[SampleRow::new(label, &sample)]);
            }
        }
        return Ok(());
    }

    let scheduler = PollingScheduler::new(ctx.metrics.clone());
    let api = ctx.api.clone();
    let fetch_subject = subject.clone();
    let format = ctx.format;
    let window = Arc::new(std::sync::Mutex::new(MetricsWindow::new()));
    let apply_window = window.clone();

    let mut handle = scheduler.start(
        "stats",
        Duration::from_millis(interval_ms),
        move || {
            let api = api.clone();
            let subject = fetch_subject.clone();
            async move { api.get_subject_stats(&subject).await }
        },
        move |sample: StatSample| {
            let mut window = apply_window.lock().unwrap_or_else(|e| e.into_inner());
            window.push(sample);
            match format {
                OutputFormat::Json => {
                    if let Some(point) = window.latest() {
                        if let Ok(line) = serde_json::to_string(point) {
                            println!("{}", line);
                        }
                    }
                }
                OutputFormat::Table => draw_window(&subject, &window),
            }
        },
    );

    tokio::signal::ctrl_c().await?;
    handle.stop();

    let window = window.lock().unwrap_or_else(|e| e.into_inner());
    if matches!(format, OutputFormat::Table) && !window.is_empty() {
        let peak = window.cpu_series().into_iter().fold(0.0_f64, f64::max);
        print_info(&format!(
            "{} samples, peak CPU {}",
            window.len(),
            format_percent(peak)
        ));
    }
    Ok(())
}
