//! Benchmark commands

use anyhow::Result;
use colored::Colorize;
use monitor_lib::BenchmarkSnapshot;

use super::AppContext;
use crate::output::{format_percent, print_info, print_json, print_success, print_warning, OutputFormat};

fn print_benchmark(snapshot: &BenchmarkSnapshot) {
    println!("{}", "Benchmark".bold());
    println!("{}", "=".repeat(50));
    if let Some(id) = &snapshot.container_id {
        println!("Container:              {}", id.to_string().cyan());
    }
    if let Some(duration) = snapshot.duration {
        println!("Duration:               {}s", duration);
    }
    println!("Avg CPU:                {}", format_percent(snapshot.avg_cpu_percent));
    println!("Avg memory:             {:.4} GB", snapshot.avg_memory_gb);
    println!("Avg disk I/O:           {:.4} MB/s", snapshot.avg_disk_io_mb_s);
    println!("Avg network I/O:        {:.4} MB/s", snapshot.avg_net_io_mb_s);
    println!();
    println!("Recorded at: {}", snapshot.timestamp.dimmed());
}

/// Run a benchmark and print its averages
pub async fn run_benchmark(ctx: &AppContext, id: &str, duration: u64) -> Result<()> {
    let mut workbench = ctx.workbench(id, None)?;

    if matches!(ctx.format, OutputFormat::Table) {
        print_info(&format!("Benchmarking {} for {}s...", id, duration));
    }
    let snapshot = workbench.run_benchmark(duration).await?;

    match ctx.format {
        OutputFormat::Json => print_json(&snapshot)?,
        OutputFormat::Table => {
            print_success("Benchmark complete");
            println!();
            print_benchmark(&snapshot);
        }
    }

    Ok(())
}

/// Show the stored benchmark, if any
pub async fn show_last_benchmark(ctx: &AppContext, id: &str) -> Result<()> {
    let mut workbench = ctx.workbench(id, None)?;
    let snapshot = workbench.last_benchmark().await?;

    match (ctx.format, snapshot) {
        (OutputFormat::Json, snapshot) => print_json(&snapshot)?,
        (OutputFormat::Table, Some(snapshot)) => print_benchmark(&snapshot),
        (OutputFormat::Table, None) => {
            print_warning(&format!(
                "No benchmark recorded for {}; run `mm benchmark run {}` first",
                id, id
            ));
        }
    }

    Ok(())
}
