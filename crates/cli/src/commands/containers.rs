//! Container and host listing commands

use anyhow::Result;
use colored::Colorize;
use monitor_lib::SubjectStats;
use tabled::Tabled;

use super::AppContext;
use crate::output::{
    color_percent, color_status, format_percent, print_json, print_table, short_id, OutputFormat,
};

/// Row for the containers table
#[derive(Tabled)]
struct ContainerRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "CPU")]
    cpu: String,
    #[tabled(rename = "Memory")]
    memory: String,
    #[tabled(rename = "Net RX / TX (MB)")]
    network: String,
}

impl From<&SubjectStats> for ContainerRow {
    fn from(stats: &SubjectStats) -> Self {
        let (cpu, memory, network) = match &stats.error {
            Some(error) => (error.red().to_string(), "-".to_string(), "-".to_string()),
            None => (
                color_percent(stats.cpu_percent),
                format!(
                    "{:.1} / {:.1} MB ({})",
                    stats.memory_usage_mb,
                    stats.memory_limit_mb,
                    format_percent(stats.memory_percent)
                ),
                format!("{:.2} / {:.2}", stats.rx_mb, stats.tx_mb),
            ),
        };

        Self {
            id: short_id(stats.id.as_str()).to_string(),
            name: stats.display_name().to_string(),
            status: color_status(&stats.status),
            cpu,
            memory,
            network,
        }
    }
}

/// List running containers
pub async fn list_containers(ctx: &AppContext) -> Result<()> {
    let subjects = ctx.api.list_subjects_with_stats().await?;

    match ctx.format {
        OutputFormat::Json => print_json(&subjects)?,
        OutputFormat::Table => {
            let rows: Vec<ContainerRow> = subjects.iter().map(ContainerRow::from).collect();
            print_table(&rows);
            if !rows.is_empty() {
                println!("\nTotal: {} containers", rows.len());
            }
        }
    }

    Ok(())
}

/// Show host-level usage
pub async fn show_host(ctx: &AppContext) -> Result<()> {
    let host = ctx.api.host_stats().await?;

    match ctx.format {
        OutputFormat::Json => print_json(&host)?,
        OutputFormat::Table => {
            println!("{}", "Host".bold());
            println!("{}", "=".repeat(50));
            println!("CPU:                    {}", color_percent(host.cpu_percent));
            println!(
                "Memory:                 {:.2} / {:.2} GB ({})",
                host.memory_used_gb,
                host.memory_total_gb,
                color_percent(host.memory_percent)
            );
            println!(
                "Disk:                   {:.2} / {:.2} GB ({})",
                host.disk_used_gb,
                host.disk_total_gb,
                color_percent(host.disk_percent)
            );
            println!(
                "Network sent / recv:    {} / {} bytes",
                host.net_bytes_sent, host.net_bytes_recv
            );
            println!();
            println!("Sampled at: {}", host.timestamp.dimmed());
        }
    }

    Ok(())
}
