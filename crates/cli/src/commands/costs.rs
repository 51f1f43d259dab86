//! Cost prediction commands

use anyhow::Result;
use colored::Colorize;
use monitor_lib::{
    projection::{AccumulationPoint, CostComparison},
    AccumulationCurve, PredictionResult, SubjectId,
};
use serde::Serialize;
use tabled::Tabled;

use super::AppContext;
use crate::output::{format_currency, format_percent, print_json, print_table, print_warning, OutputFormat};
use crate::PricingArgs;

/// Row for the provider comparison table
#[derive(Tabled)]
struct ProviderRow {
    #[tabled(rename = "Provider")]
    provider: String,
    #[tabled(rename = "Cost")]
    cost: String,
}

/// Row for the accumulation table
#[derive(Tabled)]
struct AccumulationRow {
    #[tabled(rename = "Hour")]
    label: String,
    #[tabled(rename = "Cumulative Cost")]
    value: String,
}

#[derive(Serialize)]
struct PredictionView<'a> {
    subject: &'a SubjectId,
    prediction: &'a PredictionResult,
    comparison: &'a CostComparison,
    projection: &'a AccumulationCurve,
}

fn comparison_rows(comparison: &CostComparison, currency: &str) -> Vec<ProviderRow> {
    let cheapest = comparison.cheapest().map(|c| c.provider);
    comparison
        .entries
        .iter()
        .map(|entry| {
            let cost = match entry.cost {
                Some(cost) => format_currency(cost, currency),
                None => "-".to_string(),
            };
            let is_cheapest = Some(entry.provider) == cheapest;
            ProviderRow {
                provider: if is_cheapest {
                    format!("{} (cheapest)", entry.provider).green().to_string()
                } else {
                    entry.provider.to_string()
                },
                cost,
            }
        })
        .collect()
}

fn accumulation_rows(points: &[AccumulationPoint], currency: &str) -> Vec<AccumulationRow> {
    points
        .iter()
        .map(|p| AccumulationRow {
            label: p.label.clone(),
            value: format_currency(p.value, currency),
        })
        .collect()
}

/// Predict cost for a container and show it against every provider
pub async fn predict(ctx: &AppContext, id: &str, selection: &PricingArgs) -> Result<()> {
    let mut workbench = ctx.workbench(id, Some(selection))?;
    let prediction = workbench.run_prediction().await?;
    let comparison = workbench.comparison();
    let projection = workbench.projection();

    match ctx.format {
        OutputFormat::Json => {
            let subject = SubjectId::new(id);
            print_json(&PredictionView {
                subject: &subject,
                prediction: &prediction,
                comparison: &comparison,
                projection: &projection,
            })?;
        }
        OutputFormat::Table => {
            let currency = prediction.currency.as_str();

            println!("{}", "Cost Prediction".bold());
            println!("{}", "=".repeat(50));
            println!("Container:              {}", id.cyan());
            println!("Provider:               {}", prediction.provider);
            println!("Workload intensity:     {}", prediction.workload_intensity);
            println!("Horizon:                {} h", prediction.duration_hours);
            println!();

            println!("{}", "Scaled Usage".bold());
            println!("{}", "-".repeat(50));
            println!(
                "CPU:                    {}",
                format_percent(prediction.scaled_cpu_percent)
            );
            println!("Memory:                 {:.4} GB", prediction.scaled_memory_gb);
            println!();

            println!("{}", "Cost".bold());
            println!("{}", "-".repeat(50));
            println!(
                "CPU:                    {}",
                format_currency(prediction.cpu_cost, currency)
            );
            println!(
                "Memory:                 {}",
                format_currency(prediction.memory_cost, currency)
            );
            println!(
                "{}                  {}",
                "Total:".bold(),
                format_currency(prediction.total_cost, currency).green().bold()
            );
            println!();

            println!("{}", "Provider Comparison".bold());
            println!("{}", "-".repeat(50));
            print_table(&comparison_rows(&comparison, currency));
            println!();

            println!("{}", "Cost Accumulation".bold());
            println!("{}", "-".repeat(50));
            match &projection {
                AccumulationCurve::Points(points) if !points.is_empty() => {
                    print_table(&accumulation_rows(points, currency));
                }
                _ => print_warning("No accumulation data for this horizon"),
            }

            println!();
            println!(
                "Based on benchmark from: {}",
                prediction.from_benchmark_timestamp.dimmed()
            );
        }
    }

    Ok(())
}
