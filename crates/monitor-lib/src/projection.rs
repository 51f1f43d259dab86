//! Views derived from a cost prediction
//!
//! Both views are recomputed from the latest [`PredictionResult`] and never
//! fail: without a prediction the comparison has no costs and the curve is
//! [`AccumulationCurve::NoData`].
//!
//! The accumulation curve is a linear display approximation running from
//! zero to the predicted total. It does not reconstruct per-hour usage.

use crate::models::{PredictionResult, Provider};
use crate::pricing::{projected_cost, PricingTable};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Upper bound on accumulation curve points
pub const MAX_CURVE_POINTS: usize = 24;

/// Projected cost for one catalogue provider
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProviderCost {
    pub provider: Provider,
    /// `None` when there is no prediction to project from
    pub cost: Option<f64>,
}

/// The same usage priced across the whole catalogue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostComparison {
    pub entries: Vec<ProviderCost>,
}

impl CostComparison {
    pub fn has_data(&self) -> bool {
        self.entries.iter().any(|e| e.cost.is_some())
    }

    pub fn cost_for(&self, provider: Provider) -> Option<f64> {
        self.entries
            .iter()
            .find(|e| e.provider == provider)
            .and_then(|e| e.cost)
    }

    /// Provider with the lowest projected cost
    pub fn cheapest(&self) -> Option<ProviderCost> {
        self.entries
            .iter()
            .filter(|e| e.cost.is_some())
            .copied()
            .min_by(|a, b| {
                a.cost
                    .unwrap_or(f64::INFINITY)
                    .total_cmp(&b.cost.unwrap_or(f64::INFINITY))
            })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccumulationPoint {
    /// Hours since the start of the horizon
    pub hour: f64,
    /// `"<rounded hours>h"`
    pub label: String,
    /// Cumulative cost at `hour`
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", content = "points", rename_all = "snake_case")]
pub enum AccumulationCurve {
    /// No prediction has been run yet
    NoData,
    Points(Vec<AccumulationPoint>),
}

impl AccumulationCurve {
    pub fn points(&self) -> &[AccumulationPoint] {
        match self {
            AccumulationCurve::NoData => &[],
            AccumulationCurve::Points(points) => points,
        }
    }
}

/// Derives comparison and accumulation views from predictions
#[derive(Debug, Clone, Default)]
pub struct CostProjectionEngine {
    table: Arc<PricingTable>,
}

impl CostProjectionEngine {
    pub fn new(table: Arc<PricingTable>) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &PricingTable {
        &self.table
    }

    /// Price the prediction's scaled usage with every catalogue provider
    pub fn compare(&self, prediction: Option<&PredictionResult>) -> CostComparison {
        let entries = self
            .table
            .iter()
            .map(|(provider, rate)| ProviderCost {
                provider,
                cost: prediction.map(|p| {
                    projected_cost(
                        rate,
                        p.scaled_cpu_percent,
                        p.scaled_memory_gb,
                        p.duration_hours,
                    )
                }),
            })
            .collect();

        CostComparison { entries }
    }

    /// Linear accumulation of the predicted total over `hours`
    pub fn accumulate(&self, prediction: Option<&PredictionResult>, hours: f64) -> AccumulationCurve {
        match prediction {
            None => AccumulationCurve::NoData,
            Some(p) => AccumulationCurve::Points(accumulation_points(p.total_cost, hours)),
        }
    }
}

/// Number of points used for a horizon of `hours`
pub fn point_count(hours: f64) -> usize {
    if !hours.is_finite() || hours <= 0.0 {
        return 0;
    }
    let step = (hours / MAX_CURVE_POINTS as f64).max(1.0);
    ((hours / step).ceil() as usize).min(MAX_CURVE_POINTS)
}

fn accumulation_points(total_cost: f64, hours: f64) -> Vec<AccumulationPoint> {
    let points = point_count(hours);

    (1..=points)
        .map(|i| {
            let fraction = i as f64 / points as f64;
            let hour = i as f64 * hours / points as f64;
            AccumulationPoint {
                hour,
                label: format!("{}h", hour.round() as i64),
                value: fraction * total_cost,
            }
        })
        .collect()
}
