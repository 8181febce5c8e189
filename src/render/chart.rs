use serde::Serialize;

use crate::normalize::RecommendationResult;
use crate::utils;

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub cost: Vec<Option<f64>>,
    pub co2: Vec<Option<f64>>,
    pub mean_biodegradability: Option<f64>,
    pub mean_recyclability: Option<f64>,
}

impl ChartSeries {
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

pub fn derive_series(results: &[RecommendationResult]) -> ChartSeries {
    ChartSeries {
        labels: results
            .iter()
            .enumerate()
            .map(|(i, r)| {
                r.material
                    .clone()
                    .unwrap_or_else(|| format!("#{}", i + 1))
            })
            .collect(),
        cost: results.iter().map(|r| r.cost).collect(),
        co2: results.iter().map(|r| r.co2).collect(),
        mean_biodegradability: utils::mean(results.iter().filter_map(|r| r.biodegradability)),
        mean_recyclability: utils::mean(results.iter().filter_map(|r| r.recyclability)),
    }
}

pub trait ChartBackend {
    type Chart;

    fn create(&mut self, canvas: &str, series: &ChartSeries) -> Self::Chart;
    fn destroy(&mut self, chart: Self::Chart);
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NoChart;

impl ChartBackend for NoChart {
    type Chart = ();

    fn create(&mut self, _canvas: &str, _series: &ChartSeries) {}

    fn destroy(&mut self, _chart: ()) {}
}

/// Owns at most one chart per canvas.
pub struct ChartSlot<B: ChartBackend> {
    canvas: String,
    backend: B,
    current: Option<B::Chart>,
}

impl<B: ChartBackend> ChartSlot<B> {
    pub fn new(canvas: impl Into<String>, backend: B) -> Self {
        Self {
            canvas: canvas.into(),
            backend,
            current: None,
        }
    }

    pub fn canvas(&self) -> &str {
        &self.canvas
    }

    pub fn current(&self) -> Option<&B::Chart> {
        self.current.as_ref()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn is_live(&self) -> bool {
        self.current.is_some()
    }

    pub fn replace(&mut self, series: &ChartSeries) {
        self.dispose();
        if series.is_empty() {
            return;
        }
        let chart = self.backend.create(&self.canvas, series);
        self.current = Some(chart);
    }

    pub fn dispose(&mut self) {
        if let Some(chart) = self.current.take() {
            self.backend.destroy(chart);
        }
    }
}

impl<B: ChartBackend> Drop for ChartSlot<B> {
    fn drop(&mut self) {
        self.dispose();
    }
}
