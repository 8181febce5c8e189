pub mod chart;
pub mod terminal;

use serde::Serialize;
use tracing::debug;

use crate::mapping::DisplayOptions;
use crate::normalize::{RecommendationResponse, RecommendationResult};
use crate::utils;

use self::chart::{derive_series, ChartBackend, ChartSlot, NoChart};

pub const DEFAULT_EMPTY_MESSAGE: &str = "No materials found matching your requirements.";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RankTier {
    Gold,
    Silver,
    Bronze,
    Standard,
}

impl RankTier {
    pub fn for_index(index: usize) -> Self {
        match index {
            0 => RankTier::Gold,
            1 => RankTier::Silver,
            2 => RankTier::Bronze,
            _ => RankTier::Standard,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RowView {
    pub rank: usize,
    pub tier: RankTier,
    pub material: Option<String>,
    pub description: Option<String>,
    pub score: Option<String>,
    pub cost: Option<String>,
    pub co2: Option<String>,
    pub origin: Option<String>,
    pub weight_capacity: Option<String>,
}

pub fn view(result: &RecommendationResult, index: usize, display: &DisplayOptions) -> RowView {
    RowView {
        rank: index + 1,
        tier: RankTier::for_index(index),
        material: result.material.clone(),
        description: result.description.clone(),
        score: result
            .score
            .map(|s| format!("{}/100", utils::format_fixed(s, display.score_decimals))),
        cost: result.cost.map(|c| {
            format!(
                "{}{}{}",
                display.currency,
                utils::format_fixed(c, display.cost_decimals),
                display.cost_suffix.as_deref().unwrap_or("")
            )
        }),
        co2: result.co2.map(|c| {
            format!(
                "{} {}",
                utils::format_fixed(c, display.co2_decimals),
                display.co2_unit
            )
        }),
        origin: result
            .origin
            .clone()
            .or_else(|| display.origin_fallback.clone()),
        weight_capacity: result
            .weight_capacity
            .map(|w| format!("{} kg", utils::format_fixed(w, display.capacity_decimals))),
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ResultsView {
    pub rows: Vec<RowView>,
    pub count: u64,
    pub insight: Option<String>,
}

pub fn results_view(response: &RecommendationResponse, display: &DisplayOptions) -> ResultsView {
    ResultsView {
        rows: response
            .recommendations
            .iter()
            .enumerate()
            .map(|(i, r)| view(r, i, display))
            .collect(),
        count: response.display_count(),
        insight: response.insight.clone(),
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Warning,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
    pub retryable: bool,
}

pub trait Surface {
    fn set_busy(&mut self, busy: bool);
    fn set_submit_enabled(&mut self, enabled: bool);
    fn clear_results(&mut self);
    fn show_results(&mut self, view: &ResultsView);
    fn show_empty(&mut self, message: &str);
    fn notify(&mut self, notice: &Notice);
    fn reset_form(&mut self);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubmitToken(u64);

impl SubmitToken {
    pub fn value(self) -> u64 {
        self.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StateKind {
    Idle,
    Loading,
    Results,
    Empty,
    Error,
}

#[derive(Clone, Debug, PartialEq)]
pub enum RenderState {
    Idle,
    Loading { token: SubmitToken },
    Results(ResultsView),
    Empty { message: String },
    Error(Notice),
}

impl RenderState {
    pub fn kind(&self) -> StateKind {
        match self {
            RenderState::Idle => StateKind::Idle,
            RenderState::Loading { .. } => StateKind::Loading,
            RenderState::Results(_) => StateKind::Results,
            RenderState::Empty { .. } => StateKind::Empty,
            RenderState::Error(_) => StateKind::Error,
        }
    }
}

#[derive(Clone, Debug)]
pub enum Outcome {
    Response(RecommendationResponse),
    Failed { message: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Settled {
    Applied(StateKind),
    /// The token belongs to a superseded submit; nothing was touched.
    Stale,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SubmitRejected {
    #[error("a request is already in flight")]
    InFlight,
}

pub struct Renderer<S: Surface, B: ChartBackend = NoChart> {
    surface: S,
    chart: Option<ChartSlot<B>>,
    display: DisplayOptions,
    state: RenderState,
    next_token: u64,
}

impl<S: Surface> Renderer<S, NoChart> {
    pub fn new(surface: S, display: DisplayOptions) -> Self {
        Self {
            surface,
            chart: None,
            display,
            state: RenderState::Idle,
            next_token: 0,
        }
    }
}

impl<S: Surface, B: ChartBackend> Renderer<S, B> {
    pub fn with_chart(surface: S, display: DisplayOptions, backend: B) -> Self {
        let chart = ChartSlot::new(display.chart_canvas.clone(), backend);
        Self {
            surface,
            chart: Some(chart),
            display,
            state: RenderState::Idle,
            next_token: 0,
        }
    }

    pub fn state(&self) -> &RenderState {
        &self.state
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn chart(&self) -> Option<&ChartSlot<B>> {
        self.chart.as_ref()
    }

    pub fn display(&self) -> &DisplayOptions {
        &self.display
    }

    fn in_flight(&self) -> Option<SubmitToken> {
        match self.state {
            RenderState::Loading { token } => Some(token),
            _ => None,
        }
    }

    /// Idle/settled → Loading. Refused while another request is in flight,
    /// the same way a disabled submit button swallows clicks.
    pub fn begin_submit(&mut self) -> Result<SubmitToken, SubmitRejected> {
        if self.in_flight().is_some() {
            return Err(SubmitRejected::InFlight);
        }
        self.next_token += 1;
        let token = SubmitToken(self.next_token);
        self.surface.set_submit_enabled(false);
        self.surface.set_busy(true);
        self.state = RenderState::Loading { token };
        Ok(token)
    }

    pub fn settle(&mut self, token: SubmitToken, outcome: Outcome) -> Settled {
        if self.in_flight() != Some(token) {
            debug!(token = token.value(), "dropping response from superseded submit");
            return Settled::Stale;
        }
        self.surface.set_busy(false);
        self.surface.set_submit_enabled(true);

        self.state = match outcome {
            Outcome::Response(response) if response.is_empty() => {
                self.surface.clear_results();
                if let Some(chart) = self.chart.as_mut() {
                    chart.dispose();
                }
                let message = response
                    .message
                    .clone()
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_EMPTY_MESSAGE.to_string());
                self.surface.show_empty(&message);
                RenderState::Empty { message }
            }
            Outcome::Response(response) => {
                let view = results_view(&response, &self.display);
                self.surface.clear_results();
                self.surface.show_results(&view);
                if let Some(chart) = self.chart.as_mut() {
                    chart.replace(&derive_series(&response.recommendations));
                }
                RenderState::Results(view)
            }
            Outcome::Failed { message } => {
                let notice = Notice {
                    kind: NoticeKind::Error,
                    message,
                    retryable: true,
                };
                self.surface.notify(&notice);
                RenderState::Error(notice)
            }
        };
        Settled::Applied(self.state.kind())
    }

    /// Any state → Idle. Forgets an in-flight token so a late answer is
    /// dropped.
    pub fn reset(&mut self) {
        self.surface.set_busy(false);
        self.surface.set_submit_enabled(true);
        self.surface.reset_form();
        self.surface.clear_results();
        if let Some(chart) = self.chart.as_mut() {
            chart.dispose();
        }
        self.state = RenderState::Idle;
    }

    pub fn into_parts(self) -> (S, Option<ChartSlot<B>>) {
        (self.surface, self.chart)
    }
}
