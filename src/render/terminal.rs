use std::time::Duration;

use colored::{ColoredString, Colorize};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use super::chart::{ChartBackend, ChartSeries};
use super::{Notice, NoticeKind, RankTier, ResultsView, RowView, Surface};

const BAR_WIDTH: usize = 30;

fn tag(kind: NoticeKind) -> ColoredString {
    match kind {
        NoticeKind::Info => "INF".bold().blue(),
        NoticeKind::Warning => "WRN".bold().yellow(),
        NoticeKind::Error => "ERR".bold().red(),
    }
}

fn status_line(kind: NoticeKind, message: &str) -> String {
    format!(
        "{}{}{} {}",
        "[".bold().white(),
        tag(kind),
        "]".bold().white(),
        message
    )
}

fn rank_badge(row: &RowView) -> ColoredString {
    let badge = badge_text(row);
    match row.tier {
        RankTier::Gold => badge.bold().truecolor(255, 193, 7),
        RankTier::Silver => badge.bold().truecolor(192, 192, 192),
        RankTier::Bronze => badge.bold().truecolor(205, 127, 50),
        RankTier::Standard => badge.normal(),
    }
}

fn cell(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("-")
}

struct Table {
    badge_width: usize,
    header: String,
    cells: Vec<String>,
}

fn badge_text(row: &RowView) -> String {
    format!("#{}", row.rank)
}

fn pad(s: &str, width: usize) -> String {
    format!("{}{}", s, " ".repeat(width.saturating_sub(s.chars().count())))
}

fn layout(rows: &[RowView]) -> Table {
    let headers = ["Material", "Score", "Cost", "CO₂", "Origin", "Capacity"];
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    let table: Vec<[&str; 6]> = rows
        .iter()
        .map(|r| {
            [
                cell(&r.material),
                cell(&r.score),
                cell(&r.cost),
                cell(&r.co2),
                cell(&r.origin),
                cell(&r.weight_capacity),
            ]
        })
        .collect();
    for cols in table.iter() {
        for (i, c) in cols.iter().enumerate() {
            widths[i] = widths[i].max(c.chars().count());
        }
    }
    let join = |cols: &[&str]| {
        cols.iter()
            .zip(widths.iter())
            .map(|(c, w)| pad(c, *w))
            .collect::<Vec<_>>()
            .join("  ")
    };
    let badge_width = rows
        .iter()
        .map(|r| badge_text(r).chars().count())
        .max()
        .unwrap_or(0)
        .max(4)
        + 1;
    Table {
        badge_width,
        header: join(&headers[..]),
        cells: table.iter().map(|cols| join(&cols[..])).collect(),
    }
}

pub fn format_rows(rows: &[RowView]) -> Vec<String> {
    let table = layout(rows);
    let mut out = Vec::with_capacity(rows.len() + 1);
    out.push(format!("{}{}", " ".repeat(table.badge_width), table.header));
    for (row, cells) in rows.iter().zip(table.cells.iter()) {
        out.push(format!("{}{}", pad(&badge_text(row), table.badge_width), cells));
    }
    out
}

pub struct TerminalSurface {
    spinner: Option<ProgressBar>,
    show_spinner: bool,
    submit_enabled: bool,
}

impl TerminalSurface {
    pub fn new(show_spinner: bool) -> Self {
        Self {
            spinner: None,
            show_spinner,
            submit_enabled: true,
        }
    }

    pub fn submit_enabled(&self) -> bool {
        self.submit_enabled
    }

    fn stop_spinner(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
    }
}

impl Surface for TerminalSurface {
    fn set_busy(&mut self, busy: bool) {
        self.stop_spinner();
        if busy && self.show_spinner {
            let spinner = ProgressBar::new_spinner();
            spinner.set_draw_target(ProgressDrawTarget::stderr());
            if let Ok(style) = ProgressStyle::with_template("{spinner:.green} {msg}") {
                spinner.set_style(style);
            }
            spinner.set_message("Analyzing...");
            spinner.enable_steady_tick(Duration::from_millis(100));
            self.spinner = Some(spinner);
        }
    }

    fn set_submit_enabled(&mut self, enabled: bool) {
        self.submit_enabled = enabled;
    }

    fn clear_results(&mut self) {}

    fn show_results(&mut self, view: &ResultsView) {
        println!(
            ":: {:<10}: {}",
            "Results",
            view.count.to_string().bold()
        );
        println!();
        let table = layout(&view.rows);
        let indent = " ".repeat(table.badge_width);
        println!("{}{}", indent, table.header.bold());
        for (row, cells) in view.rows.iter().zip(table.cells.iter()) {
            let gap = table.badge_width - badge_text(row).chars().count();
            println!("{}{}{}", rank_badge(row), " ".repeat(gap), cells);
            if let Some(desc) = row.description.as_deref() {
                println!("{}{}", indent, desc.dimmed());
            }
        }
        if let Some(insight) = view.insight.as_deref() {
            println!();
            println!("{}", status_line(NoticeKind::Info, insight));
        }
    }

    fn show_empty(&mut self, message: &str) {
        println!("{}", status_line(NoticeKind::Info, message));
    }

    fn notify(&mut self, notice: &Notice) {
        self.stop_spinner();
        let mut message = notice.message.clone();
        if notice.retryable {
            message.push_str(" (the form was kept, submit again to retry)");
        }
        eprintln!("{}", status_line(notice.kind, &message));
    }

    fn reset_form(&mut self) {
        self.stop_spinner();
    }
}

impl Drop for TerminalSurface {
    fn drop(&mut self) {
        self.stop_spinner();
    }
}

fn bar(value: f64, max: f64) -> String {
    if max <= 0.0 || !value.is_finite() {
        return String::new();
    }
    let filled = ((value / max) * BAR_WIDTH as f64).round() as usize;
    "█".repeat(filled.min(BAR_WIDTH))
}

pub fn bar_lines(title: &str, labels: &[String], values: &[Option<f64>]) -> Vec<String> {
    let max = values.iter().flatten().cloned().fold(0.0_f64, f64::max);
    let width = labels.iter().map(|l| l.chars().count()).max().unwrap_or(0);
    let mut out = vec![title.to_string()];
    for (label, value) in labels.iter().zip(values.iter()) {
        let pad = " ".repeat(width.saturating_sub(label.chars().count()));
        match value {
            Some(v) => out.push(format!("  {label}{pad} │{} {v:.2}", bar(*v, max))),
            None => out.push(format!("  {label}{pad} │ -")),
        }
    }
    out
}

#[derive(Clone, Debug, PartialEq)]
pub struct TerminalFrame {
    pub canvas: String,
    pub lines: Vec<String>,
}

#[derive(Clone, Debug, Default)]
pub struct TerminalChart {
    live: usize,
}

impl TerminalChart {
    pub fn live(&self) -> usize {
        self.live
    }

    pub fn frame(canvas: &str, series: &ChartSeries) -> TerminalFrame {
        let mut lines = Vec::new();
        lines.extend(bar_lines("Cost", &series.labels, &series.cost));
        lines.extend(bar_lines("CO₂", &series.labels, &series.co2));
        if let Some(bio) = series.mean_biodegradability {
            lines.push(format!("Mean biodegradability: {bio:.1}"));
        }
        if let Some(rec) = series.mean_recyclability {
            lines.push(format!("Mean recyclability: {rec:.1}%"));
        }
        TerminalFrame {
            canvas: canvas.to_string(),
            lines,
        }
    }
}

impl ChartBackend for TerminalChart {
    type Chart = TerminalFrame;

    fn create(&mut self, canvas: &str, series: &ChartSeries) -> TerminalFrame {
        let frame = Self::frame(canvas, series);
        println!();
        for line in frame.lines.iter() {
            println!("{}", line);
        }
        self.live += 1;
        frame
    }

    fn destroy(&mut self, _chart: TerminalFrame) {
        self.live = self.live.saturating_sub(1);
    }
}
