//! # Counter and Chart Deltas
//!
//! Pushes status counters and chart series to their surfaces, skipping
//! anything whose displayed value already matches.

use crate::dashboard::render::{
    ChartSeries, ChartSurface, CounterKey, CounterSurface, RedrawMode, Transition,
};
use crate::shared::{Project, Snapshot};

/// Update every counter whose displayed value differs from the snapshot.
///
/// Counters the surface does not show are skipped. Returns the number of
/// counters changed.
pub fn apply_counters(counters: &mut dyn CounterSurface, snapshot: &Snapshot) -> usize {
    let status = snapshot
        .status_counts
        .iter()
        .map(|(code, count)| (CounterKey::Status(code.clone()), *count));
    let tasks = snapshot
        .task_status_counts
        .iter()
        .map(|(metric, count)| (CounterKey::Task(metric.clone()), *count));

    let mut changed = 0;
    for (key, count) in status.chain(tasks) {
        match counters.value(&key) {
            None => continue,
            Some(current) if current == count => continue,
            Some(current) => {
                tracing::debug!("Counter {} changed: {} -> {}", key, current, count);
                counters.set_value(&key, count, Transition::Highlight);
                changed += 1;
            }
        }
    }
    changed
}

/// The two dashboard charts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    /// Planned vs actual progress per project
    Progress,
    /// Estimated, approved, planned, allocated and spent budget per project
    Budget,
}

impl ChartKind {
    pub fn name(&self) -> &'static str {
        match self {
            ChartKind::Progress => "progress",
            ChartKind::Budget => "budget",
        }
    }

    /// Series for `projects`, labelled by project name
    pub fn series(&self, projects: &[Project]) -> ChartSeries {
        let labels = projects.iter().map(|p| p.name.clone()).collect();
        let column = |value: fn(&Project) -> f64| projects.iter().map(value).collect::<Vec<_>>();

        let datasets = match self {
            ChartKind::Progress => vec![column(|p| p.planned_progress), column(|p| p.progress)],
            ChartKind::Budget => vec![
                column(|p| p.budget.estimated),
                column(|p| p.budget.approved),
                column(|p| p.budget.planned),
                column(|p| p.budget.allocated),
                column(|p| p.budget.spent),
            ],
        };
        ChartSeries { labels, datasets }
    }
}

/// What happened to a chart
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartDelta {
    Unchanged,
    /// Same labels, new values, lightweight redraw
    DataOnly,
    /// New labels, full rebuild
    Rebuilt,
}

/// Bring `chart` in line with `projects`
pub fn apply_chart(chart: &mut dyn ChartSurface, kind: ChartKind, projects: &[Project]) -> ChartDelta {
    let series = kind.series(projects);

    if chart.labels() != series.labels {
        chart.replace(&series);
        chart.redraw(RedrawMode::Full);
        tracing::debug!("Rebuilt {} chart with {} labels", kind.name(), series.labels.len());
        return ChartDelta::Rebuilt;
    }

    if chart.datasets() == series.datasets {
        return ChartDelta::Unchanged;
    }

    chart.set_datasets(&series.datasets);
    chart.redraw(RedrawMode::Lightweight);
    tracing::debug!("Updated {} chart data", kind.name());
    ChartDelta::DataOnly
}
