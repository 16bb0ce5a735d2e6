use crossterm::event::KeyCode;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Span;
use ratatui::widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph};
use ratatui::Frame;

use crate::charting::{compute_chart_params, format_label};
use crate::runtime::AppEvent;
use crate::screen::{Screen, ScreenContext};
use crate::stats::{
    aggregate_by_date, export_csv, overall_metrics, top_error_keys, DailyAggregate,
    OverallMetrics, StatsStore,
};

/// Days shown at once when paging through the date buckets
pub const WINDOW_DAYS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum Metric {
    #[strum(serialize = "total score")]
    TotalScore,
    #[strum(serialize = "best focus (s)")]
    BestFocus,
    #[strum(serialize = "max session time (s)")]
    MaxTime,
    #[strum(serialize = "avg session time (s)")]
    AvgTime,
}

pub const METRICS: [Metric; 4] = [
    Metric::TotalScore,
    Metric::BestFocus,
    Metric::MaxTime,
    Metric::AvgTime,
];

/// Chart points for one metric over a window of date buckets, x = index.
pub fn metric_series(window: &[DailyAggregate], metric: Metric) -> Vec<(f64, f64)> {
    window
        .iter()
        .enumerate()
        .map(|(i, agg)| {
            let value = match metric {
                Metric::TotalScore => agg.total_score as f64,
                Metric::BestFocus => agg.best_max_focus,
                Metric::MaxTime => agg.max_time,
                Metric::AvgTime => agg.avg_time,
            };
            (i as f64, value)
        })
        .collect()
}

/// The statistics dashboard: per-date aggregates, four metric charts,
/// a paging window, and CSV export.
pub struct StatsScreen {
    aggregates: Vec<DailyAggregate>,
    overall: OverallMetrics,
    worst_error: Option<(String, u32)>,
    offset: usize,
    selected: usize,
    notice: Option<String>,
}

impl StatsScreen {
    pub fn new() -> Box<Self> {
        Box::new(Self {
            aggregates: Vec::new(),
            overall: OverallMetrics::default(),
            worst_error: None,
            offset: 0,
            selected: 0,
            notice: None,
        })
    }

    pub fn max_offset(&self) -> usize {
        self.aggregates.len().saturating_sub(WINDOW_DAYS)
    }

    pub fn window(&self) -> &[DailyAggregate] {
        let end = (self.offset + WINDOW_DAYS).min(self.aggregates.len());
        &self.aggregates[self.offset.min(end)..end]
    }

    pub fn selected_metric(&self) -> Metric {
        METRICS[self.selected]
    }

    fn reload(&mut self, ctx: &mut ScreenContext) {
        let records = ctx.stats.load();
        self.aggregates = aggregate_by_date(&records);
        self.overall = overall_metrics(&records);
        self.worst_error = top_error_keys(&self.aggregates).into_iter().next();
        self.offset = self.offset.min(self.max_offset());
    }

    fn export(&mut self, ctx: &mut ScreenContext) {
        let path = ctx.paths.export_csv();
        self.notice = match export_csv(&path, &self.aggregates) {
            Ok(()) => Some(format!("exported to {}", path.display())),
            Err(err) => {
                tracing::warn!("csv export failed: {err}");
                Some("export failed".to_string())
            }
        };
    }
}

impl Screen for StatsScreen {
    fn enter(&mut self, ctx: &mut ScreenContext) {
        self.reload(ctx);
        self.notice = None;
    }

    fn handle_events(&mut self, events: &[AppEvent], ctx: &mut ScreenContext) {
        for event in events {
            let AppEvent::Key(key) = event else { continue };
            match key.code {
                KeyCode::Esc => {
                    ctx.pop();
                    return;
                }
                KeyCode::Left => self.offset = self.offset.saturating_sub(1),
                KeyCode::Right => self.offset = (self.offset + 1).min(self.max_offset()),
                KeyCode::PageUp => self.offset = self.offset.saturating_sub(WINDOW_DAYS),
                KeyCode::PageDown => {
                    self.offset = (self.offset + WINDOW_DAYS).min(self.max_offset())
                }
                KeyCode::Char(c @ '1'..='4') => {
                    self.selected = (c as u8 - b'1') as usize;
                }
                KeyCode::Char('e') => self.export(ctx),
                _ => {}
            }
        }
    }

    fn render(&mut self, frame: &mut Frame, _ctx: &mut ScreenContext) {
        let area = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2), // title + notice
                Constraint::Min(8),    // charts
                Constraint::Length(2), // summary + key help
            ])
            .split(area);

        let title = Paragraph::new(format!(
            "session statistics: {} dates, {} records{}",
            self.aggregates.len(),
            self.overall.records,
            self.notice
                .as_ref()
                .map(|n| format!("   {n}"))
                .unwrap_or_default()
        ))
        .style(Style::default().add_modifier(Modifier::BOLD));
        frame.render_widget(title, chunks[0]);

        if self.aggregates.is_empty() {
            let empty = Paragraph::new("no records yet, finish a trainer session first")
                .style(Style::default().fg(Color::Gray))
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::ALL));
            frame.render_widget(empty, chunks[1]);
        } else {
            self.render_charts(frame, chunks[1]);
        }

        let worst = self
            .worst_error
            .as_ref()
            .map(|(key, count)| format!("   most missed: {key} ({count})"))
            .unwrap_or_default();
        let summary = Paragraph::new(format!(
            "total score {}   max time {:.0}s   avg time {:.0}s{}\n\u{2190}/\u{2192} shift  PgUp/PgDn page  1-4 metric  (e)xport csv  (esc) back",
            self.overall.total_score, self.overall.max_time, self.overall.avg_time, worst
        ))
        .style(Style::default().fg(Color::Gray));
        frame.render_widget(summary, chunks[2]);
    }
}

impl StatsScreen {
    fn render_charts(&self, frame: &mut Frame, area: Rect) {
        let halves = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
            .split(area);
        let tile_rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(halves[0]);
        let window = self.window();

        for (i, metric) in METRICS.iter().enumerate() {
            let row = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
                .split(tile_rows[i / 2]);
            let tile = row[i % 2];
            let selected = i == self.selected;
            self.render_metric_chart(frame, tile, *metric, window, selected, i + 1);
        }

        self.render_large_chart(frame, halves[1], window);
    }

    fn render_metric_chart(
        &self,
        frame: &mut Frame,
        area: Rect,
        metric: Metric,
        window: &[DailyAggregate],
        selected: bool,
        index: usize,
    ) {
        let points = metric_series(window, metric);
        let (x_max, y_max) = compute_chart_params(&points);

        let border_style = if selected {
            Style::default().fg(Color::Green)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let last = points.last().map(|p| p.1).unwrap_or(0.0);

        let datasets = vec![Dataset::default()
            .marker(ratatui::symbols::Marker::Braille)
            .style(Style::default().fg(Color::LightGreen))
            .graph_type(GraphType::Line)
            .data(&points)];
        let chart = Chart::new(datasets)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(border_style)
                    .title(format!("({index}) {metric}, last {}", format_label(last))),
            )
            .x_axis(Axis::default().bounds([0.0, x_max]))
            .y_axis(Axis::default().bounds([0.0, y_max]));
        frame.render_widget(chart, area);
    }

    fn render_large_chart(&self, frame: &mut Frame, area: Rect, window: &[DailyAggregate]) {
        let metric = self.selected_metric();
        let points = metric_series(window, metric);
        let (x_max, y_max) = compute_chart_params(&points);
        let bold = Style::default().add_modifier(Modifier::BOLD);

        let first_date = window
            .first()
            .map(|a| a.date.format("%m-%d").to_string())
            .unwrap_or_default();
        let last_date = window
            .last()
            .map(|a| a.date.format("%m-%d").to_string())
            .unwrap_or_default();

        let datasets = vec![Dataset::default()
            .marker(ratatui::symbols::Marker::Braille)
            .style(Style::default().fg(Color::LightGreen))
            .graph_type(GraphType::Line)
            .data(&points)];
        let chart = Chart::new(datasets)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(metric.to_string()),
            )
            .x_axis(
                Axis::default()
                    .bounds([0.0, x_max])
                    .labels(vec![Span::styled(first_date, bold), Span::styled(last_date, bold)]),
            )
            .y_axis(
                Axis::default()
                    .bounds([0.0, y_max])
                    .labels(vec![
                        Span::styled("0", bold),
                        Span::styled(format_label(y_max), bold),
                    ]),
            );
        frame.render_widget(chart, area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyEvent, KeyModifiers};
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;
    use tempfile::tempdir;

    use crate::assets::AssetCache;
    use crate::config::{DataPaths, Settings};
    use crate::stats::{FileStatsStore, StatsRecord, StatsStore};

    fn ctx(dir: &std::path::Path) -> ScreenContext {
        let paths = DataPaths::new(dir);
        ScreenContext::new(
            Settings::default(),
            paths.clone(),
            AssetCache::new(dir.join("assets")),
            Box::new(FileStatsStore::new(&paths)),
        )
    }

    fn record(score: u32, day: u32) -> StatsRecord {
        StatsRecord {
            score,
            max_focus: 1.0,
            errors: Default::default(),
            time: 10.0,
            timestamp: format!("2024-01-{day:02} 10:00:00"),
        }
    }

    fn key(code: KeyCode) -> AppEvent {
        AppEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn metric_series_indexed_by_window_position() {
        use chrono::NaiveDate;
        use std::collections::BTreeMap;

        let agg = |day: u32, score: u32, max_time: f64| DailyAggregate {
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            games_count: 1,
            total_score: score,
            best_max_focus: 2.0,
            max_time,
            avg_time: max_time,
            errors: BTreeMap::new(),
        };
        let window = vec![agg(1, 5, 10.0), agg(2, 3, 20.0)];

        let series = metric_series(&window, Metric::TotalScore);
        assert_eq!(series, vec![(0.0, 5.0), (1.0, 3.0)]);
        let series = metric_series(&window, Metric::MaxTime);
        assert_eq!(series, vec![(0.0, 10.0), (1.0, 20.0)]);
    }

    #[test]
    fn enter_reloads_store() {
        let dir = tempdir().unwrap();
        let mut ctx = ctx(dir.path());
        for day in 1..=3 {
            ctx.stats.append(&record(day, day)).unwrap();
        }

        let mut screen = StatsScreen::new();
        screen.enter(&mut ctx);
        assert_eq!(screen.aggregates.len(), 3);
        assert_eq!(screen.overall.records, 3);
        assert_eq!(screen.window().len(), 3);
    }

    #[test]
    fn paging_clamps_to_bounds() {
        let dir = tempdir().unwrap();
        let mut ctx = ctx(dir.path());
        for day in 1..=25 {
            ctx.stats.append(&record(1, day)).unwrap();
        }
        let mut screen = StatsScreen::new();
        screen.enter(&mut ctx);
        assert_eq!(screen.max_offset(), 15);

        screen.handle_events(&[key(KeyCode::Left)], &mut ctx);
        assert_eq!(screen.offset, 0);

        screen.handle_events(&[key(KeyCode::PageDown), key(KeyCode::PageDown)], &mut ctx);
        assert_eq!(screen.offset, 15);
        assert_eq!(screen.window().len(), WINDOW_DAYS);

        screen.handle_events(&[key(KeyCode::Right)], &mut ctx);
        assert_eq!(screen.offset, 15);

        screen.handle_events(&[key(KeyCode::PageUp)], &mut ctx);
        assert_eq!(screen.offset, 5);
    }

    #[test]
    fn metric_selection_keys() {
        let dir = tempdir().unwrap();
        let mut ctx = ctx(dir.path());
        let mut screen = StatsScreen::new();
        screen.enter(&mut ctx);

        assert_eq!(screen.selected_metric(), Metric::TotalScore);
        screen.handle_events(&[key(KeyCode::Char('3'))], &mut ctx);
        assert_eq!(screen.selected_metric(), Metric::MaxTime);
        screen.handle_events(&[key(KeyCode::Char('2'))], &mut ctx);
        assert_eq!(screen.selected_metric(), Metric::BestFocus);
    }

    #[test]
    fn worst_error_key_surfaces_in_summary() {
        let dir = tempdir().unwrap();
        let mut ctx = ctx(dir.path());
        let mut rec = record(1, 1);
        rec.errors.insert("pike".into(), 3);
        rec.errors.insert("carp".into(), 1);
        ctx.stats.append(&rec).unwrap();

        let mut screen = StatsScreen::new();
        screen.enter(&mut ctx);
        assert_eq!(screen.worst_error, Some(("pike".to_string(), 3)));
    }

    #[test]
    fn export_writes_csv_and_notice() {
        let dir = tempdir().unwrap();
        let mut ctx = ctx(dir.path());
        ctx.stats.append(&record(5, 1)).unwrap();

        let mut screen = StatsScreen::new();
        screen.enter(&mut ctx);
        screen.handle_events(&[key(KeyCode::Char('e'))], &mut ctx);

        assert!(screen.notice.as_ref().unwrap().starts_with("exported"));
        let exported = std::fs::read_to_string(DataPaths::new(dir.path()).export_csv()).unwrap();
        assert!(exported.starts_with("date,games_count,total_score"));
        assert!(exported.contains("2024-01-01"));
    }

    #[test]
    fn renders_with_and_without_records() {
        let dir = tempdir().unwrap();
        let mut ctx = ctx(dir.path());

        let backend = TestBackend::new(100, 30);
        let mut terminal = Terminal::new(backend).unwrap();

        let mut screen = StatsScreen::new();
        screen.enter(&mut ctx);
        terminal.draw(|f| screen.render(f, &mut ctx)).unwrap();

        ctx.stats.append(&record(5, 1)).unwrap();
        ctx.stats.append(&record(3, 2)).unwrap();
        screen.enter(&mut ctx);
        terminal.draw(|f| screen.render(f, &mut ctx)).unwrap();
    }
}
