use std::collections::HashSet;

use crossterm::event::{KeyCode, MouseButton, MouseEventKind};
use rand::seq::SliceRandom;
use rand::Rng;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use crate::runtime::AppEvent;
use crate::screen::{Screen, ScreenContext};
use crate::trainer::view::rect_contains;

pub const GRID_SIZE: usize = 5;
const LAST_NUMBER: u8 = 25;

/// The ascending number-click test: a shuffled 5×5 grid, a cursor through
/// 1..=25, and the time between the first and the last correct click.
#[derive(Debug)]
pub struct DiagnosisGrid {
    grid: [[u8; GRID_SIZE]; GRID_SIZE],
    found: HashSet<u8>,
    next_expected: u8,
    started_at: Option<f64>,
    finished_at: Option<f64>,
}

impl DiagnosisGrid {
    pub fn new(rng: &mut impl Rng) -> Self {
        let mut numbers: Vec<u8> = (1..=LAST_NUMBER).collect();
        numbers.shuffle(rng);

        let mut grid = [[0u8; GRID_SIZE]; GRID_SIZE];
        for (i, value) in numbers.into_iter().enumerate() {
            grid[i / GRID_SIZE][i % GRID_SIZE] = value;
        }

        Self {
            grid,
            found: HashSet::new(),
            next_expected: 1,
            started_at: None,
            finished_at: None,
        }
    }

    pub fn value(&self, row: usize, col: usize) -> u8 {
        self.grid[row][col]
    }

    pub fn is_found(&self, value: u8) -> bool {
        self.found.contains(&value)
    }

    pub fn next_expected(&self) -> u8 {
        self.next_expected
    }

    pub fn finished(&self) -> bool {
        self.finished_at.is_some()
    }

    /// Handle a click on a cell at the given clock reading. Clicking the
    /// next expected number advances; anything else is a silent no-op.
    pub fn click(&mut self, row: usize, col: usize, clock: f64) {
        if self.finished() || row >= GRID_SIZE || col >= GRID_SIZE {
            return;
        }
        let value = self.grid[row][col];
        if value != self.next_expected {
            return;
        }
        if value == 1 {
            self.started_at = Some(clock);
        }
        self.found.insert(value);
        self.next_expected += 1;
        if self.next_expected > LAST_NUMBER {
            self.finished_at = Some(clock);
        }
    }

    /// Completion time, once finished.
    pub fn elapsed(&self) -> Option<f64> {
        match (self.started_at, self.finished_at) {
            (Some(start), Some(end)) => Some(end - start),
            _ => None,
        }
    }
}

/// Cell geometry for rendering and pointer hit-testing
#[derive(Debug, Clone, Copy)]
pub struct GridLayout {
    origin: (u16, u16),
    cell_w: u16,
    cell_h: u16,
    pub exit: Rect,
}

impl GridLayout {
    pub fn new(area: Rect) -> Self {
        let cell_w = ((area.width.saturating_sub(2)) / GRID_SIZE as u16).clamp(3, 12);
        let cell_h = ((area.height.saturating_sub(6)) / GRID_SIZE as u16).clamp(1, 5);
        let grid_w = cell_w * GRID_SIZE as u16;
        let origin_x = area.x + area.width.saturating_sub(grid_w) / 2;
        let origin_y = area.y + 3;
        Self {
            origin: (origin_x, origin_y),
            cell_w,
            cell_h,
            exit: Rect {
                x: area.x + 1,
                y: area.y,
                width: 8.min(area.width),
                height: 1,
            },
        }
    }

    pub fn cell_rect(&self, row: usize, col: usize) -> Rect {
        Rect {
            x: self.origin.0 + col as u16 * self.cell_w,
            y: self.origin.1 + row as u16 * self.cell_h,
            width: self.cell_w.saturating_sub(1),
            height: self.cell_h,
        }
    }

    /// Which cell a terminal position falls into, if any.
    pub fn hit(&self, col: u16, row: u16) -> Option<(usize, usize)> {
        for r in 0..GRID_SIZE {
            for c in 0..GRID_SIZE {
                if rect_contains(self.cell_rect(r, c), col, row) {
                    return Some((r, c));
                }
            }
        }
        None
    }
}

pub struct DiagnosisScreen {
    grid: DiagnosisGrid,
    clock: f64,
    last_area: Option<Rect>,
}

impl DiagnosisScreen {
    pub fn new(ctx: &mut ScreenContext) -> Box<Self> {
        Box::new(Self {
            grid: DiagnosisGrid::new(&mut ctx.rng),
            clock: 0.0,
            last_area: None,
        })
    }
}

impl Screen for DiagnosisScreen {
    fn enter(&mut self, ctx: &mut ScreenContext) {
        // Re-entering deals a fresh grid
        self.grid = DiagnosisGrid::new(&mut ctx.rng);
        self.clock = 0.0;
    }

    fn handle_events(&mut self, events: &[AppEvent], ctx: &mut ScreenContext) {
        for event in events {
            match event {
                AppEvent::Key(key) if key.code == KeyCode::Esc => {
                    ctx.pop();
                    return;
                }
                AppEvent::Mouse(mouse) => {
                    if let MouseEventKind::Down(MouseButton::Left) = mouse.kind {
                        let Some(area) = self.last_area else { continue };
                        let layout = GridLayout::new(area);
                        if rect_contains(layout.exit, mouse.column, mouse.row) {
                            ctx.pop();
                            return;
                        }
                        if let Some((r, c)) = layout.hit(mouse.column, mouse.row) {
                            self.grid.click(r, c, self.clock);
                        }
                    }
                }
                _ => {}
            }
        }
    }

    fn update(&mut self, dt: f64, _ctx: &mut ScreenContext) {
        self.clock += dt;
    }

    fn render(&mut self, frame: &mut Frame, _ctx: &mut ScreenContext) {
        let area = frame.area();
        self.last_area = Some(area);
        if area.width < 3 || area.height < 2 {
            return;
        }
        let layout = GridLayout::new(area);

        frame.render_widget(
            Block::default().style(Style::default().bg(Color::White).fg(Color::Black)),
            area,
        );

        let title = Paragraph::new(Line::from(vec![
            Span::raw("[ exit ]  "),
            Span::styled(
                "click the numbers in ascending order",
                Style::default().add_modifier(Modifier::BOLD),
            ),
        ]));
        frame.render_widget(
            title,
            Rect {
                x: area.x + 1,
                y: area.y,
                width: area.width.saturating_sub(1),
                height: 1,
            },
        );

        for r in 0..GRID_SIZE {
            for c in 0..GRID_SIZE {
                let rect = layout.cell_rect(r, c);
                if rect.y + rect.height > area.y + area.height
                    || rect.x + rect.width > area.x + area.width
                {
                    continue;
                }
                let value = self.grid.value(r, c);
                let style = if self.grid.is_found(value) {
                    Style::default().fg(Color::DarkGray)
                } else {
                    Style::default().add_modifier(Modifier::BOLD)
                };
                let cell = Paragraph::new(format!("{value:^width$}", width = rect.width as usize))
                    .style(style)
                    .block(Block::default().borders(Borders::NONE));
                frame.render_widget(cell, rect);
            }
        }

        if let Some(elapsed) = self.grid.elapsed() {
            let msg = Paragraph::new(format!("time: {elapsed:.2} s"))
                .style(Style::default().add_modifier(Modifier::BOLD));
            frame.render_widget(
                msg,
                Rect {
                    x: area.x + 1,
                    y: (area.y + area.height).saturating_sub(2),
                    width: area.width.saturating_sub(1),
                    height: 1,
                },
            );
        }
    }
}
