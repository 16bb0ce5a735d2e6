use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use crate::assets::AssetCache;
use crate::config::Settings;

use super::model::{DayPhase, TrainerModel, ENTITY_SIZE};

/// Display label for a required key
pub fn key_label(key: char) -> String {
    if key == ' ' {
        "[SPACE]".to_string()
    } else {
        format!("[{}]", key.to_ascii_uppercase())
    }
}

pub fn rect_contains(rect: Rect, col: u16, row: u16) -> bool {
    col >= rect.x && col < rect.x + rect.width && row >= rect.y && row < rect.y + rect.height
}

/// Screen regions of the trainer view, recomputed per frame and kept by
/// the screen for pointer hit-testing between frames.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainerLayout {
    pub header: Rect,
    pub water: Rect,
    pub exit: Rect,
}

pub fn layout(area: Rect) -> TrainerLayout {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Min(0)])
        .split(area);
    let header = chunks[0];
    // Matches the "[ exit ]" label at the start of the first header line
    let exit = Rect {
        x: header.x,
        y: header.y,
        width: 8.min(header.width),
        height: 1.min(header.height),
    };
    TrainerLayout {
        header,
        water: chunks[1],
        exit,
    }
}

/// Maps model pixels (the settings-sized logical screen) onto a terminal
/// cell area and back.
#[derive(Debug, Clone, Copy)]
pub struct Viewport {
    pub area: Rect,
    model_w: f64,
    model_h: f64,
}

impl Viewport {
    pub fn new(area: Rect, settings: &Settings) -> Self {
        Self {
            area,
            model_w: settings.screen_w.max(1) as f64,
            model_h: settings.screen_h.max(1) as f64,
        }
    }

    pub fn to_cell(&self, x: f64, y: f64) -> (u16, u16) {
        let fx = (x / self.model_w).clamp(0.0, 1.0);
        let fy = (y / self.model_h).clamp(0.0, 1.0);
        let col = self.area.x + ((fx * self.area.width.saturating_sub(1) as f64) as u16);
        let row = self.area.y + ((fy * self.area.height.saturating_sub(1) as f64) as u16);
        (col, row)
    }

    /// Model position of a cell center; None outside the mapped area.
    pub fn to_model(&self, col: u16, row: u16) -> Option<(f64, f64)> {
        if !rect_contains(self.area, col, row) {
            return None;
        }
        let fx = (col - self.area.x) as f64 + 0.5;
        let fy = (row - self.area.y) as f64 + 0.5;
        Some((
            fx / self.area.width.max(1) as f64 * self.model_w,
            fy / self.area.height.max(1) as f64 * self.model_h,
        ))
    }

    /// Cell rectangle covering one entity square at a model position.
    pub fn entity_rect(&self, x: f64, y: f64) -> Rect {
        let (col, row) = self.to_cell(x, y);
        let width = ((ENTITY_SIZE / self.model_w) * self.area.width as f64).max(1.0) as u16;
        let height = ((ENTITY_SIZE / self.model_h) * self.area.height as f64).max(1.0) as u16;
        let right = (self.area.x + self.area.width).saturating_sub(col);
        let bottom = (self.area.y + self.area.height).saturating_sub(row);
        Rect {
            x: col,
            y: row,
            width: width.min(right),
            height: height.min(bottom),
        }
    }
}

fn phase_style(phase: DayPhase) -> Style {
    match phase {
        DayPhase::Day => Style::default().bg(Color::Blue).fg(Color::White),
        DayPhase::Night => Style::default().bg(Color::Black).fg(Color::Gray),
    }
}

pub fn render(
    frame: &mut Frame,
    area: Rect,
    model: &TrainerModel,
    assets: &mut AssetCache,
    settings: &Settings,
    music_track: Option<&str>,
) {
    let layout = layout(area);
    let viewport = Viewport::new(layout.water, settings);

    render_header(frame, layout, model, music_track);
    render_water(frame, viewport, model, assets);
}

fn render_header(
    frame: &mut Frame,
    layout: TrainerLayout,
    model: &TrainerModel,
    music_track: Option<&str>,
) {
    let hearts = "\u{2665} ".repeat(model.lives as usize);
    let target = match (&model.current_target, model.current_target_key) {
        (Some(kind), Some(key)) => format!(
            "{} {}",
            key_label(key),
            kind.name.as_deref().unwrap_or(&kind.image)
        ),
        _ => "no target".to_string(),
    };
    let music = music_track
        .map(|t| format!("  \u{266a} {t}"))
        .unwrap_or_default();

    let lines = vec![
        Line::from(vec![
            Span::raw("[ exit ] "),
            Span::styled(hearts, Style::default().fg(Color::Red)),
            Span::raw(format!("  score {}", model.score)),
            Span::raw(format!("  {:.1}s", model.current_game_time)),
            Span::raw(music),
        ]),
        Line::from(vec![
            Span::raw("catch: "),
            Span::styled(target, Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(format!(
                "   focus {:.1}s (best {:.1}s)",
                model.current_focus, model.max_focus
            )),
        ]),
    ];
    let header = Paragraph::new(Text::from(lines))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, layout.header);
}

fn render_water(
    frame: &mut Frame,
    viewport: Viewport,
    model: &TrainerModel,
    assets: &mut AssetCache,
) {
    let base = phase_style(model.phase);
    frame.render_widget(Block::default().style(base), viewport.area);

    if let Some(bg) = assets.get_image(model.phase.background_key()) {
        let text = Text::from(
            bg.lines
                .iter()
                .map(|l| Line::from(l.clone()))
                .collect::<Vec<_>>(),
        );
        frame.render_widget(Paragraph::new(text).style(base), viewport.area);
    }

    // Spawn order doubles as z-order: later entities draw on top
    for entity in &model.entities {
        let rect = viewport.entity_rect(entity.x, entity.y);
        if rect.width == 0 || rect.height == 0 {
            continue;
        }
        let body = match assets.get_image(&entity.kind.image) {
            Some(sprite) => Text::from(
                sprite
                    .lines
                    .iter()
                    .map(|l| Line::from(l.clone()))
                    .collect::<Vec<_>>(),
            ),
            None => Text::from(format!("<{}>", entity.kind.image)),
        };
        frame.render_widget(Paragraph::new(body).style(base), rect);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_labels() {
        assert_eq!(key_label(' '), "[SPACE]");
        assert_eq!(key_label('w'), "[W]");
        assert_eq!(key_label('l'), "[L]");
    }

    #[test]
    fn viewport_roundtrip_stays_in_area() {
        let area = Rect {
            x: 2,
            y: 3,
            width: 60,
            height: 20,
        };
        let viewport = Viewport::new(area, &Settings::default());

        let (col, row) = viewport.to_cell(640.0, 360.0);
        assert!(rect_contains(area, col, row));

        let (mx, my) = viewport.to_model(col, row).unwrap();
        // One cell of slack in each direction after the round trip
        assert!((mx - 640.0).abs() <= 1280.0 / 60.0 + 1.0);
        assert!((my - 360.0).abs() <= 720.0 / 20.0 + 1.0);
    }

    #[test]
    fn viewport_rejects_outside_cells() {
        let area = Rect {
            x: 0,
            y: 4,
            width: 40,
            height: 10,
        };
        let viewport = Viewport::new(area, &Settings::default());
        assert!(viewport.to_model(0, 0).is_none());
        assert!(viewport.to_model(41, 5).is_none());
        assert!(viewport.to_model(5, 5).is_some());
    }

    #[test]
    fn entity_rect_clamped_to_area() {
        let area = Rect {
            x: 0,
            y: 0,
            width: 40,
            height: 10,
        };
        let viewport = Viewport::new(area, &Settings::default());
        let rect = viewport.entity_rect(1260.0, 700.0);
        assert!(rect.x + rect.width <= area.x + area.width);
        assert!(rect.y + rect.height <= area.y + area.height);
        assert!(rect.width >= 1 || rect.x == area.x + area.width);
    }

    #[test]
    fn layout_reserves_header() {
        let area = Rect {
            x: 0,
            y: 0,
            width: 80,
            height: 24,
        };
        let l = layout(area);
        assert_eq!(l.header.height, 4);
        assert_eq!(l.water.height, 20);
        assert!(rect_contains(l.header, l.exit.x, l.exit.y));
    }
}
