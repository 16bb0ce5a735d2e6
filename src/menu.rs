use crossterm::event::{KeyCode, MouseButton, MouseEventKind};
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Text};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::Frame;
use unicode_width::UnicodeWidthStr;

use crate::dashboard::StatsScreen;
use crate::diagnosis::DiagnosisScreen;
use crate::runtime::AppEvent;
use crate::screen::{Screen, ScreenContext};
use crate::trainer::view::rect_contains;
use crate::trainer::TrainerScreen;

const ITEMS: [&str; 5] = [
    "start training",
    "diagnosis",
    "statistics",
    "guide",
    "quit",
];

const GUIDE: &str = "\
trainer: move the pointer over the shown fish and press its key\n\
         keys: SPACE w s d f g h j k l; three misses end the session\n\
diagnosis: click the numbers 1..25 in ascending order\n\
statistics: arrows page dates, 1-4 pick a metric, e exports csv\n\
esc leaves any screen";

/// Entry screen with the mode buttons and a controls overlay.
pub struct MainMenuScreen {
    selected: usize,
    show_guide: bool,
    last_area: Option<Rect>,
}

impl MainMenuScreen {
    pub fn new() -> Box<Self> {
        Box::new(Self {
            selected: 0,
            show_guide: false,
            last_area: None,
        })
    }

    fn button_rect(area: Rect, index: usize) -> Rect {
        let width = 24u16.min(area.width);
        let x = area.x + area.width.saturating_sub(width) / 2;
        let y = area.y + (area.height / 3) + index as u16 * 2;
        Rect {
            x,
            y,
            width,
            height: 1,
        }
    }

    fn activate(&mut self, index: usize, ctx: &mut ScreenContext) {
        match index {
            0 => {
                let trainer = TrainerScreen::new(ctx);
                ctx.push(trainer);
            }
            1 => {
                let diagnosis = DiagnosisScreen::new(ctx);
                ctx.push(diagnosis);
            }
            2 => ctx.push(StatsScreen::new()),
            3 => self.show_guide = true,
            _ => ctx.pop(),
        }
    }
}

impl Screen for MainMenuScreen {
    fn handle_events(&mut self, events: &[AppEvent], ctx: &mut ScreenContext) {
        for event in events {
            if self.show_guide {
                match event {
                    AppEvent::Key(_) => self.show_guide = false,
                    AppEvent::Mouse(m) if matches!(m.kind, MouseEventKind::Down(_)) => {
                        self.show_guide = false
                    }
                    _ => {}
                }
                continue;
            }
            match event {
                AppEvent::Key(key) => match key.code {
                    KeyCode::Up => {
                        self.selected = self.selected.checked_sub(1).unwrap_or(ITEMS.len() - 1)
                    }
                    KeyCode::Down => self.selected = (self.selected + 1) % ITEMS.len(),
                    KeyCode::Enter => {
                        self.activate(self.selected, ctx);
                        return;
                    }
                    KeyCode::Char('t') => {
                        self.activate(0, ctx);
                        return;
                    }
                    KeyCode::Char('d') => {
                        self.activate(1, ctx);
                        return;
                    }
                    KeyCode::Char('s') => {
                        self.activate(2, ctx);
                        return;
                    }
                    KeyCode::Char('g') => self.activate(3, ctx),
                    KeyCode::Char('q') | KeyCode::Esc => {
                        ctx.pop();
                        return;
                    }
                    _ => {}
                },
                AppEvent::Mouse(mouse) => {
                    let Some(area) = self.last_area else { continue };
                    match mouse.kind {
                        MouseEventKind::Moved => {
                            for i in 0..ITEMS.len() {
                                if rect_contains(
                                    Self::button_rect(area, i),
                                    mouse.column,
                                    mouse.row,
                                ) {
                                    self.selected = i;
                                }
                            }
                        }
                        MouseEventKind::Down(MouseButton::Left) => {
                            for i in 0..ITEMS.len() {
                                if rect_contains(
                                    Self::button_rect(area, i),
                                    mouse.column,
                                    mouse.row,
                                ) {
                                    self.activate(i, ctx);
                                    return;
                                }
                            }
                        }
                        _ => {}
                    }
                }
                _ => {}
            }
        }
    }

    fn render(&mut self, frame: &mut Frame, ctx: &mut ScreenContext) {
        let area = frame.area();
        self.last_area = Some(area);
        if area.width < 2 || area.height < 2 {
            return;
        }

        frame.render_widget(
            Block::default().style(Style::default().bg(Color::Black).fg(Color::White)),
            area,
        );

        if let Some(bg) = ctx.assets.get_image("background_main_menu") {
            let text = Text::from(
                bg.lines
                    .iter()
                    .map(|l| Line::from(l.clone()))
                    .collect::<Vec<_>>(),
            );
            frame.render_widget(Paragraph::new(text), area);
        }

        let title = "smart angler";
        let title_x = area.x + area.width.saturating_sub(title.width() as u16) / 2;
        frame.render_widget(
            Paragraph::new(title).style(Style::default().add_modifier(Modifier::BOLD)),
            Rect {
                x: title_x,
                y: area.y + area.height / 5,
                width: (title.width() as u16).min(area.width),
                height: 1,
            },
        );

        for (i, label) in ITEMS.iter().enumerate() {
            let rect = Self::button_rect(area, i);
            if rect.y + rect.height > area.y + area.height {
                continue;
            }
            let style = if i == self.selected {
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::LightBlue)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            frame.render_widget(
                Paragraph::new(*label).style(style).alignment(Alignment::Center),
                rect,
            );
        }

        if self.show_guide {
            let width = 70u16.min(area.width.saturating_sub(2));
            let height = 8u16.min(area.height.saturating_sub(2));
            let overlay = Rect {
                x: area.x + area.width.saturating_sub(width) / 2,
                y: area.y + area.height.saturating_sub(height) / 2,
                width,
                height,
            };
            frame.render_widget(Clear, overlay);
            frame.render_widget(
                Paragraph::new(GUIDE)
                    .block(Block::default().borders(Borders::ALL).title("guide"))
                    .style(Style::default().bg(Color::Black).fg(Color::White)),
                overlay,
            );
        }
    }
}
