use crossterm::event::{KeyEvent, MouseButton, MouseEvent, MouseEventKind};

use super::model::KEY_POOL;
use super::view::Viewport;

/// Tracks the pointer and translates raw input into model selections.
#[derive(Debug, Default)]
pub struct TrainerController {
    cursor_cell: Option<(u16, u16)>,
}

impl TrainerController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember the pointer cell from any mouse movement or press.
    pub fn note_mouse(&mut self, mouse: &MouseEvent) {
        match mouse.kind {
            MouseEventKind::Moved
            | MouseEventKind::Drag(_)
            | MouseEventKind::Down(MouseButton::Left) => {
                self.cursor_cell = Some((mouse.column, mouse.row));
            }
            _ => {}
        }
    }

    pub fn cursor_cell(&self) -> Option<(u16, u16)> {
        self.cursor_cell
    }

    /// Pool key pressed, if the event is one of the ten trainer keys.
    pub fn pool_key(key: &KeyEvent) -> Option<char> {
        match key.code {
            crossterm::event::KeyCode::Char(c) => {
                let c = c.to_ascii_lowercase();
                KEY_POOL.contains(&c).then_some(c)
            }
            _ => None,
        }
    }

    /// Pointer position in model coordinates, if the pointer is known and
    /// inside the water area.
    pub fn cursor_in_model(&self, viewport: &Viewport) -> Option<(f64, f64)> {
        let (col, row) = self.cursor_cell?;
        viewport.to_model(col, row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyModifiers};
    use ratatui::layout::Rect;

    use crate::config::Settings;

    fn key(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE)
    }

    #[test]
    fn pool_key_accepts_the_ten_keys_only() {
        assert_eq!(TrainerController::pool_key(&key(' ')), Some(' '));
        assert_eq!(TrainerController::pool_key(&key('w')), Some('w'));
        assert_eq!(TrainerController::pool_key(&key('W')), Some('w'));
        assert_eq!(TrainerController::pool_key(&key('x')), None);
        assert_eq!(
            TrainerController::pool_key(&KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE)),
            None
        );
    }

    #[test]
    fn mouse_moves_update_cursor() {
        let mut controller = TrainerController::new();
        assert!(controller.cursor_cell().is_none());

        controller.note_mouse(&MouseEvent {
            kind: MouseEventKind::Moved,
            column: 10,
            row: 8,
            modifiers: KeyModifiers::NONE,
        });
        assert_eq!(controller.cursor_cell(), Some((10, 8)));

        // Scroll events do not move the pointer
        controller.note_mouse(&MouseEvent {
            kind: MouseEventKind::ScrollUp,
            column: 1,
            row: 1,
            modifiers: KeyModifiers::NONE,
        });
        assert_eq!(controller.cursor_cell(), Some((10, 8)));
    }

    #[test]
    fn cursor_maps_through_viewport() {
        let mut controller = TrainerController::new();
        let area = Rect {
            x: 0,
            y: 4,
            width: 64,
            height: 20,
        };
        let viewport = Viewport::new(area, &Settings::default());

        assert!(controller.cursor_in_model(&viewport).is_none());

        controller.note_mouse(&MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column: 32,
            row: 14,
            modifiers: KeyModifiers::NONE,
        });
        let (mx, my) = controller.cursor_in_model(&viewport).unwrap();
        assert!(mx > 0.0 && mx < 1280.0);
        assert!(my > 0.0 && my < 720.0);

        // Pointer above the water area maps to nothing
        controller.note_mouse(&MouseEvent {
            kind: MouseEventKind::Moved,
            column: 5,
            row: 0,
            modifiers: KeyModifiers::NONE,
        });
        assert!(controller.cursor_in_model(&viewport).is_none());
    }
}
