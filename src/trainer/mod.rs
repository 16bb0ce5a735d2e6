pub mod controller;
pub mod model;
pub mod view;

use chrono::Local;
use crossterm::event::{KeyCode, MouseButton, MouseEventKind};
use ratatui::layout::Rect;
use ratatui::Frame;

use crate::runtime::AppEvent;
use crate::screen::{Screen, ScreenContext};
use crate::stats::StatsStore;

use controller::TrainerController;
use model::{TrainerEvent, TrainerModel};
use view::{layout, rect_contains, Viewport};

/// The recognition mini-game screen: model/view/controller wired onto the
/// screen lifecycle. The screen owns all side effects (sound cues, music,
/// stats persistence, navigation); the model stays pure.
pub struct TrainerScreen {
    model: TrainerModel,
    controller: TrainerController,
    last_area: Option<Rect>,
    music: Vec<String>,
    music_on: bool,
}

impl TrainerScreen {
    pub fn new(ctx: &mut ScreenContext) -> Box<Self> {
        let model = TrainerModel::load(&ctx.settings, &ctx.paths);
        Box::new(Self {
            model,
            controller: TrainerController::new(),
            last_area: None,
            music: Vec::new(),
            music_on: false,
        })
    }

    /// Read access for headless drivers and integration tests
    pub fn model(&self) -> &TrainerModel {
        &self.model
    }

    fn viewport(&self, ctx: &ScreenContext) -> Option<Viewport> {
        let area = self.last_area?;
        Some(Viewport::new(layout(area).water, &ctx.settings))
    }

    fn play_cue(ctx: &mut ScreenContext, key: &str) {
        if let Some(path) = ctx.assets.get_sound(key) {
            tracing::debug!("playing cue '{key}' ({path:?})");
        }
    }

    fn react(&mut self, events: Vec<TrainerEvent>, ctx: &mut ScreenContext) {
        for event in events {
            match event {
                TrainerEvent::Hit => {}
                TrainerEvent::PhaseChanged(phase) => {
                    tracing::debug!("day/night flip: {phase:?}");
                }
                TrainerEvent::LifeLost => {
                    Self::play_cue(ctx, "lose_life");
                }
                TrainerEvent::GameOver => {
                    Self::play_cue(ctx, "game_over");
                    self.music_on = false;
                    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
                    let record = self.model.session_record(timestamp);
                    if let Err(err) = ctx.stats.append(&record) {
                        tracing::warn!("dropping session record: {err}");
                    }
                    ctx.pop();
                }
                TrainerEvent::TargetUnavailable => {
                    tracing::warn!("entity pool drained mid-session, leaving trainer");
                    self.music_on = false;
                    ctx.pop();
                }
            }
        }
    }
}

impl Screen for TrainerScreen {
    fn enter(&mut self, ctx: &mut ScreenContext) {
        self.music = ctx.assets.list_music();
        self.music_on = !self.music.is_empty();

        if self.model.start(&mut ctx.rng).is_err() {
            tracing::warn!("no targets available, leaving trainer");
            ctx.pop();
        }
    }

    fn exit(&mut self, _ctx: &mut ScreenContext) {
        self.music_on = false;
    }

    fn handle_events(&mut self, events: &[AppEvent], ctx: &mut ScreenContext) {
        for event in events {
            match event {
                AppEvent::Key(key) => {
                    if key.code == KeyCode::Esc {
                        ctx.pop();
                        return;
                    }
                    if let Some(pool_key) = TrainerController::pool_key(key) {
                        if let Some(viewport) = self.viewport(ctx) {
                            if let Some(cursor) = self.controller.cursor_in_model(&viewport) {
                                let out =
                                    self.model.handle_selection(cursor, pool_key, &mut ctx.rng);
                                self.react(out, ctx);
                            }
                        }
                    }
                }
                AppEvent::Mouse(mouse) => {
                    self.controller.note_mouse(mouse);
                    if let MouseEventKind::Down(MouseButton::Left) = mouse.kind {
                        if let Some(area) = self.last_area {
                            let exit = layout(area).exit;
                            if rect_contains(exit, mouse.column, mouse.row) {
                                ctx.pop();
                                return;
                            }
                        }
                    }
                }
                AppEvent::Resize | AppEvent::Tick => {}
            }
        }
    }

    fn update(&mut self, dt: f64, ctx: &mut ScreenContext) {
        if !self.model.game_running {
            return;
        }
        let out = self.model.update(dt, &mut ctx.rng);
        self.react(out, ctx);
    }

    fn render(&mut self, frame: &mut Frame, ctx: &mut ScreenContext) {
        let area = frame.area();
        self.last_area = Some(area);
        let track = if self.music_on {
            self.music.first().map(|s| s.as_str())
        } else {
            None
        };
        view::render(frame, area, &self.model, &mut ctx.assets, &ctx.settings, track);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyEvent, KeyModifiers, MouseEvent};
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;
    use tempfile::tempdir;

    use crate::assets::AssetCache;
    use crate::config::{DataPaths, Settings};
    use crate::screen::ScreenManager;
    use crate::stats::{FileStatsStore, StatsStore};

    fn ctx_with_pools(dir: &std::path::Path, pool_json: &str) -> ScreenContext {
        let paths = DataPaths::new(dir);
        std::fs::create_dir_all(dir.join("config")).unwrap();
        std::fs::write(paths.entities(true), pool_json).unwrap();
        std::fs::write(paths.entities(false), pool_json).unwrap();
        ScreenContext::new(
            Settings::default(),
            paths.clone(),
            AssetCache::new(dir.join("assets")),
            Box::new(FileStatsStore::new(&paths)),
        )
    }

    #[test]
    fn trainer_screen_runs_a_frame() {
        let dir = tempdir().unwrap();
        let mut manager =
            ScreenManager::new(ctx_with_pools(dir.path(), r#"[{"image":"pike"}]"#));
        let screen = TrainerScreen::new(manager.ctx_mut());
        manager.push(screen);
        assert_eq!(manager.depth(), 1);

        let backend = TestBackend::new(80, 24);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|f| manager.render(f)).unwrap();

        manager.handle_events(&[
            AppEvent::Mouse(MouseEvent {
                kind: MouseEventKind::Moved,
                column: 40,
                row: 12,
                modifiers: KeyModifiers::NONE,
            }),
            AppEvent::Key(KeyEvent::new(KeyCode::Char('w'), KeyModifiers::NONE)),
        ]);
        manager.update(1.0 / 60.0);
        assert!(manager.is_running());
    }

    #[test]
    fn empty_pool_pops_back_immediately() {
        let dir = tempdir().unwrap();
        let mut manager = ScreenManager::new(ctx_with_pools(dir.path(), "[]"));
        let screen = TrainerScreen::new(manager.ctx_mut());
        manager.push(screen);

        // The queued pop is applied on the next frame fan-out
        manager.update(1.0 / 60.0);
        assert_eq!(manager.depth(), 0);
        assert!(!manager.is_running());
    }

    #[test]
    fn esc_pops_without_a_record() {
        let dir = tempdir().unwrap();
        let mut manager =
            ScreenManager::new(ctx_with_pools(dir.path(), r#"[{"image":"pike"}]"#));
        let screen = TrainerScreen::new(manager.ctx_mut());
        manager.push(screen);

        manager.handle_events(&[AppEvent::Key(KeyEvent::new(
            KeyCode::Esc,
            KeyModifiers::NONE,
        ))]);
        assert_eq!(manager.depth(), 0);

        let store = FileStatsStore::with_path(DataPaths::new(dir.path()).stats());
        assert!(store.load().is_empty());
    }
}
