use crossterm::event::{KeyCode, KeyModifiers};
use rand::rngs::StdRng;
use rand::SeedableRng;
use ratatui::Frame;

use crate::assets::AssetCache;
use crate::config::{DataPaths, Settings};
use crate::runtime::AppEvent;
use crate::stats::StatsStore;

/// One visual/interactive mode of the application (menu, mini-game,
/// dashboard). Exactly one screen, the top of the manager's stack,
/// receives the frame tick.
pub trait Screen {
    /// Called immediately after this screen becomes top-of-stack.
    fn enter(&mut self, _ctx: &mut ScreenContext) {}
    /// Called immediately before this screen stops being top-of-stack.
    fn exit(&mut self, _ctx: &mut ScreenContext) {}
    fn handle_events(&mut self, _events: &[AppEvent], _ctx: &mut ScreenContext) {}
    fn update(&mut self, _dt: f64, _ctx: &mut ScreenContext) {}
    fn render(&mut self, frame: &mut Frame, ctx: &mut ScreenContext);
}

/// Navigation requested by a screen; applied by the manager between
/// lifecycle calls, never mid-call.
pub enum NavRequest {
    Push(Box<dyn Screen>),
    Pop,
    Switch(Box<dyn Screen>),
    Quit,
}

/// Shared collaborators handed to every screen lifecycle call.
pub struct ScreenContext {
    pub settings: Settings,
    pub paths: DataPaths,
    pub assets: AssetCache,
    pub stats: Box<dyn StatsStore>,
    pub rng: StdRng,
    nav: Vec<NavRequest>,
}

impl ScreenContext {
    pub fn new(
        settings: Settings,
        paths: DataPaths,
        assets: AssetCache,
        stats: Box<dyn StatsStore>,
    ) -> Self {
        Self {
            settings,
            paths,
            assets,
            stats,
            rng: StdRng::from_entropy(),
            nav: Vec::new(),
        }
    }

    pub fn push(&mut self, screen: Box<dyn Screen>) {
        self.nav.push(NavRequest::Push(screen));
    }

    pub fn pop(&mut self) {
        self.nav.push(NavRequest::Pop);
    }

    pub fn switch(&mut self, screen: Box<dyn Screen>) {
        self.nav.push(NavRequest::Switch(screen));
    }

    pub fn quit(&mut self) {
        self.nav.push(NavRequest::Quit);
    }
}

/// Owns the ordered stack of screens and mediates navigation. The top of
/// the stack is the active screen; everything below is suspended.
pub struct ScreenManager {
    stack: Vec<Box<dyn Screen>>,
    ctx: ScreenContext,
    running: bool,
}

impl ScreenManager {
    pub fn new(ctx: ScreenContext) -> Self {
        Self {
            stack: Vec::new(),
            ctx,
            running: true,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn ctx_mut(&mut self) -> &mut ScreenContext {
        &mut self.ctx
    }

    /// Suspend the current top (if any) and activate `screen`.
    pub fn push(&mut self, mut screen: Box<dyn Screen>) {
        if let Some(top) = self.stack.last_mut() {
            top.exit(&mut self.ctx);
        }
        screen.enter(&mut self.ctx);
        self.stack.push(screen);
    }

    /// Deactivate and drop the top screen, re-entering the one below it.
    /// Popping the last screen shuts the run loop down.
    pub fn pop(&mut self) {
        if let Some(mut top) = self.stack.pop() {
            top.exit(&mut self.ctx);
        }
        if let Some(top) = self.stack.last_mut() {
            top.enter(&mut self.ctx);
        } else {
            self.running = false;
        }
    }

    /// Atomic replace-top: one `exit` on the old top, one `enter` on the
    /// new top. On an empty stack this is a plain push.
    pub fn switch(&mut self, mut screen: Box<dyn Screen>) {
        if let Some(mut top) = self.stack.pop() {
            top.exit(&mut self.ctx);
        }
        screen.enter(&mut self.ctx);
        self.stack.push(screen);
    }

    pub fn handle_events(&mut self, events: &[AppEvent]) {
        for event in events {
            if let AppEvent::Key(key) = event {
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL)
                {
                    self.running = false;
                    return;
                }
            }
        }
        if let Some(top) = self.stack.last_mut() {
            top.handle_events(events, &mut self.ctx);
        }
        self.apply_nav();
    }

    pub fn update(&mut self, dt: f64) {
        if let Some(top) = self.stack.last_mut() {
            top.update(dt, &mut self.ctx);
        }
        self.apply_nav();
    }

    pub fn render(&mut self, frame: &mut Frame) {
        if let Some(top) = self.stack.last_mut() {
            top.render(frame, &mut self.ctx);
        }
    }

    fn apply_nav(&mut self) {
        let requests: Vec<NavRequest> = self.ctx.nav.drain(..).collect();
        for request in requests {
            match request {
                NavRequest::Push(screen) => self.push(screen),
                NavRequest::Pop => self.pop(),
                NavRequest::Switch(screen) => self.switch(screen),
                NavRequest::Quit => self.running = false,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn test_ctx() -> ScreenContext {
        let dir = tempfile::tempdir().unwrap();
        let paths = DataPaths::new(dir.path());
        ScreenContext::new(
            Settings::default(),
            paths.clone(),
            AssetCache::new(dir.path().join("assets")),
            Box::new(crate::stats::FileStatsStore::new(&paths)),
        )
    }

    /// Records its lifecycle calls into a shared log
    struct Probe {
        name: &'static str,
        log: Rc<RefCell<Vec<String>>>,
    }

    impl Probe {
        fn new(name: &'static str, log: &Rc<RefCell<Vec<String>>>) -> Box<Self> {
            Box::new(Self {
                name,
                log: Rc::clone(log),
            })
        }
    }

    impl Screen for Probe {
        fn enter(&mut self, _ctx: &mut ScreenContext) {
            self.log.borrow_mut().push(format!("{}.enter", self.name));
        }
        fn exit(&mut self, _ctx: &mut ScreenContext) {
            self.log.borrow_mut().push(format!("{}.exit", self.name));
        }
        fn render(&mut self, _frame: &mut Frame, _ctx: &mut ScreenContext) {}
    }

    #[test]
    fn push_pairs_exit_and_enter() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut manager = ScreenManager::new(test_ctx());

        manager.push(Probe::new("a", &log));
        manager.push(Probe::new("b", &log));

        assert_eq!(*log.borrow(), vec!["a.enter", "a.exit", "b.enter"]);
    }

    #[test]
    fn pop_reenters_previous_screen() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut manager = ScreenManager::new(test_ctx());

        manager.push(Probe::new("a", &log));
        manager.push(Probe::new("b", &log));
        manager.pop();

        assert_eq!(
            *log.borrow(),
            vec!["a.enter", "a.exit", "b.enter", "b.exit", "a.enter"]
        );
        assert!(manager.is_running());
    }

    #[test]
    fn pop_last_screen_stops_running() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut manager = ScreenManager::new(test_ctx());

        manager.push(Probe::new("a", &log));
        manager.pop();

        assert_eq!(*log.borrow(), vec!["a.enter", "a.exit"]);
        assert!(!manager.is_running());
        assert_eq!(manager.depth(), 0);
    }

    #[test]
    fn switch_enters_replacement_exactly_once() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut manager = ScreenManager::new(test_ctx());

        manager.push(Probe::new("a", &log));
        manager.push(Probe::new("b", &log));
        manager.switch(Probe::new("c", &log));

        let entries = log.borrow();
        assert_eq!(
            *entries,
            vec!["a.enter", "a.exit", "b.enter", "b.exit", "c.enter"]
        );
        // The covered screen was not re-entered, the new top entered once
        assert_eq!(entries.iter().filter(|e| *e == "c.enter").count(), 1);
        assert_eq!(manager.depth(), 2);
    }

    #[test]
    fn switch_on_empty_stack_is_push() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut manager = ScreenManager::new(test_ctx());

        manager.switch(Probe::new("a", &log));

        assert_eq!(*log.borrow(), vec!["a.enter"]);
        assert_eq!(manager.depth(), 1);
    }

    #[test]
    fn frame_fanout_on_empty_stack_is_noop() {
        let mut manager = ScreenManager::new(test_ctx());
        manager.handle_events(&[AppEvent::Resize]);
        manager.update(0.016);
        assert!(manager.is_running());
    }
}
