use std::collections::HashMap;
use std::fs;
use std::path::Path;

use rand::Rng;
use serde::Deserialize;
use thiserror::Error;

use crate::config::{DataPaths, Settings};
use crate::stats::StatsRecord;
use crate::util::round2;

/// Keys a target can demand, drawn uniformly alongside the target itself
pub const KEY_POOL: [char; 10] = [' ', 'w', 's', 'd', 'f', 'g', 'h', 'j', 'k', 'l'];

/// Concurrent on-screen entity cap; spawning past it evicts the oldest
pub const MAX_ACTIVE: usize = 4;

pub const SPAWN_INTERVAL: f64 = 1.0;
pub const DAY_NIGHT_PERIOD: f64 = 30.0;

/// Entity square edge in model pixels
pub const ENTITY_SIZE: f64 = 100.0;

/// Upward drift in model pixels per second
pub const RISE_SPEED: f64 = 120.0;

const HOLD_EPSILON: f64 = 2.0;
const STARTING_LIVES: u32 = 3;
const LATTICE_STEP: f64 = 50.0;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TrainerError {
    #[error("no targets available in the entity pool")]
    NoTargetsAvailable,
}

/// One descriptor from the day/night pool files. The `image` key doubles
/// as the sprite lookup key and the identity compared during selection.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EntityKind {
    pub image: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// A spawned target drifting up toward its lattice cell
#[derive(Debug, Clone)]
pub struct Entity {
    pub kind: EntityKind,
    pub x: f64,
    pub y: f64,
    pub target_y: f64,
    pub spawned_at: f64,
}

impl Entity {
    fn new(kind: EntityKind, x: f64, target_y: f64, spawned_at: f64) -> Self {
        Self {
            kind,
            x,
            y: target_y + ENTITY_SIZE,
            target_y,
            spawned_at,
        }
    }

    pub fn update(&mut self, dt: f64) {
        if (self.y - self.target_y).abs() > HOLD_EPSILON {
            self.y = (self.y - RISE_SPEED * dt).max(self.target_y);
        }
    }

    pub fn contains(&self, px: f64, py: f64) -> bool {
        px >= self.x && px < self.x + ENTITY_SIZE && py >= self.y && py < self.y + ENTITY_SIZE
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayPhase {
    Day,
    Night,
}

impl DayPhase {
    pub fn toggled(self) -> Self {
        match self {
            DayPhase::Day => DayPhase::Night,
            DayPhase::Night => DayPhase::Day,
        }
    }

    pub fn background_key(self) -> &'static str {
        match self {
            DayPhase::Day => "background_trainer_day",
            DayPhase::Night => "background_trainer_night",
        }
    }
}

/// What happened during a model step, for the screen to react to
/// (sound cues, persistence, navigation)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainerEvent {
    Hit,
    LifeLost,
    GameOver,
    PhaseChanged(DayPhase),
    /// The active pool drained and no new target could be drawn
    TargetUnavailable,
}

/// Read one entity pool file; malformed or missing files yield an empty
/// pool rather than an error.
pub fn load_pool(path: &Path) -> Vec<EntityKind> {
    match fs::read(path) {
        Ok(bytes) => match serde_json::from_slice::<Vec<EntityKind>>(&bytes) {
            Ok(pool) => pool,
            Err(err) => {
                tracing::warn!("malformed entity pool {path:?}: {err}");
                Vec::new()
            }
        },
        Err(err) => {
            tracing::debug!("missing entity pool {path:?}: {err}");
            Vec::new()
        }
    }
}

/// Session state of the recognition mini-game. Performs no I/O; every
/// random draw goes through the injected `Rng`.
#[derive(Debug)]
pub struct TrainerModel {
    day_pool: Vec<EntityKind>,
    night_pool: Vec<EntityKind>,
    pub phase: DayPhase,
    pub entities: Vec<Entity>,
    pub current_target: Option<EntityKind>,
    pub current_target_key: Option<char>,
    pub lives: u32,
    pub score: u32,
    pub current_focus: f64,
    pub max_focus: f64,
    pub errors: HashMap<String, u32>,
    pub game_running: bool,
    pub current_game_time: f64,
    spawn_timer: f64,
    phase_timer: f64,
    lattice_x: Vec<f64>,
    lattice_y: Vec<f64>,
}

impl TrainerModel {
    pub fn new(
        settings: &Settings,
        day_pool: Vec<EntityKind>,
        night_pool: Vec<EntityKind>,
    ) -> Self {
        let mut lattice_x = Vec::new();
        let mut x = 100.0;
        while x < settings.screen_w as f64 - 180.0 {
            lattice_x.push(x);
            x += LATTICE_STEP;
        }
        let mut lattice_y = Vec::new();
        let mut y = 300.0;
        while y < (settings.screen_h as f64 - 120.0).min(600.0) {
            lattice_y.push(y);
            y += LATTICE_STEP;
        }

        Self {
            day_pool,
            night_pool,
            phase: DayPhase::Day,
            entities: Vec::new(),
            current_target: None,
            current_target_key: None,
            lives: STARTING_LIVES,
            score: 0,
            current_focus: 0.0,
            max_focus: 0.0,
            errors: HashMap::new(),
            game_running: true,
            current_game_time: 0.0,
            spawn_timer: 0.0,
            phase_timer: 0.0,
            lattice_x,
            lattice_y,
        }
    }

    /// Build a session from the on-disk pool files.
    pub fn load(settings: &Settings, paths: &DataPaths) -> Self {
        let day_pool = load_pool(&paths.entities(true));
        let night_pool = load_pool(&paths.entities(false));
        Self::new(settings, day_pool, night_pool)
    }

    pub fn pool(&self) -> &[EntityKind] {
        match self.phase {
            DayPhase::Day => &self.day_pool,
            DayPhase::Night => &self.night_pool,
        }
    }

    /// Draw the first target and seed the screen with one entity.
    pub fn start(&mut self, rng: &mut impl Rng) -> Result<(), TrainerError> {
        self.pick_new_target(rng)?;
        self.spawn_entity(rng);
        Ok(())
    }

    /// Draw a target descriptor and required key uniformly from the
    /// active pool and the key set.
    pub fn pick_new_target(&mut self, rng: &mut impl Rng) -> Result<(), TrainerError> {
        let pool = self.pool();
        if pool.is_empty() {
            return Err(TrainerError::NoTargetsAvailable);
        }
        let kind = pool[rng.gen_range(0..pool.len())].clone();
        self.current_target = Some(kind);
        self.current_target_key = Some(KEY_POOL[rng.gen_range(0..KEY_POOL.len())]);
        Ok(())
    }

    /// Advance the session by `dt` seconds.
    pub fn update(&mut self, dt: f64, rng: &mut impl Rng) -> Vec<TrainerEvent> {
        let mut events = Vec::new();
        if !self.game_running {
            return events;
        }

        self.spawn_timer += dt;
        self.current_game_time += dt;

        for entity in &mut self.entities {
            entity.update(dt);
        }

        // One toggle per whole elapsed period, no matter how uneven dt is
        self.phase_timer += dt;
        while self.phase_timer >= DAY_NIGHT_PERIOD {
            self.phase_timer -= DAY_NIGHT_PERIOD;
            self.phase = self.phase.toggled();
            events.push(TrainerEvent::PhaseChanged(self.phase));
        }

        if self.spawn_timer > SPAWN_INTERVAL {
            events.extend(self.spawn_entity(rng));
            self.spawn_timer = 0.0;
        }

        self.current_focus += dt;
        self.max_focus = self.max_focus.max(self.current_focus);

        events
    }

    /// Spawn a new entity at a random lattice cell, evicting the oldest
    /// when the cap is exceeded. An evicted current target escaped
    /// off-screen and costs a life.
    pub fn spawn_entity(&mut self, rng: &mut impl Rng) -> Vec<TrainerEvent> {
        let mut events = Vec::new();
        if self.pool().is_empty() || self.lattice_x.is_empty() || self.lattice_y.is_empty() {
            return events;
        }

        if self.entities.len() > MAX_ACTIVE - 1 {
            let evicted = self.entities.remove(0);
            if Some(&evicted.kind) == self.current_target.as_ref() {
                events.extend(self.lose_life());
            }
        }

        let kind = {
            let pool = self.pool();
            pool[rng.gen_range(0..pool.len())].clone()
        };
        let x = self.lattice_x[rng.gen_range(0..self.lattice_x.len())];
        let y = self.lattice_y[rng.gen_range(0..self.lattice_y.len())];
        self.entities
            .push(Entity::new(kind, x, y, self.current_game_time));

        events
    }

    /// Evaluate a key press at a cursor position. Only the topmost entity
    /// under the cursor is considered: a hit when its descriptor equals
    /// the current target and the key matches, otherwise a miss.
    pub fn handle_selection(
        &mut self,
        cursor: (f64, f64),
        key: char,
        rng: &mut impl Rng,
    ) -> Vec<TrainerEvent> {
        let mut events = Vec::new();
        if !self.game_running {
            return events;
        }
        // Entities render in spawn order, so the last match is on top
        let Some(idx) = self
            .entities
            .iter()
            .rposition(|e| e.contains(cursor.0, cursor.1))
        else {
            return events;
        };

        let is_hit = self.current_target.as_ref() == Some(&self.entities[idx].kind)
            && self.current_target_key == Some(key);
        if is_hit {
            self.score += 1;
            self.entities.remove(idx);
            events.push(TrainerEvent::Hit);
            if self.pick_new_target(rng).is_err() {
                self.current_target = None;
                self.current_target_key = None;
                events.push(TrainerEvent::TargetUnavailable);
            }
        } else {
            events.extend(self.lose_life());
        }
        events
    }

    fn lose_life(&mut self) -> Vec<TrainerEvent> {
        self.lives = self.lives.saturating_sub(1);
        self.current_focus = 0.0;
        if let Some(target) = &self.current_target {
            *self.errors.entry(target.image.clone()).or_insert(0) += 1;
        }
        if self.lives == 0 {
            self.game_running = false;
            vec![TrainerEvent::GameOver]
        } else {
            vec![TrainerEvent::LifeLost]
        }
    }

    /// Snapshot for the stats store once the session ended.
    pub fn session_record(&self, timestamp: String) -> StatsRecord {
        StatsRecord {
            score: self.score,
            max_focus: self.max_focus,
            errors: self.errors.clone(),
            time: round2(self.current_game_time),
            timestamp,
        }
    }
}
