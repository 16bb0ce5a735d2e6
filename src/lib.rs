// Library surface for headless/integration tests and reuse.
// Keep this lean to avoid coupling to bin-only types in main.rs.
pub mod assets;
pub mod charting;
pub mod config;
pub mod dashboard;
pub mod diagnosis;
pub mod menu;
pub mod runtime;
pub mod screen;
pub mod stats;
pub mod trainer;
pub mod util;
