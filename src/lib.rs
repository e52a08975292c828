pub mod api;
pub mod app;
pub mod auth;
pub mod calendar;
pub mod config;
pub mod days;
pub mod errors;
pub mod habits;
pub mod handlers;
pub mod locale;
pub mod migration;
pub mod models;
pub mod overlay;
pub mod state;
pub mod stats;
pub mod storage;
pub mod templates;
pub mod theme;
pub mod ui;
pub mod validation;

pub use app::router;
pub use config::Config;
pub use state::AppState;
pub use storage::{ClientStore, resolve_data_path};
