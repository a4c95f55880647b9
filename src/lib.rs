pub mod app;
pub mod clock;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod routines;
pub mod schedule;
pub mod state;
pub mod storage;
pub mod ui;
pub mod watcher;

pub use app::router;
pub use config::Config;
pub use schedule::resolve;
pub use state::AppState;
pub use storage::load_data;
