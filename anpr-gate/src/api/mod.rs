//! HTTP API for anpr-gate

pub mod dashboard;
pub mod gate;
pub mod health;
pub mod ui;

pub use dashboard::dashboard_routes;
pub use gate::gate_routes;
pub use health::health_routes;
pub use ui::ui_routes;
