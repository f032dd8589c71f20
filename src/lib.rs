pub mod app;
pub mod camera;
pub mod config;
pub mod core;
pub mod error;
pub mod input;
pub mod render;
pub mod scenes;

// Re-export commonly used items
pub use app::App;
pub use camera::Camera;
pub use config::AppConfig;
pub use error::AppError;
pub use scenes::{Scene, SceneKind};
