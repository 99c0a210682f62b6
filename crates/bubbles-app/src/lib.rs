//! Bubbles Application
//!
//! The canvas controller that ties touch input, engine callbacks and frame
//! drawing together, plus a headless runner for native use.

pub mod cli;
mod controller;
mod error;
pub mod headless;

pub use cli::Cli;
pub use controller::CanvasController;
pub use error::{ClientError, ClientResult};
pub use headless::{HeadlessSummary, load_config, run};
