//! Terminal User Interface module.
//!
//! - `loop_runner` - Main event loop and terminal management
//! - `input` - Keyboard and paste handling
//! - `events` - Background task event processing
//! - `render` - Layout and render dispatch
//! - `helpers` - Panic capture for background tasks, spinner frames
//! - `timeline` - Timeline list widget
//! - `banner` - Copy-notification banner widget
//! - `status` - Status bar widget

mod banner;
mod events;
mod helpers;
mod input;
mod loop_runner;
mod render;
mod status;
mod timeline;

pub(crate) use helpers::catch_task_panic;
pub use loop_runner::{run, Action};
