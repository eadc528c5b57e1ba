//! Console shell: input parsing, rendering, and the event loop tying them to the controller.

pub mod app;
pub mod console;

pub use app::ShellApp;
