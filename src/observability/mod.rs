//! Crash reporting.
//!
//! The pipeline records the stage and command it is in; the panic hook
//! prints them so a crash report points at the step that blew up.
//!
//! ```ignore
//! use ccov::observability::{enter_stage, install_panic_hook};
//! use ccov::pipeline::Stage;
//!
//! install_panic_hook();
//! let _stage = enter_stage(Stage::Fix);
//! ```

pub mod context;
pub mod panic_hook;

pub use context::{current_context, enter_command, enter_stage, ContextGuard, RunContext};
pub use panic_hook::install_panic_hook;
