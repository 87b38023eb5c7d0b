//! Thread-local record of which stage and command are in flight.
//!
//! The pipeline is single-threaded, so a thread-local is enough. Guards
//! restore the previous value on drop, which keeps nested updates (command
//! inside stage) correct even when a stage returns early with `?`.

use crate::pipeline::Stage;
use std::cell::RefCell;

thread_local! {
    static CURRENT_CONTEXT: RefCell<RunContext> = const { RefCell::new(RunContext::new()) };
}

/// What ccov was doing at a given moment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunContext {
    pub stage: Option<Stage>,
    /// Rendered command line, secrets masked
    pub command: Option<String>,
}

impl RunContext {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            stage: None,
            command: None,
        }
    }
}

/// Restores the previous context when dropped.
pub struct ContextGuard {
    previous: RunContext,
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        let previous = std::mem::take(&mut self.previous);
        CURRENT_CONTEXT.with(|ctx| *ctx.borrow_mut() = previous);
    }
}

fn update(change: impl FnOnce(&mut RunContext)) -> ContextGuard {
    CURRENT_CONTEXT.with(|ctx| {
        let previous = ctx.borrow().clone();
        change(&mut *ctx.borrow_mut());
        ContextGuard { previous }
    })
}

#[must_use]
pub fn enter_stage(stage: Stage) -> ContextGuard {
    update(|ctx| {
        ctx.stage = Some(stage);
        ctx.command = None;
    })
}

#[must_use]
pub fn enter_command(command: impl Into<String>) -> ContextGuard {
    let command = command.into();
    update(move |ctx| ctx.command = Some(command))
}

#[must_use]
pub fn current_context() -> RunContext {
    CURRENT_CONTEXT.with(|ctx| ctx.borrow().clone())
}
