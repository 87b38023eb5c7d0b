//! Panic hook that says which stage and command were running.

use super::context::{current_context, RunContext};
use std::panic::PanicHookInfo;

const VERSION: &str = env!("CARGO_PKG_VERSION");
const RULE: &str = "════════════════════════════════════════════════════════════";

/// Install the crash-report hook. Call once, early in `main`.
pub fn install_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        eprintln!("{}", crash_report(info, &current_context()));
    }));
}

fn crash_report(info: &PanicHookInfo<'_>, context: &RunContext) -> String {
    let location = info
        .location()
        .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()));
    let mut lines = vec![
        String::new(),
        RULE.to_string(),
        format!("ccov {VERSION} crashed ({})", std::env::consts::OS),
        RULE.to_string(),
    ];
    lines.extend(describe(&panic_message(info), location.as_deref(), context));
    if std::env::var_os("RUST_BACKTRACE").is_some() {
        lines.push(std::backtrace::Backtrace::capture().to_string());
    } else {
        lines.push("Run with RUST_BACKTRACE=1 for a stack trace".to_string());
    }
    lines.push(RULE.to_string());
    lines.join("\n")
}

/// Body lines of the report (pure function)
fn describe(message: &str, location: Option<&str>, context: &RunContext) -> Vec<String> {
    let mut lines = vec![format!("panic:    {message}")];
    if let Some(location) = location {
        lines.push(format!("location: {location}"));
    }
    match context.stage {
        Some(stage) => lines.push(format!("stage:    {stage}")),
        None => lines.push("stage:    (none, crashed before the pipeline started)".to_string()),
    }
    if let Some(command) = &context.command {
        lines.push(format!("command:  {command}"));
    }
    lines
}

fn panic_message(info: &PanicHookInfo<'_>) -> String {
    if let Some(s) = info.payload().downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = info.payload().downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}
