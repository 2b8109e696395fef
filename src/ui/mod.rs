// src/ui/mod.rs
mod notifier;
mod render;
mod styles;

pub use notifier::{LogNotifier, NotificationSink, TerminalNotifier};
pub use render::{
    format_contexts, format_import_candidates, render_contexts, render_import_candidates,
};
