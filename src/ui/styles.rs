use crossterm::style::{Color, ContentStyle, Stylize};

use crate::types::Severity;

pub fn title_style(severity: Severity) -> ContentStyle {
    let color = match severity {
        Severity::Info => Color::Cyan,
        Severity::Warning => Color::Yellow,
        Severity::Error => Color::Red,
    };
    ContentStyle::new().with(color).bold()
}

pub fn body_style() -> ContentStyle {
    ContentStyle::new().with(Color::White)
}

pub fn prompt_style() -> ContentStyle {
    ContentStyle::new().with(Color::Yellow).bold()
}

pub fn current_marker_style() -> ContentStyle {
    ContentStyle::new().with(Color::Green).bold()
}

pub fn dim_style() -> ContentStyle {
    ContentStyle::new().with(Color::DarkGrey)
}
