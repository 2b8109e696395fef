// src/ui/notifier.rs
use async_trait::async_trait;
use std::io::{self, BufRead, Write};
use std::sync::Arc;

use super::styles::{body_style, prompt_style, title_style};
use crate::types::Severity;
use crate::utils::logging::Logger;

/// Where user-facing messages and yes/no questions go.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, title: &str, body: &str, severity: Severity);

    /// Returns the label the user picked.
    async fn confirm(&self, prompt: &str, affirmative: &str, negative: &str) -> String;
}

fn matches_label(answer: &str, label: &str) -> bool {
    let answer = answer.trim();
    if answer.is_empty() {
        return false;
    }
    answer.eq_ignore_ascii_case(label)
        || label
            .chars()
            .next()
            .map(|c| answer.len() == 1 && answer.eq_ignore_ascii_case(&c.to_string()))
            .unwrap_or(false)
}

pub struct TerminalNotifier;

#[async_trait]
impl NotificationSink for TerminalNotifier {
    async fn notify(&self, title: &str, body: &str, severity: Severity) {
        eprintln!(
            "{} {}",
            title_style(severity).apply(title),
            body_style().apply(body)
        );
    }

    async fn confirm(&self, prompt: &str, affirmative: &str, negative: &str) -> String {
        let prompt = format!("{} [{}/{}] ", prompt, affirmative, negative);
        let line = tokio::task::spawn_blocking(move || -> io::Result<String> {
            let mut stderr = io::stderr();
            write!(stderr, "{}", prompt_style().apply(prompt))?;
            stderr.flush()?;
            let mut line = String::new();
            io::stdin().lock().read_line(&mut line)?;
            Ok(line)
        })
        .await;

        match line {
            Ok(Ok(answer)) if matches_label(&answer, affirmative) => affirmative.to_string(),
            _ => negative.to_string(),
        }
    }
}

/// Headless sink: notifications go to the log, confirmations get a fixed answer.
pub struct LogNotifier {
    logger: Arc<dyn Logger>,
    assume_yes: bool,
}

impl LogNotifier {
    pub fn new(logger: Arc<dyn Logger>, assume_yes: bool) -> Self {
        Self { logger, assume_yes }
    }
}

#[async_trait]
impl NotificationSink for LogNotifier {
    async fn notify(&self, title: &str, body: &str, severity: Severity) {
        self.logger
            .log(&format!("[{}] {}: {}", severity, title, body));
    }

    async fn confirm(&self, prompt: &str, affirmative: &str, negative: &str) -> String {
        let answer = if self.assume_yes { affirmative } else { negative };
        self.logger
            .log(&format!("Confirmation '{}' answered '{}'", prompt, answer));
        answer.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn answers_match_label_or_initial() {
        assert!(matches_label("Delete\n", "Delete"));
        assert!(matches_label("d", "Delete"));
        assert!(matches_label(" YES ", "yes"));
        assert!(!matches_label("", "yes"));
        assert!(!matches_label("no", "yes"));
        assert!(!matches_label("ye", "yes"));
    }

    struct NullLogger;

    impl Logger for NullLogger {
        fn log(&self, _message: &str) {}
        fn debug_log(&self, _message: &str) {}
    }

    #[tokio::test]
    async fn log_notifier_uses_configured_answer() {
        let yes = LogNotifier::new(Arc::new(NullLogger), true);
        assert_eq!(yes.confirm("Delete?", "Delete", "Cancel").await, "Delete");

        let no = LogNotifier::new(Arc::new(NullLogger), false);
        assert_eq!(no.confirm("Delete?", "Delete", "Cancel").await, "Cancel");
    }
}
