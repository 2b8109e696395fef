use chrono::Local;
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::Path,
    sync::Mutex,
};

pub trait Logger: Send + Sync {
    fn log(&self, message: &str);
    fn debug_log(&self, message: &str);
}

#[derive(Debug)]
pub struct FileLogger {
    log_file: String,
    debug: bool,
    // serializes appends from concurrent tasks
    write_lock: Mutex<()>,
}

impl FileLogger {
    pub fn new(log_file: &str, debug: bool) -> std::io::Result<Self> {
        // Create log directory if it doesn't exist
        if let Some(parent) = Path::new(log_file).parent() {
            fs::create_dir_all(parent)?;
        }

        Ok(FileLogger {
            log_file: log_file.to_string(),
            debug,
            write_lock: Mutex::new(()),
        })
    }

    fn write_to_file(&self, message: &str) -> std::io::Result<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_file)?;

        writeln!(file, "{}: {}", Local::now().format("%Y-%m-%d %H:%M:%S"), message)
    }
}

impl Logger for FileLogger {
    fn log(&self, message: &str) {
        if let Err(e) = self.write_to_file(message) {
            eprintln!("Failed to write to log file: {}", e);
        }
    }

    fn debug_log(&self, message: &str) {
        if self.debug {
            if let Err(e) = self.write_to_file(&format!("[DEBUG] {}", message)) {
                eprintln!("Failed to write debug log: {}", e);
            }
        }
    }
}

/// Writes to stderr, used for the interactive commands.
#[derive(Debug, Default)]
pub struct ConsoleLogger {
    debug: bool,
}

impl ConsoleLogger {
    pub fn new(debug: bool) -> Self {
        Self { debug }
    }
}

impl Logger for ConsoleLogger {
    fn log(&self, message: &str) {
        eprintln!("[{}] {}", Local::now().format("%H:%M:%S"), message);
    }

    fn debug_log(&self, message: &str) {
        if self.debug {
            eprintln!("[{}] [DEBUG] {}", Local::now().format("%H:%M:%S"), message);
        }
    }
}

// MultiLogger allows logging to multiple destinations
pub struct MultiLogger {
    loggers: Vec<Box<dyn Logger>>,
}

impl MultiLogger {
    pub fn new(loggers: Vec<Box<dyn Logger>>) -> Self {
        Self { loggers }
    }
}

impl Logger for MultiLogger {
    fn log(&self, message: &str) {
        for logger in &self.loggers {
            logger.log(message);
        }
    }

    fn debug_log(&self, message: &str) {
        for logger in &self.loggers {
            logger.debug_log(message);
        }
    }
}
