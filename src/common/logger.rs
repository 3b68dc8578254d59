use std::{
    fs::{self, File, OpenOptions},
    io::{self, BufRead, BufReader, Write},
    path::Path,
    sync::{Arc, Mutex},
};

use tracing_subscriber::{
    EnvFilter,
    fmt::{self, time::LocalTime},
    prelude::*,
};

use crate::configs::{Config, LogFileConfig};

/// Builds the filter directive from `[logging]`, e.g. `info,melodeck::player=debug`.
pub fn filter_directive(config: &Config) -> String {
    let level = config
        .logging
        .as_ref()
        .and_then(|l| l.level.as_deref())
        .unwrap_or("info");

    match config.logging.as_ref().and_then(|l| l.filters.as_deref()) {
        Some(filters) if !filters.is_empty() => format!("{level},{filters}"),
        _ => level.to_string(),
    }
}

pub fn init(config: &Config) {
    // RUST_LOG wins over the config file.
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directive(config)));

    // RFC 3339 with milliseconds, in local time.
    let timer = LocalTime::new(time::macros::format_description!(
        "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3][offset_hour sign:mandatory]:[offset_minute]"
    ));

    let stdout_layer = fmt::layer()
        .with_timer(timer.clone())
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .with_file(false);

    let file_layer = config
        .logging
        .as_ref()
        .and_then(|l| l.file.as_ref())
        .map(|file| {
            if let Some(parent) = Path::new(&file.path).parent() {
                if let Err(e) = fs::create_dir_all(parent) {
                    eprintln!("Failed to create log directory: {}", e);
                }
            }
            fmt::layer()
                .with_writer(CircularFileWriter::new(file))
                .with_timer(timer)
                .with_target(true)
                .with_thread_ids(true)
                .with_line_number(true)
                .with_file(false)
                .with_ansi(false)
        });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();
}

/// Appends to a file and trims it back to the newest `max_lines` lines
/// every so often.
#[derive(Clone)]
pub(crate) struct CircularFileWriter {
    path: String,
    max_lines: u32,
    lines_since_prune: Arc<Mutex<u32>>,
}

impl CircularFileWriter {
    fn new(config: &LogFileConfig) -> Self {
        Self {
            path: config.path.clone(),
            max_lines: config.max_lines,
            lines_since_prune: Arc::new(Mutex::new(0)),
        }
    }

    fn prune(&self) -> io::Result<()> {
        if !Path::new(&self.path).exists() {
            return Ok(());
        }

        let reader = BufReader::new(File::open(&self.path)?);
        let lines: Vec<String> = reader.lines().collect::<Result<_, _>>()?;

        if lines.len() > self.max_lines as usize {
            let start = lines.len() - self.max_lines as usize;
            let mut file = File::create(&self.path)?;
            for line in &lines[start..] {
                writeln!(file, "{}", line)?;
            }
        }
        Ok(())
    }
}

impl io::Write for CircularFileWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(buf)?;

        let mut pending = self
            .lines_since_prune
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        *pending += buf.iter().filter(|&&b| b == b'\n').count() as u32;

        // Prune after 10% of max_lines (at least 50) new lines.
        if *pending >= (self.max_lines / 10).max(50) {
            if let Err(e) = self.prune() {
                eprintln!("Failed to prune log file: {}", e);
            }
            *pending = 0;
        }

        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> fmt::MakeWriter<'a> for CircularFileWriter {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
