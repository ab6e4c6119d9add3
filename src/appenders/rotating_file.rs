//! Daily rotating file appender
//!
//! Writes one formatted JSON line per record into
//! `<dirname>/<filename>`, where `%DATE%` in the filename expands to the
//! local date (`YYYY-MM-DD`). A new file is opened when the date changes;
//! the previous one can be gzip-archived.

use crate::core::appender::Appender;
use crate::core::error::{LoggerError, Result};
use crate::core::log_entry::LogRecord;
use crate::core::output_format::RecordFormatter;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Placeholder replaced by the current date in file name patterns
pub const DATE_PLACEHOLDER: &str = "%DATE%";

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Configuration for [`DailyRotateFileAppender`]
///
/// # Examples
///
/// ```
/// use rust_context_logger::appenders::DailyRotateOptions;
///
/// let options = DailyRotateOptions::new("app-%DATE%.log", "/var/log/app")
///     .with_zipped_archive(true);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct DailyRotateOptions {
    /// File name pattern, `%DATE%` is appended as `.%DATE%` when missing
    pub filename: String,
    pub dirname: PathBuf,
    /// Gzip the previous day's file after rotation
    pub zipped_archive: bool,
}

impl DailyRotateOptions {
    pub fn new(filename: impl Into<String>, dirname: impl Into<PathBuf>) -> Self {
        Self {
            filename: filename.into(),
            dirname: dirname.into(),
            zipped_archive: false,
        }
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_zipped_archive(mut self, enabled: bool) -> Self {
        self.zipped_archive = enabled;
        self
    }

    fn pattern(&self) -> String {
        if self.filename.contains(DATE_PLACEHOLDER) {
            self.filename.clone()
        } else {
            format!("{}.{}", self.filename, DATE_PLACEHOLDER)
        }
    }
}

fn today() -> String {
    chrono::Local::now().format(DATE_FORMAT).to_string()
}

/// The synchronous half: owns the open file and performs rotation
struct DailyWriter {
    dirname: PathBuf,
    pattern: String,
    zipped_archive: bool,
    current_date: String,
    current_path: PathBuf,
    writer: Option<BufWriter<File>>,
}

impl DailyWriter {
    fn open(options: &DailyRotateOptions, date: String) -> Result<Self> {
        fs::create_dir_all(&options.dirname).map_err(|e| {
            LoggerError::io_operation(
                "create log directory",
                format!("Failed to create directory '{}'", options.dirname.display()),
                e,
            )
        })?;

        let pattern = options.pattern();
        let current_path = options.dirname.join(pattern.replace(DATE_PLACEHOLDER, &date));
        let writer = Some(BufWriter::new(Self::open_file(&current_path)?));

        Ok(Self {
            dirname: options.dirname.clone(),
            pattern,
            zipped_archive: options.zipped_archive,
            current_date: date,
            current_path,
            writer,
        })
    }

    fn open_file(path: &Path) -> Result<File> {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| {
                LoggerError::file_appender(path.display().to_string(), format!("Failed to open: {}", e))
            })
    }

    fn path_for(&self, date: &str) -> PathBuf {
        self.dirname.join(self.pattern.replace(DATE_PLACEHOLDER, date))
    }

    fn write_line(&mut self, line: &str) -> Result<()> {
        self.write_line_on(today(), line)
    }

    fn write_line_on(&mut self, date: String, line: &str) -> Result<()> {
        if date != self.current_date {
            self.rotate_to(date)?;
        }

        let path = self.current_path.display().to_string();
        let Some(writer) = self.writer.as_mut() else {
            return Err(LoggerError::file_appender(path, "Writer not initialized"));
        };

        let written = writer.write_all(line.as_bytes());
        written
            .and_then(|_| writer.write_all(b"\n"))
            .and_then(|_| writer.flush())
            .map_err(|e| LoggerError::file_appender(path, format!("Failed to write log entry: {}", e)))
    }

    fn rotate_to(&mut self, date: String) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush().map_err(|e| {
                LoggerError::file_rotation(
                    self.current_path.display().to_string(),
                    format!("Failed to flush before rotation: {}", e),
                )
            })?;
        }

        let next = self.path_for(&date);
        let previous = std::mem::replace(&mut self.current_path, next);
        self.current_date = date;
        self.writer = Some(BufWriter::new(Self::open_file(&self.current_path)?));

        if self.zipped_archive && previous.exists() {
            // A failed archive leaves the plain file behind; logging continues.
            if let Err(e) = compress_file(&previous) {
                tracing::warn!(path = %previous.display(), error = %e, "log archive compression failed");
            }
        }

        Ok(())
    }
}

impl Drop for DailyWriter {
    fn drop(&mut self) {
        if let Some(mut writer) = self.writer.take() {
            let _ = writer.flush();
        }
    }
}

/// Path of the archive produced for `path`
pub fn archive_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".gz");
    PathBuf::from(name)
}

/// Gzip `path` next to itself, removing the original only once the archive
/// is complete.
fn compress_file(path: &Path) -> Result<()> {
    use std::io::BufReader;

    let gz_path = archive_path(path);
    let mut tmp_name = gz_path.as_os_str().to_os_string();
    tmp_name.push(".tmp");
    let temp_gz_path = PathBuf::from(tmp_name);

    let input = File::open(path).map_err(|e| {
        LoggerError::io_operation(
            "compress log file",
            format!("Failed to open file for compression: {}", path.display()),
            e,
        )
    })?;
    let mut reader = BufReader::with_capacity(64 * 1024, input);

    let output = File::create(&temp_gz_path).map_err(|e| {
        LoggerError::io_operation(
            "compress log file",
            format!("Failed to create temporary compressed file: {}", temp_gz_path.display()),
            e,
        )
    })?;
    let mut encoder = flate2::write::GzEncoder::new(
        BufWriter::with_capacity(64 * 1024, output),
        flate2::Compression::default(),
    );

    let copied = std::io::copy(&mut reader, &mut encoder)
        .and_then(|_| encoder.finish())
        .and_then(|mut inner| inner.flush());
    if let Err(e) = copied {
        let _ = fs::remove_file(&temp_gz_path);
        return Err(LoggerError::io_operation(
            "compress log file",
            format!("Failed to compress {}", path.display()),
            e,
        ));
    }

    fs::rename(&temp_gz_path, &gz_path).map_err(|e| {
        let _ = fs::remove_file(&temp_gz_path);
        LoggerError::io_operation(
            "compress log file",
            format!("Failed to rename compressed file to: {}", gz_path.display()),
            e,
        )
    })?;

    if let Err(e) = fs::remove_file(path) {
        tracing::warn!(
            path = %path.display(),
            error = %e,
            "archive written but original log file could not be removed"
        );
    }

    Ok(())
}

/// Structured file sink rotating once per day.
///
/// # Examples
///
/// ```no_run
/// use rust_context_logger::appenders::{DailyRotateFileAppender, DailyRotateOptions};
/// use rust_context_logger::core::RecordFormatter;
///
/// let appender = DailyRotateFileAppender::new(
///     DailyRotateOptions::new("app-%DATE%.log", "/var/log/app"),
///     RecordFormatter::new(),
/// )
/// .unwrap();
/// ```
pub struct DailyRotateFileAppender {
    writer: Arc<Mutex<DailyWriter>>,
    formatter: RecordFormatter,
}

impl DailyRotateFileAppender {
    /// Create the directory and open today's file
    ///
    /// # Errors
    ///
    /// Returns error if the directory or file cannot be created
    pub fn new(options: DailyRotateOptions, formatter: RecordFormatter) -> Result<Self> {
        let writer = DailyWriter::open(&options, today())?;
        Ok(Self {
            writer: Arc::new(Mutex::new(writer)),
            formatter,
        })
    }

    /// Path of the file currently written to
    pub fn current_path(&self) -> PathBuf {
        self.writer.lock().current_path.clone()
    }
}

#[async_trait]
impl Appender for DailyRotateFileAppender {
    async fn append(&self, record: &LogRecord) -> Result<()> {
        let line = self.formatter.format(record)?;
        let writer = Arc::clone(&self.writer);

        tokio::task::spawn_blocking(move || writer.lock().write_line(&line))
            .await
            .map_err(|e| LoggerError::WriterTask(e.to_string()))?
    }

    fn name(&self) -> &str {
        "file"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::LogLevel;
    use flate2::read::GzDecoder;
    use std::io::Read;
    use tempfile::tempdir;

    #[test]
    fn test_pattern_gets_date_suffix() {
        let options = DailyRotateOptions::new("app.log", "/tmp");
        assert_eq!(options.pattern(), "app.log.%DATE%");

        let options = DailyRotateOptions::new("app-%DATE%.log", "/tmp");
        assert_eq!(options.pattern(), "app-%DATE%.log");
    }

    #[test]
    fn test_creates_directory_and_dated_file() {
        let dir = tempdir().unwrap();
        let logs = dir.path().join("nested").join("logs");

        let writer = DailyWriter::open(&DailyRotateOptions::new("svc-%DATE%.log", &logs), "2026-01-02".into()).unwrap();

        assert_eq!(writer.current_path, logs.join("svc-2026-01-02.log"));
        assert!(writer.current_path.exists());
    }

    #[test]
    fn test_directory_failure_carries_operation() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "").unwrap();

        let err = DailyRotateFileAppender::new(
            DailyRotateOptions::new("svc.log", blocker.join("logs")),
            RecordFormatter::new(),
        )
        .err()
        .unwrap();

        assert!(matches!(err, LoggerError::IoOperation { .. }));
        assert!(err.to_string().contains("create log directory"));
    }

    #[test]
    fn test_rotates_when_date_changes() {
        let dir = tempdir().unwrap();
        let options = DailyRotateOptions::new("svc-%DATE%.log", dir.path());
        let mut writer = DailyWriter::open(&options, "2026-01-02".into()).unwrap();

        writer.write_line_on("2026-01-02".into(), "{\"n\":1}").unwrap();
        writer.write_line_on("2026-01-02".into(), "{\"n\":2}").unwrap();
        writer.write_line_on("2026-01-03".into(), "{\"n\":3}").unwrap();

        let first = fs::read_to_string(dir.path().join("svc-2026-01-02.log")).unwrap();
        let second = fs::read_to_string(dir.path().join("svc-2026-01-03.log")).unwrap();
        assert_eq!(first.lines().count(), 2);
        assert_eq!(second, "{\"n\":3}\n");
    }

    #[test]
    fn test_zipped_archive() {
        let dir = tempdir().unwrap();
        let options = DailyRotateOptions::new("svc-%DATE%.log", dir.path()).with_zipped_archive(true);
        let mut writer = DailyWriter::open(&options, "2026-01-02".into()).unwrap();

        writer.write_line_on("2026-01-02".into(), "old").unwrap();
        writer.write_line_on("2026-01-03".into(), "new").unwrap();

        let old_path = dir.path().join("svc-2026-01-02.log");
        assert!(!old_path.exists());

        let mut decoded = String::new();
        GzDecoder::new(File::open(archive_path(&old_path)).unwrap())
            .read_to_string(&mut decoded)
            .unwrap();
        assert_eq!(decoded, "old\n");
    }

    #[tokio::test]
    async fn test_appender_writes_json_lines() {
        let dir = tempdir().unwrap();
        let appender = DailyRotateFileAppender::new(
            DailyRotateOptions::new("app-%DATE%.log", dir.path()),
            RecordFormatter::new(),
        )
        .unwrap();

        appender.append(&LogRecord::new(LogLevel::Warn, "disk low")).await.unwrap();
        appender.append(&LogRecord::new(LogLevel::Log, "recovered")).await.unwrap();

        let content = fs::read_to_string(appender.current_path()).unwrap();
        let lines: Vec<serde_json::Value> = content
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["message"], "disk low");
        assert_eq!(lines[1]["level"], "info");
    }
}
