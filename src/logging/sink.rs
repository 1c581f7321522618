// SPDX-License-Identifier: Apache-2.0 OR MIT
// Output sinks for flushed log lines

use chrono::{DateTime, Local, NaiveDate};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Default rotation threshold: 10 MiB
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Byte sink for completed log lines.
///
/// Returns the number of bytes written, or -1 on failure. Sink failures
/// must never propagate into the logging call site; implementations catch
/// their own errors.
pub trait LogSink: Send + Sync {
    fn write(&self, buf: &[u8]) -> isize;
}

/// Sink that writes to standard output. The default for new loggers.
pub struct StdoutSink;

impl LogSink for StdoutSink {
    fn write(&self, buf: &[u8]) -> isize {
        match std::io::stdout().lock().write_all(buf) {
            Ok(()) => buf.len() as isize,
            Err(_) => -1,
        }
    }
}

/// Sink that discards everything.
pub struct NullSink;

impl LogSink for NullSink {
    fn write(&self, _buf: &[u8]) -> isize {
        0
    }
}

struct ActiveFile {
    file: File,
    /// Local date the active file was opened under; a change triggers
    /// rotation on the next write.
    date: NaiveDate,
    /// Bytes written into the active file by this sink.
    written: u64,
}

/// File sink with size- and day-triggered rollover.
///
/// The active file is `<dir>/logfile_YYYYMMDD.txt`. A write rotates first
/// when the file is not open yet, when the local date has changed since the
/// last write, or when the write would bring the file to `max_size` bytes
/// or beyond. Rotation renames the active file to
/// `<dir>/logfile_YYYYMMDD_HHMMSS.txt` and opens a fresh file for today.
///
/// Any I/O failure re-emits the payload on stderr and reports -1; the
/// logging call site keeps running.
pub struct RotatingFileSink {
    dir: PathBuf,
    max_size: u64,
    state: Mutex<Option<ActiveFile>>,
}

impl RotatingFileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self::with_max_size(dir, DEFAULT_MAX_FILE_SIZE)
    }

    pub fn with_max_size(dir: impl Into<PathBuf>, max_size: u64) -> Self {
        assert!(max_size > 0, "max file size must be non-zero");
        Self {
            dir: dir.into(),
            max_size,
            state: Mutex::new(None),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn active_path(&self, date: NaiveDate) -> PathBuf {
        self.dir
            .join(format!("logfile_{}.txt", date.format("%Y%m%d")))
    }

    fn rotated_path(&self, date: NaiveDate, now: &DateTime<Local>) -> PathBuf {
        self.dir.join(format!(
            "logfile_{}_{}.txt",
            date.format("%Y%m%d"),
            now.format("%H%M%S")
        ))
    }

    fn try_write(&self, buf: &[u8]) -> std::io::Result<()> {
        let mut state = self.state.lock().unwrap();
        let now = Local::now();
        let today = now.date_naive();

        let rotate = match state.as_ref() {
            None => true,
            Some(active) => {
                should_rotate(active.date, today, active.written, buf.len() as u64, self.max_size)
            }
        };

        if rotate {
            if let Some(old) = state.take() {
                // Close before renaming.
                drop(old.file);
                fs::rename(self.active_path(old.date), self.rotated_path(old.date, &now))?;
            }
            fs::create_dir_all(&self.dir)?;
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(self.active_path(today))?;
            *state = Some(ActiveFile {
                file,
                date: today,
                written: 0,
            });
        }

        let active = state.as_mut().unwrap();
        active.file.write_all(buf)?;
        active.written += buf.len() as u64;
        Ok(())
    }
}

impl LogSink for RotatingFileSink {
    fn write(&self, buf: &[u8]) -> isize {
        match self.try_write(buf) {
            Ok(()) => buf.len() as isize,
            Err(_) => {
                // Keep the payload: emit it on stderr instead.
                let _ = std::io::stderr().lock().write_all(buf);
                -1
            }
        }
    }
}

/// Size/day rotation decision, split out so the date trigger is testable
/// without moving the wall clock.
fn should_rotate(
    opened_on: NaiveDate,
    today: NaiveDate,
    written: u64,
    incoming: u64,
    max_size: u64,
) -> bool {
    if opened_on != today {
        return true;
    }
    written > 0 && written + incoming >= max_size
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stdout_sink_reports_length() {
        let sink = StdoutSink;
        assert_eq!(sink.write(b"stdout sink test\n"), 17);
    }

    #[test]
    fn test_null_sink_discards() {
        let sink = NullSink;
        assert_eq!(sink.write(b"dropped"), 0);
    }

    #[test]
    fn test_should_rotate_on_date_change() {
        let yesterday = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let today = NaiveDate::from_ymd_opt(2024, 3, 2).unwrap();
        assert!(should_rotate(yesterday, today, 0, 10, 1024));
        assert!(!should_rotate(today, today, 0, 10, 1024));
    }

    #[test]
    fn test_should_rotate_size_boundary() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        // 127 of 128 bytes written in one call: no rotation
        assert!(!should_rotate(day, day, 0, 127, 128));
        // the 128th byte triggers it
        assert!(should_rotate(day, day, 127, 1, 128));
        // a fresh file never rotates, however large the payload
        assert!(!should_rotate(day, day, 0, 4096, 128));
    }

    #[test]
    fn test_first_write_creates_active_file() {
        let dir = tempfile::tempdir().unwrap();
        let sink = RotatingFileSink::new(dir.path());

        assert_eq!(sink.write(b"first line\n"), 11);

        let expected = format!("logfile_{}.txt", Local::now().format("%Y%m%d"));
        let content = fs::read_to_string(dir.path().join(&expected)).unwrap();
        assert_eq!(content, "first line\n");
    }

    #[test]
    fn test_size_rotation_keeps_both_payloads() {
        let dir = tempfile::tempdir().unwrap();
        let sink = RotatingFileSink::with_max_size(dir.path(), 128);

        let first = vec![b'a'; 65];
        let second = vec![b'b'; 65];
        assert_eq!(sink.write(&first), 65);
        assert_eq!(sink.write(&second), 65);

        let mut names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names.len(), 2, "expected rotated + active file: {:?}", names);

        // The active (shorter) name holds the second payload, the rotated
        // one the first.
        let active = names.iter().find(|n| n.len() == "logfile_20240301.txt".len()).unwrap();
        let rotated = names.iter().find(|n| *n != active).unwrap();
        assert_eq!(fs::read(dir.path().join(rotated)).unwrap(), first);
        assert_eq!(fs::read(dir.path().join(active)).unwrap(), second);
    }

    #[test]
    fn test_no_rotation_below_threshold() {
        let dir = tempfile::tempdir().unwrap();
        let sink = RotatingFileSink::with_max_size(dir.path(), 128);

        sink.write(&vec![b'x'; 60]);
        sink.write(&vec![b'y'; 60]);

        let count = fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_write_failure_returns_negative() {
        // A file path in place of a directory makes every open fail.
        let file = tempfile::NamedTempFile::new().unwrap();
        let sink = RotatingFileSink::new(file.path());
        assert_eq!(sink.write(b"lost\n"), -1);
    }
}
