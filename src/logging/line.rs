// SPDX-License-Identifier: Apache-2.0 OR MIT
// Log line assembly: metadata prefix plus typed field appenders
//
// In-buffer layout of one line:
//   LEVEL SP TIMESTAMP SP TID [SP FILE:LINE] SP MESSAGE LF

use super::core::core;
use super::digits::{format_signed, format_unsigned};
use super::time::{current_thread_id, Time};
use super::Level;

/// Source position captured at the logging call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogLoc {
    file: &'static str,
    function: &'static str,
    line: u32,
}

impl LogLoc {
    pub const fn new(file: &'static str, function: &'static str, line: u32) -> Self {
        Self {
            file,
            function,
            line,
        }
    }

    /// A location that suppresses the FILE:LINE segment.
    pub const fn none() -> Self {
        Self::new("", "", 0)
    }

    pub const fn is_empty(&self) -> bool {
        self.line == 0
    }

    pub const fn file(&self) -> &'static str {
        self.file
    }

    pub const fn function(&self) -> &'static str {
        self.function
    }

    pub const fn line(&self) -> u32 {
        self.line
    }
}

/// One in-flight log line.
///
/// Constructing the value writes the metadata prefix into the calling
/// thread's ring buffer; `append` adds message fields; dropping the value
/// terminates the line and flushes it through the thread's sink. The level
/// gate is checked by the `log_*` macros before a `LogLine` is built.
pub struct LogLine {
    count: usize,
}

impl LogLine {
    pub fn new(level: Level, loc: LogLoc) -> Self {
        let mut line = LogLine { count: 0 };
        line.push_bytes(level.as_str().as_bytes());
        line.push_bytes(b" ");
        line.push_bytes(Time::now().format_milli().as_bytes());
        line.push_bytes(b" ");
        line.push_unsigned(current_thread_id() as u64);
        line.append(loc);
        line.push_bytes(b" ");
        line
    }

    /// Append one typed field to the message.
    pub fn append<T: LogField>(&mut self, value: T) -> &mut Self {
        value.append_to(self);
        self
    }

    fn push_bytes(&mut self, bytes: &[u8]) {
        core().produce(bytes);
        self.count += bytes.len();
    }

    fn push_unsigned(&mut self, v: u64) {
        let mut buf = [0u8; 20];
        let n = format_unsigned(v, &mut buf);
        self.push_bytes(&buf[..n]);
    }

    fn push_signed(&mut self, v: i64) {
        let mut buf = [0u8; 21];
        let n = format_signed(v, &mut buf);
        self.push_bytes(&buf[..n]);
    }
}

impl Drop for LogLine {
    fn drop(&mut self) {
        self.push_bytes(b"\n");
        core().flush(self.count as u32);
    }
}

/// Types that can be appended to a [`LogLine`] as a message field.
pub trait LogField {
    fn append_to(self, line: &mut LogLine);
}

macro_rules! impl_log_field_unsigned {
    ($($t:ty),*) => {
        $(impl LogField for $t {
            fn append_to(self, line: &mut LogLine) {
                line.push_unsigned(self as u64);
            }
        })*
    };
}

macro_rules! impl_log_field_signed {
    ($($t:ty),*) => {
        $(impl LogField for $t {
            fn append_to(self, line: &mut LogLine) {
                line.push_signed(self as i64);
            }
        })*
    };
}

impl_log_field_unsigned!(u8, u16, u32, u64, usize);
impl_log_field_signed!(i8, i16, i32, i64, isize);

impl LogField for bool {
    fn append_to(self, line: &mut LogLine) {
        line.push_bytes(if self { b"true" } else { b"false" });
    }
}

impl LogField for char {
    fn append_to(self, line: &mut LogLine) {
        let mut buf = [0u8; 4];
        line.push_bytes(self.encode_utf8(&mut buf).as_bytes());
    }
}

impl LogField for f32 {
    fn append_to(self, line: &mut LogLine) {
        // Display gives the shortest round-trip rendering.
        let s = self.to_string();
        line.push_bytes(s.as_bytes());
    }
}

impl LogField for f64 {
    fn append_to(self, line: &mut LogLine) {
        let s = self.to_string();
        line.push_bytes(s.as_bytes());
    }
}

impl LogField for &str {
    fn append_to(self, line: &mut LogLine) {
        line.push_bytes(self.as_bytes());
    }
}

impl LogField for &String {
    fn append_to(self, line: &mut LogLine) {
        line.push_bytes(self.as_bytes());
    }
}

impl LogField for String {
    fn append_to(self, line: &mut LogLine) {
        line.push_bytes(self.as_bytes());
    }
}

impl LogField for LogLoc {
    fn append_to(self, line: &mut LogLine) {
        if !self.is_empty() {
            line.push_bytes(b" ");
            line.push_bytes(self.file().as_bytes());
            line.push_bytes(b":");
            line.push_unsigned(self.line() as u64);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::sink::LogSink;
    use std::sync::{Arc, Mutex};

    struct CaptureSink {
        lines: Mutex<Vec<String>>,
    }

    impl CaptureSink {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                lines: Mutex::new(Vec::new()),
            })
        }

        fn captured(&self) -> Vec<String> {
            self.lines.lock().unwrap().clone()
        }
    }

    impl LogSink for CaptureSink {
        fn write(&self, buf: &[u8]) -> isize {
            self.lines
                .lock()
                .unwrap()
                .push(String::from_utf8_lossy(buf).into_owned());
            buf.len() as isize
        }
    }

    /// Build one line on a dedicated thread pinned to a capture sink and
    /// return it.
    fn render(build: impl FnOnce(&mut LogLine) + Send + 'static) -> String {
        let capture = CaptureSink::new();
        let sink = Arc::clone(&capture);
        std::thread::spawn(move || {
            core().set_sink(sink);
            let mut line = LogLine::new(Level::Info, LogLoc::new("line.rs", "render", 42));
            build(&mut line);
        })
        .join()
        .unwrap();
        capture
            .captured()
            .into_iter()
            .find(|l| l.contains("line.rs:42"))
            .expect("line not captured")
    }

    #[test]
    fn test_prefix_layout() {
        let line = render(|l| {
            l.append("message");
        });
        assert!(line.starts_with("INFO "), "{}", line);
        assert!(line.contains(" line.rs:42 "), "{}", line);
        assert!(line.ends_with("message\n"), "{}", line);

        // LEVEL TIMESTAMP TID FILE:LINE MESSAGE
        let fields: Vec<&str> = line.trim_end().splitn(5, ' ').collect();
        assert_eq!(fields.len(), 5);
        assert_eq!(fields[0], "INFO");
        assert!(fields[1].contains('T'), "timestamp: {}", fields[1]);
        assert!(fields[2].chars().all(|c| c.is_ascii_digit()));
        assert_eq!(fields[3], "line.rs:42");
        assert_eq!(fields[4], "message");
    }

    #[test]
    fn test_integer_fields() {
        let line = render(|l| {
            l.append("v=").append(42u64).append(' ').append(-7i32);
        });
        assert!(line.ends_with("v=42 -7\n"), "{}", line);
    }

    #[test]
    fn test_bool_char_fields() {
        let line = render(|l| {
            l.append(true).append('/').append(false);
        });
        assert!(line.ends_with("true/false\n"), "{}", line);
    }

    #[test]
    fn test_float_fields() {
        let line = render(|l| {
            l.append(1.5f64).append(' ').append(0.25f32);
        });
        assert!(line.ends_with("1.5 0.25\n"), "{}", line);
    }

    #[test]
    fn test_string_fields() {
        let line = render(|l| {
            let owned = String::from("owned");
            l.append("str ").append(&owned).append(String::from(" moved"));
        });
        assert!(line.ends_with("str owned moved\n"), "{}", line);
    }

    #[test]
    fn test_extreme_integers() {
        let line = render(|l| {
            l.append(i64::MIN).append(' ').append(u64::MAX);
        });
        assert!(
            line.ends_with("-9223372036854775808 18446744073709551615\n"),
            "{}",
            line
        );
    }

    #[test]
    fn test_empty_loc_omits_file_segment() {
        let capture = CaptureSink::new();
        let sink = Arc::clone(&capture);
        std::thread::spawn(move || {
            core().set_sink(sink);
            let mut line = LogLine::new(Level::Warn, LogLoc::none());
            line.append("no-location-marker");
        })
        .join()
        .unwrap();

        let line = capture
            .captured()
            .into_iter()
            .find(|l| l.contains("no-location-marker"))
            .unwrap();
        assert!(!line.contains(".rs:"), "{}", line);
        // LEVEL TIMESTAMP TID MESSAGE
        let fields: Vec<&str> = line.trim_end().splitn(4, ' ').collect();
        assert_eq!(fields[0], "WARN");
        assert_eq!(fields[3], "no-location-marker");
    }
}
