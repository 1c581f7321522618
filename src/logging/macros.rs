// SPDX-License-Identifier: Apache-2.0 OR MIT
// Logging macros with call-site capture
//
// Each macro checks the global level gate first, then assembles one line
// from its arguments, e.g.:
//
//   log_info!("inserted key ", key, " in ", elapsed_ms, "ms");

/// Build one log line at an explicit level with call-site capture.
#[macro_export]
macro_rules! log_line {
    ($level:expr, $($field:expr),+ $(,)?) => {{
        if $crate::logging::core().level() <= $level {
            let mut line = $crate::logging::LogLine::new(
                $level,
                $crate::logging::LogLoc::new(file!(), module_path!(), line!()),
            );
            $(line.append($field);)+
        }
    }};
}

/// Log a message with trace level
#[macro_export]
macro_rules! log_trace {
    ($($field:expr),+ $(,)?) => {
        $crate::log_line!($crate::logging::Level::Trace, $($field),+)
    };
}

/// Log a message with debug level
#[macro_export]
macro_rules! log_debug {
    ($($field:expr),+ $(,)?) => {
        $crate::log_line!($crate::logging::Level::Debug, $($field),+)
    };
}

/// Log a message with info level
#[macro_export]
macro_rules! log_info {
    ($($field:expr),+ $(,)?) => {
        $crate::log_line!($crate::logging::Level::Info, $($field),+)
    };
}

/// Log a message with warn level
#[macro_export]
macro_rules! log_warn {
    ($($field:expr),+ $(,)?) => {
        $crate::log_line!($crate::logging::Level::Warn, $($field),+)
    };
}

/// Log a message with error level
#[macro_export]
macro_rules! log_error {
    ($($field:expr),+ $(,)?) => {
        $crate::log_line!($crate::logging::Level::Error, $($field),+)
    };
}

/// Log a message with fatal level
#[macro_export]
macro_rules! log_fatal {
    ($($field:expr),+ $(,)?) => {
        $crate::log_line!($crate::logging::Level::Fatal, $($field),+)
    };
}

#[cfg(test)]
mod tests {
    use crate::logging::{core, Level, LogSink};
    use std::sync::{Arc, Mutex};

    struct CaptureSink {
        lines: Mutex<Vec<String>>,
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

    #[test]
    fn test_macros_emit_once_per_call() {
        let _guard = crate::logging::level_test_guard();
        let capture = Arc::new(CaptureSink {
            lines: Mutex::new(Vec::new()),
        });
        let sink = Arc::clone(&capture);

        std::thread::spawn(move || {
            core().set_sink(sink);
            let saved = core().level();
            core().set_level(Level::Trace);
            log_trace!("macro-test trace");
            log_debug!("macro-test debug ", 1u32);
            log_info!("macro-test info ", true);
            log_warn!("macro-test warn ", 'w');
            log_error!("macro-test error ", -3i64);
            log_fatal!("macro-test fatal");
            core().set_level(saved);
        })
        .join()
        .unwrap();

        let lines: Vec<String> = capture
            .lines
            .lock()
            .unwrap()
            .iter()
            .filter(|l| l.contains("macro-test"))
            .cloned()
            .collect();
        assert_eq!(lines.len(), 6);
        assert!(lines[0].starts_with("TRAC "));
        assert!(lines[1].ends_with("macro-test debug 1\n"));
        assert!(lines[2].ends_with("macro-test info true\n"));
        assert!(lines[3].ends_with("macro-test warn w\n"));
        assert!(lines[4].ends_with("macro-test error -3\n"));
        assert!(lines[5].starts_with("FATA "));
    }

    #[test]
    fn test_level_gate_suppresses() {
        let _guard = crate::logging::level_test_guard();
        let capture = Arc::new(CaptureSink {
            lines: Mutex::new(Vec::new()),
        });
        let sink = Arc::clone(&capture);

        std::thread::spawn(move || {
            core().set_sink(sink);
            let saved = core().level();
            core().set_level(Level::Error);
            log_info!("gated-test should not appear");
            log_error!("gated-test should appear");
            core().set_level(saved);
        })
        .join()
        .unwrap();

        let lines: Vec<String> = capture
            .lines
            .lock()
            .unwrap()
            .iter()
            .filter(|l| l.contains("gated-test"))
            .cloned()
            .collect();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("should appear"));
    }
}
