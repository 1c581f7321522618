// Wall-clock timestamps and RFC 3339 formatting for log lines.
//
// Formatting avoids `format!` on the hot path: all numeric fields go
// through the digit-pair table in `digits`.

use super::digits::format_unsigned_width;
use chrono::{DateTime, Datelike, Local, Timelike};
use std::cell::OnceCell;

/// Subsecond precision selector for RFC 3339 formatting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecondFraction {
    None,
    Milli,
    Micro,
    Nano,
}

impl SecondFraction {
    const fn width(self) -> usize {
        match self {
            SecondFraction::None => 0,
            SecondFraction::Milli => 3,
            SecondFraction::Micro => 6,
            SecondFraction::Nano => 9,
        }
    }

    const fn divisor(self) -> u32 {
        match self {
            SecondFraction::None => 1,
            SecondFraction::Milli => 1_000_000,
            SecondFraction::Micro => 1_000,
            SecondFraction::Nano => 1,
        }
    }
}

/// A wall-clock instant with nanosecond precision, local time zone.
#[derive(Debug, Clone, Copy)]
pub struct Time {
    at: DateTime<Local>,
}

impl Time {
    /// Capture the current wall-clock time.
    pub fn now() -> Self {
        Time { at: Local::now() }
    }

    pub fn year(&self) -> u64 {
        self.at.year() as u64
    }

    pub fn month(&self) -> u64 {
        self.at.month() as u64
    }

    pub fn day(&self) -> u64 {
        self.at.day() as u64
    }

    pub fn hour(&self) -> u64 {
        self.at.hour() as u64
    }

    pub fn minute(&self) -> u64 {
        self.at.minute() as u64
    }

    pub fn second(&self) -> u64 {
        self.at.second() as u64
    }

    /// Nanoseconds within the current second.
    pub fn nanosecond(&self) -> u32 {
        self.at.nanosecond() % 1_000_000_000
    }

    /// Seconds east of UTC for this instant.
    pub fn utc_offset_seconds(&self) -> i32 {
        self.at.offset().local_minus_utc()
    }

    /// RFC 3339 local-time rendering, e.g. `2021-10-10T13:46:58.123+08:00`.
    ///
    /// A zero subsecond count emits no fraction at all, so consumers must
    /// not rely on a fixed-width timestamp.
    pub fn format_rfc3339(&self, frac: SecondFraction) -> String {
        let mut buf = [0u8; 48];
        let mut p = 0;

        p += format_unsigned_width(self.year(), &mut buf[p..], 4);
        buf[p] = b'-';
        p += 1;
        p += format_unsigned_width(self.month(), &mut buf[p..], 2);
        buf[p] = b'-';
        p += 1;
        p += format_unsigned_width(self.day(), &mut buf[p..], 2);
        buf[p] = b'T';
        p += 1;
        p += format_unsigned_width(self.hour(), &mut buf[p..], 2);
        buf[p] = b':';
        p += 1;
        p += format_unsigned_width(self.minute(), &mut buf[p..], 2);
        buf[p] = b':';
        p += 1;
        p += format_unsigned_width(self.second(), &mut buf[p..], 2);

        let nanos = self.nanosecond();
        if frac.width() > 0 && nanos > 0 {
            buf[p] = b'.';
            p += 1;
            p += format_unsigned_width(
                (nanos / frac.divisor()) as u64,
                &mut buf[p..],
                frac.width(),
            );
        }

        let off = self.utc_offset_seconds();
        if off == 0 {
            buf[p] = b'Z';
            p += 1;
        } else {
            buf[p] = if off < 0 { b'-' } else { b'+' };
            p += 1;
            let off = off.unsigned_abs() as u64;
            p += format_unsigned_width(off / 3600, &mut buf[p..], 2);
            buf[p] = b':';
            p += 1;
            p += format_unsigned_width((off % 3600) / 60, &mut buf[p..], 2);
        }

        // All bytes written above are ASCII.
        String::from_utf8(buf[..p].to_vec()).unwrap_or_default()
    }

    /// Millisecond-precision rendering, the log line default.
    pub fn format_milli(&self) -> String {
        self.format_rfc3339(SecondFraction::Milli)
    }
}

/// Time-zone offset (seconds east of UTC) and abbreviation, cached per
/// thread. On platforms without zone information a fixed fallback of
/// `("CST", 28800)` is used.
pub fn local_tz_offset() -> (i64, String) {
    thread_local! {
        static TZ: OnceCell<(i64, String)> = const { OnceCell::new() };
    }
    TZ.with(|cell| cell.get_or_init(read_tz_info).clone())
}

#[cfg(unix)]
fn read_tz_info() -> (i64, String) {
    use std::ffi::CStr;

    // SAFETY: localtime_r fills the caller-provided tm and is the
    // thread-safe variant; tm_zone points at process-lifetime static data.
    unsafe {
        let now = libc::time(std::ptr::null_mut());
        let mut tm: libc::tm = std::mem::zeroed();
        if libc::localtime_r(&now, &mut tm).is_null() {
            return fallback_tz();
        }
        let zone = if tm.tm_zone.is_null() {
            fallback_tz().1
        } else {
            CStr::from_ptr(tm.tm_zone).to_string_lossy().into_owned()
        };
        (tm.tm_gmtoff as i64, zone)
    }
}

#[cfg(not(unix))]
fn read_tz_info() -> (i64, String) {
    fallback_tz()
}

fn fallback_tz() -> (i64, String) {
    (28800, "CST".to_string())
}

/// OS-level id of the calling thread, cached per thread. Stable within a
/// process run only.
pub fn current_thread_id() -> u32 {
    thread_local! {
        static TID: OnceCell<u32> = const { OnceCell::new() };
    }
    TID.with(|cell| *cell.get_or_init(os_thread_id))
}

#[cfg(target_os = "linux")]
fn os_thread_id() -> u32 {
    // SAFETY: gettid has no preconditions.
    unsafe { libc::gettid() as u32 }
}

#[cfg(not(target_os = "linux"))]
fn os_thread_id() -> u32 {
    use std::sync::atomic::{AtomicU32, Ordering};
    static NEXT: AtomicU32 = AtomicU32::new(1);
    NEXT.fetch_add(1, Ordering::Relaxed)
}
