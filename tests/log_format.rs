// On-disk log line format, end to end: macros -> ring buffer -> file sink

use skipkv::logging::{core, Level, RotatingFileSink};
use skipkv::{log_error, log_info, log_warn};
use std::fs;
use std::sync::Arc;

#[test]
fn lines_reach_the_file_in_wire_format() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().to_path_buf();

    // Pin the sink on a dedicated thread; set_sink only rebinds the
    // calling thread's logger.
    std::thread::spawn(move || {
        core().set_sink(Arc::new(RotatingFileSink::new(path)));
        core().set_level(Level::Info);
        log_info!("benchmark loaded ", 42u64, " keys");
        log_warn!("queue depth ", 7i64, " above soft limit");
        log_error!("snapshot failed: ", "disk full");
    })
    .join()
    .unwrap();

    let logfile = fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().path())
        .find(|p| p.file_name().unwrap().to_string_lossy().starts_with("logfile_"))
        .expect("active logfile written");
    let content = fs::read_to_string(logfile).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 3, "{}", content);

    for (line, (level, tail)) in lines.iter().zip([
        ("INFO", "benchmark loaded 42 keys"),
        ("WARN", "queue depth 7 above soft limit"),
        ("ERRO", "snapshot failed: disk full"),
    ]) {
        // LEVEL SP TIMESTAMP SP TID SP FILE:LINE SP MESSAGE
        let fields: Vec<&str> = line.splitn(5, ' ').collect();
        assert_eq!(fields.len(), 5, "{}", line);
        assert_eq!(fields[0], level);
        assert!(fields[1].len() >= 19 && fields[1].contains('T'), "{}", line);
        assert!(fields[2].chars().all(|c| c.is_ascii_digit()), "{}", line);
        assert!(fields[3].contains("log_format.rs:"), "{}", line);
        assert_eq!(fields[4], tail);
    }

    // All three lines came from one thread: a single thread id throughout
    let tids: std::collections::HashSet<&str> =
        lines.iter().map(|l| l.splitn(5, ' ').nth(2).unwrap()).collect();
    assert_eq!(tids.len(), 1);
}
