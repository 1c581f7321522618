// SPDX-License-Identifier: Apache-2.0 OR MIT
// Example demonstrating the logging core
//
// Run with: cargo run --example logging_demo

use skipkv::logging::{core, Level, NullSink, RotatingFileSink};
use skipkv::{log_debug, log_error, log_info, log_trace, log_warn};
use std::sync::Arc;
use std::thread;

fn main() {
    println!("=== skipkv logging demo ===\n");

    println!("1. Level gate (default Info): trace/debug are dropped");
    log_trace!("this trace line is gated away");
    log_debug!("this debug line is gated away");
    log_info!("hello from the main thread");

    println!("\n2. Lowering the gate to Trace:");
    core().set_level(Level::Trace);
    log_trace!("now trace lines flow");
    log_debug!("and debug lines too");
    core().set_level(Level::Info);

    println!("\n3. Typed field appenders in one line:");
    log_info!("ints ", 42u64, " and ", -7i32, ", bool ", true, ", char ", 'x');
    log_info!("floats ", 2.5f64, " and strings: ", String::from("owned"));

    println!("\n4. Each thread logs through its own ring buffer:");
    let mut handles = Vec::new();
    for worker in 0..3u32 {
        handles.push(thread::spawn(move || {
            for i in 0..2 {
                log_info!("worker ", worker, " line ", i);
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    println!("\n5. Switching this thread's sink to a rotating file sink:");
    let dir = std::env::temp_dir().join("skipkv_logging_demo");
    core().set_sink(Arc::new(RotatingFileSink::new(&dir)));
    log_info!("this line lands in the active logfile");
    log_warn!("and so does this warning");
    core().set_sink(Arc::new(NullSink));
    log_error!("this one is discarded by the null sink");

    println!("log files under: {}", dir.display());
}
