// SPDX-License-Identifier: Apache-2.0 OR MIT
use anyhow::{bail, Context, Result};
use clap::Parser;
use skipkv::benchmark::{self, BenchOptions, OPS_PER_MILLION};
use skipkv::logging::{core, Level, RotatingFileSink};
use skipkv::skiplist::{AutoSaveActor, SkipList, Snapshotter};
use skipkv::{Config, Console};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Minimum level of emitted log lines
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    /// Write logs through the rotating file sink into this directory
    /// instead of stdout
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Parser, Debug, PartialEq)]
enum Command {
    /// Run the concurrent insert/search benchmark
    Bench {
        /// Worker threads driving the workload
        #[arg(long, default_value_t = 4)]
        threads: usize,

        /// Operations per pass, in millions
        #[arg(long, default_value_t = 1)]
        millions: u64,

        /// Skip list level ceiling
        #[arg(long, default_value_t = 18)]
        max_level: usize,

        /// Config file carrying the benchmark toggles
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Interactive console over a fresh index
    Console {
        #[arg(long, default_value_t = 16)]
        max_level: usize,

        /// Snapshot directory for autosaves
        #[arg(long, default_value = "store")]
        store_dir: PathBuf,

        /// Enable periodic autosave with this interval in seconds
        #[arg(long)]
        autosave_secs: Option<u64>,

        /// Base name for autosave snapshot files
        #[arg(long, default_value = "console")]
        basename: String,
    },
    /// Update benchmark toggles in a config file
    Config {
        path: PathBuf,

        #[arg(long)]
        use_progress_bar: Option<bool>,

        #[arg(long)]
        use_rand_rng: Option<bool>,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level: Level = args
        .log_level
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;
    core().set_level(level);
    if let Some(dir) = &args.log_dir {
        core().set_sink(Arc::new(RotatingFileSink::new(dir.clone())));
    }

    match args.command {
        Command::Bench {
            threads,
            millions,
            max_level,
            config,
        } => {
            let toggles = match config {
                Some(path) => {
                    Config::load_from_file(&path)
                        .with_context(|| format!("loading {}", path.display()))?
                        .skip_list_benchmark
                }
                None => Default::default(),
            };
            let options = BenchOptions {
                threads,
                keys: millions * OPS_PER_MILLION,
                max_level,
                toggles,
            };

            let (insert, search) = benchmark::run(&options)?;
            println!(
                "insert elapsed: {:.3}s  QPS: {:.0}",
                insert.elapsed.as_secs_f64(),
                insert.qps
            );
            println!(
                "search elapsed: {:.3}s  QPS: {:.0}",
                search.elapsed.as_secs_f64(),
                search.qps
            );
        }
        Command::Console {
            max_level,
            store_dir,
            autosave_secs,
            basename,
        } => {
            let list: Arc<SkipList<i64, String>> = Arc::new(SkipList::new(max_level));

            // Keep the actor alive for the whole session; dropping it on
            // scope exit stops the background thread.
            let _autosave = autosave_secs.map(|secs| {
                AutoSaveActor::spawn(
                    Arc::clone(&list),
                    Snapshotter::new(store_dir),
                    basename,
                    Duration::from_secs(secs),
                )
            });

            let stdin = std::io::stdin();
            let stdout = std::io::stdout();
            Console::new(&list).run(&mut stdin.lock(), &mut stdout.lock())?;
        }
        Command::Config {
            path,
            use_progress_bar,
            use_rand_rng,
        } => {
            if use_progress_bar.is_none() && use_rand_rng.is_none() {
                bail!("nothing to update: pass --use-progress-bar and/or --use-rand-rng");
            }
            if let Some(value) = use_progress_bar {
                Config::update_use_progress_bar(&path, value)?;
                println!("useProgressBar = {}", value);
            }
            if let Some(value) = use_rand_rng {
                Config::update_use_rand_rng(&path, value)?;
                println!("useRandRNG = {}", value);
            }
        }
    }

    Ok(())
}
