//! chanstress - hammer channel selectors from control threads while a render
//! thread rebinds instruments and a reclaimer drains the return queue.
//!
//! Run with: cargo run --bin chanstress -- --writers 8 --iterations 200000

mod app;
mod store;

use clap::Parser;

use app::Stress;
use synth_channel::DEFAULT_RETURN_QUEUE_CAPACITY;

/// Concurrency stress harness for synth_channel
#[derive(Parser)]
#[command(
    name = env!("CARGO_BIN_NAME"),
    version = env!("CARGO_PKG_VERSION"),
    about = env!("CARGO_PKG_DESCRIPTION"),
    long_about = None
)]
struct Cli {
    /// Number of synthesizer channels
    #[arg(long, default_value_t = 16)]
    channels: usize,
    /// Control threads writing selectors
    #[arg(long, default_value_t = 4)]
    writers: usize,
    /// Selector writes per control thread
    #[arg(long, default_value_t = 100_000)]
    iterations: usize,
    /// Return queue capacity (0 forces every release inline)
    #[arg(long, default_value_t = DEFAULT_RETURN_QUEUE_CAPACITY)]
    queue: usize,
    /// Render tick period in microseconds
    #[arg(long = "tick-us", default_value_t = 250)]
    tick_us: u64,
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let report = Stress::new()
        .channels(cli.channels)
        .writers(cli.writers)
        .iterations(cli.iterations)
        .queue_capacity(cli.queue)
        .tick_micros(cli.tick_us)
        .run()?;

    println!("=== chanstress ===");
    println!("Channels:        {}", cli.channels);
    println!("Selector writes: {}", report.writes);
    println!("Render ticks:    {}", report.ticks);
    println!("Rebinds:         {}", report.rebinds);
    println!("Inline releases: {}", report.saturations);
    println!("Reclaimed:       {}", report.reclaimed);
    println!("Live instruments at exit: {}", report.live_instruments);

    Ok(())
}
