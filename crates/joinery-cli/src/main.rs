use std::rc::Rc;
use std::time::Duration;

use clap::Parser;
use rand::Rng;
use tokio::sync::Notify;
use tokio::task::LocalSet;
use tracing_subscriber::EnvFilter;

use joinery_core::impls::TokioScheduler;
use joinery_core::{Closure, Options, RuntimeBuilder, RuntimeStats};

/// Fan out N delayed calls, join them back in arrival order.
#[derive(Debug, Parser)]
#[command(name = "joinery", version)]
struct Args {
    /// Number of calls launched into one join group
    #[arg(long, default_value_t = 8)]
    fan_out: usize,

    /// Upper bound of the random delay per call, in milliseconds
    #[arg(long, default_value_t = 200)]
    max_delay_ms: u64,

    /// Report triggers on cancelled events (same as `S` in JOINERY_OPTIONS)
    #[arg(long)]
    strict: bool,

    /// Let the join group go out of scope before the calls come back
    #[arg(long)]
    leak: bool,

    #[arg(short, long)]
    verbose: bool,
}

/// One completed call: its index and the delay it was given.
type Arrival = (usize, Duration);

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut options = Options::from_env()?;
    options.strict |= args.strict;

    // 全部 1 スレッドで回す（コアは !Send）
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;
    let local = LocalSet::new();
    let stats = local.block_on(&rt, run(args, options))?;

    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}

async fn run(args: Args, options: Options) -> anyhow::Result<RuntimeStats> {
    let runtime = RuntimeBuilder::new()
        .scheduler(Rc::new(TokioScheduler::new()))
        .options(options)
        .build()?;

    let closure = Closure::new(&runtime);
    let group = closure.join_group::<Arrival>("joinery-cli::fan_out");

    // (A) fan out
    let mut rng = rand::thread_rng();
    for i in 0..args.fan_out {
        let delay = Duration::from_millis(rng.gen_range(0..=args.max_delay_ms));
        let event = group.make_event(Some(&closure), format!("joinery-cli::call[{i}]"));
        tracing::debug!(call = i, ?delay, event = %event.id(), "launched");
        runtime.schedule(
            delay,
            Box::new(move || {
                event.trigger((i, delay));
            }),
        );
    }

    // (B) --leak: the frame unwinds with everything still out
    if args.leak {
        tracing::warn!(outstanding = group.n_out(), "dropping join group early");
        drop(group);
        drop(closure);
        // let the late joiners run into the dead group
        tokio::time::sleep(Duration::from_millis(args.max_delay_ms + 5)).await;
        return Ok(runtime.stats());
    }

    // (C) fan in, in arrival order
    let wake = Rc::new(Notify::new());
    let mut order = Vec::with_capacity(args.fan_out);
    loop {
        while let Some((i, delay)) = group.pending() {
            tracing::info!(call = i, ?delay, "joined");
            order.push(i);
        }
        if !group.need_join() {
            break;
        }
        let waker = Rc::clone(&wake);
        group.set_notify(Box::new(move || waker.notify_one()));
        wake.notified().await;
    }
    tracing::info!(?order, "all calls joined");

    closure.end_of_scope_checks("joinery-cli::run");
    drop(group);
    drop(closure);

    let leaked = runtime.report_event_leaks();
    if leaked > 0 {
        tracing::warn!(leaked, "events left pending");
    }
    Ok(runtime.stats())
}
