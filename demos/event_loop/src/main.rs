//! A small event loop wired up with Switchboard.
//!
//! Events go through a broadcast router guarded by `MustHandle`; requests go
//! through a resolution router. Strings are also handed to two offload
//! workers.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{Context as _, Result, bail};
use clap::Parser;
use switchboard::prelude::*;
use switchboard::runtime::{ConfigLoader, logging};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "event-loop", about = "Dispatch a few events and requests")]
struct Args {
    /// Configuration file (TOML).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Queue capacity of each offload worker; 0 means unbounded.
    #[arg(long)]
    capacity: Option<usize>,
}

/// Output shared with the offload workers.
#[derive(Debug, Default)]
struct Console {
    lines: AtomicUsize,
}

impl Console {
    fn say(&self, line: impl std::fmt::Display) {
        self.lines.fetch_add(1, Ordering::Relaxed);
        println!("{line}");
    }
}

#[derive(Debug, Default)]
struct App {
    console: Arc<Console>,
}

impl SharedContext for App {
    type Shared = Arc<Console>;

    fn share(&self) -> Arc<Console> {
        Arc::clone(&self.console)
    }
}

type Ctx = Context<App>;

/// An event that cannot be cloned.
struct MyEvent;

/// A request that cannot be cloned.
struct MyRequest;

/// Queued behind every earlier job of a worker.
struct Flush;

type Offload = Buffered<Ctx, Serial<Arc<Console>>>;

fn offload(config: &OffloadConfig, label: &'static str) -> Result<Arc<Offload>> {
    let inner = serial![
        owned(move |console: &mut Arc<Console>, s: String| {
            console.say(format!("{label} c++ string {s}"))
        }),
        owned(|_: &mut Arc<Console>, _: Flush| ()),
    ]?;
    let config = OffloadConfig {
        thread_name: format!("{}-{}", config.thread_name, label.to_lowercase()),
        ..config.clone()
    };
    Ok(Arc::new(Buffered::with_config(inner, &config)?))
}

fn events(a: &Arc<Offload>, b: &Arc<Offload>) -> Result<Serial<Ctx>> {
    let b = Arc::clone(b);
    // Adding a second `owned` handler for `MyEvent` would make this fail:
    // only the last handler to match a type may take it by value.
    let handled = serial![
        view(|ctx: &mut Ctx, i: &i32| -> DispatchResult<()> {
            let answer = ctx.dispatch_request::<_, i32>(*i)?;
            match answer.into_value() {
                Some(value) => ctx.console.say(value),
                None => ctx.console.say("no answer"),
            }
            Ok(())
        }),
        view(|ctx: &mut Ctx, s: &&'static str| ctx.console.say(format!("c string {s}"))),
        cloned(|ctx: &mut Ctx, s: String| ctx.console.say(format!("c++ string {s}"))),
        view(|ctx: &mut Ctx, _: &MyEvent| ctx.console.say("Inspecting MyEvent")),
        owned(|ctx: &mut Ctx, _: MyEvent| ctx.console.say("Moved from MyEvent")),
        // B gets its own copy; A, as the last match, takes the original.
        cloned(move |ctx: &mut Ctx, s: String| b.submit(ctx, s).map(drop)),
        Arc::clone(a),
    ]?;

    Ok(serial![
        any(|ctx: &mut Ctx, m: MessageRef<'_>| {
            ctx.console
                .say(format!("Got an event with address: {:?}", m.addr()))
        }),
        MustHandle::new(handled),
    ]?)
}

fn requests() -> Result<First<Ctx>> {
    Ok(first![
        view(|ctx: &mut Ctx, _: &i32| {
            ctx.dispatch_request::<_, i32>("hello").map(Reply::into_value)
        }),
        view(|_: &mut Ctx, _: &&'static str| ()),
        view(|_: &mut Ctx, _: &&'static str| None::<i32>),
        view(|_: &mut Ctx, _: &&'static str| Some(2)),
        // Never called: the handler above already answered.
        view(|_: &mut Ctx, _: &&'static str| Some(4)),
        view(|_: &mut Ctx, _: &&'static str| ()),
        owned(|_: &mut Ctx, _: MyRequest| Hard("The handler that gets called")),
        // Never called, and never given ownership: a hard answer ends the search.
        owned(|_: &mut Ctx, _: MyRequest| Hard("Shadowed by the handler above")),
    ]?)
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut loader = ConfigLoader::new();
    if let Some(path) = &args.config {
        loader = loader.file(path);
    }
    let mut config = loader.load()?;
    if let Some(capacity) = args.capacity {
        config.offload.capacity = capacity;
    }
    logging::init_from_config(&config.logging);

    let a = offload(&config.offload, "A")?;
    let b = offload(&config.offload, "B")?;
    let mut ctx = Context::builder(App::default())
        .events(events(&a, &b)?)
        .requests(requests()?)
        .build();

    let answer = ctx
        .dispatch_request::<_, i32>(5)?
        .into_value()
        .context("nobody answered 5")?;
    ctx.console.say(answer);

    let Reply::Hard(text) = ctx.dispatch_request::<_, &'static str>(MyRequest)? else {
        bail!("MyRequest must always be answered");
    };
    ctx.console.say(text);

    ctx.dispatch_event(MyEvent)?;
    ctx.dispatch_event(String::from("hello"))?;
    ctx.dispatch_event(2_i32)?;

    for worker in [&a, &b] {
        worker.submit(&ctx, Flush)?.wait()?;
    }
    info!(
        lines = ctx.console.lines.load(Ordering::Relaxed),
        "All events handled"
    );
    Ok(())
}
