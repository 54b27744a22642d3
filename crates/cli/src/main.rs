#![warn(clippy::pedantic)]

mod command;

use std::{
    path::PathBuf,
    process::ExitCode,
    sync::{Arc, Mutex},
};

use anyhow::Context;
use clap::Parser;
use fitjournal_app::{App, Config, Event, Output};
use fitjournal_domain::{Service, SystemClock};
use fitjournal_storage::{CachedREST, LocalStorage};
use log::{error, info};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::mpsc::{self, UnboundedReceiver, UnboundedSender},
};

/// Workout journal for the terminal
#[derive(Parser, Debug)]
#[command(name = "fitjournal", version)]
struct Args {
    /// Configuration file, defaults to the platform config directory
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() -> ExitCode {
    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    let config = match args.config.or_else(Config::default_path) {
        Some(path) => Config::load(&path)?,
        None => Config::default(),
    };

    fitjournal_app::log::init(
        Arc::new(Mutex::new(LocalStorage::new(&config.data_dir))),
        config.log_level()?,
    )
    .context("failed to initialize logging")?;

    let repository = CachedREST::from_config(&config).context("failed to create HTTP client")?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start runtime")?;

    info!("using data directory {}", config.data_dir.display());

    runtime.block_on(async move {
        let (events, event_receiver) = mpsc::unbounded_channel();
        let (outputs, output_receiver) = mpsc::unbounded_channel();
        let mut app = App::new(Service::new(repository, SystemClock), events.clone());

        tokio::spawn(read_commands(events));
        let printer = tokio::spawn(print_outputs(output_receiver));

        app.run(event_receiver, outputs).await;
        if let Err(err) = printer.await {
            error!("output task failed: {err}");
        }
    });

    // Reading from stdin blocks a runtime thread until the next line.
    runtime.shutdown_background();

    Ok(())
}

/// Forwards parsed input lines to the event loop. End of input shuts the loop down.
async fn read_commands(events: UnboundedSender<Event>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(err) => {
                error!("failed to read input: {err}");
                break;
            }
        };
        if line.trim() == "help" {
            println!("{}", command::HELP);
            continue;
        }
        match command::parse(&line) {
            Ok(Some(event)) => {
                if events.send(event).is_err() {
                    return;
                }
            }
            Ok(None) => {}
            Err(err) => eprintln!("{err}, type help for a list of commands"),
        }
    }

    let _ = events.send(Event::Shutdown);
}

async fn print_outputs(mut outputs: UnboundedReceiver<Output>) {
    while let Some(output) = outputs.recv().await {
        println!("{}", command::render(&output));
    }
}
