mod cli;

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::rc::Rc;
use std::time::Duration;

use clap::Parser;
use colored::Colorize;
use crossbeam_channel::{select, tick, unbounded};

use joylist_registry::Registry;
use joylistd::inventory::{wall_clock, Clock, VirtualPlatform};
use joylistd::{
    load_config, logging, print_error, print_info, Config, Session, CONFIG_FILE_NAME,
};

use crate::cli::{Cli, Command};

fn resolve_config_path(explicit: Option<&PathBuf>) -> PathBuf {
    if let Some(path) = explicit {
        return path.clone();
    }
    std::env::current_dir()
        .map(|p| p.join(CONFIG_FILE_NAME))
        .unwrap_or_else(|_| PathBuf::from(CONFIG_FILE_NAME))
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::setup(cli.verbose, cli.no_color);

    let path = resolve_config_path(cli.command.config_path());
    let config = match load_config(&path) {
        Ok(config) => config,
        Err(e) => {
            print_error!("failed to load config {}: {e}", path.display());
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Command::Run { once, .. } => run(config, once),
        Command::List { .. } => match list(config) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                print_error!("failed to write device list: {e}");
                ExitCode::FAILURE
            }
        },
    }
}

fn run(config: Config, once: bool) -> ExitCode {
    // Handle Ctrl+C to exit cleanly
    let (stop_tx, stop_rx) = unbounded::<()>();
    if let Err(e) = ctrlc::set_handler(move || {
        let _ = stop_tx.send(());
    }) {
        print_error!("failed to set Ctrl+C handler: {e}");
        return ExitCode::FAILURE;
    }

    let ticker = tick(config.tick);
    let mut session = Session::new(config, wall_clock());
    let count = session.start();
    print_info!("joylistd started with {count} device(s). Polling for changes.");

    loop {
        select! {
            recv(stop_rx) -> _ => {
                break;
            }
            recv(ticker) -> _ => {
                session.tick();
                if once && session.is_done() {
                    break;
                }
            }
        }
    }

    session.shutdown();
    ExitCode::SUCCESS
}

fn list(config: Config) -> io::Result<()> {
    // Freeze the inventory at startup time.
    let clock: Clock = Rc::new(|| Duration::ZERO);
    let mut registry = Registry::new(config.registry)
        .with_enumerator(VirtualPlatform::new(config.devices, clock));
    registry.init();

    if registry.is_empty() {
        print_info!("no devices");
        return Ok(());
    }
    let mut out = io::stdout().lock();
    for (index, record) in registry.devices().iter().enumerate() {
        let caps = record.capabilities();
        writeln!(
            out,
            "{index:>3}  instance={:<3} device_id={:<11} guid={}  \
             buttons={} axes={} hats={} balls={}  {}",
            record.instance_id(),
            record.device_id(),
            record.guid(),
            caps.buttons,
            caps.axes,
            caps.hats,
            caps.balls,
            record.name().bold()
        )?;
    }
    Ok(())
}
