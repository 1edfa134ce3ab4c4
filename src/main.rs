mod control_api;
mod logger;
mod parse_args;
mod processor;

use buttonbox_link::{
    byte_queue, CancelToken, SerialConnector, Supervisor, SupervisorConfig,
    DEFAULT_QUEUE_CAPACITY,
};
use buttonbox_protocol::ButtonEngine;
use control_api::ControlApi;
use log::{error, info};
use logger::Logger;
use parse_args::parse_args;
use processor::ButtonProcessor;

use std::thread::{self, JoinHandle};

fn main() {
    let args = match parse_args() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("Error parsing arguments: {}", e);
            eprintln!("Usage: buttonbox [OPTIONS] <PORT> (see --help)");
            std::process::exit(1);
        }
    };

    // Set up logger
    let logger = match &args.log_file {
        Some(path) => match Logger::file(path, args.verbosity) {
            Ok(l) => {
                eprintln!("Logging to: {}", path);
                l
            }
            Err(e) => {
                eprintln!("Failed to open log file '{}': {}", path, e);
                std::process::exit(1);
            }
        },
        None => Logger::stderr(args.verbosity),
    };
    if let Err(e) = logger.install() {
        eprintln!("Failed to install logger: {}", e);
        std::process::exit(1);
    }

    info!(
        "Starting ButtonBox host processor on serial port '{}'",
        args.port
    );

    let shutdown = CancelToken::new();
    let signal_token = shutdown.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        info!("Shutdown signal received");
        signal_token.cancel();
    }) {
        error!("Failed to install signal handler: {}", e);
        std::process::exit(1);
    }

    let config = SupervisorConfig::default();
    let (in_tx, in_rx) = byte_queue(DEFAULT_QUEUE_CAPACITY);
    let (out_tx, out_rx) = byte_queue(DEFAULT_QUEUE_CAPACITY);

    let control = match &args.http_addr {
        Some(addr) => match ControlApi::bind(addr, out_tx.clone(), config.poll_interval) {
            Ok(api) => Some(api),
            Err(e) => {
                error!("{}", e);
                std::process::exit(1);
            }
        },
        None => None,
    };

    let mut workers: Vec<JoinHandle<()>> = Vec::new();

    let connector = SerialConnector::new(args.port.clone()).baud_rate(args.baud_rate);
    let mut supervisor = Supervisor::new(
        connector,
        in_tx,
        out_tx.clone(),
        out_rx,
        config.clone(),
    );
    let token = shutdown.clone();
    workers.push(spawn("supervisor", move || supervisor.run(&token)));

    let processor = ButtonProcessor::new(
        ButtonEngine::default(),
        in_rx,
        out_tx,
        config.poll_interval,
    );
    let token = shutdown.clone();
    workers.push(spawn("processor", move || {
        processor.run(&token);
    }));

    if let Some(api) = control {
        let token = shutdown.clone();
        workers.push(spawn("control-api", move || api.run(&token)));
    }

    shutdown.wait();

    for worker in workers {
        if worker.join().is_err() {
            error!("Worker thread panicked");
        }
    }
    info!("Done");
}

fn spawn<F>(name: &str, f: F) -> JoinHandle<()>
where
    F: FnOnce() + Send + 'static,
{
    match thread::Builder::new().name(name.to_string()).spawn(f) {
        Ok(handle) => handle,
        Err(e) => {
            error!("Failed to start {} thread: {}", name, e);
            std::process::exit(1);
        }
    }
}
