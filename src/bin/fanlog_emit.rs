use std::{env, process, sync::Arc};

use fanlog::config::Config;
use fanlog::log::{
    AdapterRegistry, DiagSink, Dispatcher, DispatcherConfig, FileSinkConfig, StderrDiagSink,
};
use fanlog::{log_fatal, log_info};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // --- Parse CLI args ----------------------------------------------------
    //
    //   fanlog_emit CONFIG MESSAGE...           # log each MESSAGE at INFO, close
    //   fanlog_emit CONFIG --fatal MESSAGE...   # same, then log FATAL and exit(1)
    let mut args = env::args().skip(1);
    let Some(config_path) = args.next() else {
        eprintln!("Usage: fanlog_emit CONFIG [--fatal] MESSAGE...");
        process::exit(2);
    };
    let mut fatal = false;
    let mut messages = Vec::new();
    for arg in args {
        if arg == "--fatal" {
            fatal = true;
        } else {
            messages.push(arg);
        }
    }

    // --- Build dispatcher from config --------------------------------------
    let cfg = Config::load(&config_path)?;
    let diag: Arc<dyn DiagSink> = Arc::new(StderrDiagSink);
    let registry = AdapterRegistry::with_defaults(FileSinkConfig::from_config(&cfg)?, Arc::clone(&diag));
    let dispatcher = Dispatcher::new(registry, DispatcherConfig::from_config(&cfg)?, diag)?;
    for kind in cfg.sink_kinds() {
        dispatcher.add_sink(kind)?;
    }

    for msg in &messages {
        log_info!(dispatcher, "{msg}");
    }

    if fatal {
        log_fatal!(dispatcher, "fatal requested after {} message(s)", messages.len());
    }

    dispatcher.drain();
    dispatcher.close();
    Ok(())
}
