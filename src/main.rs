use std::io;
use std::process;
use std::sync::Arc;

use rsmachine::cli::{self, Commands};
use rsmachine::executor::RealCommandExecutor;

fn main() {
    let args = match cli::parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{:#}", e);
            process::exit(2);
        }
    };

    if let Commands::Completions(opts) = &args.command {
        rsmachine::run_completions(opts, &mut io::stdout());
        return;
    }

    let log_level = match &args.command {
        Commands::Provision(opts) => opts.log_level,
        Commands::Validate(opts) => opts.log_level,
        Commands::Completions(_) => cli::LogLevel::Warn,
    };

    if let Err(e) = rsmachine::init_logging(log_level) {
        eprintln!("{:#}", e);
        process::exit(1);
    }

    let result = match &args.command {
        Commands::Provision(opts) => rsmachine::run_provision(opts, Arc::new(RealCommandExecutor)),
        Commands::Validate(opts) => rsmachine::run_validate(opts),
        Commands::Completions(_) => Ok(()),
    };

    if let Err(e) = result {
        tracing::error!("{:#}", e);
        process::exit(1);
    }
}
