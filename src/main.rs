use std::io;
use std::process;

use assisted_harness::{cli, init_logging, run_completions, run_plan, run_validate};
use tracing::error;

fn main() {
    let args = match cli::parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{:#}", e);
            process::exit(2);
        }
    };

    let mut stdout = io::stdout().lock();
    let result = match &args.command {
        cli::Commands::Validate(opts) => {
            init_logging(opts.log_level).and_then(|()| run_validate(opts, &mut stdout))
        }
        cli::Commands::Plan(opts) => {
            init_logging(opts.log_level).and_then(|()| run_plan(opts, &mut stdout))
        }
        cli::Commands::Completions(opts) => {
            run_completions(opts, &mut stdout);
            Ok(())
        }
    };

    if let Err(e) = result {
        error!("{:#}", e);
        process::exit(1);
    }
}
