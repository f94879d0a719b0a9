use std::io;

use clap::Parser;

mod args;
mod query;

use args::Arguments;

fn main() {
    let args = Arguments::parse();
    logutil::configure_global_logger(args.log_level(), args.log_format.into(), io::stderr);

    let result = {
        let mut stdout = io::stdout().lock();
        query::run(&args, &mut stdout)
    };

    if let Err(e) = result {
        println!("ERROR: {e}");
        std::process::exit(1);
    }
}
