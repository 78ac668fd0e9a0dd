use std::path::PathBuf;

use clap::Parser;
use ulp::{
    metadata::Destination,
    Logger,
    PackError,
    PackOptions,
    Packer,
};
use ulp_tools::VerbosityArgs;

/// Generate the metadata record of a live patch from its description
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The patch description file
    #[arg(value_name = "DESCRIPTION")]
    description: PathBuf,

    /// Write the metadata here instead of standard output
    #[arg(short, long, value_name = "METADATA")]
    output: Option<PathBuf>,

    /// Store this path of the livepatch shared object instead of the one in the description
    #[arg(short = 'p', long, value_name = "LIVEPATCH")]
    livepatch: Option<String>,

    /// Introspect this library instead of the object named in the description
    #[arg(short = 't', long = "target", value_name = "LIBRARY")]
    library: Option<PathBuf>,

    /// Fail if a patched function is missing from the target library
    #[arg(long, default_value_t = false)]
    strict: bool,

    #[command(flatten)]
    verbosity: VerbosityArgs,
}

fn exit_code(result: &Result<(), PackError>) -> i32 {
    match result {
        Ok(()) => 0,
        Err(_) => 1,
    }
}

fn main() {
    let args = Args::parse();
    let mut logger = Logger::spinner(args.verbosity.verbosity());

    let options = PackOptions {
        library: args.library,
        livepatch: args.livepatch,
        require_symbols: args.strict,
    };
    let destination = match args.output {
        Some(path) => Destination::File(path),
        None => Destination::Stdout,
    };

    let result = Packer::build(&args.description, &options, &mut logger).and_then(|packer| packer.write(&destination, &mut logger));

    match &result {
        Ok(()) => logger.info("metadata file generated successfully"),
        Err(err) => {
            logger.error(err.to_string());
            logger.error("metadata file generation failed");
        },
    }

    drop(logger);
    std::process::exit(exit_code(&result));
}
