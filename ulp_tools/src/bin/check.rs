use std::path::PathBuf;

use clap::Parser;
use ulp::{
    check::{
        check_patch,
        PatchStatus,
    },
    frontend::hex,
    metadata::load,
    process::{
        check_sanity,
        Pid,
        TargetProcess,
    },
    Logger,
};
use ulp_tools::{
    ptrace::PtraceHijacker,
    VerbosityArgs,
};

/// Check whether a live patch is applied in a running process.
///
/// A patch counts as applied when the livepatch shared object named in the record is
/// mapped into the process. The patch id is not compared, so two patches shipped in the
/// same shared object or a reverted patch whose object stays mapped both report applied.
///
/// Exits with 0 if the patch is not applied, 1 if it is applied and -1 on failure.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// The metadata record of the live patch
    #[arg(value_name = "METADATA")]
    metadata: PathBuf,

    /// The process to check
    #[arg(short, long, value_parser = clap::value_parser!(i32).range(1..))]
    pid: Pid,

    #[command(flatten)]
    verbosity: VerbosityArgs,
}

fn run(args: &Args, logger: &mut Logger) -> Result<PatchStatus, String> {
    logger.set_title("Loading metadata");
    let metadata = load(&args.metadata).map_err(|err| err.to_string())?;
    logger.debug(format!("Patch {} for {}", hex(metadata.patch_id()), metadata.object().name()));

    logger.set_title("Inspecting process");
    let process = TargetProcess::inspect(args.pid).map_err(|err| err.to_string())?;
    let library = check_sanity(&metadata, &process, logger).map_err(|err| err.to_string())?;
    logger.debug(format!("{} matches the build id of the record", library.display()));

    let mut hijacker = PtraceHijacker::new();
    check_patch(&mut hijacker, &metadata, &process, logger).map_err(|err| err.to_string())
}

const FAILURE: i32 = -1;

fn exit_code(result: &Result<PatchStatus, String>) -> i32 {
    match result {
        Ok(status) => status.exit_code(),
        Err(_) => FAILURE,
    }
}

fn main() {
    let args = Args::parse();
    let mut logger = Logger::spinner(args.verbosity.verbosity());

    let result = run(&args, &mut logger);

    match &result {
        Ok(PatchStatus::Applied) => logger.info(format!("Patch {} is applied in process {}", args.metadata.display(), args.pid)),
        Ok(PatchStatus::NotApplied) => logger.warning(format!("Patch {} is not applied in process {}", args.metadata.display(), args.pid)),
        Err(err) => logger.error(err),
    }

    drop(logger);
    std::process::exit(exit_code(&result));
}
