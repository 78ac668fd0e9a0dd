//! Contains the [`Hijacker`] trait and the patch status check built on top of it.

use thiserror::Error;

use crate::{
    frontend::hex,
    logger::Logger,
    metadata::PatchMetadata,
    process::TargetProcess,
};

/// The result of stopping the threads of a target process
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AttachOutcome {
    /// Every thread is stopped
    Attached,
    /// Only this many threads could be stopped
    Partial(usize),
}

/// A failed query is either something the process can recover from or not
#[derive(Debug)]
pub enum Fault<E> {
    Warning(E),
    Fatal(E),
}

/// This trait contains the minimum behavior that is expected from anything that can
/// stop a live process and ask the patching runtime inside of it about a patch.
pub trait Hijacker {
    /// Each hijacker has its corresponding error type
    type Error: std::error::Error;

    /// Stop all threads of the process
    fn attach(&mut self, process: &TargetProcess) -> Result<AttachOutcome, Self::Error>;
    /// Ask the stopped process whether the patch described by `metadata` is applied
    fn query(&mut self, metadata: &PatchMetadata) -> Result<bool, Fault<Self::Error>>;
    /// Let every thread that was stopped by [`Hijacker::attach`] continue
    fn resume(&mut self) -> Result<(), Self::Error>;
}

#[derive(Error, Debug)]
pub enum CheckError<E: std::error::Error> {
    #[error("Unable to attach to process: {0}")]
    Attach(E),

    #[error("Only {0} threads of the process could be stopped")]
    PartialAttach(usize),

    #[error("Query failed, the process can continue: {0}")]
    Query(E),

    #[error("Query failed, the process is in an inconsistent state: {0}")]
    FatalQuery(E),

    #[error("Unable to resume process: {0}")]
    Resume(E),
}

/// Whether a live patch is active in the target
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PatchStatus {
    Applied,
    NotApplied,
}

impl PatchStatus {
    /// The exit status the check tool reports this as
    pub fn exit_code(&self) -> i32 {
        match self {
            PatchStatus::Applied => 1,
            PatchStatus::NotApplied => 0,
        }
    }
}

/// Stop `process`, ask whether the patch in `metadata` is applied and let it run again.
/// The process is resumed in every case where at least one thread was stopped.
/// A failed resume is reported as [`CheckError::Resume`] even if the query failed too.
pub fn check_patch<H: Hijacker>(hijacker: &mut H, metadata: &PatchMetadata, process: &TargetProcess, logger: &mut Logger) -> Result<PatchStatus, CheckError<H::Error>> {
    logger.set_title("Attaching to process");
    logger.debug(format!("Stopping {} threads of process {}", process.threads().len(), process.pid()));

    match hijacker.attach(process).map_err(CheckError::Attach)? {
        AttachOutcome::Attached => {},
        AttachOutcome::Partial(stopped) => {
            if let Err(err) = hijacker.resume() {
                logger.error(format!("Unable to resume process after partial attach: {}", err));
            }
            return Err(CheckError::PartialAttach(stopped));
        },
    }

    logger.set_title("Querying patch status");
    logger.debug(format!("Looking for patch {}", hex(metadata.patch_id())));
    let result = hijacker.query(metadata);

    logger.set_title("Resuming process");
    let resumed = hijacker.resume();

    /* Resume failures take precedence over query failures */
    if let Err(err) = resumed {
        if let Err(Fault::Warning(query) | Fault::Fatal(query)) = &result {
            logger.error(format!("Query failed before the resume failure: {}", query));
        }
        return Err(CheckError::Resume(err));
    }

    let applied = match result {
        Ok(applied) => applied,
        Err(Fault::Warning(err)) => return Err(CheckError::Query(err)),
        Err(Fault::Fatal(err)) => return Err(CheckError::FatalQuery(err)),
    };

    if applied {
        Ok(PatchStatus::Applied)
    } else {
        Ok(PatchStatus::NotApplied)
    }
}
