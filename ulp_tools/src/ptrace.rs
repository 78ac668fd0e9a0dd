//! A [`Hijacker`] for Linux that stops threads with ptrace.
//!
//! The query does not talk to the patching runtime. A patch counts as applied
//! when its livepatch shared object is mapped into the stopped process.

use thiserror::Error;
use ulp::{
    check::{
        AttachOutcome,
        Fault,
        Hijacker,
    },
    metadata::PatchMetadata,
    process::{
        Pid,
        SanityError,
        TargetProcess,
    },
};

#[derive(Error, Debug)]
pub enum PtraceError {
    #[error("Unable to attach to thread {0}: {1}")]
    Attach(Pid, std::io::Error),

    #[error("Thread {0} did not stop: {1}")]
    Wait(Pid, std::io::Error),

    #[error("Unable to detach from thread {0}: {1}")]
    Detach(Pid, std::io::Error),

    #[error("Not attached to any process")]
    NotAttached,

    #[error("{0}")]
    Inspect(SanityError),
}

fn ptrace_request(request: libc::c_uint, tid: Pid) -> std::io::Result<()> {
    let ret = unsafe { libc::ptrace(request, tid, std::ptr::null_mut::<libc::c_void>(), std::ptr::null_mut::<libc::c_void>()) };

    if ret < 0 {
        Err(std::io::Error::last_os_error())
    } else {
        Ok(())
    }
}

fn wait_stopped(tid: Pid) -> std::io::Result<()> {
    let mut status = 0;
    let ret = unsafe { libc::waitpid(tid, &mut status, libc::__WALL) };

    if ret < 0 {
        Err(std::io::Error::last_os_error())
    } else {
        Ok(())
    }
}

#[derive(Default)]
pub struct PtraceHijacker {
    pid: Option<Pid>,
    stopped: Vec<Pid>,
}

impl PtraceHijacker {
    pub fn new() -> Self {
        Self::default()
    }

    fn attach_thread(tid: Pid) -> Result<(), PtraceError> {
        ptrace_request(libc::PTRACE_ATTACH, tid).map_err(|err| PtraceError::Attach(tid, err))?;
        wait_stopped(tid).map_err(|err| PtraceError::Wait(tid, err))
    }
}

impl Hijacker for PtraceHijacker {
    type Error = PtraceError;

    fn attach(&mut self, process: &TargetProcess) -> Result<AttachOutcome, Self::Error> {
        self.pid = Some(process.pid());
        let mut first_error = None;

        for &tid in process.threads() {
            match Self::attach_thread(tid) {
                Ok(()) => self.stopped.push(tid),
                Err(err) => {
                    first_error.get_or_insert(err);
                },
            }
        }

        match first_error {
            None => Ok(AttachOutcome::Attached),
            Some(err) if self.stopped.is_empty() => Err(err),
            Some(_) => Ok(AttachOutcome::Partial(self.stopped.len())),
        }
    }

    fn query(&mut self, metadata: &PatchMetadata) -> Result<bool, Fault<Self::Error>> {
        let pid = self.pid.ok_or(Fault::Warning(PtraceError::NotAttached))?;
        let process = TargetProcess::inspect(pid).map_err(|err| Fault::Warning(PtraceError::Inspect(err)))?;
        Ok(process.find_library(metadata.target_so_path()).is_some())
    }

    fn resume(&mut self) -> Result<(), Self::Error> {
        let mut first_error = None;

        for tid in self.stopped.drain(..) {
            if let Err(err) = ptrace_request(libc::PTRACE_DETACH, tid) {
                first_error.get_or_insert(PtraceError::Detach(tid, err));
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl Drop for PtraceHijacker {
    fn drop(&mut self) {
        let _ = self.resume();
    }
}
