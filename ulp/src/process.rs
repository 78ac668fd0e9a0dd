//! Inspection of a running process through procfs and the sanity check that
//! compares its libraries against a metadata record.

use std::path::{
    Path,
    PathBuf,
};

use thiserror::Error;

use crate::{
    frontend::{
        hex,
        read_build_id,
        ElfError,
    },
    logger::Logger,
    metadata::PatchMetadata,
};

/// A process or thread id
pub type Pid = i32;

#[derive(Error, Debug)]
pub enum SanityError {
    #[error("Unable to inspect process {0}: {1}")]
    IOError(Pid, std::io::Error),

    #[error("Target library {0} is not loaded in the process")]
    LibraryNotLoaded(String),

    #[error("Unable to read the build id of {0}: {1}")]
    ElfError(String, ElfError),

    #[error("Build id mismatch for {library}: expected {expected}, found {found}")]
    BuildIdMismatch {
        library: String,
        expected: String,
        found: String,
    },
}

/// Extract the path column of a `/proc/<pid>/maps` line, if the mapping is file backed
fn mapping_path(line: &str) -> Option<&str> {
    let mut rest = line;

    /* address, perms, offset, dev, inode */
    for _ in 0..5 {
        rest = rest.trim_start();
        let end = rest.find(char::is_whitespace)?;
        rest = &rest[end..];
    }

    let path = rest.trim();
    let path = path.strip_suffix(" (deleted)").unwrap_or(path);

    if path.starts_with('/') {
        Some(path)
    } else {
        None
    }
}

/// Every distinct file mapped into a process, in order of first appearance
pub fn parse_maps(maps: &str) -> Vec<PathBuf> {
    let mut ret = Vec::<PathBuf>::new();

    for line in maps.lines() {
        if let Some(path) = mapping_path(line) {
            if ret.iter().all(|x| x.as_path() != Path::new(path)) {
                ret.push(PathBuf::from(path));
            }
        }
    }

    ret
}

/// A snapshot of a running process: its threads and the files it has mapped
#[derive(Clone, Debug)]
pub struct TargetProcess {
    pid: Pid,
    threads: Vec<Pid>,
    libraries: Vec<PathBuf>,
}

impl TargetProcess {
    pub fn new(pid: Pid, threads: Vec<Pid>, libraries: Vec<PathBuf>) -> Self {
        Self {
            pid,
            threads,
            libraries,
        }
    }

    /// Read the thread list and memory maps of `pid` from procfs
    pub fn inspect(pid: Pid) -> Result<Self, SanityError> {
        let proc_dir = PathBuf::from(format!("/proc/{}", pid));

        let maps = std::fs::read_to_string(proc_dir.join("maps")).map_err(|err| SanityError::IOError(pid, err))?;
        let libraries = parse_maps(&maps);

        let mut threads = Vec::new();

        for entry in std::fs::read_dir(proc_dir.join("task")).map_err(|err| SanityError::IOError(pid, err))? {
            let entry = entry.map_err(|err| SanityError::IOError(pid, err))?;

            if let Some(tid) = entry.file_name().to_str().and_then(|name| name.parse::<Pid>().ok()) {
                threads.push(tid);
            }
        }

        threads.sort_unstable();

        Ok(Self::new(pid, threads, libraries))
    }

    pub fn pid(&self) -> Pid {
        self.pid
    }

    pub fn threads(&self) -> &[Pid] {
        &self.threads
    }

    pub fn libraries(&self) -> &[PathBuf] {
        &self.libraries
    }

    /// Find a mapped file whose file name equals the file name of `name`
    pub fn find_library<S: AsRef<str>>(&self, name: S) -> Option<&Path> {
        let wanted = Path::new(name.as_ref()).file_name()?;
        self.libraries.iter().map(PathBuf::as_path).find(|path| path.file_name() == Some(wanted))
    }
}

/// Make sure the process has the library that `metadata` patches loaded and that it is
/// the same build the record was generated for. Returns the path of the mapped library.
pub fn check_sanity(metadata: &PatchMetadata, process: &TargetProcess, logger: &Logger) -> Result<PathBuf, SanityError> {
    let object = metadata.object();
    let library = process.find_library(object.name()).ok_or_else(|| SanityError::LibraryNotLoaded(object.name().to_string()))?;
    logger.debug(format!("Target library {} is mapped from {}", object.name(), library.display()));

    let build_id = read_build_id(library).map_err(|err| SanityError::ElfError(library.display().to_string(), err))?;

    if build_id != object.build_id() {
        return Err(SanityError::BuildIdMismatch {
            library: library.display().to_string(),
            expected: hex(object.build_id()),
            found: hex(&build_id),
        });
    }

    Ok(library.to_path_buf())
}
