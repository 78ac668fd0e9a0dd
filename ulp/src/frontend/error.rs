use thiserror::Error;

/// Errors while reading the type tag and patch id of a dependency record
#[derive(Error, Debug)]
pub enum LinkError {
    #[error("Unable to open dependency file {0}: {1}")]
    IOError(String, std::io::Error),

    #[error("Dependency file {0} is too short to contain a patch id")]
    Truncated(String),

    #[error("Incorrect dependency patch type {0:#x}")]
    IncorrectPatchType(u8),
}

/// Errors while turning a patch description into a [`PatchMetadata`](crate::metadata::PatchMetadata)
#[derive(Error, Debug)]
pub enum DescriptionError {
    #[error("Unable to read description file {0}: {1}")]
    IOError(String, std::io::Error),

    #[error("Line {0}: description is not valid UTF-8")]
    InvalidUtf8(usize),

    #[error("Description is empty")]
    Empty,

    #[error("Line 1: missing path of the livepatch shared object")]
    MissingSoPath,

    #[error("Line {line}: unable to add dependency to livepatch metadata: {source}")]
    Dependency {
        line: usize,
        source: LinkError,
    },

    #[error("Line {0}: dependencies must be listed directly after the first line")]
    MisplacedDependency(usize),

    #[error("Line {0}: only one shared object can be patched per livepatch")]
    DuplicateObject(usize),

    #[error("Line {0}: patch description does not define shared object for patching")]
    UnitBeforeObject(usize),

    #[error("Line {0}: expected a unit of the form OLD:NEW")]
    MissingSeparator(usize),

    #[error("Line {0}: function names must not be empty")]
    EmptyFunctionName(usize),

    #[error("Patch description does not define shared object for patching")]
    MissingObject,
}

/// Errors while extracting the build id and symbol addresses from a shared object
#[derive(Error, Debug)]
pub enum ElfError {
    #[error("Cannot read from {0}: {1}")]
    IOError(String, std::io::Error),

    #[error("Invalid ELF binary: {0}")]
    InvalidELF(String),

    #[error("Unable to get .dynsym section")]
    MissingDynsym,

    #[error("Unable to find the .note.gnu.build-id section")]
    MissingBuildIdSection,

    #[error("Unable to find note with expected build id type")]
    MissingBuildIdNote,

    #[error("The build id note is empty")]
    EmptyBuildId,

    #[error("Symbol '{0}' is not in the dynamic symbol table")]
    UnresolvedSymbol(String),
}
