use thiserror::Error;

/// Everything that can go wrong while encoding or decoding a metadata record
#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("IO error: {0}")]
    IOError(#[from] std::io::Error),

    #[error("Cannot open metadata file {0}: {1}")]
    OpenError(String, std::io::Error),

    #[error("Invalid patch type {0:#x}")]
    InvalidPatchType(u8),

    #[error("Metadata record is truncated while reading the {0}")]
    Truncated(&'static str),

    #[error("The {0} is not valid UTF-8")]
    InvalidString(&'static str),

    #[error("The {0} does not fit into a record ({1} bytes)")]
    TooLong(&'static str, usize),

    #[error("Metadata record has {0} trailing bytes")]
    TrailingData(usize),
}
