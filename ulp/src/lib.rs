//! Tooling for user-space live patches.
//!
//! A live patch is described by a small text file that names the livepatch shared object,
//! the livepatches it depends on, the library it patches and which functions get replaced.
//! The [`Packer`] turns such a description into a binary metadata record by looking up
//! the build id and symbol addresses of the patched library. The [`check`] module asks a
//! running process whether a record is currently applied.
//!
//! ```no_run
//! use ulp::{metadata::Destination, Logger, PackOptions, Packer, Verbosity};
//!
//! let mut logger = Logger::spinner(Verbosity::Normal);
//! let packer = Packer::build("patch.dsc", &PackOptions::default(), &mut logger).unwrap();
//! packer.write(&Destination::File("patch.ulp".into()), &mut logger).unwrap();
//! ```

mod logger;
mod packer;

/* ulps interface: */
pub mod check;
pub mod frontend;
pub mod metadata;
pub mod process;

pub use logger::{
    Logger,
    Verbosity,
};
pub use packer::{
    generate_patch_id,
    PackError,
    PackOptions,
    Packer,
};
