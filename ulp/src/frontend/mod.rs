//! The frontend turns a patch description and the library it targets into a
//! [`PatchMetadata`](crate::metadata::PatchMetadata)

mod dependency;
mod description;
mod elf;
mod error;

pub use dependency::resolve_dependency;
pub use description::DescriptionParser;
pub use elf::{
    hex,
    read_build_id,
    ElfIntrospector,
    BUILD_ID_SECTION,
};
pub use error::{
    DescriptionError,
    ElfError,
    LinkError,
};
