use std::{
    fs::File,
    io::{
        ErrorKind,
        Read,
    },
    path::Path,
};

use byteorder::ReadBytesExt;

use crate::{
    frontend::error::LinkError,
    metadata::{
        Dependency,
        PatchType,
        PATCH_ID_LEN,
    },
};

fn read_error(path: &Path, err: std::io::Error) -> LinkError {
    if err.kind() == ErrorKind::UnexpectedEof {
        LinkError::Truncated(path.display().to_string())
    } else {
        LinkError::IOError(path.display().to_string(), err)
    }
}

/// Turn a previously generated metadata file into a [`Dependency`].
///
/// Only the type tag and the patch id are read. The dependencies of that file are
/// not followed, every transitive dependency has to be listed explicitly.
pub fn resolve_dependency<P: AsRef<Path>>(path: P) -> Result<Dependency, LinkError> {
    let path = path.as_ref();
    let mut file = File::open(path).map_err(|err| LinkError::IOError(path.display().to_string(), err))?;

    let patch_type = file.read_u8().map_err(|err| read_error(path, err))?;

    if patch_type != PatchType::Patch.as_byte() {
        return Err(LinkError::IncorrectPatchType(patch_type));
    }

    let mut id = [0; PATCH_ID_LEN];
    file.read_exact(&mut id).map_err(|err| read_error(path, err))?;

    Ok(Dependency::new(id))
}
