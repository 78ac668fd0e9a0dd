use std::{
    fs::File,
    io::Write,
    path::PathBuf,
};

use byteorder::{
    NativeEndian,
    WriteBytesExt,
};

use crate::metadata::{
    MetadataError,
    PatchMetadata,
    VAddr,
    ADDRESS_LEN,
};

/// Where a finished record ends up
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Destination {
    Stdout,
    File(PathBuf),
}

fn encode_len(len: usize, what: &'static str) -> Result<u32, MetadataError> {
    u32::try_from(len).map_err(|_| MetadataError::TooLong(what, len))
}

fn write_bytes<W: Write>(out: &mut W, bytes: &[u8], what: &'static str) -> Result<(), MetadataError> {
    out.write_u32::<NativeEndian>(encode_len(bytes.len(), what)?)?;
    out.write_all(bytes)?;
    Ok(())
}

fn write_address<W: Write>(out: &mut W, address: VAddr) -> Result<(), MetadataError> {
    /* Addresses are pointer sized on the host, wider values get truncated */
    let address = address as usize as u64;
    out.write_uint::<NativeEndian>(address, ADDRESS_LEN)?;
    Ok(())
}

/// Encode `metadata` into `out`.
///
/// The record is written field by field without any validation besides the length checks
/// that the format itself requires.
pub fn serialize<W: Write>(metadata: &PatchMetadata, out: &mut W) -> Result<(), MetadataError> {
    let object = metadata.object();

    out.write_u8(metadata.patch_type().as_byte())?;
    out.write_all(metadata.patch_id())?;
    write_bytes(out, metadata.target_so_path().as_bytes(), "livepatch path")?;
    write_bytes(out, object.build_id(), "build id")?;
    write_bytes(out, object.name().as_bytes(), "object name")?;

    out.write_u32::<NativeEndian>(encode_len(object.units().len(), "unit list")?)?;

    for unit in object.units() {
        write_bytes(out, unit.old_name().as_bytes(), "old function name")?;
        write_bytes(out, unit.new_name().as_bytes(), "new function name")?;
        write_address(out, unit.old_address())?;
    }

    out.write_u32::<NativeEndian>(encode_len(metadata.dependencies().len(), "dependency list")?)?;

    for dependency in metadata.dependencies() {
        out.write_all(dependency.id())?;
    }

    Ok(())
}

/// Encode `metadata` into a fresh buffer
pub fn to_bytes(metadata: &PatchMetadata) -> Result<Vec<u8>, MetadataError> {
    let mut buf = Vec::new();
    serialize(metadata, &mut buf)?;
    Ok(buf)
}

/// Write the encoded record to `destination`.
///
/// The record is encoded completely before the destination is touched, but the file is
/// written in place: if writing fails halfway a truncated record remains on disk and
/// must be treated as corrupt.
pub fn write_to(metadata: &PatchMetadata, destination: &Destination) -> Result<(), MetadataError> {
    let buf = to_bytes(metadata)?;

    match destination {
        Destination::Stdout => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&buf)?;
            stdout.flush()?;
        },
        Destination::File(path) => {
            let mut file = File::create(path).map_err(|err| MetadataError::OpenError(path.display().to_string(), err))?;
            file.write_all(&buf)?;
            file.flush()?;
        },
    }

    Ok(())
}
