use std::path::Path;

use byteorder::{
    ByteOrder,
    NativeEndian,
};

use crate::metadata::{
    Dependency,
    MetadataError,
    PatchId,
    PatchMetadata,
    PatchType,
    PatchUnit,
    PatchedObject,
    VAddr,
    ADDRESS_LEN,
    PATCH_ID_LEN,
};

struct RecordReader<'a> {
    buf: &'a [u8],
    cursor: usize,
}

impl<'a> RecordReader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self {
            buf,
            cursor: 0,
        }
    }

    fn take(&mut self, len: usize, what: &'static str) -> Result<&'a [u8], MetadataError> {
        let end = self.cursor.checked_add(len).filter(|end| *end <= self.buf.len()).ok_or(MetadataError::Truncated(what))?;
        let ret = &self.buf[self.cursor..end];
        self.cursor = end;
        Ok(ret)
    }

    fn u8(&mut self, what: &'static str) -> Result<u8, MetadataError> {
        Ok(self.take(1, what)?[0])
    }

    fn u32(&mut self, what: &'static str) -> Result<u32, MetadataError> {
        Ok(NativeEndian::read_u32(self.take(4, what)?))
    }

    fn address(&mut self, what: &'static str) -> Result<VAddr, MetadataError> {
        Ok(NativeEndian::read_uint(self.take(ADDRESS_LEN, what)?, ADDRESS_LEN))
    }

    fn patch_id(&mut self, what: &'static str) -> Result<PatchId, MetadataError> {
        let mut id = [0; PATCH_ID_LEN];
        id.copy_from_slice(self.take(PATCH_ID_LEN, what)?);
        Ok(id)
    }

    fn bytes(&mut self, what: &'static str) -> Result<&'a [u8], MetadataError> {
        let len = self.u32(what)? as usize;
        self.take(len, what)
    }

    fn string(&mut self, what: &'static str) -> Result<String, MetadataError> {
        let bytes = self.bytes(what)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| MetadataError::InvalidString(what))
    }

    fn remaining(&self) -> usize {
        self.buf.len() - self.cursor
    }
}

/// Decode a complete record.
///
/// Paths and names must be UTF-8, anything else fails with [`MetadataError::InvalidString`].
pub fn from_bytes(buf: &[u8]) -> Result<PatchMetadata, MetadataError> {
    let mut reader = RecordReader::new(buf);

    let patch_type = reader.u8("patch type")?;
    let patch_type = PatchType::from_byte(patch_type).ok_or(MetadataError::InvalidPatchType(patch_type))?;
    let patch_id = reader.patch_id("patch id")?;
    let target_so_path = reader.string("livepatch path")?;
    let build_id = reader.bytes("build id")?.to_vec();
    let mut object = PatchedObject::new(reader.string("object name")?);
    object.set_build_id(build_id);

    let units = reader.u32("unit count")?;

    for _ in 0..units {
        let old_name = reader.string("old function name")?;
        let new_name = reader.string("new function name")?;
        let mut unit = PatchUnit::new(old_name, new_name);
        unit.set_old_address(reader.address("old function address")?);
        object.push_unit(unit);
    }

    let deps = reader.u32("dependency count")?;
    let mut dependencies = Vec::new();

    for _ in 0..deps {
        dependencies.push(Dependency::new(reader.patch_id("dependency id")?));
    }

    if reader.remaining() > 0 {
        return Err(MetadataError::TrailingData(reader.remaining()));
    }

    Ok(PatchMetadata {
        patch_type,
        patch_id,
        target_so_path,
        object,
        dependencies,
    })
}

/// Read and decode the record stored at `path`
pub fn load<P: AsRef<Path>>(path: P) -> Result<PatchMetadata, MetadataError> {
    let path = path.as_ref();
    let buf = std::fs::read(path).map_err(|err| MetadataError::OpenError(path.display().to_string(), err))?;
    from_bytes(&buf)
}
