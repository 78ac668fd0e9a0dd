//! The in-memory model of a patch metadata record and its binary encoding.
//!
//! A record is laid out as follows, with every integer in host byte order:
//!
//! | Field          | Size                                   |
//! |----------------|----------------------------------------|
//! | patch type     | 1 byte (1 = patch, 2 = revert)         |
//! | patch id       | 32 bytes                               |
//! | livepatch path | u32 length + bytes                     |
//! | build id       | u32 length + bytes                     |
//! | object name    | u32 length + bytes                     |
//! | units          | u32 count + `(old, new, address)` each |
//! | dependencies   | u32 count + 32 byte id each            |
//!
//! Names inside a unit are encoded like the other strings, the address takes
//! as many bytes as a pointer on the host.

mod error;
mod reader;
mod writer;

pub use error::MetadataError;
pub use reader::{
    from_bytes,
    load,
};
pub use writer::{
    serialize,
    to_bytes,
    write_to,
    Destination,
};

/// The number of bytes in a patch id
pub const PATCH_ID_LEN: usize = 32;

/// The number of bytes an address occupies inside a record
pub const ADDRESS_LEN: usize = std::mem::size_of::<usize>();

/// The opaque identifier of a live patch
pub type PatchId = [u8; PATCH_ID_LEN];

/// A virtual address inside the target library
pub type VAddr = u64;

/// What a record asks the runtime to do
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PatchType {
    Patch = 1,
    Revert = 2,
}

impl PatchType {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            1 => Some(PatchType::Patch),
            2 => Some(PatchType::Revert),
            _ => None,
        }
    }

    pub fn as_byte(self) -> u8 {
        self as u8
    }
}

/// A single function replacement: calls to `old_name` end up in `new_name`
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PatchUnit {
    old_name: String,
    new_name: String,
    old_address: VAddr,
}

impl PatchUnit {
    pub fn new<S: Into<String>, T: Into<String>>(old_name: S, new_name: T) -> Self {
        Self {
            old_name: old_name.into(),
            new_name: new_name.into(),
            old_address: 0,
        }
    }

    pub fn old_name(&self) -> &str {
        &self.old_name
    }

    pub fn new_name(&self) -> &str {
        &self.new_name
    }

    /// The address of `old_name` in the target library or 0 if it could not be resolved
    pub fn old_address(&self) -> VAddr {
        self.old_address
    }

    pub fn set_old_address(&mut self, old_address: VAddr) {
        self.old_address = old_address;
    }
}

/// The shared object that a patch modifies
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PatchedObject {
    name: String,
    build_id: Vec<u8>,
    units: Vec<PatchUnit>,
}

impl PatchedObject {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            build_id: Vec::new(),
            units: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn build_id(&self) -> &[u8] {
        &self.build_id
    }

    pub fn set_build_id(&mut self, build_id: Vec<u8>) {
        self.build_id = build_id;
    }

    pub fn units(&self) -> &[PatchUnit] {
        &self.units
    }

    pub fn units_mut(&mut self) -> &mut [PatchUnit] {
        &mut self.units
    }

    /// Append a unit, units keep their declaration order
    pub fn push_unit(&mut self, unit: PatchUnit) {
        self.units.push(unit);
    }
}

/// A reference to another patch that must be applied before this one
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Dependency {
    id: PatchId,
}

impl Dependency {
    pub fn new(id: PatchId) -> Self {
        Self {
            id,
        }
    }

    pub fn id(&self) -> &PatchId {
        &self.id
    }
}

/// The root of a patch metadata record
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PatchMetadata {
    patch_type: PatchType,
    patch_id: PatchId,
    target_so_path: String,
    object: PatchedObject,
    dependencies: Vec<Dependency>,
}

impl PatchMetadata {
    /// Create a [`PatchType::Patch`] record with an all-zero patch id and no dependencies
    pub fn new<S: Into<String>>(target_so_path: S, object: PatchedObject) -> Self {
        Self {
            patch_type: PatchType::Patch,
            patch_id: [0; PATCH_ID_LEN],
            target_so_path: target_so_path.into(),
            object,
            dependencies: Vec::new(),
        }
    }

    pub fn patch_type(&self) -> PatchType {
        self.patch_type
    }

    pub fn set_patch_type(&mut self, patch_type: PatchType) {
        self.patch_type = patch_type;
    }

    pub fn patch_id(&self) -> &PatchId {
        &self.patch_id
    }

    pub fn set_patch_id(&mut self, patch_id: PatchId) {
        self.patch_id = patch_id;
    }

    /// The path of the shared object that carries the replacement functions
    pub fn target_so_path(&self) -> &str {
        &self.target_so_path
    }

    pub fn set_target_so_path<S: Into<String>>(&mut self, target_so_path: S) {
        self.target_so_path = target_so_path.into();
    }

    pub fn object(&self) -> &PatchedObject {
        &self.object
    }

    pub fn object_mut(&mut self) -> &mut PatchedObject {
        &mut self.object
    }

    pub fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }

    /// Link a dependency into the record.
    ///
    /// New dependencies are placed in front of the existing ones, so the stored
    /// order is the reverse of the order in which they were added.
    pub fn add_dependency(&mut self, dependency: Dependency) {
        self.dependencies.insert(0, dependency);
    }
}
