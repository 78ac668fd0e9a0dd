//! Build id and symbol extraction on generated shared objects

use ulp::{
    frontend::{
        read_build_id,
        ElfError,
        ElfIntrospector,
    },
    metadata::{
        PatchUnit,
        PatchedObject,
    },
    Logger,
};

#[path = "../fixture/mod.rs"]
mod fixture;

use fixture::SharedObject;

fn introspect(shared_object: SharedObject, units: &[(&str, &str)]) -> Result<PatchedObject, ElfError> {
    let dir = tempfile::tempdir().unwrap();
    let library = dir.path().join("lib.so");
    shared_object.write(&library);

    let mut object = PatchedObject::new("lib.so");
    for (old, new) in units {
        object.push_unit(PatchUnit::new(*old, *new));
    }

    ElfIntrospector::new().introspect(&library, &mut object, &Logger::silent())?;
    Ok(object)
}

#[test]
fn test_fixture_is_valid_elf() {
    let bytes = SharedObject::new().symbol("a", 1).bytes();
    let elf = goblin::elf::Elf::parse(&bytes).unwrap();
    assert!(elf.is_64);
    assert!(elf.section_headers.iter().any(|shdr| elf.shdr_strtab.get_at(shdr.sh_name) == Some(".dynsym")));
}

#[test]
fn test_symbols() {
    let object = introspect(SharedObject::new().symbol("foo", 0x1000).symbol("bar", 0x2040), &[("bar", "bar_v2"), ("foo", "foo_v2")]).unwrap();
    assert_eq!(object.units()[0].old_address(), 0x2040);
    assert_eq!(object.units()[1].old_address(), 0x1000);
    assert_eq!(object.build_id(), &[0xaa, 0xbb, 0xcc, 0xdd]);
}

#[test]
fn test_first_match_wins() {
    let object = introspect(SharedObject::new().symbol("dup", 0x10).symbol("dup", 0x20), &[("dup", "dup_v2")]).unwrap();
    assert_eq!(object.units()[0].old_address(), 0x10);
}

#[test]
fn test_long_build_id() {
    let build_id: Vec<u8> = (0..20).collect();
    let object = introspect(SharedObject::new().build_id(&build_id), &[]).unwrap();
    assert_eq!(object.build_id(), &build_id[..]);
}

#[test]
fn test_odd_build_id_length() {
    let object = introspect(SharedObject::new().build_id(&[1, 2, 3, 4, 5]), &[]).unwrap();
    assert_eq!(object.build_id(), &[1, 2, 3, 4, 5]);
}

#[test]
fn test_missing_dynsym() {
    let result = introspect(SharedObject::new().without_dynsym(), &[]);
    assert!(matches!(result, Err(ElfError::MissingDynsym)));
}

#[test]
fn test_missing_build_id() {
    let result = introspect(SharedObject::new().symbol("f", 1).without_build_id(), &[("f", "g")]);
    assert!(matches!(result, Err(ElfError::MissingBuildIdSection)));
}

#[test]
fn test_wrong_note_type() {
    let result = introspect(SharedObject::new().note_type(1), &[]);
    assert!(matches!(result, Err(ElfError::MissingBuildIdNote)));
}

#[test]
fn test_empty_build_id() {
    let result = introspect(SharedObject::new().build_id(&[]), &[]);
    assert!(matches!(result, Err(ElfError::EmptyBuildId)));
}

#[test]
fn test_read_build_id() {
    let dir = tempfile::tempdir().unwrap();
    let library = dir.path().join("lib.so");
    SharedObject::new().build_id(&[9; 16]).without_dynsym().write(&library);

    assert_eq!(read_build_id(&library).unwrap(), vec![9; 16]);
}
