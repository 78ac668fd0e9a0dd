//! Sanity checks of a metadata record against the libraries of a process

use ulp::{
    metadata::{
        PatchMetadata,
        PatchedObject,
    },
    process::{
        check_sanity,
        SanityError,
        TargetProcess,
    },
    Logger,
};

#[path = "../fixture/mod.rs"]
mod fixture;

use fixture::SharedObject;

fn record(name: &str, build_id: &[u8]) -> PatchMetadata {
    let mut object = PatchedObject::new(name);
    object.set_build_id(build_id.to_vec());
    PatchMetadata::new("lib.so.1", object)
}

#[test]
fn test_matching_build_id() {
    let dir = tempfile::tempdir().unwrap();
    let library = dir.path().join("libfoo.so.6");
    SharedObject::new().build_id(&[1, 2, 3, 4]).write(&library);

    let process = TargetProcess::new(1, vec![1], vec![dir.path().join("libc.so.6"), library.clone()]);
    let found = check_sanity(&record("/usr/lib/libfoo.so.6", &[1, 2, 3, 4]), &process, &Logger::silent()).unwrap();
    assert_eq!(found, library);
}

#[test]
fn test_build_id_mismatch() {
    let dir = tempfile::tempdir().unwrap();
    let library = dir.path().join("libfoo.so.6");
    SharedObject::new().build_id(&[1, 2, 3, 4]).write(&library);

    let process = TargetProcess::new(1, vec![1], vec![library]);
    match check_sanity(&record("libfoo.so.6", &[1, 2, 3, 5]), &process, &Logger::silent()) {
        Err(SanityError::BuildIdMismatch {
            expected,
            found,
            ..
        }) => {
            assert_eq!(expected, "01020305");
            assert_eq!(found, "01020304");
        },
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn test_library_without_build_id() {
    let dir = tempfile::tempdir().unwrap();
    let library = dir.path().join("libfoo.so.6");
    SharedObject::new().without_build_id().write(&library);

    let process = TargetProcess::new(1, vec![1], vec![library]);
    let result = check_sanity(&record("libfoo.so.6", &[1]), &process, &Logger::silent());
    assert!(matches!(result, Err(SanityError::ElfError(..))));
}

#[test]
fn test_library_not_loaded() {
    let process = TargetProcess::new(1, vec![1], Vec::new());
    let result = check_sanity(&record("libfoo.so.6", &[1]), &process, &Logger::silent());
    assert!(matches!(result, Err(SanityError::LibraryNotLoaded(_))));
}
