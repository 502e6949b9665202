//! Integration tests for writing XUR files and verifying round-trip.

mod common;

use std::sync::Arc;
use std::thread;

use tempfile::NamedTempFile;

use xur::core::{PropertyValue, UiObject};
use xur::util::Vector;
use xur::xur::{batch, FormatVersion, IArchive, OArchive, ObjectTree, VectorPool, STRN_MAGIC, VECT_MAGIC};

use common::{def, sample_scene, schema};

#[test]
fn test_roundtrip_tree_v8() {
    let schema = schema();
    let root = sample_scene(&schema);

    let bytes = OArchive::new(FormatVersion::V8)
        .write_bytes(&root, &schema)
        .expect("Failed to write archive");
    let archive = IArchive::from_bytes(&bytes, &schema).expect("Failed to read archive");

    assert_eq!(archive.version(), FormatVersion::V8);
    assert_eq!(archive.root(), Some(&root));
    assert_eq!(archive.root().unwrap().count_objects(), 4);
}

#[test]
fn test_roundtrip_tree_v5() {
    let schema = schema();
    let root = sample_scene(&schema);

    let bytes = OArchive::new(FormatVersion::V5)
        .write_bytes(&root, &schema)
        .expect("Failed to write archive");
    let archive = IArchive::from_bytes(&bytes, &schema).expect("Failed to read archive");

    assert_eq!(archive.root(), Some(&root));
    assert!(archive.vectors().is_none());
    assert_eq!(archive.sections().len(), 2);
}

#[test]
fn test_reencode_is_byte_identical() {
    let schema = schema();
    for version in [FormatVersion::V5, FormatVersion::V8] {
        let bytes = OArchive::new(version)
            .with_flags(0x0000_0100)
            .with_tool_version(0x0203)
            .write_bytes(&sample_scene(&schema), &schema)
            .expect("Failed to write archive");
        let archive = IArchive::from_bytes(&bytes, &schema).expect("Failed to read archive");
        let again = archive.to_bytes(&schema).expect("Failed to re-encode archive");
        assert_eq!(again, bytes, "{} re-encode differs", version);
    }
}

#[test]
fn test_file_size_invariant() {
    let schema = schema();
    let bytes = OArchive::new(FormatVersion::V8)
        .write_bytes(&sample_scene(&schema), &schema)
        .expect("Failed to write archive");
    let archive = IArchive::from_bytes(&bytes, &schema).expect("Failed to read archive");

    assert_eq!(archive.header().file_size as usize, bytes.len());
    assert_eq!(archive.table().end_offset(), bytes.len());
}

#[test]
fn test_string_table_order() {
    let schema = schema();
    let bytes = OArchive::new(FormatVersion::V8)
        .write_bytes(&sample_scene(&schema), &schema)
        .expect("Failed to write archive");
    let archive = IArchive::from_bytes(&bytes, &schema).expect("Failed to read archive");

    let strings: Vec<&str> = archive.strings().unwrap().iter().collect();
    assert_eq!(
        strings,
        [
            "XuiScene", "XuiText", "XuiGroup", "XuiFigure", "MainMenu", "start", "Press Start",
            "panel", "backdrop", "Idle", "", "Intro", "IntroEnd", "Outro",
        ]
    );
    // The String Table is always the first payload after the section table.
    assert_eq!(archive.table().entries()[0].magic, STRN_MAGIC);
}

#[test]
fn test_vector_pool_dedup() {
    let schema = schema();
    let bytes = OArchive::new(FormatVersion::V8)
        .write_bytes(&sample_scene(&schema), &schema)
        .expect("Failed to write archive");
    let archive = IArchive::from_bytes(&bytes, &schema).expect("Failed to read archive");

    let pool = archive.find_section::<VectorPool>().expect("V8 archive has a vector pool");
    let center = Vector::new(320.0, 240.0, 0.0);
    assert_eq!(
        pool.vectors(),
        &[center, Vector::new(1.0, 1.0, 1.0), Vector::new(0.0, -8.0, 0.0), Vector::new(320.0, 520.0, 0.0)]
    );
    assert_eq!(pool.index_of(&center), Some(0));
    assert_eq!(archive.table_entry_for(VECT_MAGIC).unwrap().length, 4 * 12);
}

#[test]
fn test_properties_written_in_canonical_order() {
    let schema = schema();
    let text = "XuiText";
    let root = UiObject::new(text)
        .with_property(def(&schema, text, "TextColor"), PropertyValue::Color(1))
        .with_property(def(&schema, text, "Width"), PropertyValue::Float(2.0))
        .with_property(def(&schema, text, "Text"), PropertyValue::String("hi".into()))
        .with_property(def(&schema, text, "Id"), PropertyValue::String("t".into()));

    let bytes = OArchive::new(FormatVersion::V8)
        .write_bytes(&root, &schema)
        .expect("Failed to write archive");
    let archive = IArchive::from_bytes(&bytes, &schema).expect("Failed to read archive");

    let names: Vec<&str> = archive.root().unwrap().properties.iter().map(|p| p.name()).collect();
    assert_eq!(names, ["Id", "Width", "Text", "TextColor"]);
}

#[test]
fn test_open_file_mmap_and_buffered() {
    let schema = schema();
    let root = sample_scene(&schema);
    let temp = NamedTempFile::new().expect("Failed to create temp file");
    let path = temp.path();

    OArchive::new(FormatVersion::V8)
        .write_file(path, &root, &schema)
        .expect("Failed to write archive");

    let mapped = IArchive::open_opts(path, true, &schema).expect("Failed to open with mmap");
    let buffered = IArchive::open_opts(path, false, &schema).expect("Failed to open buffered");
    assert_eq!(mapped.root(), Some(&root));
    assert_eq!(buffered.root(), Some(&root));
    assert_eq!(mapped.header(), buffered.header());
}

#[test]
fn test_concurrent_reads_share_schema() {
    let schema = Arc::new(schema());
    let bytes = Arc::new(
        OArchive::new(FormatVersion::V8)
            .write_bytes(&sample_scene(&schema), &*schema)
            .expect("Failed to write archive"),
    );

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let schema = Arc::clone(&schema);
            let bytes = Arc::clone(&bytes);
            thread::spawn(move || {
                let archive = IArchive::from_bytes(&bytes, &*schema).expect("Failed to read archive");
                archive.find_section::<ObjectTree>().map(|t| t.root().count_objects())
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), Some(4));
    }
}

#[test]
fn test_batch_verify_roundtrip() {
    let schema = schema();
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let paths: Vec<_> = [FormatVersion::V5, FormatVersion::V8]
        .into_iter()
        .map(|version| {
            let path = dir.path().join(format!("{}.xur", version));
            OArchive::new(version)
                .write_file(&path, &sample_scene(&schema), &schema)
                .expect("Failed to write archive");
            path
        })
        .collect();

    let results = batch::verify_roundtrip(&paths, &schema);
    assert!(results.iter().all(|r| matches!(r.result, Ok(true))));
}
