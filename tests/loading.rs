//! Loading metadata images, well-formed and broken.

mod common;

use common::{write_root, Image};
use winmdscope::{
    metadata::tables::{CustomAttribute, TableId, TypeDef},
    Architecture, Database, Error, ReaderConfig,
};

#[test]
fn load_and_enumerate() {
    let mut image = Image::new();
    image.type_def("Windows.Win32.Foundation", "HANDLE");
    image.type_def("Windows.Win32.Foundation", "BOOL");
    image.type_def("Windows.Win32.Graphics.Gdi", "HDC");
    let db = Database::from_metadata(image.build()).unwrap();

    assert_eq!(db.type_count(), 4);
    assert_eq!(db.rows::<TypeDef>().len(), 4);
    assert_eq!(
        db.namespaces().collect::<Vec<_>>(),
        ["", "Windows.Win32.Foundation", "Windows.Win32.Graphics.Gdi"]
    );
    let foundation: Vec<_> = db
        .namespace_types("Windows.Win32.Foundation")
        .map(|t| t.name().unwrap())
        .collect();
    assert_eq!(foundation, ["HANDLE", "BOOL"]);
    assert_eq!(db.module().unwrap().name().unwrap(), "test.winmd");
}

#[test]
fn empty_input() {
    assert!(matches!(Database::from_metadata(Vec::new()), Err(Error::Empty)));
    assert!(matches!(Database::from_mem(Vec::new()), Err(Error::Empty)));
}

#[test]
fn missing_file() {
    let path = std::env::temp_dir().join("winmdscope-missing").join("none.winmd");
    assert!(Database::from_file(&path).is_err());
}

#[test]
fn bad_signature() {
    let mut data = Image::new().build();
    data[0] = b'X';
    assert!(matches!(
        Database::from_metadata(data),
        Err(Error::Malformed { .. })
    ));
}

#[test]
fn truncated_image() {
    let data = Image::new().build();
    let truncated = data[..data.len() - 8].to_vec();
    assert!(Database::from_metadata(truncated).is_err());
}

#[test]
fn no_tables_stream() {
    let data = write_root(&[("#Strings", vec![0]), ("#Blob", vec![0])]);
    assert!(matches!(
        Database::from_metadata(data),
        Err(Error::Malformed { .. })
    ));
}

#[test]
fn unsorted_association_table() {
    let build = || {
        let mut image = Image::new();
        let first = image.type_def("Windows.Win32.Foundation", "A");
        let second = image.type_def("Windows.Win32.Foundation", "B");
        image.supported_architecture(second, Architecture::X64);
        image.supported_architecture(first, Architecture::X86);
        image.build_as_is()
    };

    assert!(matches!(
        Database::from_metadata_with_config(build(), ReaderConfig::strict()),
        Err(Error::UnsortedTable(TableId::CustomAttribute))
    ));

    let db = Database::from_metadata_with_config(build(), ReaderConfig::minimal()).unwrap();
    assert_eq!(db.rows::<CustomAttribute>().len(), 2);
}
