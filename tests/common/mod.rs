//! A metadata image writer for the integration tests.
//!
//! Mirrors the crate's unit-test `MetadataBuilder` for the rows these tests need: types, enums,
//! type references and `SupportedArchitectureAttribute`. Method names, the `mscorlib` reference
//! scope, the blob encoding and the `Architecture` enum appended at build time follow it, so a
//! scenario reads the same in both places.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};

use winmdscope::{
    metadata::tables::{CodedIndexType, TableId, TableInfo},
    Architecture,
};

pub const VERSION: &str = "WindowsRuntime 1.4";
pub const MODULE_NAME: &str = "test.winmd";

const METADATA_NAMESPACE: &str = "Windows.Win32.Foundation.Metadata";

/// Route the crate's `log` output to the test harness, once per process
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// ECMA-335 II.23.2 compressed unsigned integer
pub fn compressed_uint(value: u32) -> Vec<u8> {
    match value {
        0..=0x7F => vec![value as u8],
        0x80..=0x3FFF => vec![0x80 | (value >> 8) as u8, value as u8],
        _ => (0xC000_0000 | value).to_be_bytes().to_vec(),
    }
}

/// A compressed `TypeDefOrRef` reference to TypeRef row `rid`, as used in signatures
pub fn type_ref_token(rid: u32) -> Vec<u8> {
    compressed_uint((rid << 2) | 1)
}

fn coded(kind: CodedIndexType, table: TableId, rid: u32) -> u32 {
    kind.encode(table, rid).unwrap()
}

fn padded(len: usize) -> usize {
    (len + 3) & !3
}

pub struct Image {
    rows: BTreeMap<TableId, Vec<Vec<u32>>>,
    strings: Vec<u8>,
    string_offsets: HashMap<String, u32>,
    blobs: Vec<u8>,
    field_owners: Vec<u32>,
    type_refs: HashMap<(String, String), u32>,
    constructor: Option<u32>,
    architecture_enum: bool,
}

impl Default for Image {
    fn default() -> Self {
        Self::new()
    }
}

impl Image {
    /// An image with the `Module` row, the `<Module>` type and a reference to `mscorlib`
    pub fn new() -> Self {
        let mut image = Image {
            rows: BTreeMap::new(),
            strings: vec![0],
            string_offsets: HashMap::new(),
            blobs: vec![0],
            field_owners: Vec::new(),
            type_refs: HashMap::new(),
            constructor: None,
            architecture_enum: false,
        };

        let name = image.string(MODULE_NAME);
        image.push(TableId::Module, vec![0, name, 1, 0, 0]);

        let name = image.string("mscorlib");
        let token = image.blob(&[0xB7, 0x7A, 0x5C, 0x56, 0x19, 0x34, 0xE0, 0x89]);
        image.push(TableId::AssemblyRef, vec![4, 0, 0, 0, 0, token, name, 0, 0]);

        image.type_def_with("", "<Module>", 0, 0);
        image
    }

    fn push(&mut self, table: TableId, row: Vec<u32>) -> u32 {
        let rows = self.rows.entry(table).or_default();
        rows.push(row);
        rows.len() as u32
    }

    fn string(&mut self, value: &str) -> u32 {
        if value.is_empty() {
            return 0;
        }
        if let Some(offset) = self.string_offsets.get(value) {
            return *offset;
        }

        let offset = self.strings.len() as u32;
        self.strings.extend_from_slice(value.as_bytes());
        self.strings.push(0);
        self.string_offsets.insert(value.to_string(), offset);
        offset
    }

    fn blob(&mut self, value: &[u8]) -> u32 {
        if value.is_empty() {
            return 0;
        }

        let offset = self.blobs.len() as u32;
        self.blobs.extend(compressed_uint(value.len() as u32));
        self.blobs.extend_from_slice(value);
        offset
    }

    fn type_def_with(&mut self, namespace: &str, name: &str, flags: u32, extends: u32) -> u32 {
        let name = self.string(name);
        let namespace = self.string(namespace);
        // List columns are filled in by `build`
        self.push(TableId::TypeDef, vec![flags, name, namespace, extends, 0, 1])
    }

    /// Add a public type, returning its `TypeDef` row
    pub fn type_def(&mut self, namespace: &str, name: &str) -> u32 {
        self.type_def_with(namespace, name, 0x0001, 0)
    }

    /// Add an enum whose `value__` field has the field signature `value_signature`
    pub fn enum_type(&mut self, namespace: &str, name: &str, value_signature: &[u8]) -> u32 {
        let system_enum = self.shared_type_ref("System", "Enum");
        let extends = coded(CodedIndexType::TypeDefOrRef, TableId::TypeRef, system_enum);
        // Public | Sealed
        let rid = self.type_def_with(namespace, name, 0x0101, extends);

        if let Some(last) = self.field_owners.last() {
            assert!(*last <= rid, "field of row {rid} added after field of row {last}");
        }
        self.field_owners.push(rid);
        let field_name = self.string("value__");
        let signature = self.blob(value_signature);
        // Public | SpecialName | RTSpecialName
        self.push(TableId::Field, vec![0x0606, field_name, signature]);
        rid
    }

    /// Declare `nested` as nested inside `enclosing`
    pub fn nested_class(&mut self, nested: u32, enclosing: u32) {
        self.push(TableId::NestedClass, vec![nested, enclosing]);
    }

    /// Add a reference to a top-level type of `mscorlib`, returning its `TypeRef` row
    pub fn type_ref(&mut self, namespace: &str, name: &str) -> u32 {
        let scope = coded(CodedIndexType::ResolutionScope, TableId::AssemblyRef, 1);
        let name = self.string(name);
        let namespace = self.string(namespace);
        self.push(TableId::TypeRef, vec![scope, name, namespace])
    }

    /// Add a reference to the type `name` nested in the referenced type `enclosing`
    pub fn nested_type_ref(&mut self, enclosing: u32, name: &str) -> u32 {
        let scope = coded(CodedIndexType::ResolutionScope, TableId::TypeRef, enclosing);
        let name = self.string(name);
        self.push(TableId::TypeRef, vec![scope, name, 0])
    }

    fn shared_type_ref(&mut self, namespace: &str, name: &str) -> u32 {
        let key = (namespace.to_string(), name.to_string());
        if let Some(rid) = self.type_refs.get(&key) {
            return *rid;
        }

        let rid = self.type_ref(namespace, name);
        self.type_refs.insert(key, rid);
        rid
    }

    fn constructor(&mut self) -> u32 {
        if let Some(rid) = self.constructor {
            return rid;
        }

        let attribute = self.shared_type_ref(METADATA_NAMESPACE, "SupportedArchitectureAttribute");
        let enum_ref = self.shared_type_ref(METADATA_NAMESPACE, "Architecture");
        // instance void .ctor(valuetype Architecture)
        let mut signature = vec![0x20, 0x01, 0x01, 0x11];
        signature.extend(type_ref_token(enum_ref));

        let class = coded(CodedIndexType::MemberRefParent, TableId::TypeRef, attribute);
        let name = self.string(".ctor");
        let signature = self.blob(&signature);
        let rid = self.push(TableId::MemberRef, vec![class, name, signature]);
        self.constructor = Some(rid);
        rid
    }

    fn architecture_attribute(&mut self, parent: TableId, parent_rid: u32, arch: Architecture) {
        self.architecture_enum = true;
        let constructor = self.constructor();
        let parent = coded(CodedIndexType::HasCustomAttribute, parent, parent_rid);
        let constructor = coded(CodedIndexType::CustomAttributeType, TableId::MemberRef, constructor);

        let mut value = vec![0x01, 0x00];
        value.extend(arch.bits().to_le_bytes());
        value.extend([0x00, 0x00]);
        let value = self.blob(&value);
        self.push(TableId::CustomAttribute, vec![parent, constructor, value]);
    }

    /// Attach `SupportedArchitectureAttribute(arch)` to `TypeDef` row `type_def`
    pub fn supported_architecture(&mut self, type_def: u32, arch: Architecture) {
        self.architecture_attribute(TableId::TypeDef, type_def, arch);
    }

    /// Attach `SupportedArchitectureAttribute(arch)` to `TypeRef` row `type_ref`
    pub fn type_ref_architecture(&mut self, type_ref: u32, arch: Architecture) {
        self.architecture_attribute(TableId::TypeRef, type_ref, arch);
    }

    fn fill_lists(&mut self) {
        if self.architecture_enum {
            // field int32 value__
            self.enum_type(METADATA_NAMESPACE, "Architecture", &[0x06, 0x08]);
        }

        let owners = &self.field_owners;
        if let Some(type_defs) = self.rows.get_mut(&TableId::TypeDef) {
            for (rid, row) in type_defs.iter_mut().enumerate() {
                let owner = rid as u32 + 1;
                row[4] = owners.partition_point(|candidate| *candidate < owner) as u32 + 1;
            }
        }
    }

    /// Serialise with the association tables sorted
    pub fn build(mut self) -> Vec<u8> {
        self.fill_lists();
        for table in [TableId::CustomAttribute, TableId::NestedClass] {
            if let Some(rows) = self.rows.get_mut(&table) {
                rows.sort_by_key(|row| row[0]);
            }
        }
        self.write()
    }

    /// Serialise the rows in the order they were added
    pub fn build_as_is(mut self) -> Vec<u8> {
        self.fill_lists();
        self.write()
    }

    fn tables_stream(&self) -> Vec<u8> {
        let counts: Vec<(TableId, u32)> = self
            .rows
            .iter()
            .map(|(table, rows)| (*table, rows.len() as u32))
            .collect();
        let info = TableInfo::from_counts(&counts, false, false, false);

        let mut stream = vec![0, 0, 0, 0, 2, 0, 0, 1];
        let valid = counts.iter().fold(0u64, |valid, (table, _)| valid | table.mask());
        stream.extend(valid.to_le_bytes());
        stream.extend(0u64.to_le_bytes());
        for (_, count) in &counts {
            stream.extend(count.to_le_bytes());
        }
        for (table, rows) in &self.rows {
            for row in rows {
                for (column, value) in table.columns().iter().zip(row) {
                    match column.width(&info) {
                        1 => stream.push(*value as u8),
                        2 => stream.extend((*value as u16).to_le_bytes()),
                        _ => stream.extend(value.to_le_bytes()),
                    }
                }
            }
        }
        stream
    }

    fn write(self) -> Vec<u8> {
        let streams = [
            ("#~", self.tables_stream()),
            ("#Strings", self.strings),
            ("#US", vec![0]),
            ("#GUID", (1..=16).collect::<Vec<u8>>()),
            ("#Blob", self.blobs),
        ];
        write_root(&streams)
    }
}

/// Wrap streams into a metadata directory starting with `BSJB`
pub fn write_root(streams: &[(&str, Vec<u8>)]) -> Vec<u8> {
    let version_len = padded(VERSION.len() + 1);
    let headers: usize = streams
        .iter()
        .map(|(name, _)| 8 + padded(name.len() + 1))
        .sum();
    let mut offset = 16 + version_len + 4 + headers;

    let mut data = b"BSJB".to_vec();
    data.extend([1, 0, 1, 0, 0, 0, 0, 0]);
    data.extend((version_len as u32).to_le_bytes());
    let mut version = VERSION.as_bytes().to_vec();
    version.resize(version_len, 0);
    data.extend(version);
    data.extend(0u16.to_le_bytes());
    data.extend((streams.len() as u16).to_le_bytes());

    let mut bodies = Vec::new();
    for (name, body) in streams {
        let mut body = body.clone();
        body.resize(padded(body.len()), 0);
        data.extend((offset as u32).to_le_bytes());
        data.extend((body.len() as u32).to_le_bytes());
        let mut name = name.as_bytes().to_vec();
        name.resize(padded(name.len() + 1), 0);
        data.extend(name);
        offset += body.len();
        bodies.extend(body);
    }

    data.extend(bodies);
    data
}
