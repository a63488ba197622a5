//! A small metadata writer for unit tests.
//!
//! Rows are collected per table as raw column values and serialised with the same column schema
//! the reader uses, so every width decision (2 or 4 byte indexes) follows [`TableInfo`]. The
//! output is a bare metadata directory starting with `BSJB`, loadable with
//! [`crate::Database::from_metadata`].
//!
//! Member lists are derived from the owners given when members are added; members must be added
//! in owner order. Association tables are sorted by their key column before writing.
//!
//! Images that carry `SupportedArchitectureAttribute` also define the `Architecture` enum it
//! takes, as the last `TypeDef` row.

use std::collections::HashMap;

use strum::IntoEnumIterator;

use crate::metadata::{
    architecture::{Architecture, SUPPORTED_ARCHITECTURE_NAME, SUPPORTED_ARCHITECTURE_NAMESPACE},
    association::Association,
    root::CIL_HEADER_MAGIC,
    signatures::ELEMENT_TYPE,
    tables::{
        CodedIndexType, FieldAttributes, MethodAttributes, MethodSemanticsAttributes, TableId,
        TableInfo, TypeAttributes, TABLE_COUNT,
    },
};

/// Runtime version written into the metadata root
pub const VERSION: &str = "WindowsRuntime 1.4";
/// Name of the `Module` row
pub const MODULE_NAME: &str = "test.winmd";

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

/// Collects rows and heaps of one metadata image.
pub struct MetadataBuilder {
    rows: Vec<Vec<Vec<u32>>>,
    strings: Vec<u8>,
    string_offsets: HashMap<String, u32>,
    blobs: Vec<u8>,
    // Owners of the list-owned rows, in row order
    field_owners: Vec<u32>,
    method_owners: Vec<u32>,
    param_owners: Vec<u32>,
    property_owners: Vec<u32>,
    type_refs: HashMap<(String, String), u32>,
    module_refs: HashMap<String, u32>,
    constructors: HashMap<(String, String), u32>,
    architecture_enum: bool,
}

impl Default for MetadataBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MetadataBuilder {
    /// An image with the `Module` row, the `<Module>` type and a reference to `mscorlib`
    pub fn new() -> Self {
        let mut builder = MetadataBuilder {
            rows: vec![Vec::new(); TABLE_COUNT],
            strings: vec![0],
            string_offsets: HashMap::new(),
            blobs: vec![0],
            field_owners: Vec::new(),
            method_owners: Vec::new(),
            param_owners: Vec::new(),
            property_owners: Vec::new(),
            type_refs: HashMap::new(),
            module_refs: HashMap::new(),
            constructors: HashMap::new(),
            architecture_enum: false,
        };

        let name = builder.string(MODULE_NAME);
        builder.push(TableId::Module, vec![0, name, 1, 0, 0]);

        let name = builder.string("mscorlib");
        let token = builder.blob(&[0xB7, 0x7A, 0x5C, 0x56, 0x19, 0x34, 0xE0, 0x89]);
        builder.push(TableId::AssemblyRef, vec![4, 0, 0, 0, 0, token, name, 0, 0]);

        builder.type_def_with("", "<Module>", 0, 0);
        builder
    }

    fn push(&mut self, table: TableId, row: Vec<u32>) -> u32 {
        let rows = &mut self.rows[table as usize];
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
        self.push(TableId::TypeDef, vec![flags, name, namespace, extends, 0, 0])
    }

    /// Add a public type, returning its `TypeDef` row
    pub fn type_def(&mut self, namespace: &str, name: &str) -> u32 {
        self.type_def_with(namespace, name, TypeAttributes::PUBLIC, 0)
    }

    /// Add an enum whose `value__` field has the field signature `value_signature`
    pub fn enum_type(&mut self, namespace: &str, name: &str, value_signature: &[u8]) -> u32 {
        let system_enum = self.shared_type_ref("System", "Enum");
        let extends = coded(CodedIndexType::TypeDefOrRef, TableId::TypeRef, system_enum);
        let rid = self.type_def_with(
            namespace,
            name,
            TypeAttributes::PUBLIC | TypeAttributes::SEALED,
            extends,
        );

        self.field_with(
            rid,
            "value__",
            value_signature,
            FieldAttributes::PUBLIC | FieldAttributes::SPECIAL_NAME | FieldAttributes::RT_SPECIAL_NAME,
        );
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

    /// The `.ctor` `MemberRef` of the attribute `namespace.name` with the given signature
    fn constructor(&mut self, namespace: &str, name: &str, signature: &[u8]) -> u32 {
        let key = (namespace.to_string(), name.to_string());
        if let Some(rid) = self.constructors.get(&key) {
            return *rid;
        }

        let attribute = self.shared_type_ref(namespace, name);
        let class = coded(CodedIndexType::MemberRefParent, TableId::TypeRef, attribute);
        let ctor_name = self.string(".ctor");
        let signature = self.blob(signature);
        let rid = self.push(TableId::MemberRef, vec![class, ctor_name, signature]);
        self.constructors.insert(key, rid);
        rid
    }

    fn attribute(&mut self, parent: TableId, parent_rid: u32, constructor: u32, value: &[u8]) {
        let parent = coded(CodedIndexType::HasCustomAttribute, parent, parent_rid);
        let constructor = coded(CodedIndexType::CustomAttributeType, TableId::MemberRef, constructor);
        let value = self.blob(value);
        self.push(TableId::CustomAttribute, vec![parent, constructor, value]);
    }

    fn architecture_attribute(&mut self, parent: TableId, parent_rid: u32, arch: Architecture) {
        self.architecture_enum = true;
        let enum_ref = self.shared_type_ref(SUPPORTED_ARCHITECTURE_NAMESPACE, "Architecture");
        // instance void .ctor(valuetype Architecture)
        let mut signature = vec![0x20, 0x01, ELEMENT_TYPE::VOID, ELEMENT_TYPE::VALUETYPE];
        signature.extend(type_ref_token(enum_ref));
        let constructor = self.constructor(
            SUPPORTED_ARCHITECTURE_NAMESPACE,
            SUPPORTED_ARCHITECTURE_NAME,
            &signature,
        );

        let mut value = vec![0x01, 0x00];
        value.extend(arch.bits().to_le_bytes());
        value.extend([0x00, 0x00]);
        self.attribute(parent, parent_rid, constructor, &value);
    }

    /// Attach `SupportedArchitectureAttribute(arch)` to `TypeDef` row `type_def`
    pub fn supported_architecture(&mut self, type_def: u32, arch: Architecture) {
        self.architecture_attribute(TableId::TypeDef, type_def, arch);
    }

    /// Attach `SupportedArchitectureAttribute(arch)` to `TypeRef` row `type_ref`
    pub fn type_ref_architecture(&mut self, type_ref: u32, arch: Architecture) {
        self.architecture_attribute(TableId::TypeRef, type_ref, arch);
    }

    /// Attach an attribute `namespace.name` with its own `.ctor` signature and value blob.
    ///
    /// Every call adds a new constructor `MemberRef`, so the signature may differ between calls.
    pub fn custom_attribute(
        &mut self,
        parent: TableId,
        parent_rid: u32,
        namespace: &str,
        name: &str,
        signature: &[u8],
        value: &[u8],
    ) {
        let attribute = self.shared_type_ref(namespace, name);
        let class = coded(CodedIndexType::MemberRefParent, TableId::TypeRef, attribute);
        let ctor_name = self.string(".ctor");
        let signature = self.blob(signature);
        let constructor = self.push(TableId::MemberRef, vec![class, ctor_name, signature]);
        self.attribute(parent, parent_rid, constructor, value);
    }

    /// Attach an attribute without arguments to `TypeDef` row `type_def`
    pub fn marker_attribute(&mut self, type_def: u32, namespace: &str, name: &str) {
        let constructor = self.constructor(namespace, name, &[0x20, 0x00, ELEMENT_TYPE::VOID]);
        self.attribute(TableId::TypeDef, type_def, constructor, &[0x01, 0x00, 0x00, 0x00]);
    }

    fn check_order(owners: &[u32], owner: u32, what: &str) {
        if let Some(last) = owners.last() {
            assert!(
                *last <= owner,
                "{what} of row {owner} added after {what} of row {last}"
            );
        }
    }

    fn field_with(&mut self, owner: u32, name: &str, signature: &[u8], flags: u16) -> u32 {
        Self::check_order(&self.field_owners, owner, "field");
        self.field_owners.push(owner);
        let name = self.string(name);
        let signature = self.blob(signature);
        self.push(TableId::Field, vec![u32::from(flags), name, signature])
    }

    /// Add an instance field to `TypeDef` row `owner`
    pub fn field(&mut self, owner: u32, name: &str, signature: &[u8]) -> u32 {
        self.field_with(owner, name, signature, FieldAttributes::PUBLIC)
    }

    /// Add a literal field with a `Constant` of element type `kind` holding `value`
    pub fn constant_field(
        &mut self,
        owner: u32,
        name: &str,
        signature: &[u8],
        kind: u8,
        value: &[u8],
    ) -> u32 {
        let rid = self.field_with(
            owner,
            name,
            signature,
            FieldAttributes::PUBLIC
                | FieldAttributes::STATIC
                | FieldAttributes::LITERAL
                | FieldAttributes::HAS_DEFAULT,
        );
        let parent = coded(CodedIndexType::HasConstant, TableId::Field, rid);
        let value = self.blob(value);
        self.push(TableId::Constant, vec![u32::from(kind), 0, parent, value]);
        rid
    }

    /// Add explicit packing and size to `TypeDef` row `parent`
    pub fn class_layout(&mut self, parent: u32, packing_size: u16, class_size: u32) {
        self.push(
            TableId::ClassLayout,
            vec![u32::from(packing_size), class_size, parent],
        );
    }

    /// Add a static method to `TypeDef` row `owner`
    pub fn method(&mut self, owner: u32, name: &str, signature: &[u8]) -> u32 {
        Self::check_order(&self.method_owners, owner, "method");
        self.method_owners.push(owner);
        let flags = MethodAttributes::PUBLIC | MethodAttributes::STATIC | MethodAttributes::HIDE_BY_SIG;
        let name = self.string(name);
        let signature = self.blob(signature);
        // PreserveSig
        self.push(
            TableId::MethodDef,
            vec![0, 0x0080, u32::from(flags), name, signature, 0],
        )
    }

    /// Add parameter `sequence` to `MethodDef` row `method`
    pub fn param(&mut self, method: u32, sequence: u16, name: &str) -> u32 {
        Self::check_order(&self.param_owners, method, "parameter");
        self.param_owners.push(method);
        let name = self.string(name);
        self.push(TableId::Param, vec![0, u32::from(sequence), name])
    }

    /// Declare `MethodDef` row `method` as imported as `import_name` from `module`
    pub fn impl_map(&mut self, method: u32, import_name: &str, module: &str) {
        let scope = match self.module_refs.get(module) {
            Some(rid) => *rid,
            None => {
                let name = self.string(module);
                let rid = self.push(TableId::ModuleRef, vec![name]);
                self.module_refs.insert(module.to_string(), rid);
                rid
            }
        };

        let member = coded(CodedIndexType::MemberForwarded, TableId::MethodDef, method);
        let import_name = self.string(import_name);
        // NoMangle | CallConvPlatformapi
        self.push(TableId::ImplMap, vec![0x0101, member, import_name, scope]);
    }

    /// Add a property to `TypeDef` row `owner`, optionally with the getter `MethodDef` row
    pub fn property(
        &mut self,
        owner: u32,
        name: &str,
        signature: &[u8],
        getter: Option<u32>,
    ) -> u32 {
        Self::check_order(&self.property_owners, owner, "property");
        if self.property_owners.last() != Some(&owner) {
            // List column is filled in by `build`
            self.push(TableId::PropertyMap, vec![owner, 0]);
        }
        self.property_owners.push(owner);

        let name = self.string(name);
        let signature = self.blob(signature);
        let rid = self.push(TableId::Property, vec![0, name, signature]);
        if let Some(getter) = getter {
            let association = coded(CodedIndexType::HasSemantics, TableId::Property, rid);
            self.push(
                TableId::MethodSemantics,
                vec![u32::from(MethodSemanticsAttributes::GETTER), getter, association],
            );
        }
        rid
    }

    /// First row of the list owned by `owner`, given the owners of all listed rows in order
    fn list_start(owners: &[u32], owner: u32) -> u32 {
        owners.partition_point(|candidate| *candidate < owner) as u32 + 1
    }

    fn fill_lists(&mut self) {
        for (rid, row) in self.rows[TableId::TypeDef as usize].iter_mut().enumerate() {
            let owner = rid as u32 + 1;
            row[4] = Self::list_start(&self.field_owners, owner);
            row[5] = Self::list_start(&self.method_owners, owner);
        }

        for (rid, row) in self.rows[TableId::MethodDef as usize].iter_mut().enumerate() {
            row[5] = Self::list_start(&self.param_owners, rid as u32 + 1);
        }

        for row in &mut self.rows[TableId::PropertyMap as usize] {
            row[1] = Self::list_start(&self.property_owners, row[0]);
        }

        for association in Association::iter() {
            let column = association.column();
            self.rows[association.table() as usize].sort_by_key(|row| row[column]);
        }
    }

    fn tables_stream(&self) -> Vec<u8> {
        let counts: Vec<(TableId, u32)> = TableId::iter()
            .map(|table| (table, self.rows[table as usize].len() as u32))
            .filter(|(_, count)| *count > 0)
            .collect();
        let info = TableInfo::from_counts(&counts, false, false, false);
        let valid = counts
            .iter()
            .fold(0u64, |valid, (table, _)| valid | table.mask());

        let mut data = vec![0, 0, 0, 0, 2, 0, 0, 1];
        data.extend(valid.to_le_bytes());
        data.extend(0u64.to_le_bytes());
        for (_, count) in &counts {
            data.extend(count.to_le_bytes());
        }

        for (table, _) in &counts {
            let columns = table.columns();
            for row in &self.rows[*table as usize] {
                for (column, value) in columns.iter().zip(row) {
                    match column.width(&info) {
                        1 => data.push(*value as u8),
                        2 => data.extend((*value as u16).to_le_bytes()),
                        _ => data.extend(value.to_le_bytes()),
                    }
                }
            }
        }

        data
    }

    fn write_root(streams: &[(&str, Vec<u8>)]) -> Vec<u8> {
        let mut version = VERSION.as_bytes().to_vec();
        version.resize((VERSION.len() + 1 + 3) & !3, 0);

        let headers_len: usize = streams
            .iter()
            .map(|(name, _)| 8 + ((name.len() + 1 + 3) & !3))
            .sum();
        let mut offset = 16 + version.len() + 4 + headers_len;

        let mut data = CIL_HEADER_MAGIC.to_le_bytes().to_vec();
        data.extend(1u16.to_le_bytes());
        data.extend(1u16.to_le_bytes());
        data.extend(0u32.to_le_bytes());
        data.extend((version.len() as u32).to_le_bytes());
        data.extend(&version);
        data.extend(0u16.to_le_bytes());
        data.extend((streams.len() as u16).to_le_bytes());

        let mut bodies = Vec::new();
        for (name, body) in streams {
            let mut body = body.clone();
            body.resize((body.len() + 3) & !3, 0);

            data.extend((offset as u32).to_le_bytes());
            data.extend((body.len() as u32).to_le_bytes());
            let mut name_bytes = name.as_bytes().to_vec();
            name_bytes.resize((name.len() + 1 + 3) & !3, 0);
            data.extend(name_bytes);

            offset += body.len();
            bodies.extend(body);
        }

        data.extend(bodies);
        data
    }

    fn heaps(&self) -> Vec<(&'static str, Vec<u8>)> {
        let mvid: Vec<u8> = (1..=16).collect();
        vec![
            ("#Strings", self.strings.clone()),
            ("#US", vec![0]),
            ("#GUID", mvid),
            ("#Blob", self.blobs.clone()),
        ]
    }

    /// Serialise the image
    pub fn build(mut self) -> Vec<u8> {
        if self.architecture_enum {
            // field int32 value__
            self.enum_type(
                SUPPORTED_ARCHITECTURE_NAMESPACE,
                "Architecture",
                &[0x06, ELEMENT_TYPE::I4],
            );
        }
        self.fill_lists();
        let mut streams = vec![("#~", self.tables_stream())];
        streams.extend(self.heaps());
        Self::write_root(&streams)
    }

    /// Serialise the heaps only, leaving out the tables stream
    pub fn build_without_tables(self) -> Vec<u8> {
        Self::write_root(&self.heaps())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compressed() {
        assert_eq!(compressed_uint(0x03), [0x03]);
        assert_eq!(compressed_uint(0x80), [0x80, 0x80]);
        assert_eq!(compressed_uint(0x2E57), [0xAE, 0x57]);
        assert_eq!(compressed_uint(0x4000), [0xC0, 0x00, 0x40, 0x00]);
        assert_eq!(type_ref_token(16), [0x41]);
    }

    #[test]
    fn list_starts() {
        let owners = [2, 2, 4];
        assert_eq!(MetadataBuilder::list_start(&owners, 1), 1);
        assert_eq!(MetadataBuilder::list_start(&owners, 2), 1);
        assert_eq!(MetadataBuilder::list_start(&owners, 3), 3);
        assert_eq!(MetadataBuilder::list_start(&owners, 4), 3);
        assert_eq!(MetadataBuilder::list_start(&owners, 5), 4);
    }
}
