//! A loaded metadata image.
//!
//! [`Database`] owns the input (memory-mapped file or buffer) together with the parsed view of
//! its metadata: the root, the tables stream, the four heaps and the module-wide type cache.
//! Everything else in the crate hands out `Copy` row handles that borrow the database, so a
//! handle can never outlive the bytes it reads.
//!
//! # Examples
//!
//! ```rust,no_run
//! use winmdscope::{Architecture, Database};
//!
//! let db = Database::from_file(std::path::Path::new("Windows.Win32.winmd"))?;
//! let context = db.find_required("Windows.Win32.System.Diagnostics.Debug", "CONTEXT")?;
//! for variant in db.variants(context) {
//!     println!("{}", variant.display_name()?);
//! }
//! let x86 = db.select_variant(context, Architecture::X86)?;
//! println!("x86 layout: {}", x86.display_name()?);
//! # Ok::<(), winmdscope::Error>(())
//! ```

use std::{path::Path, sync::Arc};

use dashmap::DashMap;
use ouroboros::self_referencing;

use crate::{
    file::File,
    metadata::{
        architecture::Architecture,
        association::{verify_sorted_tables, Association},
        config::ReaderConfig,
        root::Root,
        streams::{Blob, Guid, Strings, TablesHeader, UserStrings},
        tables::{Assembly, Module, RowRange, TableId, TableRow, TypeDef},
        token::Token,
        typecache::TypeCache,
    },
    Result,
};

/// Heap used when a stream is absent: the mandatory empty entry only
const EMPTY_HEAP: &[u8] = &[0];

/// Parsed streams of one metadata image, borrowing the image bytes.
pub struct MetadataView<'a> {
    /// The metadata root and stream directory
    pub root: Root,
    /// The `#~` or `#-` tables stream
    pub tables: TablesHeader<'a>,
    /// The `#Strings` heap
    pub strings: Strings<'a>,
    /// The `#Blob` heap
    pub blobs: Blob<'a>,
    /// The `#GUID` heap
    pub guids: Guid<'a>,
    /// The `#US` heap
    pub user_strings: UserStrings<'a>,
    /// Top-level type groups and the nested type index
    pub types: TypeCache<'a>,
}

impl<'a> MetadataView<'a> {
    /// Parse the metadata directory `data`, which starts with the `BSJB` root
    ///
    /// # Errors
    /// Returns an error if the root or a stream is malformed, the tables stream is missing, or
    /// `config` asks for sorted tables and one is not.
    pub fn from_metadata(data: &'a [u8], config: &ReaderConfig) -> Result<MetadataView<'a>> {
        let root = Root::read(data)?;

        let mut tables = None;
        let mut strings = Strings::from(EMPTY_HEAP)?;
        let mut blobs = Blob::from(EMPTY_HEAP)?;
        let mut guids = Guid::from(&[])?;
        let mut user_strings = UserStrings::from(EMPTY_HEAP)?;

        for stream in &root.stream_headers {
            let start = stream.offset as usize;
            let Some(stream_data) = data.get(start..start + stream.size as usize) else {
                return Err(out_of_bounds_error!());
            };

            match stream.name.as_str() {
                "#~" | "#-" => tables = Some(TablesHeader::from(stream_data)?),
                "#Strings" => strings = Strings::from(stream_data)?,
                "#Blob" => blobs = Blob::from(stream_data)?,
                "#GUID" => guids = Guid::from(stream_data)?,
                "#US" => user_strings = UserStrings::from(stream_data)?,
                _ => {}
            }
        }

        let Some(tables) = tables else {
            return Err(malformed_error!("Metadata has no tables stream"));
        };

        if config.verify_sorted_tables {
            verify_sorted_tables(&tables)?;
        }

        let types = TypeCache::build(&tables, strings)?;
        log::debug!(
            "loaded {} tables, {} top-level type names, {} nested types",
            tables.table_count(),
            types.name_count(),
            types.nested_count()
        );

        Ok(MetadataView {
            root,
            tables,
            strings,
            blobs,
            guids,
            user_strings,
            types,
        })
    }
}

#[self_referencing]
struct Storage {
    file: File,

    #[borrows(file)]
    #[covariant]
    view: MetadataView<'this>,
}

/// A loaded metadata image.
///
/// `Database` is `Send` and `Sync`; every query takes `&self`, so one instance can be shared
/// between threads without locking. The only interior state is a memo of computed display names.
pub struct Database {
    storage: Storage,
    config: ReaderConfig,
    display_names: DashMap<Token, Arc<str>>,
}

impl Database {
    /// Memory-map and load a `.winmd` (PE) file
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, is not a PE image with CLR metadata, or the
    /// metadata is malformed.
    pub fn from_file(path: &Path) -> Result<Database> {
        Self::from_file_with_config(path, ReaderConfig::default())
    }

    /// [`Database::from_file`] with an explicit configuration
    ///
    /// # Errors
    /// See [`Database::from_file`].
    pub fn from_file_with_config(path: &Path, config: ReaderConfig) -> Result<Database> {
        Self::load(File::from_file(path)?, config)
    }

    /// Load a `.winmd` (PE) image from a buffer
    ///
    /// # Errors
    /// Returns an error if the buffer is not a PE image with CLR metadata, or the metadata is
    /// malformed.
    pub fn from_mem(data: Vec<u8>) -> Result<Database> {
        Self::from_mem_with_config(data, ReaderConfig::default())
    }

    /// [`Database::from_mem`] with an explicit configuration
    ///
    /// # Errors
    /// See [`Database::from_mem`].
    pub fn from_mem_with_config(data: Vec<u8>, config: ReaderConfig) -> Result<Database> {
        Self::load(File::from_mem(data)?, config)
    }

    /// Load a bare metadata directory that starts with the `BSJB` root
    ///
    /// # Errors
    /// Returns an error if the buffer is empty or the metadata is malformed.
    pub fn from_metadata(data: Vec<u8>) -> Result<Database> {
        Self::from_metadata_with_config(data, ReaderConfig::default())
    }

    /// [`Database::from_metadata`] with an explicit configuration
    ///
    /// # Errors
    /// See [`Database::from_metadata`].
    pub fn from_metadata_with_config(data: Vec<u8>, config: ReaderConfig) -> Result<Database> {
        Self::load(File::from_metadata(data)?, config)
    }

    fn load(file: File, config: ReaderConfig) -> Result<Database> {
        let storage = Storage::try_new(file, |file| {
            MetadataView::from_metadata(file.metadata(), &config)
        })?;

        Ok(Database {
            storage,
            config,
            display_names: DashMap::new(),
        })
    }

    /// The parsed streams
    #[must_use]
    pub fn view(&self) -> &MetadataView<'_> {
        self.storage.borrow_view()
    }

    /// The loaded input
    #[must_use]
    pub fn file(&self) -> &File {
        self.storage.borrow_file()
    }

    /// The configuration this database was loaded with
    #[must_use]
    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    /// The metadata root
    #[must_use]
    pub fn root(&self) -> &Root {
        &self.view().root
    }

    /// The tables stream
    #[must_use]
    pub fn tables(&self) -> &TablesHeader<'_> {
        &self.view().tables
    }

    /// The `#Strings` heap
    #[must_use]
    pub fn strings(&self) -> &Strings<'_> {
        &self.view().strings
    }

    /// The `#Blob` heap
    #[must_use]
    pub fn blobs(&self) -> &Blob<'_> {
        &self.view().blobs
    }

    /// The `#GUID` heap
    #[must_use]
    pub fn guids(&self) -> &Guid<'_> {
        &self.view().guids
    }

    /// The `#US` heap
    #[must_use]
    pub fn user_strings(&self) -> &UserStrings<'_> {
        &self.view().user_strings
    }

    /// The module-wide type cache
    #[must_use]
    pub fn types(&self) -> &TypeCache<'_> {
        &self.view().types
    }

    /// Number of `TypeDef` rows
    #[must_use]
    pub fn type_count(&self) -> u32 {
        self.tables().table(TableId::TypeDef).row_count()
    }

    /// A handle for row `rid` of `T::TABLE`
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if `rid` is 0 or past the end of the table.
    pub fn row<'a, T: TableRow<'a>>(&'a self, rid: u32) -> Result<T> {
        let rows = self.tables().table(T::TABLE).row_count();
        if rid == 0 || rid > rows {
            return Err(malformed_error!(
                "Row {} out of range for table {:?} with {} rows",
                rid,
                T::TABLE,
                rows
            ));
        }

        Ok(T::from_row(self, rid))
    }

    /// Every row of `T::TABLE`
    #[must_use]
    pub fn rows<'a, T: TableRow<'a>>(&'a self) -> RowRange<'a, T> {
        RowRange::all(self)
    }

    /// The rows of the association's table whose key references `target`
    ///
    /// # Errors
    /// Returns an error if `target` cannot be a key of `association`, or a key cannot be read.
    pub fn associated<'a, T: TableRow<'a>>(
        &'a self,
        association: Association,
        target: Token,
    ) -> Result<RowRange<'a, T>> {
        if T::TABLE != association.table() {
            return Err(malformed_error!(
                "{:?} rows requested for association {:?}",
                T::TABLE,
                association
            ));
        }

        let rows = association.lookup(self.tables(), target)?;
        Ok(RowRange::new(self, rows))
    }

    /// The `Module` row
    ///
    /// # Errors
    /// Returns an error if the image has no module row.
    pub fn module(&self) -> Result<Module<'_>> {
        self.row(1)
    }

    /// The `Assembly` row, absent for metadata of a bare module
    #[must_use]
    pub fn assembly(&self) -> Option<Assembly<'_>> {
        self.row(1).ok()
    }

    /// The head of the top-level type group `namespace.name`
    #[must_use]
    pub fn find(&self, namespace: &str, name: &str) -> Option<TypeDef<'_>> {
        self.types()
            .find(namespace, name)
            .map(|rid| TypeDef::from_row(self, rid))
    }

    /// The head of the top-level type group `namespace.name`, or a not-found error
    ///
    /// # Errors
    /// Returns [`crate::Error::TypeNotFound`] if no top-level type has that name.
    pub fn find_required(&self, namespace: &str, name: &str) -> Result<TypeDef<'_>> {
        self.find(namespace, name).ok_or_else(|| {
            crate::Error::TypeNotFound(format!(
                "Type '{}.{}' could not be found",
                namespace, name
            ))
        })
    }

    /// All definitions sharing the namespace and name of `head`, in table order.
    ///
    /// Nested types and types without siblings yield just themselves.
    pub fn variants<'a>(&'a self, head: TypeDef<'a>) -> impl Iterator<Item = TypeDef<'a>> + 'a {
        let group = self.types().group_of(head.rid());
        let rids: Vec<u32> = match group {
            Some(group) => group.to_vec(),
            None => vec![head.rid()],
        };

        rids.into_iter().map(move |rid| TypeDef::from_row(self, rid))
    }

    /// The first variant of `head`'s group whose declared architectures intersect `requested`.
    ///
    /// An undeclared set on either side counts as all architectures. If no variant matches, the
    /// result is `head` itself.
    ///
    /// # Errors
    /// Returns an error if a variant's architecture attribute cannot be decoded.
    pub fn select_variant<'a>(
        &'a self,
        head: TypeDef<'a>,
        requested: Architecture,
    ) -> Result<TypeDef<'a>> {
        let requested = requested.normalise();
        for candidate in self.variants(head) {
            let declared = candidate.supported_architectures()?.normalise();
            if declared.intersects(requested) {
                log::trace!(
                    "variant {} of {:?} matches {}",
                    candidate.token(),
                    head,
                    requested
                );
                return Ok(candidate);
            }
        }

        log::trace!("no variant of {:?} matches {}, using head", head, requested);
        Ok(head)
    }

    /// The top-level types declared in `namespace`, in table order
    pub fn namespace_types<'a>(
        &'a self,
        namespace: &str,
    ) -> impl Iterator<Item = TypeDef<'a>> + 'a {
        let rids = self.types().namespace(namespace).to_vec();
        rids.into_iter().map(move |rid| TypeDef::from_row(self, rid))
    }

    /// Every namespace that declares at least one top-level type, sorted
    pub fn namespaces(&self) -> impl Iterator<Item = &str> {
        self.types().namespaces()
    }

    /// The memoised display name of `token`, computing it with `compute` on first use
    pub(crate) fn display_name_with<F>(&self, token: Token, compute: F) -> Result<Arc<str>>
    where
        F: FnOnce() -> Result<String>,
    {
        if let Some(name) = self.display_names.get(&token) {
            return Ok(name.clone());
        }

        let name: Arc<str> = Arc::from(compute()?);
        Ok(self
            .display_names
            .entry(token)
            .or_insert(name)
            .value()
            .clone())
    }
}
