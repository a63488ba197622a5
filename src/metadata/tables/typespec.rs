//! `TypeSpec` (0x1B): constructed types such as generic instances and arrays.

use crate::{
    metadata::{
        signatures::{parse_type_spec_signature, SignatureTypeSpec},
        tables::{table_row, TableRow},
    },
    Result,
};

table_row! {
    /// A type described by a signature blob
    TypeSpec => TypeSpec
}

impl TypeSpec<'_> {
    /// The decoded type signature
    ///
    /// # Errors
    /// Returns an error if the blob cannot be read or is malformed.
    pub fn signature(&self) -> Result<SignatureTypeSpec> {
        parse_type_spec_signature(self.blob(0)?)
    }
}
