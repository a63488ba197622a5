//! `CustomAttribute` (0x0C).

use crate::{
    metadata::{
        customattributes::{parse_custom_attribute_blob, CustomAttributeValue},
        signatures::{parse_method_signature, SignatureMethod},
        tables::{table_row, CodedIndex, CodedIndexType, MemberRef, MethodDef, TableId, TableRow},
        token::Token,
    },
    Result,
};

table_row! {
    /// An attribute attached to a metadata row
    CustomAttribute => CustomAttribute
}

impl<'a> CustomAttribute<'a> {
    /// The row carrying the attribute, `HasCustomAttribute`
    ///
    /// # Errors
    /// Returns an error if the row cannot be read or carries an invalid tag.
    pub fn parent(&self) -> Result<CodedIndex> {
        self.coded_index(0, CodedIndexType::HasCustomAttribute)
    }

    /// Token of the row carrying the attribute
    ///
    /// # Errors
    /// See [`CustomAttribute::parent`].
    pub fn parent_token(&self) -> Result<Token> {
        Ok(self.parent()?.token)
    }

    /// The attribute constructor, `CustomAttributeType`: a `MethodDef` or a `MemberRef`
    ///
    /// # Errors
    /// Returns an error if the row cannot be read or carries an invalid tag.
    pub fn constructor(&self) -> Result<CodedIndex> {
        self.coded_index(1, CodedIndexType::CustomAttributeType)
    }

    /// Decoded signature of the constructor
    ///
    /// # Errors
    /// Returns an error if the constructor row or its signature cannot be read.
    pub fn constructor_signature(&self) -> Result<SignatureMethod> {
        let db = self.database();
        let constructor = self.constructor()?;
        match constructor.tag {
            TableId::MethodDef => db.row::<MethodDef>(constructor.row)?.signature(),
            TableId::MemberRef => {
                parse_method_signature(db.row::<MemberRef>(constructor.row)?.signature_blob()?)
            }
            _ => Err(malformed_error!(
                "Invalid custom attribute constructor - {}",
                constructor.token
            )),
        }
    }

    /// Namespace and name of the attribute type, read from the constructor's declaring type
    ///
    /// # Errors
    /// Returns an error if the constructor or its declaring type cannot be read.
    pub fn type_namespace_and_name(&self) -> Result<(&'a str, &'a str)> {
        let db = self.database();
        let constructor = self.constructor()?;
        match constructor.tag {
            TableId::MethodDef => {
                let method = db.row::<MethodDef>(constructor.row)?;
                match method.parent()? {
                    Some(parent) => Ok((parent.namespace()?, parent.name()?)),
                    None => Err(malformed_error!(
                        "Attribute constructor {} has no declaring type",
                        constructor.token
                    )),
                }
            }
            TableId::MemberRef => {
                let class = db.row::<MemberRef>(constructor.row)?.class()?;
                db.type_name(class)
            }
            _ => Err(malformed_error!(
                "Invalid custom attribute constructor - {}",
                constructor.token
            )),
        }
    }

    /// The undecoded value blob
    ///
    /// # Errors
    /// Returns an error if the row or the blob cannot be read.
    pub fn blob_data(&self) -> Result<&'a [u8]> {
        self.blob(2)
    }

    /// The decoded arguments
    ///
    /// # Errors
    /// Returns an error if the constructor signature or the blob cannot be decoded.
    pub fn value(&self) -> Result<CustomAttributeValue> {
        let constructor = self.constructor_signature()?;
        parse_custom_attribute_blob(self.database(), self.blob_data()?, &constructor)
    }
}
