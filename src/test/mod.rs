mod builder;

pub(crate) use builder::{compressed_uint, type_ref_token, MetadataBuilder};
