use thiserror::Error;

/// A malformed envelope, payload, or wire record. Fatal for the entry
/// being decoded; the binder decides whether the run survives it.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("truncated input at byte {0}")]
    Truncated(usize),

    #[error("varint overflows 64 bits at byte {0}")]
    Varint(usize),

    #[error("unsupported wire type {wire_type} for field {field}")]
    WireType { field: u32, wire_type: u8 },

    #[error("malformed payload: {0}")]
    Shape(String),

    #[error("payload carries no recognized schema generation")]
    MissingGeneration,

    #[error("payload generation field {0} does not match the declared SDK version")]
    WrongGeneration(u32),

    #[error("invalid utf-8 in string table entry")]
    Utf8(#[from] std::str::Utf8Error),

    #[error(transparent)]
    Resolution(#[from] ResolutionError),
}

/// An interned index that does not resolve against its table.
#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error("interned string index {index} out of range (table has {len} entries)")]
    StringIndex { index: usize, len: usize },

    #[error("interned dotted-name index {index} out of range (table has {len} entries)")]
    DottedNameIndex { index: usize, len: usize },

    #[error("interned type index {index} out of range (table has {len} entries)")]
    TypeIndex { index: usize, len: usize },

    #[error("template `{0}` has no matching data-type definition")]
    TemplateWithoutDataDef(String),
}

/// A node kind outside the known set. Never propagated as a failure: the
/// affected field, choice, or key degrades to a passthrough token or an
/// empty result, and this shows up in the logs instead.
#[derive(Debug, Error)]
#[error("unsupported {kind} construct: {detail}")]
pub struct UnsupportedConstruct {
    pub kind: &'static str,
    pub detail: String,
}

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("manifest is missing mandatory key `{0}`")]
    MissingKey(&'static str),

    #[error("manifest lists no module files")]
    EmptyDalfs,

    #[error("unsupported SDK version `{0}`")]
    UnsupportedSdkVersion(String),

    #[error("module file name `{0}` carries no trailing 64-hex package hash")]
    BadPackageId(String),
}
