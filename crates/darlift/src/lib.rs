//! darlift - normalized type-model extraction from compiled contract
//! archives.
//!
//! A DAR is a zip archive holding a manifest and one serialized
//! intermediate-representation module file per linked package. This crate
//! turns the extracted contents into a language-agnostic type model: one
//! entity per record, variant, enum, interface, and contract template,
//! with choices, contract keys, and interface-inherited choices resolved,
//! and with type names deduplicated deterministically across the whole
//! linked set.
//!
//! The pipeline is a single deterministic pass: decode each entry with the
//! schema decoder its SDK version selects, normalize types to canonical
//! tokens, assemble entities per module, merge interface choices into
//! implementing templates, then bind everything globally with the
//! collision-rename pass. Archive decompression and rendering of the
//! finished model are the caller's concern.

pub mod ast;
pub mod binder;
pub mod builder;
pub mod decode;
pub mod error;
pub mod keys;
pub mod manifest;
pub mod model;
pub mod normalize;
pub mod tables;
pub mod wire;

pub use binder::bind;
pub use decode::{decoder_for, Generation, SchemaDecoder};
pub use error::{DecodeError, ManifestError, ResolutionError, UnsupportedConstruct};
pub use manifest::{package_id, Manifest};
pub use model::{Choice, Entity, EntityKind, Field, Model};
