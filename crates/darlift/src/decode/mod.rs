//! Schema decoders.
//!
//! A module file is a nested binary envelope: an outer wrapper whose field 1
//! is the payload bytes, and an inner payload carrying exactly one
//! recognized schema-generation field. Two incompatible generations exist;
//! each has its own decoder behind [`SchemaDecoder`], selected once per
//! archive entry from the manifest's declared SDK version. Both decoders
//! produce the identical [`ast`] shapes so the rest of the pipeline is
//! generation-agnostic.
//!
//! Observable wire differences the two generations own independently:
//! generation A inlines field and choice types and choice names, and has an
//! opaque complex-key node; generation B interns types in a package-level
//! table, interns choice names, and gives key projections a recursive
//! sub-expression.

use crate::ast::Package;
use crate::error::{DecodeError, ResolutionError};
use crate::wire::Reader;

mod gen_a;
mod gen_b;

pub use gen_a::GenADecoder;
pub use gen_b::GenBDecoder;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Generation {
    A,
    B,
}

pub trait SchemaDecoder: Send + Sync {
    fn generation(&self) -> Generation;

    /// Decode one archive entry's bytes into a package. Any malformed
    /// shape fails the whole entry.
    fn decode_package(&self, bytes: &[u8]) -> Result<Package, DecodeError>;
}

pub fn decoder_for(generation: Generation) -> &'static dyn SchemaDecoder {
    match generation {
        Generation::A => &GenADecoder,
        Generation::B => &GenBDecoder,
    }
}

const ENVELOPE_PAYLOAD: u32 = 1;
pub(crate) const PAYLOAD_GEN_A: u32 = 3;
pub(crate) const PAYLOAD_GEN_B: u32 = 4;

pub(crate) fn unwrap_envelope(bytes: &[u8]) -> Result<&[u8], DecodeError> {
    let mut reader = Reader::new(bytes);
    let mut payload = None;
    while let Some((field, value)) = reader.next_field()? {
        if field == ENVELOPE_PAYLOAD {
            payload = Some(value.bytes()?);
        }
    }
    payload.ok_or_else(|| DecodeError::Shape("envelope carries no payload".into()))
}

/// Pull the package bytes for the wanted generation out of the inner
/// payload. Exactly one generation field may be present.
pub(crate) fn generation_payload(bytes: &[u8], want: u32) -> Result<&[u8], DecodeError> {
    let mut reader = Reader::new(bytes);
    let mut found = None;
    while let Some((field, value)) = reader.next_field()? {
        if field == PAYLOAD_GEN_A || field == PAYLOAD_GEN_B {
            if found.is_some() {
                return Err(DecodeError::Shape(
                    "payload carries more than one generation field".into(),
                ));
            }
            found = Some((field, value.bytes()?));
        }
    }
    match found {
        None => Err(DecodeError::MissingGeneration),
        Some((tag, body)) if tag == want => Ok(body),
        Some((tag, _)) => Err(DecodeError::WrongGeneration(tag)),
    }
}

/// Resolve raw dotted-name messages (field 1: repeated string index) into
/// joined literal names against the string table.
pub(crate) fn resolve_dotted(
    strings: &[String],
    raw: &[&[u8]],
) -> Result<Vec<String>, DecodeError> {
    let mut out = Vec::with_capacity(raw.len());
    for bytes in raw {
        let mut segments = Vec::new();
        let mut reader = Reader::new(bytes);
        while let Some((field, value)) = reader.next_field()? {
            if field == 1 {
                let index = value.varint()? as usize;
                let segment =
                    strings
                        .get(index)
                        .ok_or(ResolutionError::StringIndex {
                            index,
                            len: strings.len(),
                        })?;
                segments.push(segment.as_str());
            }
        }
        out.push(segments.join("."));
    }
    Ok(out)
}
