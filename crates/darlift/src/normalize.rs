//! Type normalization.
//!
//! Maps a raw type descriptor to the canonical token the renderer consumes
//! verbatim: fixed keywords for builtin scalars, `[]`/`*` prefixes for
//! list/optional, structured map and tuple tokens, and bare entity names
//! (underscores stripped) for applied constructors. Unknown shapes pass
//! through with a warning as their bare detail string, without the `@`/`?`
//! sigil of the raw descriptor form, which survives only on the field's
//! raw string; normalization never fails.

use std::collections::BTreeSet;

use tracing::warn;

use crate::ast::{PrimKind, TypeDesc};
use crate::error::UnsupportedConstruct;
use crate::tables::simple_name;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized {
    pub token: String,
    pub is_enum: bool,
}

impl Normalized {
    fn plain(token: String) -> Self {
        Self {
            token,
            is_enum: false,
        }
    }
}

/// Entity-naming convention: last dotted segment, underscores stripped.
pub fn entity_name(dotted: &str) -> String {
    simple_name(dotted).replace('_', "")
}

/// Normalize an already-rendered token: leading list/optional markers are
/// preserved, the remainder loses its underscores. Idempotent.
pub fn normalize_token(raw: &str) -> String {
    let mut rest = raw;
    let mut prefix = String::new();
    loop {
        if let Some(stripped) = rest.strip_prefix("[]") {
            prefix.push_str("[]");
            rest = stripped;
        } else if let Some(stripped) = rest.strip_prefix('*') {
            prefix.push('*');
            rest = stripped;
        } else {
            break;
        }
    }
    prefix.push_str(&rest.replace('_', ""));
    prefix
}

/// True for token forms that carry their own absence/emptiness, which is
/// what the field optionality flag records.
pub fn is_soft_token(token: &str) -> bool {
    token.starts_with("[]") || token.starts_with('*') || token.starts_with("map[")
}

pub fn normalize(ty: &TypeDesc, enums: &BTreeSet<String>) -> Normalized {
    match ty {
        TypeDesc::Prim { kind, args } => normalize_prim(ty, *kind, args, enums),
        TypeDesc::Con { name, args } => {
            let simple = entity_name(name);
            match (simple.as_str(), args.len()) {
                ("Tuple2", 2) => Normalized::plain(format!(
                    "({},{})",
                    normalize(&args[0], enums).token,
                    normalize(&args[1], enums).token
                )),
                ("Tuple3", 3) => Normalized::plain(format!(
                    "({},{},{})",
                    normalize(&args[0], enums).token,
                    normalize(&args[1], enums).token,
                    normalize(&args[2], enums).token
                )),
                _ => Normalized {
                    is_enum: enums.contains(&simple),
                    token: simple,
                },
            }
        }
        TypeDesc::Var(name) => passthrough("type variable", name),
        TypeDesc::Unknown(detail) => passthrough("type", detail),
    }
}

fn normalize_prim(
    ty: &TypeDesc,
    kind: PrimKind,
    args: &[TypeDesc],
    enums: &BTreeSet<String>,
) -> Normalized {
    let arg = |i: usize| args.get(i).map(|a| normalize(a, enums).token);
    match kind {
        PrimKind::List => match arg(0) {
            Some(inner) => Normalized::plain(format!("[]{inner}")),
            None => underapplied(ty),
        },
        PrimKind::Optional => match arg(0) {
            Some(inner) => Normalized::plain(format!("*{inner}")),
            None => underapplied(ty),
        },
        PrimKind::TextMap => match arg(0) {
            Some(value) => Normalized::plain(format!("map[text]{value}")),
            None => underapplied(ty),
        },
        PrimKind::GenMap => match (arg(0), arg(1)) {
            (Some(key), Some(value)) => Normalized::plain(format!("map[{key}]{value}")),
            _ => underapplied(ty),
        },
        // The wrapped template type adds nothing to the token.
        PrimKind::ContractId => Normalized::plain("contractid".into()),
        scalar => Normalized::plain(scalar.name().into()),
    }
}

fn underapplied(ty: &TypeDesc) -> Normalized {
    passthrough("under-applied builtin", &ty.to_string())
}

// The token is the bare detail; the `@`/`?` descriptor sigil stays on the
// field's raw form only.
fn passthrough(kind: &'static str, detail: &str) -> Normalized {
    let diag = UnsupportedConstruct {
        kind,
        detail: detail.to_string(),
    };
    warn!("{diag}; passing raw descriptor through");
    Normalized::plain(normalize_token(detail))
}
