//! Contract-key field recovery.
//!
//! A template's key is an expression over its fields; the model only needs
//! the field names the expression touches. This walks the narrow node set
//! the decoders surface and gives up (empty result, logged) on anything
//! else. It is not an expression interpreter.

use tracing::debug;

use crate::ast::KeyExpr;
use crate::error::UnsupportedConstruct;

/// Ordered field names referenced by a key expression.
pub fn key_fields(expr: &KeyExpr) -> Vec<String> {
    match expr {
        KeyExpr::Project { field, over } => {
            let mut names = vec![field.clone()];
            if let Some(sub) = over {
                names.extend(key_fields(sub));
            }
            names
        }
        KeyExpr::RecordCtor(fields) => fields.clone(),
        KeyExpr::Var(name) => vec![name.clone()],
        KeyExpr::Complex => {
            debug!("complex key expression; no field names recovered");
            Vec::new()
        }
        KeyExpr::Unknown(detail) => {
            let diag = UnsupportedConstruct {
                kind: "key expression",
                detail: detail.clone(),
            };
            debug!("{diag}; no field names recovered");
            Vec::new()
        }
    }
}
