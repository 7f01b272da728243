//! Generation-agnostic decoded AST.
//!
//! Both schema decoders produce these shapes, with every interned index
//! already resolved to its literal name, so everything downstream of the
//! decoder is written once. Each node family is a closed sum type; a node
//! kind outside the known set becomes an explicit `Unknown` variant
//! carrying a diagnostic string rather than a silent default.

use std::fmt;

#[derive(Debug)]
pub struct Package {
    pub modules: Vec<Module>,
}

#[derive(Debug)]
pub struct Module {
    pub name: String,
    pub data_defs: Vec<DataDef>,
    pub templates: Vec<TemplateDef>,
    pub interfaces: Vec<InterfaceDef>,
}

#[derive(Debug)]
pub struct DataDef {
    /// Full dotted name; entity naming reduces it to the last segment.
    pub name: String,
    pub serializable: bool,
    pub body: DataBody,
}

#[derive(Debug)]
pub enum DataBody {
    Record(Vec<RawField>),
    Variant(Vec<RawField>),
    Enum(Vec<String>),
    Interface,
    Unknown(String),
}

#[derive(Debug)]
pub struct RawField {
    pub name: String,
    pub ty: TypeDesc,
}

#[derive(Debug, Clone)]
pub enum TypeDesc {
    Prim { kind: PrimKind, args: Vec<TypeDesc> },
    Con { name: String, args: Vec<TypeDesc> },
    Var(String),
    Unknown(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimKind {
    Unit,
    Bool,
    Int64,
    Text,
    Party,
    Numeric,
    Date,
    Timestamp,
    List,
    Optional,
    TextMap,
    GenMap,
    ContractId,
    BigNumeric,
    RoundingMode,
    Any,
}

impl PrimKind {
    pub fn from_tag(tag: u64) -> Option<Self> {
        Some(match tag {
            1 => PrimKind::Unit,
            2 => PrimKind::Bool,
            3 => PrimKind::Int64,
            4 => PrimKind::Text,
            5 => PrimKind::Party,
            6 => PrimKind::Numeric,
            7 => PrimKind::Date,
            8 => PrimKind::Timestamp,
            9 => PrimKind::List,
            10 => PrimKind::Optional,
            11 => PrimKind::TextMap,
            12 => PrimKind::GenMap,
            13 => PrimKind::ContractId,
            14 => PrimKind::BigNumeric,
            15 => PrimKind::RoundingMode,
            16 => PrimKind::Any,
            _ => return None,
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            PrimKind::Unit => "unit",
            PrimKind::Bool => "bool",
            PrimKind::Int64 => "int64",
            PrimKind::Text => "text",
            PrimKind::Party => "party",
            PrimKind::Numeric => "decimal",
            PrimKind::Date => "date",
            PrimKind::Timestamp => "timestamp",
            PrimKind::List => "list",
            PrimKind::Optional => "optional",
            PrimKind::TextMap => "textmap",
            PrimKind::GenMap => "genmap",
            PrimKind::ContractId => "contractid",
            PrimKind::BigNumeric => "bignumeric",
            PrimKind::RoundingMode => "roundingmode",
            PrimKind::Any => "any",
        }
    }
}

// The Display form is the "raw descriptor" kept on each field for
// diagnostics; it is never consumed as a type reference.
impl fmt::Display for TypeDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDesc::Prim { kind, args } => write_applied(f, kind.name(), args),
            TypeDesc::Con { name, args } => write_applied(f, name, args),
            TypeDesc::Var(name) => write!(f, "@{name}"),
            TypeDesc::Unknown(detail) => write!(f, "?{detail}"),
        }
    }
}

fn write_applied(f: &mut fmt::Formatter<'_>, head: &str, args: &[TypeDesc]) -> fmt::Result {
    write!(f, "{head}")?;
    if !args.is_empty() {
        write!(f, "<")?;
        for (i, arg) in args.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{arg}")?;
        }
        write!(f, ">")?;
    }
    Ok(())
}

#[derive(Debug)]
pub struct TemplateDef {
    pub name: String,
    pub choices: Vec<RawChoice>,
    pub key: Option<KeyExpr>,
    /// Dotted names of implemented interfaces, in declaration order.
    pub implements: Vec<String>,
}

#[derive(Debug)]
pub struct RawChoice {
    pub name: String,
    pub arg: TypeDesc,
    pub ret: TypeDesc,
}

#[derive(Debug)]
pub struct InterfaceDef {
    pub name: String,
    pub choices: Vec<RawChoice>,
}

#[derive(Debug)]
pub enum KeyExpr {
    /// Field projection. Generation B carries the projected-on
    /// sub-expression; generation A leaves it empty.
    Project {
        field: String,
        over: Option<Box<KeyExpr>>,
    },
    /// Record construction: the constructed field names in order.
    RecordCtor(Vec<String>),
    Var(String),
    /// Generation A's opaque complex-key node.
    Complex,
    Unknown(String),
}
