//! Fixture support: a wire writer mirroring the crate's reader, plus
//! package builders that lay out synthetic archive entries for either
//! schema generation.

#![allow(dead_code)]

pub const HASH: &str = "0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef";

fn put_varint(buf: &mut Vec<u8>, mut value: u64) {
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            buf.push(byte);
            return;
        }
        buf.push(byte | 0x80);
    }
}

#[derive(Default)]
pub struct Msg {
    buf: Vec<u8>,
}

impl Msg {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(&mut self, field: u32, wire_type: u8) {
        put_varint(&mut self.buf, (u64::from(field) << 3) | u64::from(wire_type));
    }

    pub fn varint(mut self, field: u32, value: u64) -> Self {
        self.key(field, 0);
        put_varint(&mut self.buf, value);
        self
    }

    pub fn bytes(mut self, field: u32, bytes: &[u8]) -> Self {
        self.key(field, 2);
        put_varint(&mut self.buf, bytes.len() as u64);
        self.buf.extend_from_slice(bytes);
        self
    }

    pub fn str(self, field: u32, value: &str) -> Self {
        self.bytes(field, value.as_bytes())
    }

    pub fn msg(self, field: u32, inner: Msg) -> Self {
        let encoded = inner.build();
        self.bytes(field, &encoded)
    }

    pub fn build(self) -> Vec<u8> {
        self.buf
    }
}

#[derive(Clone)]
pub enum Ty {
    Unit,
    Bool,
    Int64,
    Text,
    Party,
    Numeric,
    Date,
    Timestamp,
    ContractId,
    List(Box<Ty>),
    Optional(Box<Ty>),
    Con(String),
}

impl Ty {
    pub fn con(name: &str) -> Self {
        Ty::Con(name.to_string())
    }

    pub fn list(inner: Ty) -> Self {
        Ty::List(Box::new(inner))
    }

    pub fn optional(inner: Ty) -> Self {
        Ty::Optional(Box::new(inner))
    }

    fn prim_tag(&self) -> Option<(u64, Vec<&Ty>)> {
        Some(match self {
            Ty::Unit => (1, Vec::new()),
            Ty::Bool => (2, Vec::new()),
            Ty::Int64 => (3, Vec::new()),
            Ty::Text => (4, Vec::new()),
            Ty::Party => (5, Vec::new()),
            Ty::Numeric => (6, Vec::new()),
            Ty::Date => (7, Vec::new()),
            Ty::Timestamp => (8, Vec::new()),
            Ty::List(inner) => (9, vec![inner]),
            Ty::Optional(inner) => (10, vec![inner]),
            Ty::ContractId => (13, Vec::new()),
            Ty::Con(_) => return None,
        })
    }
}

pub enum KeyFx {
    Proj(String),
    ProjOver(String, Box<KeyFx>),
    Record(Vec<String>),
    Var(String),
    Complex,
}

pub enum Def {
    Record {
        name: String,
        fields: Vec<(String, Ty)>,
    },
    Variant {
        name: String,
        fields: Vec<(String, Ty)>,
    },
    Enum {
        name: String,
        ctors: Vec<String>,
    },
    Template {
        name: String,
        choices: Vec<(String, Ty, Ty)>,
        key: Option<KeyFx>,
        implements: Vec<String>,
    },
    Interface {
        name: String,
        choices: Vec<(String, Ty, Ty)>,
    },
}

pub fn record(name: &str, fields: &[(&str, Ty)]) -> Def {
    Def::Record {
        name: name.to_string(),
        fields: fields
            .iter()
            .map(|(n, t)| (n.to_string(), t.clone()))
            .collect(),
    }
}

pub fn variant(name: &str, fields: &[(&str, Ty)]) -> Def {
    Def::Variant {
        name: name.to_string(),
        fields: fields
            .iter()
            .map(|(n, t)| (n.to_string(), t.clone()))
            .collect(),
    }
}

pub fn enumeration(name: &str, ctors: &[&str]) -> Def {
    Def::Enum {
        name: name.to_string(),
        ctors: ctors.iter().map(|c| c.to_string()).collect(),
    }
}

pub fn template(
    name: &str,
    choices: &[(&str, Ty, Ty)],
    key: Option<KeyFx>,
    implements: &[&str],
) -> Def {
    Def::Template {
        name: name.to_string(),
        choices: choices
            .iter()
            .map(|(n, a, r)| (n.to_string(), a.clone(), r.clone()))
            .collect(),
        key,
        implements: implements.iter().map(|i| i.to_string()).collect(),
    }
}

pub fn interface(name: &str, choices: &[(&str, Ty, Ty)]) -> Def {
    Def::Interface {
        name: name.to_string(),
        choices: choices
            .iter()
            .map(|(n, a, r)| (n.to_string(), a.clone(), r.clone()))
            .collect(),
    }
}

/// Builds one archive entry's bytes for either generation, managing the
/// interned tables the way the decoders expect them.
pub struct PackageFx {
    gen_b: bool,
    strings: Vec<String>,
    dotted: Vec<String>,
    types: Vec<Vec<u8>>,
    modules: Vec<Vec<u8>>,
}

impl PackageFx {
    pub fn gen_a() -> Self {
        Self::new(false)
    }

    pub fn gen_b() -> Self {
        Self::new(true)
    }

    fn new(gen_b: bool) -> Self {
        Self {
            gen_b,
            strings: Vec::new(),
            dotted: Vec::new(),
            types: Vec::new(),
            modules: Vec::new(),
        }
    }

    fn s(&mut self, value: &str) -> u64 {
        if let Some(i) = self.strings.iter().position(|s| s == value) {
            return i as u64;
        }
        self.strings.push(value.to_string());
        (self.strings.len() - 1) as u64
    }

    fn d(&mut self, value: &str) -> u64 {
        // Segments intern eagerly so the dotted table can be encoded last.
        for segment in value.split('.') {
            self.s(segment);
        }
        if let Some(i) = self.dotted.iter().position(|d| d == value) {
            return i as u64;
        }
        self.dotted.push(value.to_string());
        (self.dotted.len() - 1) as u64
    }

    fn ty_msg(&mut self, ty: &Ty) -> Msg {
        match ty.prim_tag() {
            Some((tag, args)) => {
                let mut prim = Msg::new().varint(1, tag);
                for arg in args {
                    let encoded = self.ty_msg(arg);
                    prim = prim.msg(2, encoded);
                }
                Msg::new().msg(1, prim)
            }
            None => {
                let Ty::Con(name) = ty else { unreachable!() };
                let idx = self.d(name);
                Msg::new().msg(2, Msg::new().varint(1, idx))
            }
        }
    }

    fn ty_idx(&mut self, ty: &Ty) -> u64 {
        let encoded = match ty.prim_tag() {
            Some((tag, args)) => {
                let arg_idxs: Vec<u64> = args.iter().map(|a| self.ty_idx(a)).collect();
                let mut prim = Msg::new().varint(1, tag);
                for idx in arg_idxs {
                    prim = prim.varint(2, idx);
                }
                Msg::new().msg(1, prim)
            }
            None => {
                let Ty::Con(name) = ty else { unreachable!() };
                let idx = self.d(name);
                Msg::new().msg(2, Msg::new().varint(1, idx))
            }
        };
        self.types.push(encoded.build());
        (self.types.len() - 1) as u64
    }

    fn field_msg(&mut self, name: &str, ty: &Ty) -> Msg {
        let name_idx = self.s(name);
        let msg = Msg::new().varint(1, name_idx);
        if self.gen_b {
            let idx = self.ty_idx(ty);
            msg.varint(2, idx)
        } else {
            let encoded = self.ty_msg(ty);
            msg.msg(2, encoded)
        }
    }

    fn field_list(&mut self, fields: &[(String, Ty)]) -> Msg {
        let mut list = Msg::new();
        for (name, ty) in fields {
            let encoded = self.field_msg(name, ty);
            list = list.msg(1, encoded);
        }
        list
    }

    fn choice_msg(&mut self, name: &str, arg: &Ty, ret: &Ty) -> Msg {
        if self.gen_b {
            let name_idx = self.s(name);
            let arg_idx = self.ty_idx(arg);
            let ret_idx = self.ty_idx(ret);
            Msg::new()
                .varint(1, name_idx)
                .varint(2, arg_idx)
                .varint(3, ret_idx)
        } else {
            let arg_msg = self.ty_msg(arg);
            let ret_msg = self.ty_msg(ret);
            Msg::new().str(1, name).msg(2, arg_msg).msg(3, ret_msg)
        }
    }

    fn key_msg(&mut self, key: &KeyFx) -> Msg {
        match key {
            KeyFx::Proj(field) => {
                let idx = self.s(field);
                Msg::new().msg(1, Msg::new().varint(1, idx))
            }
            KeyFx::ProjOver(field, over) => {
                let idx = self.s(field);
                let sub = self.key_msg(over);
                Msg::new().msg(1, Msg::new().varint(1, idx).msg(2, sub))
            }
            KeyFx::Record(fields) => {
                let mut inner = Msg::new();
                for field in fields {
                    let idx = self.s(field);
                    inner = inner.varint(1, idx);
                }
                Msg::new().msg(2, inner)
            }
            KeyFx::Var(name) => {
                let idx = self.s(name);
                Msg::new().msg(3, Msg::new().varint(1, idx))
            }
            KeyFx::Complex => Msg::new().bytes(4, &[]),
        }
    }

    pub fn module(&mut self, name: &str, defs: Vec<Def>) -> &mut Self {
        let name_idx = self.d(name);
        let mut module = Msg::new().varint(1, name_idx);
        for def in defs {
            module = match def {
                Def::Record { name, fields } => {
                    let name_idx = self.d(&name);
                    let list = self.field_list(&fields);
                    module.msg(
                        2,
                        Msg::new().varint(1, name_idx).varint(2, 1).msg(3, list),
                    )
                }
                Def::Variant { name, fields } => {
                    let name_idx = self.d(&name);
                    let list = self.field_list(&fields);
                    module.msg(
                        2,
                        Msg::new().varint(1, name_idx).varint(2, 1).msg(4, list),
                    )
                }
                Def::Enum { name, ctors } => {
                    let name_idx = self.d(&name);
                    let mut list = Msg::new();
                    for ctor in &ctors {
                        let idx = self.s(ctor);
                        list = list.varint(1, idx);
                    }
                    module.msg(
                        2,
                        Msg::new().varint(1, name_idx).varint(2, 1).msg(5, list),
                    )
                }
                Def::Template {
                    name,
                    choices,
                    key,
                    implements,
                } => {
                    let name_idx = self.d(&name);
                    let mut tpl = Msg::new().varint(1, name_idx);
                    for (choice_name, arg, ret) in &choices {
                        let encoded = self.choice_msg(choice_name, arg, ret);
                        tpl = tpl.msg(2, encoded);
                    }
                    if let Some(key) = &key {
                        let encoded = self.key_msg(key);
                        tpl = tpl.msg(3, encoded);
                    }
                    for iface in &implements {
                        let idx = self.d(iface);
                        tpl = tpl.varint(4, idx);
                    }
                    module.msg(3, tpl)
                }
                Def::Interface { name, choices } => {
                    let name_idx = self.d(&name);
                    let mut iface = Msg::new().varint(1, name_idx);
                    for (choice_name, arg, ret) in &choices {
                        let encoded = self.choice_msg(choice_name, arg, ret);
                        iface = iface.msg(2, encoded);
                    }
                    module.msg(4, iface)
                }
            };
        }
        self.modules.push(module.build());
        self
    }

    /// Encode the package, wrap it in the inner payload and outer
    /// envelope, and return the entry's bytes.
    pub fn entry_bytes(&self) -> Vec<u8> {
        let mut package = Msg::new();
        for module in &self.modules {
            package = package.bytes(1, module);
        }
        for string in &self.strings {
            package = package.str(2, string);
        }
        for dotted in &self.dotted {
            let mut name = Msg::new();
            for segment in dotted.split('.') {
                let idx = self
                    .strings
                    .iter()
                    .position(|s| s == segment)
                    .expect("segment interned") as u64;
                name = name.varint(1, idx);
            }
            package = package.msg(3, name);
        }
        for ty in &self.types {
            package = package.bytes(4, ty);
        }

        let generation_field = if self.gen_b { 4 } else { 3 };
        let payload = Msg::new().bytes(generation_field, &package.build()).build();
        Msg::new().bytes(1, &payload).build()
    }
}
