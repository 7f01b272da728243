//! Generation B decoder: the layout used by the newest SDK major.
//!
//! The package carries an interned type table; field, choice-argument, and
//! choice-result types are varint indices into it, and an interned type's
//! own arguments may only reference entries earlier in the table. Choice
//! names are interned-string indices, and key projections carry the
//! projected-on sub-expression so nested projections resolve recursively.

use super::{generation_payload, resolve_dotted, unwrap_envelope, Generation, SchemaDecoder,
            PAYLOAD_GEN_B};
use crate::ast::{
    DataBody, DataDef, InterfaceDef, KeyExpr, Module, Package, PrimKind, RawChoice, RawField,
    TemplateDef, TypeDesc,
};
use crate::error::{DecodeError, ResolutionError};
use crate::tables::InternedTables;
use crate::wire::Reader;

pub struct GenBDecoder;

impl SchemaDecoder for GenBDecoder {
    fn generation(&self) -> Generation {
        Generation::B
    }

    fn decode_package(&self, bytes: &[u8]) -> Result<Package, DecodeError> {
        let payload = unwrap_envelope(bytes)?;
        let body = generation_payload(payload, PAYLOAD_GEN_B)?;
        decode_body(body)
    }
}

// Package: 1 module, 2 interned string, 3 interned dotted name,
// 4 interned type.
fn decode_body(body: &[u8]) -> Result<Package, DecodeError> {
    let mut module_bytes = Vec::new();
    let mut strings = Vec::new();
    let mut dotted_raw = Vec::new();
    let mut type_raw = Vec::new();

    let mut reader = Reader::new(body);
    while let Some((field, value)) = reader.next_field()? {
        match field {
            1 => module_bytes.push(value.bytes()?),
            2 => strings.push(value.utf8()?.to_string()),
            3 => dotted_raw.push(value.bytes()?),
            4 => type_raw.push(value.bytes()?),
            _ => {}
        }
    }

    let dotted_names = resolve_dotted(&strings, &dotted_raw)?;
    let base = InternedTables::new(strings, dotted_names);

    let mut types: Vec<TypeDesc> = Vec::with_capacity(type_raw.len());
    for bytes in &type_raw {
        let ty = decode_interned_type(bytes, &base, &types)?;
        types.push(ty);
    }
    let tables = base.with_types(types);

    let mut modules = Vec::with_capacity(module_bytes.len());
    for bytes in module_bytes {
        modules.push(decode_module(bytes, &tables)?);
    }
    Ok(Package { modules })
}

// Interned type: one-of 1 prim { 1 tag, 2 repeated arg type idx }, 2 con
// { 1 dotted idx, 2 repeated arg type idx }, 3 var { 1 string idx }.
// Argument indices must point at already-built entries.
fn decode_interned_type(
    bytes: &[u8],
    tables: &InternedTables,
    built: &[TypeDesc],
) -> Result<TypeDesc, DecodeError> {
    let mut out = None;
    let mut reader = Reader::new(bytes);
    while let Some((field, value)) = reader.next_field()? {
        match field {
            1 => {
                let (tag, args) = decode_applied(value.bytes()?, built)?;
                out = Some(match tag.and_then(PrimKind::from_tag) {
                    Some(kind) => TypeDesc::Prim { kind, args },
                    None => TypeDesc::Unknown(format!(
                        "builtin tag {}",
                        tag.map_or_else(|| "<missing>".into(), |t| t.to_string())
                    )),
                });
            }
            2 => {
                let (name_idx, args) = decode_applied(value.bytes()?, built)?;
                let name_idx = name_idx
                    .ok_or_else(|| DecodeError::Shape("constructor carries no name".into()))?;
                out = Some(TypeDesc::Con {
                    name: tables.dotted_name(name_idx)?.to_string(),
                    args,
                });
            }
            3 => {
                let idx = decode_single_index(value.bytes()?)?;
                out = Some(TypeDesc::Var(tables.string(idx)?.to_string()));
            }
            other => {
                if out.is_none() {
                    out = Some(TypeDesc::Unknown(format!("type tag {other}")));
                }
            }
        }
    }
    Ok(out.unwrap_or_else(|| TypeDesc::Unknown("empty type".into())))
}

fn decode_applied(
    bytes: &[u8],
    built: &[TypeDesc],
) -> Result<(Option<u64>, Vec<TypeDesc>), DecodeError> {
    let mut head = None;
    let mut args = Vec::new();
    let mut reader = Reader::new(bytes);
    while let Some((field, value)) = reader.next_field()? {
        match field {
            1 => head = Some(value.varint()?),
            2 => args.push(lookup_built(built, value.varint()?)?),
            _ => {}
        }
    }
    Ok((head, args))
}

fn lookup_built(built: &[TypeDesc], index: u64) -> Result<TypeDesc, DecodeError> {
    let index = index as usize;
    built
        .get(index)
        .cloned()
        .ok_or_else(|| {
            ResolutionError::TypeIndex {
                index,
                len: built.len(),
            }
            .into()
        })
}

fn decode_single_index(bytes: &[u8]) -> Result<u64, DecodeError> {
    let mut idx = None;
    let mut reader = Reader::new(bytes);
    while let Some((field, value)) = reader.next_field()? {
        if field == 1 {
            idx = Some(value.varint()?);
        }
    }
    idx.ok_or_else(|| DecodeError::Shape("reference carries no index".into()))
}

// Module: 1 name dotted idx, 2 data def, 3 template, 4 interface.
fn decode_module(bytes: &[u8], tables: &InternedTables) -> Result<Module, DecodeError> {
    let mut name_idx = None;
    let mut data_defs = Vec::new();
    let mut templates = Vec::new();
    let mut interfaces = Vec::new();

    let mut reader = Reader::new(bytes);
    while let Some((field, value)) = reader.next_field()? {
        match field {
            1 => name_idx = Some(value.varint()?),
            2 => data_defs.push(decode_data_def(value.bytes()?, tables)?),
            3 => templates.push(decode_template(value.bytes()?, tables)?),
            4 => interfaces.push(decode_interface(value.bytes()?, tables)?),
            _ => {}
        }
    }

    let name_idx =
        name_idx.ok_or_else(|| DecodeError::Shape("module carries no name".into()))?;
    Ok(Module {
        name: tables.dotted_name(name_idx)?.to_string(),
        data_defs,
        templates,
        interfaces,
    })
}

fn decode_data_def(bytes: &[u8], tables: &InternedTables) -> Result<DataDef, DecodeError> {
    let mut name_idx = None;
    let mut serializable = false;
    let mut body = None;

    let mut reader = Reader::new(bytes);
    while let Some((field, value)) = reader.next_field()? {
        match field {
            1 => name_idx = Some(value.varint()?),
            2 => serializable = value.varint()? != 0,
            3 => body = Some(DataBody::Record(decode_fields(value.bytes()?, tables)?)),
            4 => body = Some(DataBody::Variant(decode_fields(value.bytes()?, tables)?)),
            5 => body = Some(DataBody::Enum(decode_enum_ctors(value.bytes()?, tables)?)),
            6 => {
                value.bytes()?;
                body = Some(DataBody::Interface);
            }
            other => {
                if body.is_none() {
                    body = Some(DataBody::Unknown(format!("data body tag {other}")));
                }
            }
        }
    }

    let name_idx =
        name_idx.ok_or_else(|| DecodeError::Shape("data definition carries no name".into()))?;
    Ok(DataDef {
        name: tables.dotted_name(name_idx)?.to_string(),
        serializable,
        body: body.unwrap_or_else(|| DataBody::Unknown("data definition without body".into())),
    })
}

// FieldList: 1 repeated FieldDef { 1 name string idx, 2 type table idx }.
fn decode_fields(bytes: &[u8], tables: &InternedTables) -> Result<Vec<RawField>, DecodeError> {
    let mut out = Vec::new();
    let mut reader = Reader::new(bytes);
    while let Some((field, value)) = reader.next_field()? {
        if field == 1 {
            out.push(decode_field(value.bytes()?, tables)?);
        }
    }
    Ok(out)
}

fn decode_field(bytes: &[u8], tables: &InternedTables) -> Result<RawField, DecodeError> {
    let mut name = None;
    let mut ty = None;

    let mut reader = Reader::new(bytes);
    while let Some((field, value)) = reader.next_field()? {
        match field {
            1 => name = Some(tables.string(value.varint()?)?.to_string()),
            2 => ty = Some(tables.interned_type(value.varint()?)?.clone()),
            _ => {}
        }
    }

    Ok(RawField {
        name: name.ok_or_else(|| DecodeError::Shape("field carries no name".into()))?,
        ty: ty.unwrap_or_else(|| TypeDesc::Unknown("field without a type".into())),
    })
}

fn decode_enum_ctors(bytes: &[u8], tables: &InternedTables) -> Result<Vec<String>, DecodeError> {
    let mut out = Vec::new();
    let mut reader = Reader::new(bytes);
    while let Some((field, value)) = reader.next_field()? {
        if field == 1 {
            out.push(tables.string(value.varint()?)?.to_string());
        }
    }
    Ok(out)
}

fn decode_template(bytes: &[u8], tables: &InternedTables) -> Result<TemplateDef, DecodeError> {
    let mut name_idx = None;
    let mut choices = Vec::new();
    let mut key = None;
    let mut implements = Vec::new();

    let mut reader = Reader::new(bytes);
    while let Some((field, value)) = reader.next_field()? {
        match field {
            1 => name_idx = Some(value.varint()?),
            2 => choices.push(decode_choice(value.bytes()?, tables)?),
            3 => key = Some(decode_key(value.bytes()?, tables)?),
            4 => implements.push(tables.dotted_name(value.varint()?)?.to_string()),
            _ => {}
        }
    }

    let name_idx =
        name_idx.ok_or_else(|| DecodeError::Shape("template carries no name".into()))?;
    Ok(TemplateDef {
        name: tables.dotted_name(name_idx)?.to_string(),
        choices,
        key,
        implements,
    })
}

// Choice: 1 name string idx, 2 argument type table idx, 3 result type
// table idx. Names are interned in this generation.
fn decode_choice(bytes: &[u8], tables: &InternedTables) -> Result<RawChoice, DecodeError> {
    let mut name = None;
    let mut arg = None;
    let mut ret = None;

    let mut reader = Reader::new(bytes);
    while let Some((field, value)) = reader.next_field()? {
        match field {
            1 => name = Some(tables.string(value.varint()?)?.to_string()),
            2 => arg = Some(tables.interned_type(value.varint()?)?.clone()),
            3 => ret = Some(tables.interned_type(value.varint()?)?.clone()),
            _ => {}
        }
    }

    Ok(RawChoice {
        name: name.ok_or_else(|| DecodeError::Shape("choice carries no name".into()))?,
        arg: arg.unwrap_or_else(|| TypeDesc::Unknown("choice without argument type".into())),
        ret: ret.unwrap_or_else(|| TypeDesc::Unknown("choice without result type".into())),
    })
}

// KeyExpr: one-of 1 projection { 1 field string idx, 2 sub-expression },
// 2 record ctor { 1 repeated field string idx }, 3 var { 1 string idx }.
// No complex-key node in this generation.
fn decode_key(bytes: &[u8], tables: &InternedTables) -> Result<KeyExpr, DecodeError> {
    let mut out = None;
    let mut reader = Reader::new(bytes);
    while let Some((field, value)) = reader.next_field()? {
        match field {
            1 => {
                let mut field_idx = None;
                let mut over = None;
                let mut inner = Reader::new(value.bytes()?);
                while let Some((tag, v)) = inner.next_field()? {
                    match tag {
                        1 => field_idx = Some(v.varint()?),
                        2 => over = Some(Box::new(decode_key(v.bytes()?, tables)?)),
                        _ => {}
                    }
                }
                let field_idx = field_idx
                    .ok_or_else(|| DecodeError::Shape("projection carries no field".into()))?;
                out = Some(KeyExpr::Project {
                    field: tables.string(field_idx)?.to_string(),
                    over,
                });
            }
            2 => {
                let mut fields = Vec::new();
                let mut inner = Reader::new(value.bytes()?);
                while let Some((tag, v)) = inner.next_field()? {
                    if tag == 1 {
                        fields.push(tables.string(v.varint()?)?.to_string());
                    }
                }
                out = Some(KeyExpr::RecordCtor(fields));
            }
            3 => {
                let idx = decode_single_index(value.bytes()?)?;
                out = Some(KeyExpr::Var(tables.string(idx)?.to_string()));
            }
            other => {
                if out.is_none() {
                    out = Some(KeyExpr::Unknown(format!("key node tag {other}")));
                }
            }
        }
    }
    Ok(out.unwrap_or_else(|| KeyExpr::Unknown("empty key expression".into())))
}

fn decode_interface(bytes: &[u8], tables: &InternedTables) -> Result<InterfaceDef, DecodeError> {
    let mut name_idx = None;
    let mut choices = Vec::new();

    let mut reader = Reader::new(bytes);
    while let Some((field, value)) = reader.next_field()? {
        match field {
            1 => name_idx = Some(value.varint()?),
            2 => choices.push(decode_choice(value.bytes()?, tables)?),
            _ => {}
        }
    }

    let name_idx =
        name_idx.ok_or_else(|| DecodeError::Shape("interface carries no name".into()))?;
    Ok(InterfaceDef {
        name: tables.dotted_name(name_idx)?.to_string(),
        choices,
    })
}
