//! Per-package entity construction.
//!
//! Turns one decoded package into normalized entities: record/variant/enum
//! entities for serializable data types, template entities for template
//! declarations with a matching record definition, and interface entities
//! with their choice lists. Interface choice *merging* happens in the
//! binder, once the global interface set is known.

use std::collections::BTreeSet;

use tracing::{debug, warn};

use crate::ast::{DataBody, Package, RawChoice, RawField};
use crate::error::ResolutionError;
use crate::keys::key_fields;
use crate::model::{Choice, Entity, EntityKind, Field};
use crate::normalize::{entity_name, is_soft_token, normalize};

/// Interface entities of every module, in declaration order. Run as the
/// binder's first pass so interface choice sets exist before any template
/// is merged.
pub fn build_interfaces(package: &Package) -> Vec<Entity> {
    let enums = enum_names(package);
    let mut out = Vec::new();
    for module in &package.modules {
        for interface in &module.interfaces {
            out.push(
                Entity::new(
                    entity_name(&interface.name),
                    module.name.clone(),
                    EntityKind::Interface,
                )
                .with_choices(build_choices(&interface.choices, &enums)),
            );
        }
    }
    out
}

/// Record, variant, enum, and template entities of every module, in
/// declaration order. Same-named definitions are all kept; name
/// uniqueness is the binder's job. Interface declarations and interface
/// markers are left to [`build_interfaces`].
pub fn build_entities(package: &Package) -> Vec<Entity> {
    let enums = enum_names(package);
    let mut out: Vec<Entity> = Vec::new();

    for module in &package.modules {
        for def in &module.data_defs {
            if !def.serializable {
                debug!("excluding non-serializable data type `{}`", def.name);
                continue;
            }
            let name = entity_name(&def.name);
            let entity = match &def.body {
                DataBody::Record(fields) => {
                    Entity::new(name.clone(), module.name.clone(), EntityKind::Record)
                        .with_fields(build_fields(fields, &enums, false))
                }
                DataBody::Variant(fields) => {
                    // A variant instance carries exactly one arm.
                    Entity::new(name.clone(), module.name.clone(), EntityKind::Variant)
                        .with_fields(build_fields(fields, &enums, true))
                }
                DataBody::Enum(ctors) => {
                    Entity::new(name.clone(), module.name.clone(), EntityKind::Enum)
                        .with_constructors(ctors.clone())
                }
                DataBody::Interface => continue,
                DataBody::Unknown(detail) => {
                    warn!("skipping data type `{name}` with unsupported body ({detail})");
                    continue;
                }
            };
            out.push(entity);
        }

        for template in &module.templates {
            let name = entity_name(&template.name);
            // Same-module definitions win over a same-named one elsewhere
            // in the package.
            let pos = out
                .iter()
                .position(|e| e.name == name && e.module == module.name)
                .or_else(|| out.iter().position(|e| e.name == name));
            let Some(base) = pos.map(|i| &mut out[i]) else {
                warn!(
                    "{}; skipping template",
                    ResolutionError::TemplateWithoutDataDef(name)
                );
                continue;
            };
            if base.kind != EntityKind::Record {
                warn!(
                    "{}; skipping template",
                    ResolutionError::TemplateWithoutDataDef(name)
                );
                continue;
            }

            base.kind = EntityKind::Template;
            base.choices = build_choices(&template.choices, &enums);
            // Dotted names survive here; the binder resolves them against
            // the accumulated interface set and writes the final names.
            base.implements = template.implements.clone();

            if let Some(expr) = &template.key {
                let names = key_fields(expr);
                if names.len() > 1 {
                    // Composite keys bind their first field only.
                    debug!(
                        "template `{name}` has a composite key {names:?}; binding `{}`",
                        names[0]
                    );
                }
                match names.first() {
                    Some(first) if base.fields.iter().any(|f| &f.name == first) => {
                        base.key_field = Some(first.clone());
                    }
                    Some(first) => {
                        debug!("template `{name}` key names `{first}`, which is not a field");
                    }
                    None => {}
                }
            }
        }
    }

    out
}

/// Append an interface's choices to a template, skipping names the
/// template already defines. Own choices always come first.
pub fn merge_interface_choices(template: &mut Entity, interface: &Entity) {
    for choice in &interface.choices {
        if template.choices.iter().any(|c| c.name == choice.name) {
            continue;
        }
        let mut inherited = choice.clone();
        inherited.inherited_from = Some(interface.name.clone());
        template.choices.push(inherited);
    }
}

fn enum_names(package: &Package) -> BTreeSet<String> {
    let mut names = BTreeSet::new();
    for module in &package.modules {
        for def in &module.data_defs {
            if def.serializable && matches!(def.body, DataBody::Enum(_)) {
                names.insert(entity_name(&def.name));
            }
        }
    }
    names
}

fn build_fields(raw: &[RawField], enums: &BTreeSet<String>, force_optional: bool) -> Vec<Field> {
    raw.iter()
        .map(|field| {
            let norm = normalize(&field.ty, enums);
            Field {
                name: field.name.clone(),
                raw: field.ty.to_string(),
                optional: force_optional || is_soft_token(&norm.token),
                is_enum: norm.is_enum,
                token: norm.token,
            }
        })
        .collect()
}

fn build_choices(raw: &[RawChoice], enums: &BTreeSet<String>) -> Vec<Choice> {
    raw.iter()
        .map(|choice| {
            let argument = Some(normalize(&choice.arg, enums).token).filter(|t| t != "unit");
            Choice {
                name: choice.name.clone(),
                argument,
                result: normalize(&choice.ret, enums).token,
                inherited_from: None,
            }
        })
        .collect()
}
