//! Cross-package binding.
//!
//! Walks every linked archive entry in lexicographic path order and folds
//! the per-entry entities into one global mapping. Two passes: interfaces
//! first, so their choice sets exist before any implementing template is
//! built, then everything else. Name collisions, within a single entry and
//! across the linked set alike, are resolved with deterministic integer
//! suffixes, and every stale type reference is rewritten. Iteration order
//! is always an explicit sort; re-running on identical input must
//! reproduce the mapping byte for byte.
//!
//! Failure policy: the primary entry failing to decode aborts the run;
//! a secondary entry failing is logged and dropped.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::ast::Package;
use crate::builder::{build_entities, build_interfaces, merge_interface_choices};
use crate::decode::{decoder_for, SchemaDecoder};
use crate::manifest::{package_id, Manifest};
use crate::model::{Entity, EntityKind, Model};
use crate::normalize::entity_name;

struct AccumulatedInterface {
    module: String,
    /// Name before any collision suffix, as templates reference it.
    original_name: String,
    entity: Entity,
    placed: bool,
}

/// Bind every entry the manifest links, reading pre-extracted module files
/// under `root`.
pub fn bind(root: &Path, manifest: &Manifest) -> Result<Model> {
    let decoder = decoder_for(manifest.generation()?);
    let package_id = package_id(&manifest.main_dalf)?;

    let mut entries: Vec<&str> = manifest.dalfs.iter().map(String::as_str).collect();
    entries.sort_unstable();
    entries.dedup();

    let interfaces = collect_interfaces(root, manifest, decoder, &entries)?;
    let entities = collect_entities(root, manifest, decoder, &entries, interfaces)?;

    Ok(Model {
        package_id,
        entities,
    })
}

/// First pass: accumulate every interface across the linked set, assigning
/// collision suffixes in lexicographic name order per entry.
fn collect_interfaces(
    root: &Path,
    manifest: &Manifest,
    decoder: &dyn SchemaDecoder,
    entries: &[&str],
) -> Result<Vec<AccumulatedInterface>> {
    let mut accumulated: Vec<AccumulatedInterface> = Vec::new();
    let mut taken: BTreeSet<String> = BTreeSet::new();

    for entry in entries {
        let package = match load_package(root, entry, decoder) {
            Ok(package) => package,
            Err(err) => {
                fail_or_skip(entry, manifest, err, "interface pass")?;
                continue;
            }
        };

        let mut found = build_interfaces(&package);
        found.sort_by(|a, b| a.name.cmp(&b.name));

        for mut entity in found {
            let original_name = entity.name.clone();
            if let Some(renamed) = collision_suffix(&entity.name, &taken) {
                debug!("interface `{original_name}` collides; renamed to `{renamed}`");
                entity.name = renamed;
            }
            taken.insert(entity.name.clone());
            accumulated.push(AccumulatedInterface {
                module: entity.module.clone(),
                original_name,
                entity,
                placed: false,
            });
        }
    }

    Ok(accumulated)
}

/// Second pass: build every entry's entities, merge the accumulated
/// interfaces in, and fold into the global mapping with plan-then-apply
/// renames. Every pass-one interface name is reserved up front, so a
/// struct sharing an interface's name takes a suffix no matter which
/// entry lands first.
fn collect_entities(
    root: &Path,
    manifest: &Manifest,
    decoder: &dyn SchemaDecoder,
    entries: &[&str],
    mut interfaces: Vec<AccumulatedInterface>,
) -> Result<BTreeMap<String, Entity>> {
    let mut model: BTreeMap<String, Entity> = BTreeMap::new();
    let reserved: BTreeSet<String> =
        interfaces.iter().map(|r| r.entity.name.clone()).collect();

    for entry in entries {
        let package = match load_package(root, entry, decoder) {
            Ok(package) => package,
            Err(err) => {
                fail_or_skip(entry, manifest, err, "struct pass")?;
                continue;
            }
        };

        let mut built = build_entities(&package);
        merge_interfaces(&mut built, &interfaces);

        // Interfaces belonging to this entry's modules enter the mapping
        // here, under their pass-one names.
        let module_names: BTreeSet<&str> =
            package.modules.iter().map(|m| m.name.as_str()).collect();
        let mut placed: Vec<Entity> = Vec::new();
        for record in interfaces.iter_mut() {
            if record.placed || !module_names.contains(record.module.as_str()) {
                continue;
            }
            record.placed = true;
            placed.push(record.entity.clone());
        }

        let mut taken: BTreeSet<String> = model.keys().cloned().collect();
        taken.extend(reserved.iter().cloned());
        let planned = suffix_entities(&mut built, &mut taken);
        rewrite_references(&mut built, &planned);
        rewrite_references(&mut placed, &planned);

        for entity in placed.into_iter().chain(built) {
            model.insert(entity.name.clone(), entity);
        }
    }

    Ok(model)
}

fn merge_interfaces(entities: &mut [Entity], interfaces: &[AccumulatedInterface]) {
    for entity in entities.iter_mut() {
        if entity.kind != EntityKind::Template || entity.implements.is_empty() {
            continue;
        }
        let implements = std::mem::take(&mut entity.implements);
        for dotted in implements {
            let module = dotted.rsplit_once('.').map(|(m, _)| m).unwrap_or("");
            let name = entity_name(&dotted);
            // Same-module interfaces win over same-named ones from other
            // linked packages; name-only is the cross-package fallback.
            let found = interfaces
                .iter()
                .find(|r| r.module == module && r.original_name == name)
                .or_else(|| interfaces.iter().find(|r| r.original_name == name));
            match found {
                Some(record) => {
                    merge_interface_choices(entity, &record.entity);
                    entity.implements.push(record.entity.name.clone());
                }
                None => {
                    warn!(
                        "template `{}` implements unknown interface `{dotted}`",
                        entity.name
                    );
                    entity.implements.push(name);
                }
            }
        }
    }
}

/// Run each entity through the running name table in name-then-module
/// order, applying the collision rule to within-entry duplicates and
/// cross-entry clashes alike. Returns the applied rename plan.
fn suffix_entities(
    entities: &mut Vec<Entity>,
    taken: &mut BTreeSet<String>,
) -> Vec<(String, String)> {
    entities.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.module.cmp(&b.module)));

    let mut planned = Vec::new();
    for entity in entities.iter_mut() {
        if let Some(renamed) = collision_suffix(&entity.name, taken) {
            debug!("entity `{}` collides; renamed to `{renamed}`", entity.name);
            planned.push((entity.name.clone(), renamed.clone()));
            entity.name = renamed;
        }
        taken.insert(entity.name.clone());
    }
    planned
}

/// Rewrite every field and choice type that pointed at a renamed name,
/// behind a leading list or optional marker if one is present.
fn rewrite_references(entities: &mut [Entity], planned: &[(String, String)]) {
    for (old, new) in planned {
        for entity in entities.iter_mut() {
            for field in &mut entity.fields {
                if let Some(token) = rewrite_token(&field.token, old, new) {
                    field.token = token;
                }
            }
            for choice in &mut entity.choices {
                if let Some(token) = choice
                    .argument
                    .as_deref()
                    .and_then(|t| rewrite_token(t, old, new))
                {
                    choice.argument = Some(token);
                }
                if let Some(token) = rewrite_token(&choice.result, old, new) {
                    choice.result = token;
                }
            }
        }
    }
}

/// The global collision rule. An existing name matches the candidate when
/// it equals the candidate followed by nothing or by an integer; N matches
/// put the candidate at `candidate{N+1}`.
fn collision_suffix(candidate: &str, taken: &BTreeSet<String>) -> Option<String> {
    let matches = taken
        .iter()
        .filter(|name| {
            name.strip_prefix(candidate)
                .is_some_and(|rest| rest.is_empty() || rest.parse::<u64>().is_ok())
        })
        .count();
    (matches > 0).then(|| format!("{candidate}{}", matches + 1))
}

fn rewrite_token(token: &str, old: &str, new: &str) -> Option<String> {
    if token == old {
        return Some(new.to_string());
    }
    for marker in ["[]", "*"] {
        if let Some(rest) = token.strip_prefix(marker) {
            if rest == old {
                return Some(format!("{marker}{new}"));
            }
        }
    }
    None
}

fn load_package(root: &Path, entry: &str, decoder: &dyn SchemaDecoder) -> Result<Package> {
    let path = root.join(entry);
    let bytes = fs::read(&path)
        .with_context(|| format!("reading archive entry `{}`", path.display()))?;
    let package = decoder
        .decode_package(&bytes)
        .with_context(|| format!("decoding archive entry `{entry}`"))?;
    Ok(package)
}

fn fail_or_skip(entry: &str, manifest: &Manifest, err: anyhow::Error, pass: &str) -> Result<()> {
    if entry == manifest.main_dalf {
        Err(err.context(format!("primary entry `{entry}` failed during {pass}")))
    } else {
        warn!("skipping linked entry `{entry}` during {pass}: {err:#}");
        Ok(())
    }
}
