//! End-to-end scenarios over the public binding API, driving both schema
//! generations through synthetic archive entries.

mod common;

use std::fs;
use std::path::Path;

use anyhow::Result;
use tempfile::TempDir;

use common::{record, template, variant, KeyFx, PackageFx, Ty, HASH};
use darlift::{bind, EntityKind, Manifest};

fn write_entry(root: &Path, rel: &str, bytes: &[u8]) -> Result<()> {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, bytes)?;
    Ok(())
}

fn manifest_for(main: &str, dalfs: &[&str], sdk: &str) -> Manifest {
    Manifest::parse(&format!(
        "Main-Dalf: {main}\nDalfs: {}\nSdk-Version: {sdk}\n",
        dalfs.join(", ")
    ))
    .unwrap()
}

#[test]
fn rental_archive_selects_generation_a_and_extracts_the_template() -> Result<()> {
    let dir = TempDir::new()?;
    let entry = format!("rental-0.1.0-{HASH}/rental-0.1.0-{HASH}.dalf");

    let mut package = PackageFx::gen_a();
    package.module(
        "Rental",
        vec![
            record(
                "Rental.RentalAgreement",
                &[
                    ("landlord", Ty::Party),
                    ("tenant", Ty::Party),
                    ("terms", Ty::Text),
                ],
            ),
            template(
                "Rental.RentalAgreement",
                &[("Archive", Ty::Unit, Ty::Unit)],
                Some(KeyFx::Proj("landlord".into())),
                &[],
            ),
        ],
    );
    write_entry(dir.path(), &entry, &package.entry_bytes())?;

    let manifest = manifest_for(&entry, &[&entry], "1.18.1");
    let model = bind(dir.path(), &manifest)?;

    assert_eq!(model.package_id, HASH);

    let agreement = &model.entities["RentalAgreement"];
    assert_eq!(agreement.kind, EntityKind::Template);
    assert_eq!(agreement.module, "Rental");

    let field_names: Vec<&str> = agreement.fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(field_names, ["landlord", "tenant", "terms"]);
    assert_eq!(agreement.fields[0].token, "party");
    assert_eq!(agreement.fields[2].token, "text");

    assert_eq!(agreement.key_field.as_deref(), Some("landlord"));
    // Archive's unit argument is suppressed.
    assert_eq!(agreement.choices[0].name, "Archive");
    assert_eq!(agreement.choices[0].argument, None);
    Ok(())
}

#[test]
fn colliding_data_types_are_suffixed_and_references_rewritten() -> Result<()> {
    let dir = TempDir::new()?;
    let other_hash = "f".repeat(64);
    let first = format!("alpha-{HASH}.dalf");
    let second = format!("beta-{other_hash}.dalf");

    let mut alpha = PackageFx::gen_a();
    alpha.module(
        "Alpha",
        vec![record("Alpha.Accept", &[("note", Ty::Text)])],
    );
    write_entry(dir.path(), &first, &alpha.entry_bytes())?;

    let mut beta = PackageFx::gen_a();
    beta.module(
        "Beta",
        vec![
            record("Beta.Accept", &[("flag", Ty::Bool)]),
            record(
                "Beta.Offer",
                &[
                    ("direct", Ty::con("Beta.Accept")),
                    ("many", Ty::list(Ty::con("Beta.Accept"))),
                    ("maybe", Ty::optional(Ty::con("Beta.Accept"))),
                ],
            ),
        ],
    );
    write_entry(dir.path(), &second, &beta.entry_bytes())?;

    let manifest = manifest_for(&first, &[&first, &second], "1.18.1");
    let model = bind(dir.path(), &manifest)?;

    // First by sorted discovery keeps the bare name.
    assert_eq!(model.entities["Accept"].module, "Alpha");
    assert_eq!(model.entities["Accept2"].module, "Beta");

    let offer = &model.entities["Offer"];
    assert_eq!(offer.fields[0].token, "Accept2");
    assert_eq!(offer.fields[1].token, "[]Accept2");
    assert_eq!(offer.fields[2].token, "*Accept2");
    Ok(())
}

#[test]
fn variant_constructors_become_optional_fields_under_generation_b() -> Result<()> {
    let dir = TempDir::new()?;
    let entry = format!("address-{HASH}.dalf");

    let mut package = PackageFx::gen_b();
    package.module(
        "Main",
        vec![
            record("Main.USAddress", &[("zip", Ty::Text)]),
            record("Main.UKAddress", &[("postcode", Ty::Text)]),
            variant(
                "Main.Address",
                &[
                    ("US", Ty::con("Main.USAddress")),
                    ("UK", Ty::con("Main.UKAddress")),
                ],
            ),
        ],
    );
    write_entry(dir.path(), &entry, &package.entry_bytes())?;

    let manifest = manifest_for(&entry, &[&entry], "3.1.0");
    let model = bind(dir.path(), &manifest)?;

    let address = &model.entities["Address"];
    assert_eq!(address.kind, EntityKind::Variant);
    assert_eq!(address.fields.len(), 2);
    assert!(address.fields.iter().all(|f| f.optional));
    assert_eq!(address.fields[0].token, "USAddress");
    assert_eq!(address.fields[1].token, "UKAddress");
    Ok(())
}

#[test]
fn enum_references_carry_the_flag_through_the_pipeline() -> Result<()> {
    let dir = TempDir::new()?;
    let entry = format!("paint-{HASH}.dalf");

    let mut package = PackageFx::gen_b();
    package.module(
        "Main",
        vec![
            common::enumeration("Main.Color", &["Red", "Green", "Blue"]),
            record("Main.Paint", &[("shade", Ty::con("Main.Color"))]),
        ],
    );
    write_entry(dir.path(), &entry, &package.entry_bytes())?;

    let manifest = manifest_for(&entry, &[&entry], "3.1.0");
    let model = bind(dir.path(), &manifest)?;

    let color = &model.entities["Color"];
    assert_eq!(color.kind, EntityKind::Enum);
    assert_eq!(color.constructors, ["Red", "Green", "Blue"]);

    let shade = &model.entities["Paint"].fields[0];
    assert!(shade.is_enum);
    assert_eq!(shade.token, "Color");
    assert!(!shade.optional);
    Ok(())
}
