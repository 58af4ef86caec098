use fieldstore::config;
use fieldstore::{ContainerOptions, FieldArray, FieldContainer, FieldError, FieldResult, KeyFilter, LookupOptions, RecipeArgs};
use serde_json::json;

fn coordinates(n: usize) -> FieldArray {
    let rows: Vec<Vec<f64>> = (0..n).map(|i| vec![i as f64, 2.0 * i as f64, 3.0 * i as f64]).collect();
    FieldArray::from_rows(&rows).unwrap()
}

fn masses(c: &mut FieldContainer, args: &RecipeArgs) -> FieldResult<FieldArray> {
    // Stored in units of 1e10 Msun/h; scale out h when units are requested
    let raw = c.array("Masses")?;
    if args.get_bool("units").unwrap_or(false) {
        let h = args.get_f64("little_h").ok_or_else(|| FieldError::generator("little_h missing"))?;
        return Ok(raw.map_f64(|m| m * 1e10 / h));
    }
    Ok(raw)
}

/// A snapshot-like tree: gas and dark matter groups seeded from "disk".
fn snapshot() -> FieldContainer {
    let defaults = config::parse_yaml("units: true\nlittle_h: 0.5\n", "test").unwrap();
    let mut root = FieldContainer::from_options(ContainerOptions {
        name: Some("snapshot".into()),
        containers: vec!["PartType0".into(), "PartType1".into()],
        recipe_defaults: defaults.recipe_defaults(),
        ..Default::default()
    });
    for (k, n) in [("PartType0", 4usize), ("PartType1", 3)] {
        let group = root.container_mut(k).unwrap();
        group.insert_array("Coordinates", coordinates(n));
        group.insert_array("Masses", FieldArray::from(vec![1.0; n]));
        group.insert_array("uid", FieldArray::from((0..n as i64).collect::<Vec<_>>()));
        group.add_alias("pos", "Coordinates");
    }
    root.register_field("all")
        .name("mass_phys")
        .param("units")
        .accept_extra()
        .generator(masses)
        .unwrap();
    root.register_field("all")
        .name("radius")
        .description("distance from origin")
        .generator(|c, _| c.array("pos")?.row_norm())
        .unwrap();
    root
}

#[test]
fn particle_groups_derive_with_tree_defaults() {
    let mut root = snapshot();
    assert_eq!(root.keys(KeyFilter::default()), vec!["PartType0", "PartType1"]);
    assert!(root.get("PartType0").unwrap().is_container());

    let gas = root.container_mut("PartType0").unwrap();
    assert_eq!(gas.field_length(), Some(4));
    let m = gas.array("mass_phys").unwrap();
    assert_eq!(m.to_f64_vec(), vec![2e10; 4]);
    assert_eq!(gas.keys(KeyFilter::default()), vec!["Coordinates", "Masses", "mass_phys", "radius"]);
    let r = gas.array("radius").unwrap().to_f64_vec();
    assert!((r[1] - 14f64.sqrt()).abs() < 1e-12);
}

#[test]
fn dataframe_of_a_particle_group() {
    let mut root = snapshot();
    let dm = root.container_mut("PartType1").unwrap();
    let df = dm.get_dataframe(Some(&["Coordinates0", "Coordinates2", "radius", "uid"])).unwrap();
    assert_eq!(df.height(), 3);
    let names: Vec<&str> = df.get_column_names().iter().map(|n| n.as_str()).collect();
    assert_eq!(names, vec!["Coordinates0", "Coordinates2", "radius", "uid"]);
    let z: Vec<f64> = df.column("Coordinates2").unwrap().f64().unwrap().into_iter().map(|o| o.unwrap()).collect();
    assert_eq!(z, vec![0.0, 3.0, 6.0]);

    let err = dm.get_dataframe(Some(&["Coordinates5"])).unwrap_err();
    assert_eq!(err.code_str(), "dimension");
}

#[test]
fn merging_a_halo_catalog_into_a_snapshot() {
    let mut root = snapshot();
    let mut catalog = FieldContainer::new();
    let groups = catalog.new_container("Group", ContainerOptions::default());
    groups.insert_array("GroupMass", FieldArray::from(vec![10.0, 20.0]));
    let gas = catalog.new_container("PartType0", ContainerOptions::default());
    gas.insert_array("Masses", FieldArray::from(vec![99.0; 4]));
    gas.insert_array("GroupID", FieldArray::from(vec![0i64, 0, 1, 1]));

    root.merge(catalog, true).unwrap();
    let gas = root.container_mut("PartType0").unwrap();
    assert_eq!(gas.array("Masses").unwrap().to_f64_vec(), vec![1.0; 4]);
    assert_eq!(gas.array("GroupID").unwrap().len(), Some(4));
    let halos = root.container("Group").unwrap();
    assert_eq!(halos.recipe_defaults().get("little_h"), Some(&json!(0.5)));
    assert_eq!(root.keys(KeyFilter::default()), vec!["Group", "PartType0", "PartType1"]);
}

#[test]
fn non_throwing_lookup_paths() {
    let mut root = snapshot();
    let dm = root.container_mut("PartType1").unwrap();
    let fallback = FieldArray::from(vec![-1.0]);
    let got = dm.get_or("Potential", fallback.clone(), LookupOptions::default()).unwrap();
    assert!(got.as_array().unwrap().ptr_eq(&fallback));
    let err = dm.get_or("radius", fallback, LookupOptions::stored_only()).unwrap_err();
    assert_eq!(err, FieldError::derived_forbidden("radius"));
    assert!(dm.get("Potential").unwrap_err().is_not_found());
}
