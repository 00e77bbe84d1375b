//! End-to-end document tests: build a tree, write it to disk, read it
//! back into a fresh model.

use std::sync::Arc;

use trellis_model::serialization::{load_document, save_document};
use trellis_model::{Blueprint, ItemCatalog, Model, ModelError, Role, TagInfo, TagRow, Value};

fn catalog() -> Arc<ItemCatalog> {
    let catalog = ItemCatalog::new();
    catalog.register("Project", || {
        Blueprint::new()
            .with_data(Role::Display, Value::from("untitled"))
            .with_universal_tag("layers", true)
    });
    catalog.register("Layer", || {
        Blueprint::new()
            .with_property("visible", Value::from(true))
            .with_property("opacity", Value::from(1.0))
            .with_tag(
                TagInfo::new("shapes", 0, None, vec!["Shape".to_string()]),
                true,
            )
    });
    catalog.register("Shape", || {
        Blueprint::new()
            .with_property("label", Value::from(""))
            .with_property("area", Value::from(0.0))
    });
    Arc::new(catalog)
}

fn build_sample(model: &Model) {
    let project = model
        .insert_item("Project", model.root(), &TagRow::append())
        .unwrap();
    model
        .set_data(project, Role::Display, Value::from("demo"))
        .unwrap();

    let layer = model
        .insert_item("Layer", project, &TagRow::append())
        .unwrap();
    model
        .set_property(layer, "opacity", Value::from(0.5))
        .unwrap();

    for (label, area) in [("roi-a", 12.5), ("roi-b", 3.0)] {
        let shape = model.insert_item("Shape", layer, &TagRow::append()).unwrap();
        model
            .set_property(shape, "label", Value::from(label))
            .unwrap();
        model
            .set_property(shape, "area", Value::from(area))
            .unwrap();
    }
}

#[test]
fn save_and_load_preserves_tree() {
    let source = Model::new(catalog());
    build_sample(&source);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("project.json");
    save_document(&source, &path).unwrap();

    let target = Model::new(catalog());
    load_document(&target, &path).unwrap();

    let projects = target.children(target.root(), "").unwrap();
    assert_eq!(projects.len(), 1);
    assert_eq!(
        target.data(projects[0], Role::Display).unwrap(),
        Some(Value::from("demo"))
    );

    let layers = target.children(projects[0], "layers").unwrap();
    assert_eq!(layers.len(), 1);
    assert_eq!(
        target.property(layers[0], "opacity").unwrap(),
        Value::from(0.5)
    );
    assert_eq!(
        target.property(layers[0], "visible").unwrap(),
        Value::from(true)
    );

    let shapes = target.children(layers[0], "shapes").unwrap();
    assert_eq!(shapes.len(), 2);
    assert_eq!(
        target.property(shapes[0], "label").unwrap(),
        Value::from("roi-a")
    );
    assert_eq!(
        target.property(shapes[1], "area").unwrap(),
        Value::from(3.0)
    );
}

#[test]
fn load_replaces_existing_content() {
    let source = Model::new(catalog());
    build_sample(&source);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("project.json");
    save_document(&source, &path).unwrap();

    let target = Model::new(catalog());
    let stale = target
        .insert_item("Project", target.root(), &TagRow::append())
        .unwrap();
    load_document(&target, &path).unwrap();

    assert!(!target.contains(stale));
    assert_eq!(target.children(target.root(), "").unwrap().len(), 1);
}

#[test]
fn load_rejects_document_with_unknown_type() {
    let source = Model::new(catalog());
    build_sample(&source);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("project.json");
    save_document(&source, &path).unwrap();

    // A catalog missing "Shape" cannot accept the document.
    let bare = ItemCatalog::new();
    bare.register("Project", || {
        Blueprint::new().with_universal_tag("layers", true)
    });
    bare.register("Layer", Blueprint::new);
    let target = Model::new(Arc::new(bare));
    let before = target
        .insert_item("Project", target.root(), &TagRow::append())
        .unwrap();

    let result = load_document(&target, &path);
    assert!(matches!(result, Err(ModelError::UnknownType { .. })));
    // Failed load left the model as it was.
    assert!(target.contains(before));
    assert_eq!(target.children(target.root(), "").unwrap(), vec![before]);
}

#[test]
fn load_rejects_malformed_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.json");
    std::fs::write(&path, "{ not json").unwrap();

    let model = Model::new(catalog());
    assert!(matches!(
        load_document(&model, &path),
        Err(ModelError::Format { .. })
    ));
}
