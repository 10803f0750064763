use std::fs;
use std::path::Path;

use partcat_store::{Component, StoreError, Workspace};
use tempfile::tempdir;

fn write_component(root: &Path, name: &str, manifest: &str, quantity: &str) {
    let dir = root.join("components").join(name);
    fs::create_dir_all(&dir).expect("component dir");
    fs::write(dir.join("MANIFEST"), manifest).expect("manifest");
    fs::write(dir.join("QUANTITY"), quantity).expect("quantity");
}

#[test]
fn open_scans_every_component_folder() {
    let temp = tempdir().expect("tempdir");
    fs::create_dir_all(temp.path().join("assets/images")).expect("images");
    write_component(temp.path(), "BC547", "Category: Transistors\nPackage: TO-92\n", "25\n");
    write_component(temp.path(), "LM358", "Category: ICs\n", "3");

    let workspace = Workspace::open(temp.path()).expect("open");
    assert!(workspace.is_open());
    assert_eq!(workspace.components().count(), 2);

    let bc547 = workspace.component("BC547").expect("BC547");
    assert_eq!(bc547.quantity(), 25);
    assert_eq!(bc547.properties().get("Package"), Some("TO-92"));
    assert_eq!(bc547.category().name(), Some("Transistors"));
    assert!(!bc547.is_newly_created());
}

#[test]
fn corrupt_folder_does_not_block_the_rest() {
    let temp = tempdir().expect("tempdir");
    write_component(temp.path(), "good", "Category: Passives\n", "1");
    fs::create_dir_all(temp.path().join("components/no-manifest")).expect("corrupt dir");

    let workspace = Workspace::open(temp.path()).expect("open");
    let names: Vec<_> = workspace.components().filter_map(Component::name).collect();
    assert_eq!(names, ["good"]);
    assert!(matches!(
        Component::load(&workspace, "no-manifest"),
        Err(StoreError::ManifestNotFound(_))
    ));
}

#[test]
fn new_component_round_trips_through_disk() {
    let temp = tempdir().expect("tempdir");
    let mut workspace = Workspace::create_new(temp.path()).expect("create");

    let mut component = Component::create(&workspace, "1N4148").expect("create component");
    assert!(component.is_newly_created());
    assert_eq!(component.path(), None);
    component.set_quantity(100);
    component.set_notes(Some("small signal".to_string()));
    component
        .properties_mut()
        .insert("Category", "Diodes")
        .expect("category");
    component
        .properties_mut()
        .insert("Package", "DO-35")
        .expect("package");
    component.save().expect("save");
    assert!(!component.is_newly_created());

    workspace.reopen().expect("reopen");
    let loaded = workspace.component("1N4148").expect("loaded");
    assert_eq!(loaded.quantity(), 100);
    assert_eq!(loaded.notes(), Some("small signal"));
    assert_eq!(loaded.properties(), component.properties());
    assert_eq!(
        fs::read_to_string(temp.path().join("components/1N4148/MANIFEST")).expect("manifest"),
        "Category: Diodes\nPackage: DO-35\n"
    );
}

#[test]
fn duplicate_names_are_rejected() {
    let temp = tempdir().expect("tempdir");
    let workspace = Workspace::create_new(temp.path()).expect("create");
    write_component(temp.path(), "NE555", "Category: ICs\n", "4");

    assert!(workspace.exists("NE555"));
    assert!(matches!(
        Component::create(&workspace, "NE555"),
        Err(StoreError::ComponentExists(name)) if name == "NE555"
    ));
    let opened = Component::open(&workspace, "NE555").expect("open existing");
    assert_eq!(opened.quantity(), 4);
}

#[test]
fn delete_then_repopulate_drops_the_component() {
    let temp = tempdir().expect("tempdir");
    write_component(temp.path(), "R1", "Category: Passives\n", "10");
    write_component(temp.path(), "R2", "Category: Passives\n", "20");
    let mut workspace = Workspace::open(temp.path()).expect("open");

    let r1 = workspace.component_mut("R1").expect("R1");
    r1.delete().expect("delete");
    assert!(r1.is_deleted());
    assert!(matches!(r1.save(), Err(StoreError::ComponentDeleted(_))));
    assert!(!temp.path().join("components/R1").exists());

    workspace.populate_components().expect("repopulate");
    let names: Vec<_> = workspace.components().filter_map(Component::name).collect();
    assert_eq!(names, ["R2"]);
}

#[test]
fn save_as_leaves_the_original_in_place() {
    let temp = tempdir().expect("tempdir");
    write_component(temp.path(), "BC547", "Category: Transistors\n", "5");
    let mut workspace = Workspace::open(temp.path()).expect("open");

    let mut copy = workspace.component("BC547").expect("BC547").clone();
    copy.set_quantity(7);
    copy.save_as("BC547B").expect("save as");
    assert_eq!(copy.name(), Some("BC547B"));

    workspace.reopen().expect("reopen");
    assert_eq!(workspace.component("BC547").expect("original").quantity(), 5);
    assert_eq!(workspace.component("BC547B").expect("copy").quantity(), 7);
}

#[test]
fn operations_on_a_closed_workspace_fail() {
    let workspace = Workspace::new();
    assert!(!workspace.is_open());
    assert!(matches!(
        Component::load(&workspace, "anything"),
        Err(StoreError::WorkspaceNotOpen)
    ));
    assert!(matches!(
        Component::empty(&workspace),
        Err(StoreError::WorkspaceNotOpen)
    ));
    assert!(!workspace.exists("anything"));
}
