use std::error::Error;
use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

fn cli(workspace: &Path) -> Result<Command, Box<dyn Error>> {
    let mut command = Command::cargo_bin("partcat-cli")?;
    command
        .env_remove("RUST_LOG")
        .env_remove("PARTCAT_CONFIG")
        .arg("--workspace")
        .arg(workspace);
    Ok(command)
}

fn init(workspace: &Path) -> Result<(), Box<dyn Error>> {
    Command::cargo_bin("partcat-cli")?
        .env_remove("PARTCAT_CONFIG")
        .arg("init")
        .arg(workspace)
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized workspace"));
    Ok(())
}

#[test]
fn init_creates_the_workspace_skeleton() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let root = dir.path().join("inventory");
    init(&root)?;
    assert!(root.join("components").is_dir());
    assert!(root.join("assets/images").is_dir());
    Ok(())
}

#[test]
fn new_then_show_round_trips_fields() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    init(dir.path())?;

    cli(dir.path())?
        .args([
            "new",
            "BC547",
            "--quantity",
            "25",
            "--notes",
            "general purpose",
            "--property",
            "Category=Transistors",
            "--property",
            "Sub-Category=NPN",
            "--property",
            "Package=TO-92",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created component BC547"));

    assert_eq!(
        fs::read_to_string(dir.path().join("components/BC547/MANIFEST"))?,
        "Category: Transistors\nSub-Category: NPN\nPackage: TO-92\n"
    );
    assert_eq!(
        fs::read_to_string(dir.path().join("components/BC547/QUANTITY"))?,
        "25"
    );

    let output = cli(dir.path())?
        .args(["show", "BC547", "--json"])
        .output()?;
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(json["quantity"], 25);
    assert_eq!(json["category"], "Transistors");
    assert_eq!(json["sub_category"], "NPN");
    assert_eq!(json["notes"], "general purpose");
    assert_eq!(json["properties"]["Package"], "TO-92");
    assert_eq!(json["has_datasheet"], false);

    cli(dir.path())?
        .args(["show", "BC547"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Quantity: 25"));
    Ok(())
}

#[test]
fn new_rejects_an_existing_name() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    init(dir.path())?;
    cli(dir.path())?.args(["new", "NE555"]).assert().success();

    cli(dir.path())?
        .args(["new", "NE555"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("component 'NE555' already exists"));
    Ok(())
}

#[test]
fn set_updates_and_removes_properties() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    init(dir.path())?;
    cli(dir.path())?
        .args(["new", "R1", "--property", "Value=10k", "--property", "Package=0805"])
        .assert()
        .success();

    cli(dir.path())?
        .args([
            "set",
            "R1",
            "--quantity",
            "50",
            "--property",
            "Value=22k",
            "--remove-property",
            "Package",
        ])
        .assert()
        .success();
    assert_eq!(
        fs::read_to_string(dir.path().join("components/R1/MANIFEST"))?,
        "Value: 22k\n"
    );

    cli(dir.path())?
        .args(["set", "R1", "--remove-property", "Package"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("has no property 'Package'"));
    Ok(())
}

#[test]
fn list_and_tree_group_by_category() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    init(dir.path())?;
    for (name, category, sub) in [
        ("BC557", "Transistors", Some("PNP")),
        ("BC547", "Transistors", Some("NPN")),
        ("2N7000", "Transistors", None),
        ("C1", "Capacitors", None),
    ] {
        let mut command = cli(dir.path())?;
        command
            .args(["new", name, "--property"])
            .arg(format!("Category={category}"));
        if let Some(sub) = sub {
            command.arg("--property").arg(format!("Sub-Category={sub}"));
        }
        command.assert().success();
    }

    cli(dir.path())?
        .args(["list", "--category", "Transistors"])
        .assert()
        .success()
        .stdout("2N7000\t0\tTransistors\nBC547\t0\tTransistors\nBC557\t0\tTransistors\n");

    cli(dir.path())?
        .arg("tree")
        .assert()
        .success()
        .stdout(
            "Capacitors\n  C1\nTransistors\n  NPN\n    BC547\n  PNP\n    BC557\n  2N7000\n",
        );

    cli(dir.path())?
        .args(["tree", "--filter", "bc54"])
        .assert()
        .success()
        .stdout("Transistors\n  NPN\n    BC547\n");
    Ok(())
}

#[test]
fn image_is_imported_into_the_pool() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let root = dir.path().join("ws");
    init(&root)?;
    cli(&root)?.args(["new", "BC817"]).assert().success();
    let photo = dir.path().join("photo.png");
    fs::write(&photo, b"png bytes")?;

    cli(&root)?
        .args(["image", "BC817"])
        .arg(&photo)
        .assert()
        .success();
    assert_eq!(fs::read(root.join("assets/images/BC817.png"))?, b"png bytes");
    assert_eq!(
        fs::read_to_string(root.join("components/BC817/IMAGE"))?,
        "BC817"
    );
    Ok(())
}

#[test]
fn save_as_rename_and_delete() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    init(dir.path())?;
    cli(dir.path())?
        .args(["new", "LM358", "--quantity", "3"])
        .assert()
        .success();

    cli(dir.path())?
        .args(["save-as", "LM358", "LM358N"])
        .assert()
        .success();
    assert!(dir.path().join("components/LM358").is_dir());
    assert!(dir.path().join("components/LM358N").is_dir());

    cli(dir.path())?
        .args(["rename", "LM358", "LM358N"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
    cli(dir.path())?
        .args(["rename", "LM358", "LM358P"])
        .assert()
        .success();
    assert!(!dir.path().join("components/LM358").exists());
    assert_eq!(
        fs::read_to_string(dir.path().join("components/LM358P/QUANTITY"))?,
        "3"
    );

    cli(dir.path())?
        .args(["delete", "LM358P"])
        .assert()
        .success();
    assert!(!dir.path().join("components/LM358P").exists());
    cli(dir.path())?
        .args(["show", "LM358P"])
        .assert()
        .failure();
    Ok(())
}

#[test]
fn attach_copies_files_under_fixed_names() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let root = dir.path().join("ws");
    init(&root)?;
    cli(&root)?.args(["new", "2N3904"]).assert().success();
    let sheet = dir.path().join("2n3904.pdf");
    fs::write(&sheet, b"%PDF")?;
    let model = dir.path().join("2n3904.lib");
    fs::write(&model, ".model 2N3904 NPN")?;

    cli(&root)?
        .args(["attach", "2N3904", "--datasheet"])
        .arg(&sheet)
        .assert()
        .success();
    cli(&root)?
        .args(["attach", "2N3904", "--spice-model"])
        .arg(&model)
        .assert()
        .success();
    assert_eq!(fs::read(root.join("components/2N3904/datasheet.pdf"))?, b"%PDF");
    assert!(root.join("components/2N3904/model.mod").is_file());

    cli(&root)?
        .args(["attach", "2N3904"])
        .assert()
        .failure();
    Ok(())
}

#[test]
fn config_file_supplies_workspace_and_layout() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let root = dir.path().join("ws");
    let config = dir.path().join("partcat.json");
    fs::write(
        &config,
        serde_json::json!({
            "workspace": root,
            "layout": { "components_dir": "parts" }
        })
        .to_string(),
    )?;

    Command::cargo_bin("partcat-cli")?
        .env_remove("PARTCAT_WORKSPACE")
        .arg("--config")
        .arg(&config)
        .args(["init"])
        .arg(&root)
        .assert()
        .success();
    Command::cargo_bin("partcat-cli")?
        .env_remove("PARTCAT_WORKSPACE")
        .env("PARTCAT_CONFIG", &config)
        .args(["new", "U1", "--property", "Category=ICs"])
        .assert()
        .success();
    assert!(root.join("parts/U1/MANIFEST").is_file());
    Ok(())
}

#[test]
fn missing_workspace_is_reported() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    cli(&dir.path().join("nowhere"))?
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("open workspace"));
    Ok(())
}
