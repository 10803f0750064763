mod config;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{ArgGroup, Args, Parser, Subcommand};
use partcat_store::{
    sort_categories, sort_components, Component, ComponentCategory, ComponentTree, PropertyMap,
    Workspace, WorkspaceLayout,
};
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::config::CliConfig;

#[derive(Parser)]
#[command(
    name = "partcat-cli",
    about = "Manage a PartCat electronic component inventory",
    author,
    version
)]
struct Cli {
    /// 工作區根目錄；預設讀取設定檔或目前目錄。 / Workspace root (defaults to the config file, then the current directory).
    #[arg(long, global = true, value_name = "PATH", env = "PARTCAT_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// JSON 設定檔路徑。 / Path to a JSON configuration file.
    #[arg(long, global = true, value_name = "FILE", env = "PARTCAT_CONFIG")]
    config: Option<PathBuf>,

    /// 增加記錄詳細程度（可重複）。 / Increase log verbosity (repeatable).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// 僅輸出錯誤記錄。 / Only log errors.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 建立新的工作區目錄結構。 / Create the directory skeleton of a new workspace.
    Init(InitArgs),
    /// 列出零件。 / List components.
    List(ListArgs),
    /// 顯示分類樹。 / Print the category tree.
    Tree(TreeArgs),
    /// 顯示單一零件。 / Show a single component.
    Show(ShowArgs),
    /// 建立並儲存新零件。 / Create and save a new component.
    New(NewArgs),
    /// 修改既有零件。 / Edit an existing component.
    Set(SetArgs),
    /// 指定零件圖片（必要時匯入工作區）。 / Assign a component image, importing it when needed.
    Image(ImageArgs),
    /// 另存為新名稱，保留原零件。 / Save a copy under a new name, keeping the original.
    SaveAs(RenameArgs),
    /// 重新命名零件。 / Rename a component.
    Rename(RenameArgs),
    /// 刪除零件。 / Delete a component.
    Delete(NameArgs),
    /// 附加規格書或 SPICE 模型。 / Attach a datasheet or SPICE model.
    Attach(AttachArgs),
}

#[derive(Args)]
struct InitArgs {
    /// 新工作區的位置。 / Location of the new workspace.
    #[arg(value_name = "PATH")]
    path: PathBuf,
}

#[derive(Args)]
struct ListArgs {
    /// 僅列出此分類。 / Only list this category.
    #[arg(long, value_name = "NAME")]
    category: Option<String>,
    /// 以 JSON 輸出。 / Print JSON.
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct TreeArgs {
    /// 依名稱篩選（不分大小寫）。 / Keep components whose name contains TEXT (case-insensitive).
    #[arg(long, value_name = "TEXT", default_value = "")]
    filter: String,
}

#[derive(Args)]
struct ShowArgs {
    name: String,
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct NameArgs {
    name: String,
}

#[derive(Args)]
struct EditArgs {
    /// 庫存數量。 / Quantity on hand.
    #[arg(long)]
    quantity: Option<u32>,
    /// 備註文字。 / Free-text notes.
    #[arg(long)]
    notes: Option<String>,
    /// 新增或取代屬性。 / Add or replace a property.
    #[arg(long = "property", value_name = "KEY=VALUE", value_parser = parse_property)]
    properties: Vec<(String, String)>,
}

#[derive(Args)]
struct NewArgs {
    name: String,
    #[command(flatten)]
    edit: EditArgs,
}

#[derive(Args)]
struct SetArgs {
    name: String,
    #[command(flatten)]
    edit: EditArgs,
    /// 移除屬性。 / Remove a property.
    #[arg(long = "remove-property", value_name = "KEY")]
    remove: Vec<String>,
}

#[derive(Args)]
struct ImageArgs {
    name: String,
    #[arg(value_name = "FILE")]
    file: PathBuf,
}

#[derive(Args)]
struct RenameArgs {
    name: String,
    new_name: String,
}

#[derive(Args)]
#[command(group(ArgGroup::new("kind").required(true).args(["datasheet", "spice_model"])))]
struct AttachArgs {
    name: String,
    /// 規格書檔案。 / Datasheet file.
    #[arg(long, value_name = "FILE")]
    datasheet: Option<PathBuf>,
    /// SPICE 模型檔案。 / SPICE model file.
    #[arg(long, value_name = "FILE")]
    spice_model: Option<PathBuf>,
}

#[derive(Serialize)]
struct ComponentView<'a> {
    name: &'a str,
    quantity: u32,
    category: String,
    sub_category: Option<String>,
    properties: &'a PropertyMap,
    notes: Option<&'a str>,
    image: Option<&'a str>,
    image_is_default: bool,
    has_datasheet: bool,
    has_spice_model: bool,
}

impl<'a> ComponentView<'a> {
    fn new(component: &'a Component) -> Self {
        Self {
            name: component.name().unwrap_or_default(),
            quantity: component.quantity(),
            category: component.category().to_string(),
            sub_category: component.sub_category().name().map(str::to_string),
            properties: component.properties(),
            notes: component.notes(),
            image: component.image().name(),
            image_is_default: component.image().is_using_defaults(),
            has_datasheet: component.has_datasheet(),
            has_spice_model: component.has_spice_model(),
        }
    }
}

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let Cli {
        workspace,
        config,
        verbose,
        quiet,
        command,
    } = Cli::parse();

    let config = match config {
        Some(path) => CliConfig::load(&resolve_input_path(&path)?)?,
        None => CliConfig::default(),
    };
    init_tracing(config.log_filter.as_deref(), verbose, quiet);

    match command {
        Commands::Init(args) => execute_init(args, config.layout),
        Commands::List(args) => execute_list(&open_store(workspace, config)?, args),
        Commands::Tree(args) => execute_tree(&open_store(workspace, config)?, args),
        Commands::Show(args) => execute_show(&open_store(workspace, config)?, args),
        Commands::New(args) => execute_new(&open_store(workspace, config)?, args),
        Commands::Set(args) => execute_set(&mut open_store(workspace, config)?, args),
        Commands::Image(args) => execute_image(&mut open_store(workspace, config)?, args),
        Commands::SaveAs(args) => execute_save_as(&mut open_store(workspace, config)?, args),
        Commands::Rename(args) => execute_rename(&mut open_store(workspace, config)?, args),
        Commands::Delete(args) => execute_delete(&mut open_store(workspace, config)?, args),
        Commands::Attach(args) => execute_attach(&open_store(workspace, config)?, args),
    }
}

/// Opens the workspace named on the command line, in the config file, or the current directory.
fn open_store(workspace: Option<PathBuf>, config: CliConfig) -> Result<Workspace> {
    let root = resolve_workspace(workspace.or(config.workspace))?;
    debug!(root = %root.display(), "opening workspace");
    Workspace::open_with_layout(&root, config.layout)
        .with_context(|| format!("open workspace '{}'", root.display()))
}

fn init_tracing(config_filter: Option<&str>, verbose: u8, quiet: bool) {
    let fallback = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        (false, _) => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| match config_filter {
            Some(directive) => EnvFilter::try_new(directive),
            None => EnvFilter::try_new(fallback),
        })
        .unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn execute_init(args: InitArgs, layout: WorkspaceLayout) -> Result<()> {
    let root = resolve_input_path(&args.path)?;
    Workspace::create_new_with_layout(&root, layout)
        .with_context(|| format!("create workspace '{}'", root.display()))?;
    println!("Initialized workspace at {}", root.display());
    Ok(())
}

fn execute_list(store: &Workspace, args: ListArgs) -> Result<()> {
    let mut components: Vec<&Component> = match &args.category {
        Some(name) => store.components_by_category(&ComponentCategory::named(name.as_str())),
        None => store.components().collect(),
    };
    sort_components(&mut components);

    if args.json {
        let views: Vec<_> = components.into_iter().map(ComponentView::new).collect();
        println!("{}", serde_json::to_string_pretty(&views)?);
        return Ok(());
    }
    for component in components {
        println!(
            "{}\t{}\t{}",
            component.name().unwrap_or_default(),
            component.quantity(),
            component.category()
        );
    }
    Ok(())
}

fn execute_tree(store: &Workspace, args: TreeArgs) -> Result<()> {
    let mut categories = store.component_categories();
    sort_categories(&mut categories);
    let tree = store.component_tree(&args.filter);
    print_tree(&tree, &categories);
    Ok(())
}

/// Prints `tree` following the alphabetical order of `order`.
fn print_tree(tree: &ComponentTree, order: &[ComponentCategory]) {
    for category in order {
        let Some(node) = tree
            .categories
            .iter()
            .find(|node| Some(node.name.as_str()) == category.name())
        else {
            continue;
        };
        println!("{}", node.name);
        for sub in category.sub_categories() {
            let Some(sub_node) = node
                .sub_categories
                .iter()
                .find(|sub_node| Some(sub_node.name.as_str()) == sub.name())
            else {
                continue;
            };
            println!("  {}", sub_node.name);
            for name in sorted(&sub_node.components) {
                println!("    {name}");
            }
        }
        for name in sorted(&node.components) {
            println!("  {name}");
        }
    }
}

fn sorted(names: &[String]) -> Vec<&str> {
    let mut names: Vec<&str> = names.iter().map(String::as_str).collect();
    names.sort_by_key(|name| name.to_lowercase());
    names
}

fn execute_show(store: &Workspace, args: ShowArgs) -> Result<()> {
    let component = store.component(&args.name)?;
    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&ComponentView::new(component))?
        );
    } else {
        println!("{component}");
    }
    Ok(())
}

fn execute_new(store: &Workspace, args: NewArgs) -> Result<()> {
    ensure_available(store, &args.name)?;
    let mut component = Component::create(store, &args.name)?;
    apply_edits(&mut component, args.edit)?;
    component
        .save()
        .with_context(|| format!("save component '{}'", args.name))?;
    println!("Created component {}", args.name);
    Ok(())
}

fn execute_set(store: &mut Workspace, args: SetArgs) -> Result<()> {
    let component = store.component_mut(&args.name)?;
    apply_edits(component, args.edit)?;
    for key in &args.remove {
        if component.properties_mut().remove(key).is_none() {
            bail!("component '{}' has no property '{key}'", args.name);
        }
    }
    component
        .save()
        .with_context(|| format!("save component '{}'", args.name))?;
    println!("Updated component {}", args.name);
    Ok(())
}

fn apply_edits(component: &mut Component, edit: EditArgs) -> Result<()> {
    if let Some(quantity) = edit.quantity {
        component.set_quantity(quantity);
    }
    if let Some(notes) = edit.notes {
        component.set_notes(Some(notes));
    }
    for (key, value) in edit.properties {
        component.properties_mut().insert(key, value)?;
    }
    Ok(())
}

fn execute_image(store: &mut Workspace, args: ImageArgs) -> Result<()> {
    let source = resolve_input_path(&args.file)?;
    if !source.is_file() {
        bail!("image '{}' does not exist", source.display());
    }
    let component = store.component_mut(&args.name)?;
    component.set_image_path(Some(source.as_path()));
    let Some(imported) = component.image().path().map(Path::to_path_buf) else {
        bail!("failed to import image '{}'", source.display());
    };
    component
        .save()
        .with_context(|| format!("save component '{}'", args.name))?;
    println!("Image for {} set to {}", args.name, imported.display());
    Ok(())
}

fn execute_save_as(store: &mut Workspace, args: RenameArgs) -> Result<()> {
    if args.name != args.new_name {
        ensure_available(store, &args.new_name)?;
    }
    store.component_mut(&args.name)?.save_as(&args.new_name)?;
    println!("Saved {} as {}", args.name, args.new_name);
    Ok(())
}

fn execute_rename(store: &mut Workspace, args: RenameArgs) -> Result<()> {
    if args.name != args.new_name {
        ensure_available(store, &args.new_name)?;
    }
    store.component_mut(&args.name)?.rename(&args.new_name)?;
    println!("Renamed {} to {}", args.name, args.new_name);
    Ok(())
}

fn execute_delete(store: &mut Workspace, args: NameArgs) -> Result<()> {
    store
        .component_mut(&args.name)?
        .delete()
        .with_context(|| format!("delete component '{}'", args.name))?;
    println!("Deleted component {}", args.name);
    Ok(())
}

fn execute_attach(store: &Workspace, args: AttachArgs) -> Result<()> {
    let component = store.component(&args.name)?;
    let dest = match (args.datasheet, args.spice_model) {
        (Some(datasheet), _) => component.attach_datasheet(&resolve_input_path(&datasheet)?)?,
        (None, Some(model)) => component.attach_spice_model(&resolve_input_path(&model)?)?,
        (None, None) => bail!("specify --datasheet <FILE> or --spice-model <FILE>"),
    };
    println!("Attached {}", dest.display());
    Ok(())
}

fn ensure_available(store: &Workspace, name: &str) -> Result<()> {
    if store.exists(name) {
        bail!("component '{name}' already exists");
    }
    Ok(())
}

fn parse_property(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing property key in '{raw}'"));
    }
    Ok((key.to_string(), value.trim().to_string()))
}

fn resolve_workspace(workspace: Option<PathBuf>) -> Result<PathBuf> {
    match workspace {
        Some(path) => resolve_input_path(&path),
        None => std::env::current_dir().context("determine current directory"),
    }
}

fn resolve_input_path(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()
            .context("determine current directory")?
            .join(path))
    }
}
