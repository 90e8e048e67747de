use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use colorswap::{
    Hex, Project, ScanOptions, SelectPayload, SwapPayload, scan_colors, select_layers_by_color,
    swap_colors, undo_swap_json,
};

#[derive(Parser, Debug)]
#[command(name = "colorswap", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print every color used in the active composition as JSON.
    Scan(ScanArgs),
    /// Apply a swap payload and print the change log.
    Swap(SwapArgs),
    /// Select the layers that use any of the given colors.
    Select(SelectArgs),
    /// Revert a swap from a saved history entry.
    Undo(UndoArgs),
}

#[derive(Parser, Debug)]
struct ScanArgs {
    /// Input project JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Descend into precomposition layers.
    #[arg(long, default_value_t = false)]
    precomps: bool,

    /// Merge colors within this percentage distance (0 disables).
    #[arg(long, default_value_t = 0)]
    similar: u32,

    /// Only scan selected top-level layers.
    #[arg(long, default_value_t = false)]
    selected_only: bool,
}

#[derive(Parser, Debug)]
struct SwapArgs {
    /// Input project JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Swap payload JSON (`swaps`, `keyframeSwaps`, `includePrecomps`, `selectedOnly`).
    #[arg(long)]
    payload: PathBuf,

    /// Where to write the edited project (defaults to `--in`).
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct SelectArgs {
    /// Input project JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Comma-separated colors, e.g. `#ff0000,#00ff00`.
    #[arg(long, value_delimiter = ',', required = true)]
    colors: Vec<Hex>,

    /// Descend into precomposition layers.
    #[arg(long, default_value_t = false)]
    precomps: bool,

    /// Where to write the edited project (defaults to `--in`).
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct UndoArgs {
    /// Input project JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Undo history entry JSON, as recorded after a swap.
    #[arg(long)]
    history: PathBuf,

    /// Where to write the edited project (defaults to `--in`).
    #[arg(long)]
    out: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.cmd {
        Command::Scan(args) => cmd_scan(args),
        Command::Swap(args) => cmd_swap(args),
        Command::Select(args) => cmd_select(args),
        Command::Undo(args) => cmd_undo(args),
    }
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_env("COLORSWAP_LOG")
        .or_else(|_| tracing_subscriber::EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("colorswap=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_scan(args: ScanArgs) -> anyhow::Result<()> {
    let project = load_project(&args.in_path)?;
    let opts = ScanOptions {
        include_precomps: args.precomps,
        similarity_threshold: args.similar,
        selected_only: args.selected_only,
    };
    let catalog = scan_colors(&project, opts);
    print_json(&catalog)
}

fn cmd_swap(args: SwapArgs) -> anyhow::Result<()> {
    let mut project = load_project(&args.in_path)?;
    let payload: SwapPayload = read_json(&args.payload)?;
    let outcome = swap_colors(&mut project, &payload);
    print_json(&outcome)?;
    save_project(&project, args.out.as_deref().unwrap_or(&args.in_path))
}

fn cmd_select(args: SelectArgs) -> anyhow::Result<()> {
    let mut project = load_project(&args.in_path)?;
    let payload = SelectPayload {
        colors: args.colors,
        include_precomps: args.precomps,
    };
    let result = select_layers_by_color(&mut project, &payload);
    print_json(&result)?;
    save_project(&project, args.out.as_deref().unwrap_or(&args.in_path))
}

fn cmd_undo(args: UndoArgs) -> anyhow::Result<()> {
    let mut project = load_project(&args.in_path)?;
    let history = std::fs::read_to_string(&args.history)
        .with_context(|| format!("read '{}'", args.history.display()))?;
    let outcome = undo_swap_json(&mut project, &history);
    print_json(&outcome)?;
    if !outcome.success {
        anyhow::bail!(
            "undo failed: {}",
            outcome.message.as_deref().unwrap_or("unknown error")
        );
    }
    save_project(&project, args.out.as_deref().unwrap_or(&args.in_path))
}

fn load_project(path: &Path) -> anyhow::Result<Project> {
    let project =
        Project::from_path(path).with_context(|| format!("load project '{}'", path.display()))?;
    project
        .validate()
        .with_context(|| format!("validate project '{}'", path.display()))?;
    Ok(project)
}

fn save_project(project: &Project, path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    project
        .write_path(path)
        .with_context(|| format!("write project '{}'", path.display()))?;
    eprintln!("wrote {}", path.display());
    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let text =
        std::fs::read_to_string(path).with_context(|| format!("read '{}'", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parse '{}'", path.display()))
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    let text = serde_json::to_string_pretty(value).context("serialize result")?;
    println!("{text}");
    Ok(())
}
