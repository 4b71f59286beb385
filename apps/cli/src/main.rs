use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use pathdock_plugins::{
    PluginId, PreferencesAction, PythonpathManager, Workbench, MOST_IMPORTANT_PAGES,
};
use pathdock_pythonpath::{
    join_pythonpath, AddOutcome, EnvSystemPath, Move, PathManagerModel, Section,
    SystemPathSource,
};
use pathdock_settings::JsonConfigStore;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "pathdock",
    about = "Manage the PYTHONPATH of pathdock workspaces",
    author,
    version
)]
struct Cli {
    /// 指定工作區根目錄；預設為目前目錄。 / Workspace root (defaults to current directory).
    #[arg(long, global = true, value_name = "PATH")]
    workspace: Option<PathBuf>,
    /// 輸出除錯記錄。 / Print debug logs to stderr.
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 管理 PYTHONPATH。 / Inspect and edit the PYTHONPATH.
    #[command(subcommand)]
    Pythonpath(PythonpathCommand),
    /// 列出外掛啟動順序。 / Print the plugin startup order.
    Plugins,
    /// 偏好設定頁面與動作。 / Preferences pages and actions.
    #[command(subcommand)]
    Preferences(PreferencesCommand),
}

#[derive(Subcommand)]
enum PythonpathCommand {
    /// 依優先順序列出路徑。 / List the paths in precedence order.
    List(ProjectArgs),
    /// 新增使用者路徑。 / Add a user path at the top of the list.
    Add(AddArgs),
    /// 移除使用者路徑。 / Remove a user path.
    Remove(PathArg),
    /// 啟用路徑。 / Enable a path.
    Enable(PathArg),
    /// 停用路徑。 / Disable a path.
    Disable(PathArg),
    /// 調整使用者路徑順序。 / Reorder a user path.
    Move(MoveArgs),
    /// 輸出 PYTHONPATH 值。 / Print the value to export as PYTHONPATH.
    Export(ExportArgs),
}

#[derive(Args)]
struct ProjectArgs {
    /// 視為已開啟的專案目錄。 / Project directory to treat as open.
    #[arg(long, value_name = "DIR")]
    project: Option<PathBuf>,
}

#[derive(Args)]
struct PathArg {
    #[arg(value_name = "DIR")]
    path: PathBuf,
}

#[derive(Args)]
struct AddArgs {
    #[arg(value_name = "DIR")]
    path: PathBuf,
    /// 新增後保持停用。 / Keep the new path disabled.
    #[arg(long)]
    inactive: bool,
}

#[derive(Args)]
struct MoveArgs {
    #[arg(value_name = "DIR")]
    path: PathBuf,
    #[arg(long, value_enum)]
    to: MoveChoice,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum MoveChoice {
    Top,
    Up,
    Down,
    Bottom,
}

impl MoveChoice {
    fn label(self) -> &'static str {
        match self {
            MoveChoice::Top => "top",
            MoveChoice::Up => "up",
            MoveChoice::Down => "down",
            MoveChoice::Bottom => "bottom",
        }
    }
}

impl From<MoveChoice> for Move {
    fn from(choice: MoveChoice) -> Self {
        match choice {
            MoveChoice::Top => Move::Top,
            MoveChoice::Up => Move::Up,
            MoveChoice::Down => Move::Down,
            MoveChoice::Bottom => Move::Bottom,
        }
    }
}

#[derive(Args)]
struct ExportArgs {
    #[command(flatten)]
    project: ProjectArgs,
    /// 捨棄目前環境中的 PYTHONPATH。 / Drop the entries of the current PYTHONPATH.
    #[arg(long)]
    clear: bool,
}

#[derive(Subcommand)]
enum PreferencesCommand {
    /// 依顯示順序列出設定頁面。 / List configuration pages in display order.
    Pages,
    /// 列出偏好設定動作。 / List the preferences actions.
    Actions,
}

type CliWorkbench = Workbench<JsonConfigStore>;

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let Cli {
        workspace,
        verbose,
        command,
    } = Cli::parse();
    if verbose {
        init_logging()?;
    }
    let workspace_root = resolve_workspace(workspace)?;
    debug!(workspace = %workspace_root.display(), "resolved workspace");
    match command {
        Commands::Pythonpath(subcommand) => execute_pythonpath_command(subcommand, &workspace_root),
        Commands::Plugins => list_plugins(&workspace_root),
        Commands::Preferences(subcommand) => {
            execute_preferences_command(subcommand, &workspace_root)
        }
    }
}

fn init_logging() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow!("failed to install logger: {err}"))
}

fn execute_pythonpath_command(command: PythonpathCommand, workspace_root: &Path) -> Result<()> {
    match command {
        PythonpathCommand::List(args) => list_pythonpath(args, workspace_root),
        PythonpathCommand::Add(args) => {
            let dir = resolve_input_path(&args.path)?;
            if !dir.is_dir() {
                bail!("'{}' is not a directory", dir.display());
            }
            let dir = path_string(&dir);
            edit_pythonpath(workspace_root, |model| {
                let message = match model.add_path(&dir, true) {
                    AddOutcome::Added => format!("Added {dir}"),
                    AddOutcome::AlreadyPresent => format!("{dir} is already listed; moved to top"),
                    AddOutcome::Rejected => {
                        bail!("'{dir}' is an interpreter package directory and cannot be added")
                    }
                };
                if args.inactive {
                    model.set_active(&dir, false)?;
                }
                Ok(message)
            })
        }
        PythonpathCommand::Remove(args) => {
            let dir = path_string(&resolve_input_path(&args.path)?);
            edit_pythonpath(workspace_root, |model| {
                model.remove_path(&dir)?;
                Ok(format!("Removed {dir}"))
            })
        }
        PythonpathCommand::Enable(args) => toggle_path(&args.path, true, workspace_root),
        PythonpathCommand::Disable(args) => toggle_path(&args.path, false, workspace_root),
        PythonpathCommand::Move(args) => {
            let dir = path_string(&resolve_input_path(&args.path)?);
            edit_pythonpath(workspace_root, |model| {
                model.move_path(&dir, args.to.into())?;
                Ok(format!("Moved {dir} to {}", args.to.label()))
            })
        }
        PythonpathCommand::Export(args) => export_pythonpath(args, workspace_root),
    }
}

fn toggle_path(path: &Path, active: bool, workspace_root: &Path) -> Result<()> {
    let dir = path_string(&resolve_input_path(path)?);
    edit_pythonpath(workspace_root, |model| {
        model.set_active(&dir, active)?;
        let verb = if active { "Enabled" } else { "Disabled" };
        Ok(format!("{verb} {dir}"))
    })
}

fn list_pythonpath(args: ProjectArgs, workspace_root: &Path) -> Result<()> {
    let mut workbench = start_workbench(workspace_root)?;
    open_project(&mut workbench, args.project.as_deref())?;

    let model = workbench.pythonpath().path_manager();
    let map = workbench.pythonpath().resolver().precedence_map();
    for (path, active) in map.iter() {
        let state = if active { "active" } else { "inactive" };
        let section = section_label(&model, path);
        println!("{state:<8} {section:<7} {path}");
    }

    workbench.shutdown()?;
    Ok(())
}

fn export_pythonpath(args: ExportArgs, workspace_root: &Path) -> Result<()> {
    let mut workbench = start_workbench(workspace_root)?;
    open_project(&mut workbench, args.project.project.as_deref())?;

    let existing = EnvSystemPath::default().system_path();
    let paths = workbench
        .pythonpath()
        .path_manager()
        .export(&existing, args.clear);
    let joined = join_pythonpath(&paths)?;
    println!("{}", joined.to_string_lossy());

    workbench.shutdown()?;
    Ok(())
}

/// Runs `edit` on a fresh path-manager model and applies the result.
fn edit_pythonpath<F>(workspace_root: &Path, edit: F) -> Result<()>
where
    F: FnOnce(&mut PathManagerModel) -> Result<String>,
{
    let mut workbench = start_workbench(workspace_root)?;
    let mut model = workbench.pythonpath().path_manager();
    let message = edit(&mut model)?;
    match model.accept() {
        Some(map) => {
            workbench.update_pythonpath(&map)?;
        }
        None => debug!("path manager left unchanged"),
    }
    workbench.shutdown()?;
    println!("{message}");
    Ok(())
}

fn list_plugins(workspace_root: &Path) -> Result<()> {
    let workbench = load_workbench(workspace_root)?;
    for (index, id) in workbench.startup_order()?.into_iter().enumerate() {
        let name = workbench.plugin_name(id).unwrap_or_default();
        println!("{}. {id} ({name})", index + 1);
    }
    Ok(())
}

fn execute_preferences_command(command: PreferencesCommand, workspace_root: &Path) -> Result<()> {
    match command {
        PreferencesCommand::Pages => {
            let mut workbench = start_workbench(workspace_root)?;
            for page in workbench.preferences().pages() {
                let marker = if MOST_IMPORTANT_PAGES.contains(&page.plugin) {
                    "*"
                } else {
                    " "
                };
                println!("{marker} {} ({})", page.title, page.plugin);
            }
            workbench.shutdown()?;
            Ok(())
        }
        PreferencesCommand::Actions => {
            for action in PreferencesAction::ALL {
                println!("{}:{}", PluginId::Preferences, action.as_str());
            }
            Ok(())
        }
    }
}

fn section_label(model: &PathManagerModel, path: &str) -> &'static str {
    match model.section_of(path) {
        Some(Section::Project) => "project",
        Some(Section::User) => "user",
        // Interpreter package directories are hidden from the model.
        Some(Section::System) | None => "system",
    }
}

fn open_project(workbench: &mut CliWorkbench, project: Option<&Path>) -> Result<()> {
    if let Some(project) = project {
        let dir = resolve_input_path(project)?;
        workbench.open_project(&path_string(&dir))?;
    }
    Ok(())
}

fn load_workbench(workspace_root: &Path) -> Result<CliWorkbench> {
    let path = config_path(workspace_root);
    let config = JsonConfigStore::load(&path)
        .with_context(|| format!("failed to load configuration from {}", path.display()))?;
    let manager = PythonpathManager::new(
        config,
        Box::new(EnvSystemPath::default()),
        Some(state_dir(workspace_root)),
    );
    Ok(Workbench::new(manager))
}

fn start_workbench(workspace_root: &Path) -> Result<CliWorkbench> {
    let mut workbench = load_workbench(workspace_root)?;
    workbench.start().context("failed to start plugins")?;
    Ok(workbench)
}

fn state_dir(workspace_root: &Path) -> PathBuf {
    workspace_root.join(".pathdock")
}

fn config_path(workspace_root: &Path) -> PathBuf {
    state_dir(workspace_root).join("config.json")
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
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
