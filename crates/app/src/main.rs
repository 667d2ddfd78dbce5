mod logging;

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dioxus::LaunchBuilder;
use dioxus::desktop::{Config as DesktopConfig, WindowBuilder};
use services::{AppServices, Clock, FolderScanner, LibraryService};
use ui::{App, UiApp, build_app_context};

const DATA_ENV: &str = "COURSE_TRACKER_DATA";
const APP_DIR: &str = "course-tracker";
const STATE_FILE: &str = "library.json";

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    MissingFolder,
    EmptyPath { flag: &'static str },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::MissingFolder => write!(f, "scan requires a folder"),
            ArgsError::EmptyPath { flag } => write!(f, "{flag} cannot be empty"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

struct DesktopApp {
    services: AppServices,
}

impl UiApp for DesktopApp {
    fn library(&self) -> Arc<LibraryService> {
        self.services.library()
    }

    fn startup_warning(&self) -> Option<String> {
        self.services.startup_warning().map(|warning| warning.message())
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  app [ui] [--data <path>]   open the course library");
    eprintln!("  app scan <folder>          list the lessons a folder would yield");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --data <platform data dir>/{APP_DIR}/{STATE_FILE}, else ./{STATE_FILE}");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  {DATA_ENV}, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Ui,
    Scan,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "ui" => Some(Self::Ui),
            "scan" => Some(Self::Scan),
            _ => None,
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
struct UiArgs {
    data: Option<PathBuf>,
}

impl UiArgs {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut data = None;
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--data" => {
                    let value = require_value(args, "--data")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::EmptyPath { flag: "--data" });
                    }
                    data = Some(PathBuf::from(value));
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }
        Ok(Self { data })
    }
}

#[derive(Debug, PartialEq, Eq)]
struct ScanArgs {
    folder: PathBuf,
}

impl ScanArgs {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut folder = None;
        for arg in args {
            match arg.as_str() {
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ if arg.starts_with("--") || folder.is_some() => {
                    return Err(ArgsError::UnknownArg(arg));
                }
                _ => folder = Some(PathBuf::from(arg)),
            }
        }
        folder
            .map(|folder| Self { folder })
            .ok_or(ArgsError::MissingFolder)
    }
}

/// `--data` wins over the environment, which wins over the platform data dir.
fn resolve_data_path(
    flag: Option<PathBuf>,
    env: Option<OsString>,
    data_dir: Option<PathBuf>,
) -> PathBuf {
    if let Some(path) = flag {
        return path;
    }
    if let Some(value) = env.filter(|value| !value.is_empty()) {
        return PathBuf::from(value);
    }
    data_dir.map_or_else(
        || PathBuf::from(STATE_FILE),
        |dir| dir.join(APP_DIR).join(STATE_FILE),
    )
}

fn run_scan(folder: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let scan = FolderScanner::default().open(folder)?;
    let sections = scan.sections();
    let mut total = 0;
    for section in &sections {
        println!("[{}]", section.name().unwrap_or("."));
        for lesson in section.lessons() {
            println!("  {}", lesson.path());
            total += 1;
        }
    }
    println!("{total} lessons in {} sections", sections.len());
    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    // No subcommand launches the UI.
    let cmd = match argv.first().map(String::as_str) {
        None => Command::Ui,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Ui,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };
    if !argv.is_empty() && !argv[0].starts_with("--") {
        argv.remove(0);
    }

    logging::init()?;
    let mut iter = argv.into_iter();

    match cmd {
        Command::Scan => {
            let parsed = ScanArgs::parse(&mut iter).inspect_err(|e| {
                eprintln!("{e}");
                print_usage();
            })?;
            run_scan(&parsed.folder)
        }
        Command::Ui => {
            let parsed = UiArgs::parse(&mut iter).inspect_err(|e| {
                eprintln!("{e}");
                print_usage();
            })?;
            let data_path =
                resolve_data_path(parsed.data, std::env::var_os(DATA_ENV), dirs::data_dir());
            tracing::info!(path = %data_path.display(), "using progress file");

            let services = AppServices::new_json(&data_path, Clock::system()).await?;
            let app: Arc<dyn UiApp> = Arc::new(DesktopApp { services });
            let context = build_app_context(&app);

            let desktop_cfg = DesktopConfig::new().with_window(
                WindowBuilder::new()
                    .with_title("CourseTracker")
                    .with_always_on_top(false),
            );

            LaunchBuilder::desktop()
                .with_cfg(desktop_cfg)
                .with_context(context)
                .launch(App);
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
