use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use annotate_core::Clock;
use dioxus::LaunchBuilder;
use dioxus::desktop::{Config as DesktopConfig, WindowBuilder};
use services::{
    AppServices, FileDatasetSource, ProgressService, RemoteSyncService, SessionWorkflow,
};
use storage::repository::Storage;
use tracing::info;
use ui::{App, UiApp, build_app_context};

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
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
    export_dir: PathBuf,
}

impl UiApp for DesktopApp {
    fn workflow(&self) -> Arc<SessionWorkflow> {
        self.services.workflow()
    }

    fn progress(&self) -> Arc<ProgressService> {
        self.services.progress()
    }

    fn sync(&self) -> Arc<RemoteSyncService> {
        self.services.sync()
    }

    fn export_dir(&self) -> PathBuf {
        self.export_dir.clone()
    }
}

struct Args {
    db_url: String,
    dataset_dir: PathBuf,
    export_dir: PathBuf,
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- [--db <sqlite_url>] [--dataset-dir <path>] [--export-dir <path>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite:annotate.sqlite3");
    eprintln!("  --dataset-dir datasets");
    eprintln!("  --export-dir exports");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  ANNOTATE_DB_URL, ANNOTATE_DATASET_DIR, ANNOTATE_EXPORT_DIR, ANNOTATE_SYNC_BASE_URL");
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("ANNOTATE_DB_URL")
            .ok()
            .map_or_else(|| "sqlite://annotate.sqlite3".into(), normalize_sqlite_url);
        let mut dataset_dir = std::env::var("ANNOTATE_DATASET_DIR")
            .ok()
            .map_or_else(|| PathBuf::from("datasets"), PathBuf::from);
        let mut export_dir = std::env::var("ANNOTATE_EXPORT_DIR")
            .ok()
            .map_or_else(|| PathBuf::from("exports"), PathBuf::from);

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--dataset-dir" => {
                    dataset_dir = PathBuf::from(require_value(args, "--dataset-dir")?);
                }
                "--export-dir" => {
                    export_dir = PathBuf::from(require_value(args, "--export-dir")?);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            dataset_dir,
            export_dir,
        })
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1);
    let parsed = Args::parse(&mut argv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    // Open + migrate SQLite at startup. Keep this in the binary glue so
    // core/services stay pure.
    prepare_sqlite_file(&parsed.db_url)?;
    let storage = Storage::sqlite(&parsed.db_url).await?;
    let dataset = Arc::new(FileDatasetSource::new(parsed.dataset_dir.clone()));
    let services = AppServices::from_storage(&storage, Clock::default_clock(), dataset);

    info!(
        db = %parsed.db_url,
        dataset_dir = %parsed.dataset_dir.display(),
        sync_enabled = services.sync().enabled(),
        "annotation workbench starting"
    );

    let app = DesktopApp {
        services,
        export_dir: parsed.export_dir,
    };
    let app: Arc<dyn UiApp> = Arc::new(app);
    let context = build_app_context(&app);

    let desktop_cfg = DesktopConfig::new().with_window(
        WindowBuilder::new()
            .with_title("Annotation Workbench")
            .with_always_on_top(false),
    );

    LaunchBuilder::desktop()
        .with_cfg(desktop_cfg)
        .with_context(context)
        .launch(App);
    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
