//! MyServer Setup - one-shot web stack provisioner for Termux.

use std::env;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use tracing::{error, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use myserver_setup::config::{Environment, InstallLayout, Settings};
use myserver_setup::error::ProvisionError;
use myserver_setup::journal::{JournalReporter, JournalWriter};
use myserver_setup::pipeline::{
    default_steps, ConsoleReporter, FanoutReporter, ProvisionContext, ServerSummary, StepPipeline,
};

const VERSION: &str = env!("CARGO_PKG_VERSION");
const NAME: &str = env!("CARGO_PKG_NAME");

/// Port the stock Termux httpd.conf listens on.
const HTTP_PORT: u16 = 8080;

/// Parsed command line.
#[derive(Debug, Default)]
struct CliArgs {
    help: bool,
    version: bool,
    list_steps: bool,
    config: Option<PathBuf>,
}

impl CliArgs {
    fn parse(args: impl Iterator<Item = String>) -> Result<Self, String> {
        let mut cli = Self::default();
        let mut args = args.skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "-h" | "--help" => cli.help = true,
                "-V" | "--version" => cli.version = true,
                "--list-steps" => cli.list_steps = true,
                "-c" | "--config" => match args.next() {
                    Some(path) => cli.config = Some(PathBuf::from(path)),
                    None => return Err(format!("{} requires a path", arg)),
                },
                other => match other.strip_prefix("--config=") {
                    Some(path) => cli.config = Some(PathBuf::from(path)),
                    None => return Err(format!("unknown argument '{}'", other)),
                },
            }
        }
        Ok(cli)
    }
}

fn main() -> ExitCode {
    let cli = match CliArgs::parse(env::args()) {
        Ok(cli) => cli,
        Err(e) => {
            eprintln!("Error: {}. Try --help.", e);
            return ExitCode::FAILURE;
        }
    };

    if cli.help {
        print_help();
        return ExitCode::SUCCESS;
    }

    if cli.version {
        println!("{} {}", NAME, VERSION);
        return ExitCode::SUCCESS;
    }

    let settings = match load_settings(cli.config.as_deref()) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error loading configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = init_logging(&settings) {
        eprintln!("Error initializing logging: {}", e);
        return ExitCode::FAILURE;
    }

    info!("Starting {} v{}", NAME, VERSION);

    let layout = match InstallLayout::resolve(&settings, &Environment::capture()) {
        Ok(l) => l,
        Err(e) => {
            error!(error = %e, "Cannot resolve install layout");
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    info!(
        prefix = %layout.prefix.display(),
        document_root = %layout.document_root.display(),
        "Install layout resolved"
    );

    let pipeline = StepPipeline::new(default_steps(&settings, &layout));

    if cli.list_steps {
        for (i, step) in pipeline.steps().iter().enumerate() {
            println!("{:>2}. {}", i + 1, step.name);
        }
        return ExitCode::SUCCESS;
    }

    let mut ctx = match ProvisionContext::new(layout.clone(), &settings) {
        Ok(c) => c,
        Err(e) => {
            error!(error = %e, "Startup failed");
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut reporter = FanoutReporter::new().with(Box::new(ConsoleReporter::new(ServerSummary {
        document_root: layout.document_root.clone(),
        http_port: HTTP_PORT,
        https_port: settings.tls.listen_port,
        launcher: launcher_name(&layout),
    })));

    if settings.journal.enabled {
        let path = settings
            .journal
            .path
            .clone()
            .unwrap_or_else(|| layout.default_journal());
        match JournalWriter::open(&path) {
            Ok(writer) => {
                let journal = JournalReporter::new(writer);
                info!(path = %path.display(), run_id = %journal.run_id(), "Journal enabled");
                reporter = reporter.with(Box::new(journal));
            }
            Err(e) => warn!(error = %e, "Journal unavailable, continuing without it"),
        }
    }

    let result = pipeline.run(&mut ctx, &mut reporter);

    if result.succeeded() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Print help message.
fn print_help() {
    println!(
        r#"{} {}
Set up Apache, PHP, TLS and phpMyAdmin on Termux. Safe to run repeatedly.

USAGE:
    {} [OPTIONS]

OPTIONS:
    -c, --config <PATH>    Path to configuration file
                           [default: ~/.config/myserver/setup.toml if present]
        --list-steps       Print the provisioning steps and exit
    -h, --help             Print help information
    -V, --version          Print version information

ENVIRONMENT:
    PREFIX                 Install prefix (set by Termux)
    RUST_LOG               Overrides the configured log level
"#,
        NAME, VERSION, NAME
    );
}

/// An explicit `--config` must exist; the default location is optional.
fn load_settings(explicit: Option<&Path>) -> Result<Settings, ProvisionError> {
    if let Some(path) = explicit {
        return Settings::load(path);
    }
    match dirs::config_dir().map(|d| d.join("myserver/setup.toml")) {
        Some(path) if path.is_file() => Settings::load(path),
        _ => Ok(Settings::default()),
    }
}

fn launcher_name(layout: &InstallLayout) -> String {
    layout
        .launcher_destination()
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "myserver".to_string())
}

/// Initialize logging based on settings.
///
/// Logs go to stderr; stdout carries the progress output.
fn init_logging(settings: &Settings) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.logging.level));

    match settings.logging.format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .try_init()?;
        }
        "pretty" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().pretty().with_writer(std::io::stderr))
                .try_init()?;
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .try_init()?;
        }
    }

    Ok(())
}
