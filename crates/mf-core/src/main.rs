//! mf-core - frames monkey test bundles.
//!
//! Reads a test bundle, wraps every test script in the setup/teardown
//! boilerplate for the app packaged next to it, and writes a new bundle.

use clap::{Args, Parser, Subcommand};
use mf_bundle::{transform_file, BundleLayout, TransformReport};
use mf_core::config::{load_settings, ConfigOptions, Settings, SettingsOverrides};
use mf_core::exit_codes::ExitCode;
use mf_core::logging::{generate_run_id, init_logging, LogConfig, LogFormat, LogLevel};
use mf_core::output::{OutputFormat, OUTPUT_SCHEMA_VERSION};
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

/// Frame monkey test scripts with app setup/teardown boilerplate
#[derive(Parser)]
#[command(name = "mf-core")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Global options available to all commands
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Settings file (TOML)
    #[arg(long, global = true, env = "MF_CONFIG")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "json")]
    format: OutputFormat,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Log format on stderr
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,

    /// Omit timestamps from human-readable log lines
    #[arg(long, global = true)]
    no_timestamps: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Frame every test in a bundle and write a new bundle
    Frame(FrameArgs),

    /// Show how a bundle would be grouped, without writing anything
    Inspect(InspectArgs),

    /// Print version information
    Version,
}

/// Overrides for the bundle layout settings
#[derive(Args, Debug)]
struct LayoutArgs {
    /// Extension of test scripts [default: .monkey]
    #[arg(long)]
    script_ext: Option<String>,

    /// Extension of app packages [default: .pbw]
    #[arg(long)]
    package_ext: Option<String>,

    /// Descriptor member inside each package [default: appinfo.json]
    #[arg(long)]
    descriptor: Option<String>,
}

#[derive(Args, Debug)]
struct FrameArgs {
    /// Input test bundle
    input: PathBuf,

    /// Output test bundle (created or overwritten)
    output: PathBuf,

    /// Reject app names and ids containing quotes or line breaks
    #[arg(long)]
    strict: bool,

    #[command(flatten)]
    layout: LayoutArgs,
}

#[derive(Args, Debug)]
struct InspectArgs {
    /// Input test bundle
    input: PathBuf,

    #[command(flatten)]
    layout: LayoutArgs,
}

fn main() {
    let cli = Cli::parse();

    let cli_level = if cli.global.quiet {
        Some(LogLevel::Error)
    } else {
        match cli.global.verbose {
            0 => None,
            1 => Some(LogLevel::Debug),
            _ => Some(LogLevel::Trace),
        }
    };
    init_logging(
        &LogConfig::from_env(cli_level, cli.global.log_format)
            .with_timestamps(!cli.global.no_timestamps),
    );

    let run_id = generate_run_id();
    let span = tracing::info_span!("mf", run_id = %run_id);
    let _guard = span.enter();

    let exit_code = match &cli.command {
        Commands::Frame(args) => run_frame(&cli.global, args),
        Commands::Inspect(args) => run_inspect(&cli.global, args),
        Commands::Version => {
            print_version(&cli.global);
            ExitCode::Clean
        }
    };

    debug!(exit_code = %exit_code, "Exiting");
    std::process::exit(exit_code.as_i32());
}

// ============================================================================
// Command implementations
// ============================================================================

fn run_frame(global: &GlobalOpts, args: &FrameArgs) -> ExitCode {
    let settings = match resolve_settings(global, &args.layout, args.strict) {
        Ok(settings) => settings,
        Err(code) => return code,
    };

    if let Err(code) = check_input(global, "frame", &args.input) {
        return code;
    }

    let options = settings.transform_options();
    info!(
        input = %args.input.display(),
        output = %args.output.display(),
        strict = options.strict_parameters,
        "Framing bundle"
    );

    match transform_file(&args.input, &args.output, &options) {
        Ok(report) => {
            output_frame_report(global, args, &report);
            ExitCode::Clean
        }
        Err(e) => {
            let code = ExitCode::from(&e);
            error!(error = %e, "Transform failed");
            output_error(global, "frame", code, e.kind(), &e.to_string())
        }
    }
}

fn run_inspect(global: &GlobalOpts, args: &InspectArgs) -> ExitCode {
    let settings = match resolve_settings(global, &args.layout, false) {
        Ok(settings) => settings,
        Err(code) => return code,
    };

    if let Err(code) = check_input(global, "inspect", &args.input) {
        return code;
    }

    let options = settings.transform_options();
    let layout = match BundleLayout::scan_file(&args.input, &options) {
        Ok(layout) => layout,
        Err(e) => {
            let code = ExitCode::from(&e);
            error!(error = %e, "Inspect failed");
            return output_error(global, "inspect", code, e.kind(), &e.to_string());
        }
    };

    let unpaired: Vec<&str> = layout
        .unpaired_scripts()
        .into_iter()
        .map(|s| s.path.as_str())
        .collect();
    let orphans: Vec<&str> = layout
        .orphan_packages()
        .into_iter()
        .map(|p| p.path.as_str())
        .collect();

    match global.format {
        OutputFormat::Json => {
            let groups: Vec<_> = layout
                .scripts
                .iter()
                .map(|(group, script)| {
                    json!({
                        "group": group,
                        "test_name": script.test_name,
                        "script": script.path,
                        "package": layout.packages.get(group).map(|p| p.path.as_str()),
                    })
                })
                .collect();
            print_json(&json!({
                "schema_version": OUTPUT_SCHEMA_VERSION,
                "command": "inspect",
                "input": args.input.display().to_string(),
                "groups": groups,
                "unpaired_scripts": unpaired,
                "orphan_packages": orphans,
                "passthrough": layout.passthrough_count(),
            }));
        }
        OutputFormat::Summary => {
            println!(
                "{} tests, {} without package, {} orphan packages, {} other entries",
                layout.scripts.len(),
                unpaired.len(),
                orphans.len(),
                layout.passthrough_count()
            );
        }
        OutputFormat::Exitcode => {}
    }

    if unpaired.is_empty() {
        ExitCode::Clean
    } else {
        ExitCode::BundleInvalid
    }
}

fn print_version(global: &GlobalOpts) {
    let version = env!("CARGO_PKG_VERSION");
    match global.format {
        OutputFormat::Json => print_json(&json!({
            "schema_version": OUTPUT_SCHEMA_VERSION,
            "command": "version",
            "version": version,
        })),
        OutputFormat::Summary => println!("mf-core {version}"),
        OutputFormat::Exitcode => {}
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn resolve_settings(
    global: &GlobalOpts,
    layout: &LayoutArgs,
    strict: bool,
) -> Result<Settings, ExitCode> {
    let options = ConfigOptions {
        config_path: global.config.clone(),
        ..Default::default()
    };

    let resolved = load_settings(&options).map_err(|e| {
        error!(error = %e, "Failed to load settings");
        output_error(global, "config", ExitCode::ArgsError, "config", &e.to_string())
    })?;
    debug!(source = %resolved.source, path = ?resolved.path, "Settings loaded");

    let overrides = SettingsOverrides {
        script_extension: layout.script_ext.clone(),
        package_extension: layout.package_ext.clone(),
        descriptor: layout.descriptor.clone(),
        strict,
    };
    let settings = resolved.settings.apply(&overrides);

    settings.validate().map_err(|e| {
        error!(error = %e, "Invalid settings");
        output_error(global, "config", ExitCode::ArgsError, "config", &e.to_string())
    })?;

    Ok(settings)
}

fn check_input(global: &GlobalOpts, command: &str, input: &Path) -> Result<(), ExitCode> {
    if input.is_file() {
        return Ok(());
    }
    let message = format!("input bundle not found: {}", input.display());
    error!(path = %input.display(), "Input bundle not found");
    Err(output_error(
        global,
        command,
        ExitCode::InputError,
        "input_not_found",
        &message,
    ))
}

fn output_frame_report(global: &GlobalOpts, args: &FrameArgs, report: &TransformReport) {
    match global.format {
        OutputFormat::Json => print_json(&json!({
            "schema_version": OUTPUT_SCHEMA_VERSION,
            "command": "frame",
            "input": args.input.display().to_string(),
            "output": args.output.display().to_string(),
            "entries_written": report.entries_written(),
            "report": report,
        })),
        OutputFormat::Summary => println!(
            "framed {} tests ({} entries) -> {}",
            report.framed.len(),
            report.entries_written(),
            args.output.display()
        ),
        OutputFormat::Exitcode => {}
    }
}

fn output_error(
    global: &GlobalOpts,
    command: &str,
    code: ExitCode,
    kind: &str,
    message: &str,
) -> ExitCode {
    match global.format {
        OutputFormat::Json => print_json(&json!({
            "schema_version": OUTPUT_SCHEMA_VERSION,
            "command": command,
            "error": {
                "code": code.code_name(),
                "exit_code": code.as_i32(),
                "category": code.category(),
                "kind": kind,
                "message": message,
            },
        })),
        OutputFormat::Summary => println!("[{}] {}: {}", code.code_name(), command, message),
        OutputFormat::Exitcode => {}
    }
    code
}

fn print_json(value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{text}"),
        Err(e) => error!(error = %e, "Failed to serialize output"),
    }
}
