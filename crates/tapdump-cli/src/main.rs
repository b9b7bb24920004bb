use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use glob::glob;
use log::{LevelFilter, warn};
use serde::Serialize;
use tapdump_core::job::{
    CaptureJobRequest, LifecycleOp, ServiceInfo, WorkerSelection, WorkerStatus,
};
use tapdump_core::notify::{CompletionMessage, DEFAULT_FILE_TYPE, ToolResults};
use tapdump_core::{
    MalformedHeaderPolicy, PacketRecord, ParseOptions, PipelineError, TextLineSource, ToolConfig,
    ToolLineSource, build_report, parse_source, resolve_path,
};

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (commit ",
    env!("TAPDUMP_BUILD_COMMIT"),
    ", ",
    env!("TAPDUMP_BUILD_DATE"),
    ")"
);

#[derive(Parser, Debug)]
#[command(name = "tapdump")]
#[command(version, long_version = LONG_VERSION)]
#[command(
    about = "Turn packet-dump text (header + hex payload lines) into JSON packet records.",
    long_about = None,
    after_help = "Examples:\n  tapdump parse capture.pcap\n  tapdump parse capture.pcap -o packets.json --pretty\n  tapdump parse dump.txt --text --strict\n  tapdump job check request.json\n  tapdump job info"
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Parse a capture file (or saved dump text) into packet records.
    Parse(ParseArgs),
    /// Validate control-plane requests for capture workers.
    Job {
        #[command(subcommand)]
        command: JobCommands,
    },
}

#[derive(clap::Args, Debug)]
struct ParseArgs {
    /// Capture file to run the dump tool on (or dump text with --text)
    input: Option<PathBuf>,

    /// Input is dump text produced earlier; the dump tool is not run
    #[arg(long)]
    text: bool,

    /// Dump tool program
    #[arg(long, value_name = "PROGRAM", conflicts_with = "text")]
    tool: Option<String>,

    /// Dump tool argument placed before the path (repeatable; replaces the defaults)
    #[arg(
        long = "tool-arg",
        value_name = "ARG",
        allow_hyphen_values = true,
        conflicts_with = "text"
    )]
    tool_args: Vec<String>,

    /// Fail on lines that look like headers but do not parse
    #[arg(long)]
    strict: bool,

    /// Output path (JSON); stdout when omitted
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Pretty-print JSON output
    #[arg(long, conflicts_with = "compact")]
    pretty: bool,

    /// Compact JSON output (default)
    #[arg(long)]
    compact: bool,

    /// Emit a completion message with the records as its data, using this job id
    #[arg(long, value_name = "ID")]
    envelope: Option<String>,

    /// File type announced in the completion message
    #[arg(long, default_value = DEFAULT_FILE_TYPE, requires = "envelope")]
    file_type: String,

    /// Suppress non-error output
    #[arg(long)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum JobCommands {
    /// Validate a capture job request and print the worker command
    Check {
        /// JSON request file
        request: PathBuf,
    },
    /// Validate a worker selection for a lifecycle operation
    Select {
        /// start, stop or delete
        op: LifecycleOp,
        /// JSON request file
        request: PathBuf,
    },
    /// Print the service information payload
    Info,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Parse(args) => cmd_parse(args),
        Commands::Job { command } => match command {
            JobCommands::Check { request } => cmd_job_check(&request),
            JobCommands::Select { op, request } => cmd_job_select(op, &request),
            JobCommands::Info => cmd_job_info(),
        },
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err.message);
            if let Some(hint) = err.hint {
                eprintln!("hint: {}", hint);
            }
            ExitCode::from(2)
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

#[derive(Debug)]
struct CliError {
    message: String,
    hint: Option<String>,
}

impl CliError {
    fn new(message: impl Into<String>, hint: Option<String>) -> Self {
        Self {
            message: message.into(),
            hint,
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        CliError::new(format!("{err:#}"), None)
    }
}

fn cmd_parse(args: ParseArgs) -> Result<(), CliError> {
    let input = match resolve_path(args.input.as_slice()) {
        Ok(input) => input,
        Err(PipelineError::NoPathProvided) => {
            if !args.quiet {
                eprintln!("warning: no path provided, nothing to parse");
            }
            return Ok(());
        }
        Err(err) => return Err(CliError::new(err.to_string(), None)),
    };
    let resolved_input = resolve_input_path(&input)?;
    validate_input_file(&resolved_input)?;
    if let Some(output) = args.output.as_ref() {
        ensure_distinct_output(&resolved_input, output)?;
    }

    let tool = tool_config(&args);
    let options = ParseOptions {
        malformed_headers: if args.strict {
            MalformedHeaderPolicy::Abort
        } else {
            MalformedHeaderPolicy::Skip
        },
    };

    let parsed = if args.text {
        let source = TextLineSource::open(&resolved_input)
            .map_err(|err| CliError::new(err.to_string(), None))?;
        parse_source(source, &options)
    } else {
        let source = ToolLineSource::run(&tool, &resolved_input).map_err(|err| {
            CliError::new(
                err.to_string(),
                Some("check that the dump tool is installed, or pass --text for dump text".to_string()),
            )
        })?;
        parse_source(source, &options)
    };
    let packets = parsed.map_err(|err| match err {
        PipelineError::Dump(_) => CliError::new(
            err.to_string(),
            Some("drop --strict to skip malformed header lines".to_string()),
        ),
        other => CliError::new(other.to_string(), None),
    })?;

    let input_display = resolved_input.display().to_string();
    let packets_total = packets.len();
    let json = match args.envelope.as_deref() {
        Some(id) => {
            let message = completion_message(id, &input_display, &args.file_type, &tool, &packets)?;
            serialize(&message, args.pretty, args.compact)?
        }
        None => {
            let report = build_report(&input_display, &tool, packets);
            serialize(&report, args.pretty, args.compact)?
        }
    };

    match args.output.as_ref() {
        None => println!("{}", json),
        Some(output) => {
            if let Some(parent) = output.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent).with_context(|| {
                        format!("Failed to create output directory: {}", parent.display())
                    })?;
                }
            }
            fs::write(output, json)
                .with_context(|| format!("Failed to write output: {}", output.display()))?;
            if !args.quiet {
                eprintln!("OK: {} packets written -> {}", packets_total, output.display());
            }
        }
    }
    Ok(())
}

fn tool_config(args: &ParseArgs) -> ToolConfig {
    let mut tool = ToolConfig::default();
    if let Some(program) = args.tool.as_ref() {
        tool.program = program.clone();
    }
    if !args.tool_args.is_empty() {
        tool.args = args.tool_args.clone();
    }
    tool
}

fn completion_message(
    id: &str,
    file_path: &str,
    file_type: &str,
    tool: &ToolConfig,
    packets: &[PacketRecord],
) -> Result<CompletionMessage, CliError> {
    let data = serde_json::to_string(packets).context("JSON serialization failed")?;
    Ok(
        CompletionMessage::metadata(id, file_path, file_type, ToolResults::from(tool))
            .with_data(data),
    )
}

fn serialize<T: Serialize>(value: &T, pretty: bool, compact: bool) -> Result<String, CliError> {
    if pretty && compact {
        return Err(CliError::new(
            "cannot use --pretty and --compact together",
            Some("choose one output format".to_string()),
        ));
    }
    if pretty {
        serde_json::to_string_pretty(value)
            .context("JSON serialization failed")
            .map_err(Into::into)
    } else {
        serde_json::to_string(value)
            .context("JSON serialization failed")
            .map_err(Into::into)
    }
}

#[derive(Serialize)]
struct JobPlan<'a> {
    id: &'a str,
    nic: &'a str,
    continuous: bool,
    command: String,
    worker: WorkerStatus,
}

fn cmd_job_check(request: &Path) -> Result<(), CliError> {
    let payload = read_request(request)?;
    let job = CaptureJobRequest::from_json(&payload)
        .and_then(CaptureJobRequest::validate)
        .map_err(|err| {
            CliError::new(
                err.to_string(),
                Some("a capture job needs id, nic, interval and iters".to_string()),
            )
        })?;
    let plan = JobPlan {
        id: &job.id,
        nic: &job.nic,
        continuous: job.is_continuous(),
        command: job.worker_command(),
        worker: WorkerStatus::new(&job.id, "created", job.worker_args()),
    };
    println!("{}", serialize(&plan, false, false)?);
    Ok(())
}

fn cmd_job_select(op: LifecycleOp, request: &Path) -> Result<(), CliError> {
    let payload = read_request(request)?;
    let selection = WorkerSelection::from_json(&payload).map_err(|err| {
        CliError::new(
            err.to_string(),
            Some(r#"expected {"id": "<worker>"} or {"id": ["<worker>", ...]}"#.to_string()),
        )
    })?;
    for id in selection.ids() {
        println!("{} {}", op, id);
    }
    Ok(())
}

fn cmd_job_info() -> Result<(), CliError> {
    let info = ServiceInfo {
        version: env!("CARGO_PKG_VERSION").to_string(),
    };
    println!("{}", serialize(&info, false, false)?);
    Ok(())
}

fn read_request(request: &Path) -> Result<String, CliError> {
    fs::read_to_string(request)
        .with_context(|| format!("Failed to read request: {}", request.display()))
        .map_err(Into::into)
}

fn validate_input_file(input: &Path) -> Result<(), CliError> {
    if !input.exists() {
        return Err(CliError::new(
            format!("input file not found: {}", input.display()),
            Some("pass a capture file, or dump text with --text".to_string()),
        ));
    }
    if !input.is_file() {
        return Err(CliError::new(
            format!("input is not a file: {}", input.display()),
            Some("pass a capture file, or dump text with --text".to_string()),
        ));
    }
    Ok(())
}

fn ensure_distinct_output(input: &Path, output: &Path) -> Result<(), CliError> {
    let input_abs = fs::canonicalize(input)
        .with_context(|| format!("Failed to resolve input path: {}", input.display()))?;
    let output_dir = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::canonicalize(parent).ok(),
        _ => fs::canonicalize(".").ok(),
    };
    let (Some(output_dir), Some(file_name)) = (output_dir, output.file_name()) else {
        return Ok(());
    };
    if output_dir.join(file_name) == input_abs {
        return Err(CliError::new(
            format!("output path must differ from input: {}", output.display()),
            Some("choose a different output path".to_string()),
        ));
    }
    Ok(())
}

fn resolve_input_path(input: &Path) -> Result<PathBuf, CliError> {
    let pattern = input.to_string_lossy();
    if !is_glob_pattern(&pattern) {
        return Ok(input.to_path_buf());
    }

    let mut matches = Vec::new();
    let paths = glob(&pattern).map_err(|err| {
        CliError::new(
            format!("invalid input pattern '{}'", pattern),
            Some(format!("pattern error: {}", err.msg)),
        )
    })?;
    for entry in paths {
        match entry {
            Ok(path) if path.is_file() => matches.push(path),
            Ok(_) => {}
            Err(err) => warn!("skipping unreadable match: {}", err),
        }
    }

    if matches.is_empty() {
        return Err(CliError::new(
            format!("no files match pattern '{}'", pattern),
            Some("check the path or quote the pattern".to_string()),
        ));
    }
    if matches.len() > 1 {
        let listed = matches
            .iter()
            .take(3)
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", ");
        let more = if matches.len() > 3 { ", ..." } else { "" };
        return Err(CliError::new(
            format!(
                "multiple files match pattern '{}' ({} matches); matches: {}{}",
                pattern,
                matches.len(),
                listed,
                more
            ),
            Some("pass a single capture file, or run once per file".to_string()),
        ));
    }

    Ok(matches.remove(0))
}

fn is_glob_pattern(input: &str) -> bool {
    input.contains('*') || input.contains('?') || input.contains('[')
}
