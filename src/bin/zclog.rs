#![deny(unsafe_code)]

//! `zclog` command line tool: level control client and a demo producer.

use mimalloc::MiMalloc;

/// High-performance memory allocator for improved allocation throughput.
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

use std::ffi::OsString;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::builder::{PathBufValueParser, ValueParser};
use clap::{Arg, ArgAction, ArgMatches, Command, value_parser};
use reqwest::blocking::{Client, RequestBuilder};
use tracing_subscriber::EnvFilter;
use zclog::{CONTROL_PATH, ConfigUpdate, Logger, Mode, OverflowPolicy, Severity};

/// Environment variable holding the filter for zclog's own diagnostics.
const DIAGNOSTICS_ENV: &str = "ZCLOG_DIAGNOSTICS";

const CONTROL_TIMEOUT: Duration = Duration::from_secs(10);

fn main() -> ExitCode {
    init_diagnostics();
    let mut stdout = io::stdout().lock();
    let mut stderr = io::stderr().lock();
    run_with(std::env::args_os(), &mut stdout, &mut stderr)
}

fn init_diagnostics() {
    let filter = EnvFilter::try_from_env(DIAGNOSTICS_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

/// Builds the `clap` command used for parsing.
fn clap_command() -> Command {
    Command::new("zclog")
        .about("Embedded logging toolkit: runtime level control and a demo producer.")
        .version(env!("CARGO_PKG_VERSION"))
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("set-level")
                .about("Install a level override on a running SERVER-mode logger.")
                .arg(
                    Arg::new("addr")
                        .long("addr")
                        .value_name("HOST:PORT")
                        .help("Address of the level control listener.")
                        .default_value("127.0.0.1:9300"),
                )
                .arg(
                    Arg::new("logger")
                        .long("logger")
                        .value_name("NAME")
                        .help("Caller identity the override applies to.")
                        .required(true),
                )
                .arg(
                    Arg::new("level")
                        .long("level")
                        .value_name("LEVEL")
                        .help("Minimum severity, as a code from 1 (DEBUG) to 6 (FATAL) or a name.")
                        .value_parser(ValueParser::new(parse_severity))
                        .required(true),
                ),
        )
        .subcommand(
            Command::new("demo")
                .about("Emit records through a logger configured from the flags.")
                .arg(
                    Arg::new("dir")
                        .long("dir")
                        .value_name("DIR")
                        .help("Write log files into DIR instead of the console only.")
                        .value_parser(PathBufValueParser::new()),
                )
                .arg(
                    Arg::new("prefix")
                        .long("prefix")
                        .value_name("PREFIX")
                        .help("Log file name prefix."),
                )
                .arg(
                    Arg::new("server")
                        .long("server")
                        .help("Deliver through the queue and drain loop (SERVER mode).")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("block")
                        .long("block")
                        .help("Wait for queue space instead of discarding records.")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("quiet")
                        .long("quiet")
                        .help("Do not mirror file output to the console.")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("count")
                        .long("count")
                        .value_name("N")
                        .help("Number of records to emit.")
                        .value_parser(value_parser!(u64))
                        .default_value("10"),
                ),
        )
}

fn parse_severity(text: &str) -> Result<Severity, String> {
    text.parse::<Severity>().map_err(|error| error.to_string())
}

fn run_with<I, T>(args: I, stdout: &mut impl Write, stderr: &mut impl Write) -> ExitCode
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let matches = match clap_command().try_get_matches_from(args) {
        Ok(matches) => matches,
        Err(error) => {
            let rendered = error.render();
            return if error.use_stderr() {
                let _ = write!(stderr, "{rendered}");
                ExitCode::from(2)
            } else {
                let _ = write!(stdout, "{rendered}");
                ExitCode::SUCCESS
            };
        }
    };

    let outcome = match matches.subcommand() {
        Some(("set-level", args)) => set_level(args, stdout),
        Some(("demo", args)) => demo(args, stdout),
        _ => Err("a subcommand is required".to_owned()),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            let _ = writeln!(stderr, "zclog: {message}");
            ExitCode::FAILURE
        }
    }
}

fn set_level(args: &ArgMatches, stdout: &mut impl Write) -> Result<(), String> {
    let addr = args
        .get_one::<String>("addr")
        .map_or("127.0.0.1:9300", String::as_str);
    let logger = args
        .get_one::<String>("logger")
        .ok_or("missing --logger")?;
    let level = *args
        .get_one::<Severity>("level")
        .ok_or("missing --level")?;

    let (status, body) = send_control_request(addr, logger, level)
        .map_err(|error| format!("control request to {addr} failed: {error}"))?;
    if status != 200 {
        return Err(format!("{status} {body}"));
    }
    writeln!(stdout, "{body}").map_err(|error| error.to_string())
}

fn send_control_request(addr: &str, logger: &str, level: Severity) -> reqwest::Result<(u16, String)> {
    let client = Client::builder().timeout(CONTROL_TIMEOUT).build()?;
    let response = control_request(&client, addr, logger, level).send()?;
    let status = response.status().as_u16();
    Ok((status, response.text()?))
}

/// `GET` on the control path with the `logger` and `level` query parameters.
fn control_request(client: &Client, addr: &str, logger: &str, level: Severity) -> RequestBuilder {
    let code = level.code().to_string();
    client
        .get(format!("http://{addr}{CONTROL_PATH}"))
        .query(&[("logger", logger), ("level", code.as_str())])
}

fn demo(args: &ArgMatches, stdout: &mut impl Write) -> Result<(), String> {
    let count = args.get_one::<u64>("count").copied().unwrap_or(10);

    let mut update = ConfigUpdate::new()
        .global_level(Severity::Debug)
        .disable_control_listener(true);
    if let Some(dir) = args.get_one::<PathBuf>("dir") {
        update = update.dir(dir);
    }
    if let Some(prefix) = args.get_one::<String>("prefix") {
        update = update.prefix(prefix);
    }
    if args.get_flag("server") {
        update = update.mode(Mode::Server);
    }
    if args.get_flag("block") {
        update = update.overflow_policy(OverflowPolicy::Block);
    }
    if args.get_flag("quiet") {
        update = update.suppress_console(true);
    }

    let logger = Logger::new();
    logger.configure(update).map_err(|error| error.to_string())?;

    for index in 0..count {
        let severity = match index % 4 {
            0 => Severity::Debug,
            1 => Severity::Info,
            2 => Severity::Warning,
            _ => Severity::Error,
        };
        zclog::log!(logger, severity, "demo record {} of {}", index + 1, count);
    }
    logger.shutdown().map_err(|error| error.to_string())?;

    let stats = logger.stats();
    writeln!(
        stdout,
        "zclog demo: mode {}, {} written, {} dropped",
        logger.mode(),
        stats.written,
        stats.dropped
    )
    .map_err(|error| error.to_string())
}
