//! Command-line interface for diagram-sync.
//!
//! Uses lexopt for minimal binary size overhead (~34KB).

use std::ffi::OsString;
use std::net::IpAddr;
use std::path::PathBuf;

/// Command-line arguments.
///
/// Everything except the flags is optional so that unset options fall
/// through to environment variables and the config file.
#[derive(Debug, Clone, Default)]
pub struct Args {
    /// Host address to bind to.
    pub host: Option<IpAddr>,
    /// Preferred port.
    pub port: Option<u16>,
    /// Extra ports to try above the preferred one.
    pub port_range: Option<u16>,
    /// Path to configuration file.
    pub config: Option<PathBuf>,
    /// Session time-to-live in seconds.
    pub ttl_secs: Option<u64>,
    /// Expiry sweep period in seconds.
    pub sweep_interval_secs: Option<u64>,
    /// Log level (error, warn, info, debug, trace).
    pub log_level: Option<String>,
    /// Show version and exit.
    pub version: bool,
    /// Show help and exit.
    pub help: bool,
}

/// Parse command-line arguments.
pub fn parse_args() -> Result<Args, ArgsError> {
    parse_args_from(std::env::args_os())
}

/// Parse arguments from an iterator (for testing).
pub fn parse_args_from<I>(args: I) -> Result<Args, ArgsError>
where
    I: IntoIterator<Item = OsString>,
{
    use lexopt::prelude::*;

    let mut result = Args::default();
    let mut parser = lexopt::Parser::from_iter(args);

    while let Some(arg) = parser.next()? {
        match arg {
            Short('h') | Long("help") => {
                result.help = true;
            }
            Short('V') | Long("version") => {
                result.version = true;
            }
            Short('H') | Long("host") => {
                result.host = Some(parse_value(&mut parser, "host")?);
            }
            Short('p') | Long("port") => {
                result.port = Some(parse_value(&mut parser, "port")?);
            }
            Long("port-range") => {
                result.port_range = Some(parse_value(&mut parser, "port-range")?);
            }
            Short('c') | Long("config") => {
                result.config = Some(parser.value()?.parse()?);
            }
            Long("ttl") => {
                result.ttl_secs = Some(parse_value(&mut parser, "ttl")?);
            }
            Long("sweep-interval") => {
                result.sweep_interval_secs = Some(parse_value(&mut parser, "sweep-interval")?);
            }
            Short('l') | Long("log-level") => {
                result.log_level = Some(parser.value()?.parse()?);
            }
            Value(val) => {
                return Err(ArgsError::UnexpectedArgument(val.to_string_lossy().into()));
            }
            _ => return Err(arg.unexpected().into()),
        }
    }

    Ok(result)
}

fn parse_value<T: std::str::FromStr>(
    parser: &mut lexopt::Parser,
    name: &'static str,
) -> Result<T, ArgsError> {
    use lexopt::ValueExt;

    let value: String = parser.value()?.parse()?;
    value
        .parse()
        .map_err(|_| ArgsError::InvalidValue(name, value))
}

/// Print help message.
pub fn print_help() {
    let version = env!("CARGO_PKG_VERSION");
    println!(
        r#"diagram-sync {version}
Versioned diagram state shared between an AI agent and a browser editor

USAGE:
    diagram-sync [OPTIONS]

OPTIONS:
    -H, --host <ADDR>           Host address to bind [default: 127.0.0.1]
    -p, --port <PORT>           Preferred port [default: 6002]
        --port-range <N>        Extra ports tried when busy [default: 18]
    -c, --config <FILE>         Path to configuration file (JSON)
        --ttl <SECS>            Evict sessions idle this long [default: 3600]
        --sweep-interval <SECS> Expiry sweep period [default: 300]
    -l, --log-level <LVL>       Log level (error, warn, info, debug, trace)
    -h, --help                  Print help
    -V, --version               Print version

ENVIRONMENT VARIABLES:
    DIAGRAM_SYNC_HOST           Host address (overrides config)
    DIAGRAM_SYNC_PORT           Preferred port (overrides config)
    DIAGRAM_SYNC_SESSION_TTL    Session TTL in seconds (overrides config)
    DIAGRAM_SYNC_LOG_LEVEL      Log level (overrides config)
    RUST_LOG                    Alternative log level setting

EXAMPLES:
    # Start with defaults (localhost:6002, falling back up to 6020)
    diagram-sync

    # Listen on all interfaces
    diagram-sync -H 0.0.0.0 -p 8080

    # Start with config file
    diagram-sync -c /etc/diagram-sync/config.json
"#
    );
}

/// Print version.
pub fn print_version() {
    println!("diagram-sync {}", env!("CARGO_PKG_VERSION"));
}

/// Argument parsing errors.
#[derive(Debug)]
pub enum ArgsError {
    /// Lexopt parsing error.
    Lexopt(lexopt::Error),
    /// Invalid argument value.
    InvalidValue(&'static str, String),
    /// Unexpected positional argument.
    UnexpectedArgument(String),
}

impl std::fmt::Display for ArgsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lexopt(e) => write!(f, "{}", e),
            Self::InvalidValue(name, value) => {
                write!(f, "invalid value for --{}: '{}'", name, value)
            }
            Self::UnexpectedArgument(arg) => {
                write!(f, "unexpected argument: '{}'", arg)
            }
        }
    }
}

impl std::error::Error for ArgsError {}

impl From<lexopt::Error> for ArgsError {
    fn from(e: lexopt::Error) -> Self {
        Self::Lexopt(e)
    }
}
