//! These structs provide the CLI interface for the finanzas CLI.

use clap::{Parser, Subcommand};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing_subscriber::filter::LevelFilter;

/// finanzas: A JSON API for the personal finance records kept in a Google sheet.
///
/// The sheet holds income and expenses, credit card installments, account balances, savings goals
/// and investments. This program serves them to a client app over HTTP, reading the sheet on every
/// request and writing changes straight back to it.
///
/// Access to Google is through an OAuth access token that you obtain separately and keep in
/// $FINANZAS_HOME/.secrets/token.json.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the data directory and the configuration file.
    ///
    /// This is the first command you should run. You need the URL of your Google sheet, and
    /// optionally a token file which will be moved into the secrets directory.
    Init(InitArgs),
    /// Run the HTTP API.
    Serve(ServeArgs),
    /// Run a single query request (test, getData) and print the response.
    Get(GetArgs),
    /// Run a single command request (sync, addMovimiento, addTarjeta) from a JSON file and print
    /// the response.
    Post(PostArgs),
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where configuration and secrets are held. Defaults to ~/finanzas
    #[arg(long, env = "FINANZAS_HOME", default_value_t = default_finanzas_home())]
    finanzas_home: DisplayPath,
}

impl Common {
    pub fn new(log_level: LevelFilter, finanzas_home: PathBuf) -> Self {
        Self {
            log_level,
            finanzas_home: finanzas_home.into(),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn finanzas_home(&self) -> &DisplayPath {
        &self.finanzas_home
    }
}

/// Args for the `finanzas init` command.
#[derive(Debug, Parser, Clone)]
pub struct InitArgs {
    /// The URL to your Google sheet. It looks like this:
    /// https://docs.google.com/spreadsheets/d/1a7Km9FxQwRbPt82JvN4LzYpH5OcGnWsT6iDuE3VhMjX/edit
    #[arg(long)]
    sheet_url: String,

    /// A token file holding an OAuth access token for the Sheets API. It will be moved to the
    /// default secrets location in the data directory.
    #[arg(long)]
    token_file: Option<PathBuf>,

    /// The address the API will listen on, e.g. 0.0.0.0:8787
    #[arg(long)]
    listen: Option<String>,
}

impl InitArgs {
    pub fn new(
        sheet_url: impl Into<String>,
        token_file: Option<PathBuf>,
        listen: Option<String>,
    ) -> Self {
        Self {
            sheet_url: sheet_url.into(),
            token_file,
            listen,
        }
    }

    pub fn sheet_url(&self) -> &str {
        &self.sheet_url
    }

    pub fn token_file(&self) -> Option<&Path> {
        self.token_file.as_deref()
    }

    pub fn listen(&self) -> Option<&str> {
        self.listen.as_deref()
    }
}

/// Args for the `finanzas serve` command.
#[derive(Debug, Parser, Clone, Default)]
pub struct ServeArgs {
    /// The address to listen on. Overrides listen_addr from the config file.
    #[arg(long)]
    listen: Option<String>,
}

impl ServeArgs {
    pub fn new(listen: Option<String>) -> Self {
        Self { listen }
    }

    pub fn listen(&self) -> Option<&str> {
        self.listen.as_deref()
    }
}

/// Args for the `finanzas get` command.
#[derive(Debug, Parser, Clone, Default)]
pub struct GetArgs {
    /// The query action: test or getData. Defaults to test.
    #[arg(long)]
    action: Option<String>,
}

impl GetArgs {
    pub fn new(action: Option<String>) -> Self {
        Self { action }
    }

    pub fn action(&self) -> Option<&str> {
        self.action.as_deref()
    }
}

/// Args for the `finanzas post` command.
#[derive(Debug, Parser, Clone)]
pub struct PostArgs {
    /// A file holding the JSON request body, e.g. {"action": "addMovimiento", "item": {...}}
    #[arg(long)]
    file: PathBuf,
}

impl PostArgs {
    pub fn new(file: impl Into<PathBuf>) -> Self {
        Self { file: file.into() }
    }

    pub fn file(&self) -> &Path {
        &self.file
    }
}

fn default_finanzas_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("finanzas"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --finanzas-home or FINANZAS_HOME instead of relying on the \
                default home directory. If you continue using the program right now, you may have \
                problems!",
            );
            PathBuf::from("finanzas")
        }
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn path(&self) -> &Path {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_serve() {
        let args = Args::try_parse_from([
            "finanzas",
            "--finanzas-home",
            "/tmp/f",
            "--log-level",
            "debug",
            "serve",
            "--listen",
            "0.0.0.0:9000",
        ])
        .unwrap();
        assert_eq!(args.common().finanzas_home().path(), Path::new("/tmp/f"));
        assert_eq!(args.common().log_level(), LevelFilter::DEBUG);
        let Command::Serve(serve) = args.command() else {
            panic!("expected serve");
        };
        assert_eq!(serve.listen(), Some("0.0.0.0:9000"));
    }

    #[test]
    fn test_parse_init_requires_url() {
        assert!(Args::try_parse_from(["finanzas", "init"]).is_err());
        let args = Args::try_parse_from([
            "finanzas",
            "init",
            "--sheet-url",
            "https://docs.google.com/spreadsheets/d/abc/edit",
        ])
        .unwrap();
        let Command::Init(init) = args.command() else {
            panic!("expected init");
        };
        assert!(init.token_file().is_none());
        assert_eq!(args.common().log_level(), LevelFilter::INFO);
    }
}
