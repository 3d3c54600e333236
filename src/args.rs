//! These structs provide the CLI interface for the kasa CLI.

use crate::filter::Filter;
use crate::model::{Amount, NewTransaction, TransactionId, TransactionType};
use crate::report::OutputFormat;
use crate::session::Credentials;
use crate::stats::CategorySortOrder;
use clap::{Parser, Subcommand};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing_subscriber::filter::LevelFilter;

/// The API that `kasa init` points at unless told otherwise.
pub const DEFAULT_API_URL: &str = "https://esnaf-takip-backend.onrender.com";

/// kasa: A cash book for small shops.
///
/// Records income and expenses against an online ledger and shows where the money goes: total
/// income, total expense, the balance, and a bar per category.
///
/// Start with `kasa init`, then `kasa register` and `kasa login`. Set KASA_IN_TEST_MODE to try
/// everything against a built-in demo account (demo@kasa.test / demo) without a server.
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
    /// Create the data directory and initialize the configuration file.
    ///
    /// This is the first command you should run. By default the data directory is $HOME/kasa,
    /// pass --kasa-home or set KASA_HOME to put it somewhere else.
    Init(InitArgs),
    /// Create an account with the ledger API. This does not sign you in.
    Register(CredentialArgs),
    /// Sign in and keep the session in the data directory.
    Login(CredentialArgs),
    /// Forget the saved session.
    Logout,
    /// Show total income, total expense, the balance and a bar per category.
    Dashboard(DashboardArgs),
    /// List transactions, most recent first.
    List(ListArgs),
    /// Record a new transaction, then show the updated balance.
    Add(AddArgs),
    /// Delete a transaction by its id, then show the updated balance. Asks first unless --yes is
    /// given.
    Delete(DeleteArgs),
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

    /// The directory where kasa configuration and the session are held. Defaults to ~/kasa
    #[arg(long, env = "KASA_HOME", default_value_t = default_kasa_home())]
    kasa_home: DisplayPath,
}

impl Common {
    pub fn new(log_level: LevelFilter, kasa_home: PathBuf) -> Self {
        Self {
            log_level,
            kasa_home: kasa_home.into(),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn kasa_home(&self) -> &DisplayPath {
        &self.kasa_home
    }
}

/// (Not shown): Args for the `kasa init` command.
#[derive(Debug, Parser, Clone)]
pub struct InitArgs {
    /// The base URL of the ledger API.
    #[arg(long, default_value = DEFAULT_API_URL)]
    api_url: String,
}

impl InitArgs {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }
}

/// (Not shown): Args for the `kasa register` and `kasa login` commands.
#[derive(Parser, Clone)]
pub struct CredentialArgs {
    /// The email address of the account.
    #[arg(long)]
    email: String,

    /// The account password.
    #[arg(long, env = "KASA_PASSWORD", hide_env_values = true)]
    password: String,
}

impl CredentialArgs {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    pub fn credentials(&self) -> Credentials {
        Credentials::new(&self.email, &self.password)
    }
}

impl std::fmt::Debug for CredentialArgs {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialArgs")
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

/// (Not shown): Args for the `kasa dashboard` command.
#[derive(Debug, Parser, Clone)]
pub struct DashboardArgs {
    /// The order of the category bars. Defaults to the category_sort setting in config.json.
    #[arg(long)]
    sort: Option<CategorySortOrder>,

    #[arg(long, default_value_t = OutputFormat::Table)]
    format: OutputFormat,
}

impl DashboardArgs {
    pub fn new(sort: Option<CategorySortOrder>, format: OutputFormat) -> Self {
        Self { sort, format }
    }

    pub fn sort(&self) -> Option<CategorySortOrder> {
        self.sort
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }
}

/// (Not shown): Args for the `kasa list` command.
#[derive(Debug, Parser, Clone)]
pub struct ListArgs {
    /// Which transactions to show.
    #[arg(long, default_value_t = Filter::All)]
    filter: Filter,

    #[arg(long, default_value_t = OutputFormat::Table)]
    format: OutputFormat,
}

impl ListArgs {
    pub fn new(filter: Filter, format: OutputFormat) -> Self {
        Self { filter, format }
    }

    pub fn filter(&self) -> Filter {
        self.filter
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }
}

/// (Not shown): Args for the `kasa add` command.
#[derive(Debug, Parser, Clone)]
pub struct AddArgs {
    /// A short description, e.g. "Günlük satış".
    #[arg(long)]
    title: String,

    /// The amount in lira, without a sign. Thousands separators and the ₺ symbol are accepted.
    #[arg(long)]
    amount: Amount,

    /// Whether the money came in or went out.
    #[arg(long = "type")]
    r#type: TransactionType,

    /// One of the configured categories.
    #[arg(long)]
    category: String,
}

impl AddArgs {
    pub fn new(
        title: impl Into<String>,
        amount: Amount,
        r#type: TransactionType,
        category: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            amount,
            r#type,
            category: category.into(),
        }
    }

    pub fn transaction(&self) -> NewTransaction {
        NewTransaction::new(&self.title, self.amount, self.r#type, &self.category)
    }
}

/// (Not shown): Args for the `kasa delete` command.
#[derive(Debug, Parser, Clone)]
pub struct DeleteArgs {
    /// The id shown in the last column of `kasa list`.
    id: TransactionId,

    /// Delete without asking for confirmation.
    #[arg(long, short)]
    yes: bool,
}

impl DeleteArgs {
    pub fn new(id: TransactionId, yes: bool) -> Self {
        Self { id, yes }
    }

    pub fn id(&self) -> &TransactionId {
        &self.id
    }

    pub fn yes(&self) -> bool {
        self.yes
    }
}

fn default_kasa_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("kasa"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --kasa-home or KASA_HOME instead of relying on the default \
                kasa home directory. If you continue using the program right now, you may have \
                problems!",
            );
            PathBuf::from("kasa")
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
    pub fn new(path: PathBuf) -> Self {
        Self(path)
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        let mut argv = vec!["kasa", "--kasa-home", "/tmp/kasa-args-test"];
        argv.extend_from_slice(args);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_init_default_url() {
        let args = parse(&["init"]);
        let Command::Init(init) = args.command() else {
            panic!("expected init");
        };
        assert_eq!(init.api_url(), DEFAULT_API_URL);
        assert_eq!(
            args.common().kasa_home().path(),
            Path::new("/tmp/kasa-args-test")
        );
        assert_eq!(args.common().log_level(), LevelFilter::INFO);
    }

    #[test]
    fn test_add() {
        let args = parse(&[
            "add",
            "--title",
            " Günlük satış ",
            "--amount",
            "1,250.50",
            "--type",
            "income",
            "--category",
            "Ciro/Satış",
        ]);
        let Command::Add(add) = args.command() else {
            panic!("expected add");
        };
        let new = add.transaction();
        assert_eq!(new.title(), "Günlük satış");
        assert_eq!(new.amount().to_string(), "1,250.50");
        assert_eq!(new.r#type(), TransactionType::Income);
    }

    #[test]
    fn test_add_rejects_bad_amount() {
        let argv = [
            "kasa", "add", "--title", "x", "--amount", "abc", "--type", "expense", "--category",
            "Kira",
        ];
        assert!(Args::try_parse_from(argv).is_err());
    }

    #[test]
    fn test_list_and_dashboard_options() {
        let args = parse(&["list", "--filter", "expense", "--format", "csv"]);
        let Command::List(list) = args.command() else {
            panic!("expected list");
        };
        assert_eq!(list.filter(), Filter::Expense);
        assert_eq!(list.format(), OutputFormat::Csv);

        let args = parse(&["dashboard", "--sort", "descending"]);
        let Command::Dashboard(dashboard) = args.command() else {
            panic!("expected dashboard");
        };
        assert_eq!(dashboard.sort(), Some(CategorySortOrder::Descending));
        assert_eq!(dashboard.format(), OutputFormat::Table);
    }

    #[test]
    fn test_delete_and_login() {
        let args = parse(&["delete", "42"]);
        let Command::Delete(delete) = args.command() else {
            panic!("expected delete");
        };
        assert_eq!(delete.id().as_str(), "42");
        assert!(!delete.yes());

        let args = parse(&["delete", "--yes", "42"]);
        let Command::Delete(delete) = args.command() else {
            panic!("expected delete");
        };
        assert!(delete.yes());

        let args = parse(&["login", "--email", "a@b.test", "--password", "pw"]);
        let Command::Login(login) = args.command() else {
            panic!("expected login");
        };
        assert_eq!(login.credentials().email(), "a@b.test");
        assert_eq!(login.credentials().password(), "pw");
        assert!(!format!("{args:?}").contains("pw\""));
    }
}
