//! CLI entry point for the wholeshare rebalancer.

use std::path::PathBuf;
use std::process;

use clap::{Args, Parser, Subcommand};

use wholeshare_rebalancer::audit::AuditLog;
use wholeshare_rebalancer::broker;
use wholeshare_rebalancer::config::Config;
use wholeshare_rebalancer::error::{Error, Result};
use wholeshare_rebalancer::execution::{self, Mode, RunOptions};
use wholeshare_rebalancer::{menu, target};

#[derive(Parser)]
#[command(name = "rebalancer")]
#[command(about = "Whole-share investing and rebalancing for Schwab accounts")]
#[command(version)]
struct Cli {
    /// Path to config.toml
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Authorize with Schwab and store the token
    Login,

    /// List accounts with value and cash
    Accounts,

    /// Invest available cash without selling
    Invest(TradeArgs),

    /// Sell and buy to move toward the target allocation
    Rebalance(TradeArgs),

    /// Compare current holdings with the target allocation
    Drift {
        /// Account number, last three digits, or index from `accounts`
        #[arg(long)]
        account: String,
    },

    /// Interactive menu (default)
    Menu,
}

#[derive(Args)]
struct TradeArgs {
    /// Account number, last three digits, or index from `accounts`
    #[arg(long)]
    account: String,

    /// Show plan without submitting
    #[arg(long)]
    dry_run: bool,

    /// Skip confirmation prompt
    #[arg(long)]
    yes: bool,
}

impl TradeArgs {
    fn options(&self) -> RunOptions {
        RunOptions {
            dry_run: self.dry_run,
            yes: self.yes,
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();

    let cli = Cli::parse();

    let config = match Config::load(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {e}");
            process::exit(1);
        }
    };

    if let Err(e) = run(&config, cli.command.unwrap_or(Command::Menu)) {
        match &e {
            Error::Aborted(msg) => {
                eprintln!("{msg}");
                process::exit(0);
            }
            _ => {
                eprintln!("Error: {e}");
                process::exit(1);
            }
        }
    }
}

fn run(config: &Config, command: Command) -> Result<()> {
    if let Command::Login = command {
        let schwab = broker::connect(config)?;
        return broker::login(&schwab);
    }

    let schwab = broker::connect_logged_in(config)?;

    match command {
        // handled above
        Command::Login => Ok(()),
        Command::Accounts => execution::show_accounts(&schwab).map(|_| ()),
        Command::Invest(args) => trade(config, &schwab, Mode::Invest, &args),
        Command::Rebalance(args) => trade(config, &schwab, Mode::Rebalance, &args),
        Command::Drift { account } => {
            let targets = target::load(&config.targets_path())?;
            let account = execution::find_account(&schwab, &account)?;
            execution::run_drift(&schwab, &account, &targets).map(|_| ())
        }
        Command::Menu => {
            let targets = target::load(&config.targets_path())?;
            let mut audit = AuditLog::open(&config.audit_path())?;
            menu::run(&schwab, &targets, &mut audit)
        }
    }
}

fn trade(
    config: &Config,
    schwab: &dyn wholeshare_broker::Broker,
    mode: Mode,
    args: &TradeArgs,
) -> Result<()> {
    let targets = target::load(&config.targets_path())?;
    let account = execution::find_account(schwab, &args.account)?;
    let mut audit = AuditLog::open(&config.audit_path())?;
    execution::run(schwab, &account, &targets, mode, args.options(), &mut audit)?;
    Ok(())
}
