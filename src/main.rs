use anyhow::Result;
use clap::{Parser, Subcommand};
use fe_waf::cli;
use fe_waf::waf::Action;

#[derive(Parser)]
#[command(name = "fe-waf")]
#[command(version = fe_waf::VERSION)]
#[command(about = "Manage edge WAF policies: IP rules, backups, restores and copies", long_about = None)]
struct Cli {
    #[command(flatten)]
    global: cli::GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Block requests from networks
    Block(cli::ips::IpsArgs),

    /// Allow requests from networks
    Allow(cli::ips::IpsArgs),

    /// Log requests from networks
    Log(cli::ips::IpsArgs),

    /// Delete custom rules by name prefix
    Delete(cli::delete::DeleteArgs),

    /// Run the actions in a TOML file
    Run(cli::run::RunArgs),

    /// Back up policies to JSON files
    Backup(cli::backup::BackupArgs),

    /// Restore policies from backups
    Restore(cli::restore::RestoreArgs),

    /// Copy rules between policies
    Copy(cli::copy::CopyArgs),

    /// List resources
    List(cli::list::ListArgs),

    /// Show resources
    Show(cli::show::ShowArgs),

    /// Configuration management
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let global = cli.global;

    match cli.command {
        Commands::Block(args) => cli::ips::run(Action::Block, args, global).await,
        Commands::Allow(args) => cli::ips::run(Action::Allow, args, global).await,
        Commands::Log(args) => cli::ips::run(Action::Log, args, global).await,
        Commands::Delete(args) => cli::delete::run(args, global).await,
        Commands::Run(args) => cli::run::run(args, global).await,
        Commands::Backup(args) => cli::backup::run(args, global).await,
        Commands::Restore(args) => cli::restore::run(args, global).await,
        Commands::Copy(args) => cli::copy::run(args, global).await,
        Commands::List(args) => cli::list::run(args, global).await,
        Commands::Show(args) => cli::show::run(args, global).await,
        Commands::Config(args) => cli::config::run(args, global).await,
    }
}
