mod commands;
mod utils;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "ground")]
#[command(about = "Provision the groundwork three-stack deployment", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Synthesize the resource graph and print the batch as JSON
    Synth {
        /// Environment name (dev, prod)
        environment: Option<String>,
        /// Environment name (-e/--env flag, GROUNDWORK_ENV variable)
        #[arg(
            short = 'e',
            long = "env",
            env = "GROUNDWORK_ENV",
            conflicts_with = "environment",
            hide = true
        )]
        env_flag: Option<String>,
    },
    /// Provision the topology
    Up {
        /// Environment name (dev, prod)
        environment: Option<String>,
        /// Environment name (-e/--env flag, GROUNDWORK_ENV variable)
        #[arg(
            short = 'e',
            long = "env",
            env = "GROUNDWORK_ENV",
            conflicts_with = "environment",
            hide = true
        )]
        env_flag: Option<String>,
        /// Skip the ordered bucket-replication configuration (no AWS calls)
        #[arg(long)]
        skip_replication: bool,
    },
    /// Tear down provisioned resources (retained resources are left in place)
    Down {
        /// Environment name (dev, prod)
        environment: Option<String>,
        /// Environment name (-e/--env flag, GROUNDWORK_ENV variable)
        #[arg(
            short = 'e',
            long = "env",
            env = "GROUNDWORK_ENV",
            conflicts_with = "environment",
            hide = true
        )]
        env_flag: Option<String>,
        /// Skip the confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
    /// Validate the topology for an environment without provisioning anything
    Validate {
        /// Environment name (dev, prod)
        environment: Option<String>,
        /// Environment name (-e/--env flag, GROUNDWORK_ENV variable)
        #[arg(
            short = 'e',
            long = "env",
            env = "GROUNDWORK_ENV",
            conflicts_with = "environment",
            hide = true
        )]
        env_flag: Option<String>,
    },
    /// Print version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if matches!(cli.command, Commands::Version) {
        println!("groundwork {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let project_root = std::env::current_dir()?;

    match cli.command {
        Commands::Synth {
            environment,
            env_flag,
        } => {
            let env = utils::determine_environment(environment.or(env_flag))?;
            commands::synth::handle(env)?;
        }
        Commands::Up {
            environment,
            env_flag,
            skip_replication,
        } => {
            let env = utils::determine_environment(environment.or(env_flag))?;
            commands::up::handle(env, &project_root, skip_replication).await?;
        }
        Commands::Down {
            environment,
            env_flag,
            yes,
        } => {
            let env = utils::determine_environment(environment.or(env_flag))?;
            commands::down::handle(env, &project_root, yes).await?;
        }
        Commands::Validate {
            environment,
            env_flag,
        } => {
            let env = utils::determine_environment(environment.or(env_flag))?;
            commands::validate::handle(env)?;
        }
        Commands::Version => {
            unreachable!("Version is handled before dispatch");
        }
    }

    Ok(())
}
