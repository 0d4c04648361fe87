use crate::domain::model::{Field, IpMode};
use clap::{Parser, Subcommand};

#[derive(Debug, Clone, Parser)]
#[command(name = "circuit-portal")]
#[command(about = "Look up, edit and register client network circuits")]
pub struct CliConfig {
    /// Path to TOML configuration file (defaults to the built-in demo circuits)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Look up a circuit by service number
    Search { query: String },

    /// Edit an existing circuit and commit the changes
    Edit {
        service_number: String,

        /// Field assignment, e.g. --set vlan=120
        #[arg(long = "set", value_parser = parse_assignment)]
        assignments: Vec<(Field, String)>,
    },

    /// Register a new circuit
    Register {
        #[arg(long, default_value = "single")]
        mode: IpMode,

        /// LAN address (repeatable)
        #[arg(long)]
        lan: Vec<String>,

        /// WAN address (repeatable)
        #[arg(long)]
        wan: Vec<String>,

        /// Field assignment, e.g. --set client_name="Acme"
        #[arg(long = "set", value_parser = parse_assignment)]
        assignments: Vec<(Field, String)>,
    },
}

fn parse_assignment(raw: &str) -> Result<(Field, String), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected field=value, got '{}'", raw))?;
    Ok((name.parse()?, value.to_string()))
}
