use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "blobstate",
    about = "blobstate: named blobs over HTTP, in memory or in Redis",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// TOML file read before environment variables
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP server until a termination signal
    Serve(ServeArgs),
    /// Print the resolved configuration
    Config,
}

#[derive(Args)]
pub struct ServeArgs {
    /// Listen host, overriding HOST
    #[arg(long)]
    pub host: Option<String>,
    /// Listen port, overriding PORT
    #[arg(short, long)]
    pub port: Option<u16>,
}
