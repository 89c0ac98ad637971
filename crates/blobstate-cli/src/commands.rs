use blobstate_server::{BlobServer, ServerConfig};
use colored::Colorize;

use crate::cli::*;

pub async fn run_command(command: Command, config: ServerConfig) -> anyhow::Result<()> {
    match command {
        Command::Serve(args) => cmd_serve(args, config).await,
        Command::Config => cmd_config(&config),
    }
}

/// Apply command-line overrides on top of the loaded configuration.
pub fn apply_overrides(mut config: ServerConfig, args: &ServeArgs) -> ServerConfig {
    if let Some(host) = &args.host {
        config.host = host.clone();
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    config
}

async fn cmd_serve(args: ServeArgs, config: ServerConfig) -> anyhow::Result<()> {
    let config = apply_overrides(config, &args);
    let store = blobstate_store::open_store(config.persistent_config().as_ref())?;
    let server = BlobServer::new(config, store);
    server.serve().await?;
    Ok(())
}

fn cmd_config(config: &ServerConfig) -> anyhow::Result<()> {
    let field = |name: &str, value: &str| {
        let shown = if value.is_empty() {
            "(not set)".dimmed().to_string()
        } else {
            value.to_string()
        };
        println!("  {:<12} {}", name.bold(), shown);
    };

    println!("{} {}", "Environment:".bold(), config.env_name.to_string().yellow());
    field("listen", &config.bind_addr());
    field("log_level", &config.log_level);
    field("color", &config.color);

    match config.persistent_config() {
        None => println!("{} {}", "Store:".bold(), "ephemeral".cyan()),
        Some(db) => {
            println!("{} {}", "Store:".bold(), "persistent".cyan());
            field("address", &db.display_addr());
            field("username", db.username.as_deref().unwrap_or_default());
            // Only the path is shown; the secret stays in its file.
            field("password", &config.db_password);
            field("pool_size", &db.pool_size.to_string());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_replace_host_and_port() {
        let args = ServeArgs { host: Some("0.0.0.0".into()), port: Some(8080) };
        let config = apply_overrides(ServerConfig::default(), &args);
        assert_eq!(config.bind_addr(), "0.0.0.0:8080");
    }

    #[test]
    fn no_overrides_keep_config() {
        let args = ServeArgs { host: None, port: None };
        let config = apply_overrides(ServerConfig::default(), &args);
        assert_eq!(config, ServerConfig::default());
    }

    #[test]
    fn config_prints_for_both_backends() {
        cmd_config(&ServerConfig::default()).unwrap();
        let persistent = ServerConfig { db_host: "localhost".into(), ..ServerConfig::default() };
        cmd_config(&persistent).unwrap();
    }
}
