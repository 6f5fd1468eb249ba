use clap::{Parser, Subcommand};
use galleria_core::{naming, normalize, CoreConfig, DESCRIPTION_PROMPT};
use galleria_storage::guess_content_type;
use galleria_server::server::gemini_options;
use galleria_vision::{GeminiClient, VisionClient};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "galleria")]
#[command(about = "A photo gallery that captions uploads with a vision model")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the gallery server
    Serve {
        /// Server host address
        #[arg(long)]
        host: Option<String>,

        /// Server port
        #[arg(long)]
        port: Option<u16>,

        /// Directory for the local storage backend
        #[arg(long)]
        storage_path: Option<PathBuf>,
    },
    /// Describe a local image and print the record as JSON
    Describe {
        /// Image file to describe
        image: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref())?;
    config.apply_env_fallbacks(|key| std::env::var(key).ok());

    init_tracing(cli.debug || config.server.debug);

    match cli.command {
        Commands::Serve {
            host,
            port,
            storage_path,
        } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(path) = storage_path {
                config.storage.local.base_path = path;
            }
            serve_command(config).await?;
        }
        Commands::Describe { image } => {
            describe_command(config, &image).await?;
        }
    }

    Ok(())
}

fn init_tracing(debug: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_config(config_path: Option<&Path>) -> Result<CoreConfig, ConfigError> {
    use figment::{
        providers::{Env, Format, Toml},
        Figment,
    };

    let mut figment = Figment::new();

    if let Some(path) = config_path {
        figment = figment.merge(Toml::file(path));
    } else {
        figment = figment
            .merge(Toml::file("galleria.toml"))
            .merge(Toml::file("config/galleria.toml"));
    }

    // GALLERIA_SERVER__PORT -> server.port
    figment = figment.merge(Env::prefixed("GALLERIA_").split("__"));

    figment.extract().map_err(ConfigError::Figment)
}

async fn serve_command(config: CoreConfig) -> Result<(), GalleriaError> {
    info!(
        "Starting Galleria on {}:{}",
        config.server.host, config.server.port
    );
    if config.vision.api_key.is_none() {
        warn!("GEMINI_API_KEY is not set; every upload will get an error description");
    }

    let server = galleria_server::Server::new(config).await?;
    server.serve().await?;

    Ok(())
}

async fn describe_command(config: CoreConfig, image: &Path) -> Result<(), GalleriaError> {
    let filename = image
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default();
    naming::validate_image_filename(filename)?;

    let data = tokio::fs::read(image).await?;
    let mime_type = guess_content_type(filename);
    info!("Describing {} ({} bytes, {})", image.display(), data.len(), mime_type);

    let client = GeminiClient::new(gemini_options(&config.vision))
        .map_err(|e| galleria_core::CoreError::configuration(e.to_string()))?;

    let record = normalize(client.generate(&data, mime_type, DESCRIPTION_PROMPT).await);
    let json = serde_json::to_string_pretty(&record)
        .map_err(galleria_core::CoreError::from)?;
    println!("{}", json);

    Ok(())
}

// Error types
#[derive(Debug, thiserror::Error)]
pub enum GalleriaError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Core error: {0}")]
    Core(#[from] galleria_core::CoreError),
    #[error("Server error: {0}")]
    Server(#[from] galleria_server::ServerError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Figment error: {0}")]
    Figment(#[from] figment::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;
    use galleria_core::config::{ImageDisposition, StorageBackend};

    #[test]
    fn test_defaults_without_any_source() {
        Jail::expect_with(|_jail| {
            let config = load_config(None).map_err(|e| e.to_string())?;
            assert_eq!(config.server.port, 8080);
            assert_eq!(config.storage.backend, StorageBackend::Local);
            Ok(())
        });
    }

    #[test]
    fn test_file_then_env_precedence() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "galleria.toml",
                r#"
                [server]
                port = 3000
                image_disposition = "inline"

                [storage]
                backend = "memory"
                "#,
            )?;
            jail.set_env("GALLERIA_SERVER__PORT", "4000");
            jail.set_env("GALLERIA_VISION__MODEL", "gemini-1.5-pro");

            let config = load_config(None).map_err(|e| e.to_string())?;
            assert_eq!(config.server.port, 4000);
            assert_eq!(config.server.image_disposition, ImageDisposition::Inline);
            assert_eq!(config.storage.backend, StorageBackend::Memory);
            assert_eq!(config.vision.model, "gemini-1.5-pro");
            Ok(())
        });
    }

    #[test]
    fn test_explicit_config_path() {
        Jail::expect_with(|jail| {
            jail.create_file("galleria.toml", "[server]\nport = 1111\n")?;
            jail.create_file("custom.toml", "[server]\nport = 2222\n")?;

            let config = load_config(Some(Path::new("custom.toml"))).map_err(|e| e.to_string())?;
            assert_eq!(config.server.port, 2222);
            Ok(())
        });
    }

    #[test]
    fn test_cli_parses_serve_overrides() {
        let cli = Cli::try_parse_from([
            "galleria",
            "--debug",
            "serve",
            "--port",
            "9000",
            "--storage-path",
            "/tmp/photos",
        ])
        .unwrap();

        assert!(cli.debug);
        match cli.command {
            Commands::Serve {
                host,
                port,
                storage_path,
            } => {
                assert_eq!(host, None);
                assert_eq!(port, Some(9000));
                assert_eq!(storage_path, Some(PathBuf::from("/tmp/photos")));
            }
            Commands::Describe { .. } => panic!("expected serve"),
        }
    }
}
