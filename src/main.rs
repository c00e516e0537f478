use std::{net::SocketAddr, path::Path, sync::Arc};

use clap::Parser;
use color_eyre::{
    Result,
    eyre::{Context, eyre},
};
use ingress_router::{
    adapters::{HttpClientAdapter, IngressHandler, IngressServer},
    config::{ServerConfig, ServerConfigValidator, load_config, load_ingress, resolve_ingress_path},
    core::IngressSpec,
    metrics,
    ports::{http_client::HttpClient, http_server::HttpServer},
    tracing_setup,
    utils::GracefulShutdown,
};

#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    #[clap(subcommand)]
    command: Option<Commands>,

    /// Server configuration file
    #[clap(short, long, global = true, default_value = "config.yaml")]
    config: String,
}

#[derive(Parser, Debug)]
enum Commands {
    /// Start the ingress router (default)
    Serve,
    /// Validate the configuration file and the ingress manifest it points to
    Validate,
    /// Write a starter configuration and ingress manifest
    Init,
}

const DEFAULT_CONFIG: &str = r#"# Ingress router configuration

# The address to listen on
listen_addr: "127.0.0.1:8080"

# Ingress manifest, relative to this file
ingress_path: "ingress.yaml"

upstream:
  connect_timeout_secs: 5
  response_timeout_secs: 30
  pool_idle_timeout_secs: 90

logging:
  level: "info"
  json: true
"#;

const DEFAULT_INGRESS: &str = r#"apiVersion: networking.k8s.io/v1
kind: Ingress
metadata:
  name: example-ingress
spec:
  # Used when no rule matches
  # defaultBackend:
  #   service:
  #     name: fallback
  #     port:
  #       number: 8080
  rules:
    - host: foo.bar.com
      http:
        paths:
          - path: /foo
            pathType: Prefix
            backend:
              service:
                name: localhost
                port:
                  number: 3000
          - path: /bar
            pathType: Prefix
            backend:
              service:
                name: localhost
                port:
                  number: 3001
"#;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();

    match args.command.unwrap_or(Commands::Serve) {
        Commands::Validate => validate_config_command(&args.config).await,
        Commands::Init => init_config_command(&args.config).await,
        Commands::Serve => serve_command(&args.config).await,
    }
}

async fn serve_command(config_path: &str) -> Result<()> {
    let config: ServerConfig = load_config(config_path)
        .await
        .with_context(|| format!("Failed to load config from {config_path}"))?;
    ServerConfigValidator::validate(&config)
        .map_err(|e| eyre!("Invalid configuration in {config_path}:\n{e}"))?;

    tracing_setup::init_tracing(&config.logging)
        .map_err(|e| eyre!("Failed to initialize tracing: {}", e))?;
    metrics::init_metrics().map_err(|e| eyre!("Failed to initialize metrics: {}", e))?;

    let ingress_path = resolve_ingress_path(config_path, &config);
    tracing::info!("Loading ingress manifest from {}", ingress_path.display());
    let spec = load_ingress(&ingress_path).await?;
    log_routes(&spec);

    let http_client: Arc<dyn HttpClient> = Arc::new(
        HttpClientAdapter::new(&config.upstream).context("Failed to create HTTP client adapter")?,
    );
    let handler = Arc::new(IngressHandler::new(Arc::new(spec), http_client));

    let listen_addr: SocketAddr = config
        .listen_addr
        .parse()
        .context("Failed to parse listen address")?;

    let graceful_shutdown = Arc::new(GracefulShutdown::new());
    let signal_handler_shutdown = graceful_shutdown.clone();
    tokio::spawn(async move {
        if let Err(e) = signal_handler_shutdown.run_signal_handler().await {
            tracing::error!("Signal handler error: {}", e);
        }
    });

    println!("Ingress router listening on {listen_addr}");
    let server = IngressServer::new(listen_addr, handler, graceful_shutdown);
    server.run().await
}

fn log_routes(spec: &IngressSpec) {
    for rule in spec.rules() {
        let host = if rule.host().is_empty() { "*" } else { rule.host() };
        if rule.paths().is_empty() {
            tracing::warn!("Rule for host {} has no paths and will answer 404", host);
        }
        for path in rule.paths() {
            tracing::info!(
                "Configured route: {}{} -> {}",
                host,
                path.path_prefix(),
                path.backend().authority()
            );
        }
    }
    if let Some(backend) = spec.default_backend() {
        tracing::info!("Configured default backend: {}", backend.authority());
    }
}

/// Validate configuration and manifest, then exit
async fn validate_config_command(config_path: &str) -> Result<()> {
    println!("🔍 Validating configuration file: {config_path}");

    if !Path::new(config_path).exists() {
        eprintln!("❌ Error: Configuration file '{config_path}' not found");
        std::process::exit(1);
    }

    let config = match load_config(config_path).await {
        Ok(config) => {
            println!("✅ Configuration parsing: OK");
            config
        }
        Err(e) => {
            eprintln!("❌ Configuration parsing failed:");
            eprintln!("   {e:#}");
            std::process::exit(1);
        }
    };

    if let Err(e) = ServerConfigValidator::validate(&config) {
        eprintln!("❌ Configuration validation failed:");
        eprintln!("{e}");
        std::process::exit(1);
    }
    println!("✅ Configuration validation: OK");

    let ingress_path = resolve_ingress_path(config_path, &config);
    let spec = match load_ingress(&ingress_path).await {
        Ok(spec) => {
            println!("✅ Ingress manifest: OK ({})", ingress_path.display());
            spec
        }
        Err(e) => {
            eprintln!("❌ Ingress manifest rejected:");
            eprintln!("   {e:#}");
            std::process::exit(1);
        }
    };

    println!();
    println!("📋 Configuration Summary:");
    println!("   • Listen Address: {}", config.listen_addr);
    println!("   • Ingress: {}", spec.name().unwrap_or("<unnamed>"));
    println!("   • Rules: {}", spec.rules().len());
    for rule in spec.rules() {
        let host = if rule.host().is_empty() { "*" } else { rule.host() };
        for path in rule.paths() {
            println!(
                "       {host}{} -> {}",
                path.path_prefix(),
                path.backend().authority()
            );
        }
    }
    match spec.default_backend() {
        Some(backend) => println!("   • Default Backend: {}", backend.authority()),
        None => println!("   • Default Backend: none (unmatched requests get 404)"),
    }
    println!();
    println!("🎉 Configuration is valid and ready to use!");
    Ok(())
}

/// Write a starter config and ingress manifest next to it
async fn init_config_command(config_path: &str) -> Result<()> {
    let path = Path::new(config_path);
    let ingress_path = path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join("ingress.yaml");

    for existing in [path, ingress_path.as_path()] {
        if existing.exists() {
            eprintln!("❌ Error: '{}' already exists", existing.display());
            std::process::exit(1);
        }
    }

    tokio::fs::write(path, DEFAULT_CONFIG)
        .await
        .context("Failed to write config file")?;
    tokio::fs::write(&ingress_path, DEFAULT_INGRESS)
        .await
        .context("Failed to write ingress manifest")?;

    println!("✅ Created default configuration at: {config_path}");
    println!("✅ Created example ingress at: {}", ingress_path.display());
    println!("   Run 'ingress-router --config {config_path} serve' to start the router");
    Ok(())
}
