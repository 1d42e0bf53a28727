use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use rawh::client::{Client, ClientRequest, build_client, generate_sample_data, normalize_url};
use rawh::config::{ClientConfig, ServerConfig};
use rawh::http::HttpVersion;
use rawh::net::server::Server;
use rawh::net::tls::TlsVersion;
use rawh::units::parse_byte_size;

const NAME: &str = env!("CARGO_PKG_NAME");
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "rawh", version)]
#[command(about = "rawh functions either as an HTTP server or as a client to diagnose requests and responses.")]
struct Cli {
    /// Enables verbose output for the operation (client and server modes).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run as an HTTP server
    Server(ServerArgs),
    /// Run as an HTTP client
    Client(ClientArgs),
}

#[derive(Args)]
struct ServerArgs {
    /// Specify the port the server will listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// TOML file with server settings; flags take precedence
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Normalize header names format.
    #[arg(long)]
    normalize_headers: bool,
}

#[derive(Args)]
struct ClientArgs {
    url: String,

    /// Use the 'canonical' client instead of the 'raw' one.
    #[arg(short = 'C', long)]
    canonical: bool,

    /// HTTP method to use (e.g., 'GET', 'POST').
    #[arg(short = 'X', long, default_value = "GET")]
    method: String,

    /// Data to be sent as the body of the request, typically with 'POST'.
    #[arg(short, long, default_value = "")]
    data: String,

    /// Data size [B|KB|MB|GB] to be generated and sent as the body of the request.
    #[arg(long)]
    generate_data_size: Option<String>,

    /// HTTP version to use (options: 1.0, 1.1, 2).
    #[arg(long = "http", default_value = "1.1")]
    http_version: String,

    /// Minimum TLS version to use (options: 1.0, 1.1, 1.2, 1.3).
    #[arg(long = "tls", default_value = "1.2")]
    tls_version: String,

    /// Allow insecure server connections.
    #[arg(short = 'k', long)]
    insecure: bool,

    /// Adds a header to the request, format 'key: value'.
    #[arg(short = 'H', long = "header")]
    headers: Vec<String>,

    /// Normalize header names format.
    #[arg(long)]
    normalize_headers: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "rawh=info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let result = async_std::task::block_on(async move {
        match cli.command {
            Command::Server(args) => run_server(args, cli.verbose).await,
            Command::Client(args) => run_client(args, cli.verbose).await,
        }
    });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            println!("{NAME} {VERSION}");
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

type BoxError = Box<dyn std::error::Error>;

async fn run_server(args: ServerArgs, verbose: bool) -> Result<(), BoxError> {
    let mut config = match &args.config {
        Some(path) => ServerConfig::from_file(path),
        None => ServerConfig::default(),
    };
    if let Some(port) = args.port {
        config.port = port;
    }
    config.verbose |= verbose;
    config.normalize_headers |= args.normalize_headers;

    Server::bind(config).await?.run().await?;
    Ok(())
}

async fn run_client(args: ClientArgs, verbose: bool) -> Result<(), BoxError> {
    let config = ClientConfig {
        canonical: args.canonical,
        http_version: HttpVersion::from_name(&args.http_version)?,
        tls_version: TlsVersion::from_name(&args.tls_version)?,
        insecure: args.insecure,
        normalize_headers: args.normalize_headers,
        verbose,
    };
    let client = build_client(&config)?;

    let body = match &args.generate_data_size {
        Some(size) => generate_sample_data(parse_byte_size(size)?),
        None => args.data.into_bytes(),
    };
    let request = ClientRequest {
        method: args.method,
        url: normalize_url(&args.url),
        header_lines: args.headers,
        body,
    };

    let response = client.send(&request).await?;
    println!("{}", String::from_utf8_lossy(&response.body));
    Ok(())
}
