use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Method;
use serde_json::Value;

#[derive(Parser)]
#[command(name = "registry-cli")]
#[command(about = "Inspect a running route registry", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    /// Canonical namespace the registry serves its own routes under.
    #[arg(short, long, default_value = "app/v1")]
    namespace: String,

    /// Admin API key (only needed for deprecation commands).
    #[arg(short, long, env = "ROUTE_REGISTRY_ADMIN_KEY", default_value = "CHANGE_ME_IN_PRODUCTION")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Full route catalog, conflicts and statistics
    Discover,
    /// Routes in one logical group
    Group { name: String },
    /// Generated OpenAPI document
    Openapi,
    /// Legacy route usage (pending and persisted)
    Deprecations,
    /// Reset deprecation statistics (irreversible)
    ClearDeprecations,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = format!(
        "{}/{}",
        cli.url.trim_end_matches('/'),
        cli.namespace.trim_matches('/')
    );

    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", cli.key))?,
    );

    let (method, path, admin) = match &cli.command {
        Commands::Discover => (Method::GET, "discover".to_string(), false),
        Commands::Group { name } => (Method::GET, format!("discover/{}", name), false),
        Commands::Openapi => (Method::GET, "openapi".to_string(), false),
        Commands::Deprecations => (Method::GET, "admin/deprecations".to_string(), true),
        Commands::ClearDeprecations => (Method::DELETE, "admin/deprecations".to_string(), true),
    };

    let mut request = client.request(method, format!("{}/{}", base, path));
    if admin {
        request = request.headers(headers);
    }
    let res = request.send().await?;
    print_response(res).await?;

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: registry returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
