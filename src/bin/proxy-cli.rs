use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::Method;
use serde_json::Value;

#[derive(Parser)]
#[command(name = "proxy-cli")]
#[command(about = "Send one request through the dashboard forwarding proxy", long_about = None)]
struct Cli {
    /// Proxy endpoint, mount path included.
    #[arg(short, long, default_value = "http://localhost:8080/api/proxy")]
    url: String,

    /// Target API base URL (sent as X-Proxy-Target).
    #[arg(short, long)]
    target: String,

    /// API key for the target (sent as X-Proxy-API-Key).
    #[arg(short, long)]
    key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// GET a path below the target base
    Get {
        path: String,
        /// Query parameter as key=value, repeatable
        #[arg(short, long = "query")]
        query: Vec<String>,
    },
    /// POST a body to a path below the target base
    Post {
        path: String,
        /// Request body; sent as JSON when it parses as JSON
        #[arg(short, long)]
        data: String,
    },
    /// DELETE a path below the target base
    Delete { path: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json, text/plain, */*"));
    headers.insert("x-proxy-target", HeaderValue::from_str(&cli.target)?);
    if let Some(key) = &cli.key {
        headers.insert("x-proxy-api-key", HeaderValue::from_str(key)?);
    }

    let base = cli.url.trim_end_matches('/');
    let request = match cli.command {
        Commands::Get { path, query } => {
            let pairs: Vec<(String, String)> = query
                .iter()
                .map(|q| match q.split_once('=') {
                    Some((k, v)) => (k.to_string(), v.to_string()),
                    None => (q.to_string(), String::new()),
                })
                .collect();
            client
                .request(Method::GET, endpoint(base, &path))
                .query(&pairs)
        }
        Commands::Post { path, data } => {
            let content_type = if serde_json::from_str::<Value>(&data).is_ok() {
                "application/json"
            } else {
                "text/plain"
            };
            client
                .request(Method::POST, endpoint(base, &path))
                .header(CONTENT_TYPE, content_type)
                .body(data)
        }
        Commands::Delete { path } => client.request(Method::DELETE, endpoint(base, &path)),
    };

    let res = request.headers(headers).send().await?;
    print_response(res).await?;
    Ok(())
}

fn endpoint(base: &str, path: &str) -> String {
    format!("{}/{}", base, path.trim_start_matches('/'))
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let is_json = res
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.contains("application/json"));
    let text = res.text().await?;

    if !status.is_success() {
        eprintln!("Error: proxy returned status {}", status);
    }

    match serde_json::from_str::<Value>(&text) {
        Ok(json) if is_json => println!("{}", serde_json::to_string_pretty(&json)?),
        _ => println!("{}", text),
    }
    Ok(())
}
