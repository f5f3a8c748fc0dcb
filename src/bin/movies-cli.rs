use clap::{Parser, Subcommand};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "movies-cli")]
#[command(about = "Client for the route-tree movie service", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List all movies
    List,
    /// Show one movie
    Get { id: u64 },
    /// Create a movie
    Create {
        title: String,
        #[arg(long)]
        year: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let res = match cli.command {
        Commands::List => client.get(format!("{}/movies", cli.url)).send().await?,
        Commands::Get { id } => {
            client
                .get(format!("{}/movies/{}", cli.url, id))
                .send()
                .await?
        }
        Commands::Create { title, year } => {
            let mut body = json!({ "title": title });
            if let Some(year) = year {
                body["year"] = json!(year);
            }
            client
                .post(format!("{}/movies", cli.url))
                .json(&body)
                .send()
                .await?
        }
    };

    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;
    if !status.is_success() {
        eprintln!("Error: movie service returned status {}", status);
    }

    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{}", text),
    }
    Ok(())
}
