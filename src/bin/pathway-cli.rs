use std::path::PathBuf;

use axum::http::Method;
use clap::{Parser, Subcommand};
use serde_json::json;

use pathway::config::{load_config, PathwayConfig};
use pathway::http::mount_static_routes;
use pathway::routing::Match;
use pathway::{Router, RouterBuilder};

#[derive(Parser)]
#[command(name = "pathway-cli")]
#[command(about = "Inspect the routes declared in a pathway config", long_about = None)]
struct Cli {
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the route table
    Routes {
        /// Emit JSON instead of the aligned table
        #[arg(long)]
        json: bool,
    },
    /// Resolve a request against the routes
    Match {
        method: String,
        path: String,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => PathwayConfig::default(),
    };
    let mut builder = RouterBuilder::with_config(config.router.clone());
    mount_static_routes(&mut builder, &config.routes)?;
    let router = builder.build()?;

    match cli.command {
        Commands::Routes { json } => print_routes(&router, json)?,
        Commands::Match { method, path } => {
            let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())?;
            print_match(&router, &method, &path)?;
        }
    }

    Ok(())
}

fn print_routes(router: &Router, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    if json {
        println!("{}", serde_json::to_string_pretty(&router.list_routes())?);
    } else if router.routes().is_empty() {
        eprintln!("No routes declared");
    } else {
        println!("{router}");
    }
    Ok(())
}

fn print_match(router: &Router, method: &Method, path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let report = match router.find(method, path) {
        Match::Found { route, bindings } => json!({
            "outcome": "found",
            "route": route.summary(),
            "bindings": bindings,
        }),
        Match::MethodNotAllowed { allowed } => json!({
            "outcome": "method_not_allowed",
            "allowed": allowed.iter().map(Method::as_str).collect::<Vec<_>>(),
        }),
        Match::NotFound => json!({ "outcome": "not_found" }),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
