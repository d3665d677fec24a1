//! render-admin - cache maintenance for the render pipeline store
//!
//! Usage:
//!   render-admin stats                 Report entry count, size, timestamp extremes
//!   render-admin clear                 Delete every cache entry
//!   render-admin clear-older <ms>      Delete entries older than <ms> milliseconds

use patent_render::admin::CacheAdmin;
use patent_render::CacheStore;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        print_usage();
        std::process::exit(1);
    }

    let dir =
        std::env::var("RENDER_CACHE_DIR").unwrap_or_else(|_| ".cache/renders".to_string());
    let admin = CacheAdmin::new(Arc::new(CacheStore::on_disk(dir)));

    match args[1].as_str() {
        "stats" => print_json(&admin.stats().await),
        "clear" => print_json(&admin.clear_all().await),
        "clear-older" => {
            let Some(raw) = args.get(2) else {
                eprintln!("Usage: render-admin clear-older <ms>");
                std::process::exit(1);
            };
            let Ok(max_age_ms) = raw.parse::<i64>() else {
                eprintln!("Invalid maxAge parameter: {raw}");
                std::process::exit(1);
            };
            match admin.clear_older_than(max_age_ms).await {
                Ok(report) => print_json(&report),
                Err(err) => {
                    eprintln!("{err}");
                    std::process::exit(1);
                }
            }
        }
        "version" | "--version" | "-V" => {
            println!("render-admin {}", env!("CARGO_PKG_VERSION"));
        }
        "help" | "--help" | "-h" => print_usage(),
        other => {
            eprintln!("Unknown command: {other}");
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string_pretty(value).unwrap_or_default()
    );
}

fn print_usage() {
    println!(
        r#"render-admin - cache maintenance for the render pipeline store

USAGE:
    render-admin <COMMAND> [OPTIONS]

COMMANDS:
    stats                  Report entry count, stored size, timestamp extremes
    clear                  Delete every cache entry
    clear-older <ms>       Delete entries older than <ms> milliseconds
    version                Show version information
    help                   Show this help message

ENVIRONMENT:
    RENDER_CACHE_DIR       Cache directory (default: .cache/renders)"#
    );
}
