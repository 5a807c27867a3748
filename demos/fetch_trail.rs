//! Fetch trail data over HTTP and report its size.
//!
//! Run with: cargo run --example fetch_trail --features http -- <base-url>

use std::env;

use trail_tracker::{format_distance, TrailDataFetcher};

#[tokio::main]
async fn main() {
    let base_url = env::args()
        .nth(1)
        .unwrap_or_else(|| "http://localhost:8080/assets/nakahechi".to_string());

    let fetcher = match TrailDataFetcher::new(&base_url) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("{}", e);
            return;
        }
    };

    match fetcher.fetch().await {
        Ok(data) => {
            println!("Trail {}", data.trail.route_id);
            println!(
                "  {} points, {}",
                data.geometry.len(),
                format_distance(Some(data.geometry.total_length()))
            );
            println!(
                "  {} stages, {} POIs",
                data.trail.stages.len(),
                data.pois.len()
            );
        }
        Err(e) => eprintln!("fetch failed: {}", e),
    }
}
