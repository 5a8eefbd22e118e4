use std::path::PathBuf;

use autonorte_client::MarketplaceClient;
use tracing::{info, Level};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    let base_url =
        std::env::var("AUTONORTE_API_BASE").unwrap_or_else(|_| "http://localhost:8000".to_string());
    let data_dir = std::env::var("AUTONORTE_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(".autonorte"));

    info!("🚗 TuAutoNorte marketplace client");
    info!("Backend: {}", base_url);
    info!("Local store: {}", data_dir.display());
    info!("");

    let client = MarketplaceClient::new(&base_url, &data_dir)?;

    let cars = client.cars.get_all_cars().await;
    info!("✅ {} listings available\n", cars.len());

    for (i, car) in cars.iter().enumerate() {
        println!("{}. {} (${})", i + 1, car.title, car.price);
        println!("   {} {} · {} · {} km", car.brand, car.model, car.location, car.mileage);
        let cover = car.images.first().map(String::as_str).unwrap_or("-");
        println!("   Seller: {} · cover: {}", car.user_name, cover);
        println!();
    }

    // Admin dashboard view: independent fetches, completion order does not
    // matter, each result lands in its own slot
    let (pending, users) =
        tokio::join!(client.admin.get_pending_cars(), client.admin.get_all_users());
    info!("📋 {} listings pending moderation, {} registered users", pending.len(), users.len());

    Ok(())
}
