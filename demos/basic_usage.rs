//! Basic Catalog Usage Example
//!
//! Demonstrates the create/relate/persist workflow against a durable store.
//!
//! Run with:
//!   cargo run --example basic_usage

use posada::catalog::Catalog;
use serde_json::json;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Posada: Basic Usage ===\n");

    let path = std::env::temp_dir().join("posada-basic-usage.json");
    let _ = std::fs::remove_file(&path);

    let catalog = Catalog::open(&path).await?;
    println!("✓ Opened catalog at {}\n", path.display());

    // === Create the object graph ===
    println!("--- Creating entities ---");

    let state = catalog.create_state(&json!({ "name": "California" })).await?;
    println!("  State   {} ({})", state.as_state().unwrap().name, state.id);

    let city = catalog
        .create_city(&state.id, &json!({ "name": "Fremont" }))
        .await?;
    println!("  City    {} ({})", city.as_city().unwrap().name, city.id);

    let user = catalog
        .create_user(&json!({ "email": "ada@example.com", "password": "secret" }))
        .await?;
    println!("  User    {} ({})", user.as_user().unwrap().email, user.id);

    let place = catalog
        .create_place(
            &city.id,
            &json!({
                "user_id": user.id,
                "name": "Bright loft",
                "price_by_night": 120,
                "max_guest": 4
            }),
        )
        .await?;
    println!("  Place   {} ({})\n", place.as_place().unwrap().name, place.id);

    // === Derived collections ===
    println!("--- Resolving relationships ---");

    let cities = catalog.cities_of_state(&state.id).await?;
    println!("  {} has {} city(ies)", state.as_state().unwrap().name, cities.len());

    let wifi = catalog.create_amenity(&json!({ "name": "Wifi" })).await?;
    catalog.link_amenity(&place.id, &wifi.id).await?;
    let amenities = catalog.amenities_of_place(&place.id).await?;
    println!("  {} offers {} amenity(ies)", place.as_place().unwrap().name, amenities.len());

    let stats = catalog.stats().await?;
    println!("  Stats: {stats:?}\n");

    // === Persistence round-trip ===
    println!("--- Restarting ---");
    catalog.close().await?;

    let reopened = Catalog::open(&path).await?;
    let survived = reopened.get_place(&place.id).await?;
    println!(
        "  ✓ {} survived the restart (updated {})",
        survived.as_place().unwrap().name,
        survived.updated_at
    );

    println!("\n=== Example Complete ===");
    Ok(())
}
