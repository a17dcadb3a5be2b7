mod app_system;
mod clients;
mod config;
mod domain;
mod error;
mod jobs;
mod otp;
mod store;

#[cfg(test)]
mod mock_framework;

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info, Instrument};

use crate::app_system::{setup_tracing, OrderSystem};
use crate::config::SystemConfig;
use crate::domain::{
    CategoryCreate, CategoryPatch, DeliveryDetails, ItemPrice, LineItem, MenuItem, OrderCreate,
    OrderFilter, ProfileCreate, ProfilePatch, SavedAddress,
};
use crate::otp::{DevGateway, OtpService, DEV_OTP_CODE};

#[tokio::main]
async fn main() -> Result<(), String> {
    dotenvy::dotenv().ok();
    setup_tracing();

    info!("Starting order system");
    let config = SystemConfig::from_env();
    let otp = OtpService::new(Arc::new(DevGateway), config.otp_session_ttl);
    let system = OrderSystem::new(config);

    seed_menu(&system).await?;

    // Phone verification, then the first-login profile bootstrap.
    let phone = "9999999999";
    otp.send(phone).await.map_err(|e| e.to_string())?;
    otp.verify(phone, DEV_OTP_CODE)
        .await
        .map_err(|e| e.to_string())?;

    let uid = "uid_demo".to_string();
    let profile = match system
        .profiles
        .get_profile(uid.clone())
        .await
        .map_err(|e| e.to_string())?
    {
        Some(existing) => existing,
        None => system
            .profiles
            .create_profile(ProfileCreate {
                user_id: uid,
                name: "Alice".into(),
                phone: phone.into(),
                email: "alice@example.com".into(),
            })
            .await
            .map_err(|e| e.to_string())?,
    };
    info!(user_id = %profile.id, "Profile ready");

    // Save the delivery address against the profile for next time.
    let profile = system
        .profiles
        .update_profile(
            profile.id.clone(),
            ProfilePatch {
                addresses: Some(vec![SavedAddress {
                    label: "Hostel".into(),
                    address: "A-10, Sector 62".into(),
                }]),
                ..ProfilePatch::default()
            },
        )
        .await
        .map_err(|e| e.to_string())?;

    // The admin board keeps a live view of orders still in flight.
    let mut board = system
        .orders
        .subscribe(OrderFilter::undelivered())
        .await
        .map_err(|e| e.to_string())?;
    // Initial snapshot, empty at this point.
    board.recv().await;

    let span = tracing::info_span!("order_processing");
    let order = async {
        info!("Placing demo order");
        system
            .orders
            .place_order(OrderCreate {
                customer_id: profile.id.clone(),
                items: vec![
                    LineItem::new("Margherita", 250, 1),
                    LineItem::new("Coke", 40, 2),
                ],
                delivery: DeliveryDetails {
                    name: profile.name.clone(),
                    phone: profile.phone.clone(),
                    address: profile.addresses[0].address.clone(),
                    instructions: None,
                    university_gate: None,
                },
            })
            .await
            .map_err(|e| e.to_string())
    }
    .instrument(span)
    .await?;
    info!(order_id = %order.id, total = order.total_price, "Order placed");

    if let Some(snapshot) = board.recv().await {
        info!(in_flight = snapshot.len(), "Admin board updated");
    }

    // Walk the order through its lifecycle the way the admin UI does:
    // one step at a time, only ever to the next status.
    let mut status = order.status;
    while let Some(next) = status.next() {
        match system.orders.advance(order.id.clone(), next, "admin_demo").await {
            Ok(updated) => {
                status = updated.status;
                info!(status = %status, "Order advanced");
            }
            Err(e) => {
                error!(error = %e, "Order advance failed");
                break;
            }
        }
    }

    // Admin's end-of-day view.
    let start_of_day = Utc::now().date_naive().and_time(chrono::NaiveTime::MIN).and_utc();
    let todays = system
        .orders
        .list_all(OrderFilter::since(start_of_day))
        .await
        .map_err(|e| e.to_string())?;
    info!(count = todays.len(), "Orders placed today");

    board.unsubscribe().await;
    system.shutdown().await?;

    info!("Application completed successfully");
    Ok(())
}

/// Fills the menu collection the way the admin panel would.
async fn seed_menu(system: &OrderSystem) -> Result<(), String> {
    let mut margherita_sizes = BTreeMap::new();
    margherita_sizes.insert("Regular".to_string(), 250);
    margherita_sizes.insert("Medium".to_string(), 400);

    system
        .menu
        .create_category(CategoryCreate {
            name: "Pizzas".into(),
            position: 1,
            items: vec![MenuItem {
                name: "Margherita".into(),
                price: ItemPrice::BySize(margherita_sizes),
                available: true,
                image_url: None,
            }],
        })
        .await
        .map_err(|e| e.to_string())?;

    let beverages = system
        .menu
        .create_category(CategoryCreate {
            name: "Beverages".into(),
            position: 1,
            items: vec![MenuItem {
                name: "Coke".into(),
                price: ItemPrice::Fixed(40),
                available: true,
                image_url: None,
            }],
        })
        .await
        .map_err(|e| e.to_string())?;
    // Beverages belong after the pizzas.
    system
        .menu
        .update_category(
            beverages.id,
            CategoryPatch {
                position: Some(2),
                ..CategoryPatch::default()
            },
        )
        .await
        .map_err(|e| e.to_string())?;

    let categories = system.menu.list_categories().await.map_err(|e| e.to_string())?;
    info!(categories = categories.len(), "Menu seeded");
    Ok(())
}
