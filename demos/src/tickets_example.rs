use dotenv::dotenv;
use resolution_client::prelude::*;
use resolution_client::views::{Dashboard, TicketList};
use std::env;

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();

    let email = env::var("RESOLUTION_EMAIL").expect("RESOLUTION_EMAIL must be set");
    let password = env::var("RESOLUTION_PASSWORD").expect("RESOLUTION_PASSWORD must be set");

    let resolution = Resolution::from_env();
    let context = resolution.session();
    let user = context.login(&email, &password).await?;
    let token = context.token();

    println!("Starting Tickets example for {}", user.full_name());

    let claims = resolution.claims();
    let requests = resolution.requests();

    // Create one of each
    let claim = claims
        .create(&NewTicket::new(user.id, "Cobro duplicado", "Se cobró dos veces la factura"))
        .await?;
    println!("Created claim: {}", serde_json::to_string_pretty(&claim)?);

    let request = requests
        .create(&NewTicket::new(user.id, "Cambio de plan", "Quiero pasar al plan anual"))
        .await?;
    println!("Created request: {}", serde_json::to_string_pretty(&request)?);

    // List and summarize
    let list = TicketList::load(&claims, Some(user.id)).await;
    println!("\nClaims ({}):", list.items().len());
    for ticket in list.items() {
        println!("  {:?} {} [{}]", ticket.id, ticket.subject, ticket.status);
    }

    let dashboard = Dashboard::load(&claims, &requests, Some(user.id)).await?;
    println!(
        "\nDashboard: {} claims, {} requests, {}% of claims completed",
        dashboard.claims.total,
        dashboard.requests.total,
        dashboard.claims.completed_percentage()
    );

    // Clean up
    let mut list = TicketList::load(&requests, Some(user.id)).await;
    if let Some(id) = request.id {
        let deleted = list.delete(&requests, id, true, token.as_deref()).await;
        println!("\nDeleted request {}: {}", id, deleted);
    }

    println!("Tickets example completed");
    Ok(())
}
