use dotenv::dotenv;
use resolution_client::admin::{AdminPanel, PendingUpdate};
use resolution_client::prelude::*;
use std::env;

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();

    let email = env::var("RESOLUTION_ADMIN_EMAIL").expect("RESOLUTION_ADMIN_EMAIL must be set");
    let password =
        env::var("RESOLUTION_ADMIN_PASSWORD").expect("RESOLUTION_ADMIN_PASSWORD must be set");

    let resolution = Resolution::from_env();
    let context = resolution.session();
    let user = context.login(&email, &password).await?;
    let token = context.token();

    println!("Starting Admin example as {}", user.email);

    let admin = resolution.admin();
    let mut panel = AdminPanel::new();
    if !panel.refresh(&admin, &user, token.as_deref()).await {
        println!("Could not load the panel: {:?}", panel.error());
        return Ok(());
    }

    // Advance every pending claim one step
    let updates: Vec<PendingUpdate> = panel
        .data()
        .map(|data| {
            data.items(TicketKind::Claim)
                .iter()
                .filter(|item| item.ticket.status == TicketStatus::Pending)
                .filter_map(|item| {
                    Some(PendingUpdate {
                        kind: TicketKind::Claim,
                        id: item.ticket.id?,
                        status: item.ticket.status.next()?,
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    println!("Advancing {} pending claims", updates.len());
    let results = admin.apply_bulk(&user, token.as_deref(), &updates).await?;
    for (update, result) in updates.iter().zip(results) {
        match result {
            Ok(()) => println!("  claim {} -> {}", update.id, update.status),
            Err(err) => println!("  claim {} failed: {}", update.id, err),
        }
    }

    let reports = admin.reports(&user, token.as_deref()).await?;
    let pct = reports.claims_stats.percentages();
    println!(
        "\nClaims: {} total, {}% pending, {}% in progress, {}% completed",
        reports.claims_stats.total, pct.pending, pct.in_progress, pct.completed
    );

    println!("Admin example completed");
    Ok(())
}
