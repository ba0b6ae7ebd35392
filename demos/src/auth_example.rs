use dotenv::dotenv;
use resolution_client::auth::RegisterData;
use resolution_client::prelude::*;
use resolution_client::verification::FlowPurpose;
use std::env;
use uuid::Uuid;

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file
    dotenv().ok();

    // NEXT_PUBLIC_API_URL points at the backend origin
    let resolution = Resolution::from_env();
    println!("Starting Auth example against {}", resolution.url);

    // Generate a unique email for testing
    let unique_id = Uuid::new_v4().to_string();
    let test_email = format!("test-user-{}@example.com", unique_id);
    let test_password = "securePassword123!";

    let auth = resolution.auth();

    println!("Registering a new user with email: {}", test_email);
    let user = auth
        .register(&RegisterData {
            first_name: "Demo".into(),
            last_name: "User".into(),
            email: test_email.clone(),
            password: test_password.into(),
            phone: None,
        })
        .await?;
    println!("Registered: {:?}", user);

    let envelope = auth.issue_code(user.id).await?;
    println!("Code issued: {:?}", envelope.message);

    // Unverified accounts are refused by the session context
    let context = resolution.session();
    match context.login(&test_email, test_password).await {
        Ok(_) => println!("Signed in without verification"),
        Err(err) => println!("Sign in refused as expected: {}", err),
    }

    // The code arrives by email; pass it in to finish verification
    if let Ok(code) = env::var("VERIFICATION_CODE") {
        let mut flow = resolution.verification(&test_email, FlowPurpose::VerifyAccount);
        flow.enter_code(&code);
        match flow.submit_code(auth).await {
            Ok(_) => {
                let user = context.login(&test_email, test_password).await?;
                println!("Signed in as {}", user.full_name());
                context.logout().await?;
            }
            Err(err) => println!("Verification failed: {}", err),
        }
    } else {
        println!("Set VERIFICATION_CODE to complete the verification step");
    }

    println!("Auth example completed");
    Ok(())
}
