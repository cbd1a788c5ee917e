//! Drive one OAuth redirect against a running backend.
//!
//! The persisted token and profile live in a JSON file, so a second run
//! restores the session instead of exchanging again.
//!
//! Run with:
//! ```bash
//! AUTHGATE_API_BASE_URL=http://127.0.0.1:8000 RUST_LOG=authgate=debug \
//!     cargo run --example callback -- "http://localhost:3000/auth/callback?code=4/0Ab..."
//! ```

use authgate::prelude::*;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Prints where the browser would go.
struct ConsoleNavigator;

impl Navigator for ConsoleNavigator {
    fn navigate(&self, location: &Location) {
        let how = if location.replace { "replace" } else { "push" };
        println!("🧭 Navigate ({}): {}", how, location.path);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let url = std::env::args()
        .nth(1)
        .ok_or_else(|| anyhow::anyhow!("usage: callback <callback-url> [store-file]"))?;
    let store_path = std::env::args()
        .nth(2)
        .unwrap_or_else(|| "authgate-session.json".to_string());

    let gate = AuthGate::builder()
        .config(AuthGateConfig::from_env()?)
        .stores(ScopedStores::new(
            Arc::new(MemoryStore::new()),
            Arc::new(FileStore::open(&store_path)?),
        ))
        .build()?;

    let restored = gate.restore_session();
    if restored.is_authenticated {
        println!("🔑 Restored session from {}", store_path);
    }

    let navigator = Arc::new(ConsoleNavigator);
    match gate.handle_redirect(&url, navigator).await? {
        Some(report) => {
            if let Some(message) = report.state.error_message() {
                println!("❌ {}", message);
            }
            println!("State: {:?}", report.state);
        }
        None => println!("Callback already handled"),
    }

    let session = gate.session().snapshot();
    println!(
        "Authenticated: {} | needs profile update: {}",
        session.is_authenticated, session.needs_profile_update
    );
    if let Some(user) = session.user_data {
        println!("User: {} ({:?})", user.id, user.email);
    }

    Ok(())
}
