use std::sync::Arc;
use std::time::Duration;

use profit_coach::billing::webhook::{billing_routes, BillingRouteState};
use profit_coach::catalog::seed;
use profit_coach::chat::routes::{chat_routes, ChatRouteState};
use profit_coach::chat::ChatOrchestrator;
use profit_coach::config::{BillingConfig, ChatConfig};
use profit_coach::gateway::{CompletionGateway, GatewayConfig, OpenAiGateway};
use profit_coach::profile::routes::{profile_routes, ProfileRouteState};
use profit_coach::store::{Database, LibSqlBackend};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    // Read API key from environment
    let api_key = std::env::var("OPENAI_API_KEY").unwrap_or_else(|_| {
        eprintln!("Error: OPENAI_API_KEY not set");
        eprintln!("  export OPENAI_API_KEY=sk-...");
        std::process::exit(1);
    });

    let model = std::env::var("COACH_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());

    let api_base = std::env::var("COACH_COMPLETION_API_BASE")
        .unwrap_or_else(|_| "https://api.openai.com/v1".to_string());

    let port: u16 = std::env::var("COACH_PORT")
        .unwrap_or_else(|_| "8787".to_string())
        .parse()
        .unwrap_or(8787);

    let gateway_timeout_secs: u64 = std::env::var("COACH_GATEWAY_TIMEOUT_SECS")
        .unwrap_or_else(|_| "30".to_string())
        .parse()
        .unwrap_or(30);

    let billing_config = BillingConfig::from_env();

    eprintln!("💰 Profit Coach v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Model: {}", model);
    eprintln!("   Chat API: http://0.0.0.0:{}/chat", port);
    eprintln!(
        "   Entitlement gate: {}",
        if billing_config.enforce_entitlement {
            "enforced"
        } else {
            "disabled"
        }
    );

    // ── Database ─────────────────────────────────────────────────────────
    let db_path =
        std::env::var("COACH_DB_PATH").unwrap_or_else(|_| "./data/profit-coach.db".to_string());

    let db_path_ref = std::path::Path::new(&db_path);
    let db: Arc<dyn Database> = Arc::new(
        LibSqlBackend::new_local(db_path_ref)
            .await
            .unwrap_or_else(|e| {
                eprintln!("Error: Failed to open database at {}: {}", db_path, e);
                std::process::exit(1);
            }),
    );

    eprintln!("   Database: {}", db_path);

    // ── Starter catalog ──────────────────────────────────────────────────
    let seeded = seed::seed_if_empty(db.as_ref()).await?;
    if seeded > 0 {
        eprintln!("   Seeded {} starter tutorials", seeded);
    }

    // ── Completion gateway ───────────────────────────────────────────────
    let gateway_config = GatewayConfig {
        api_base,
        api_key: secrecy::SecretString::from(api_key),
        model,
        timeout: Duration::from_secs(gateway_timeout_secs),
        ..GatewayConfig::default()
    };
    let gateway: Arc<dyn CompletionGateway> = Arc::new(OpenAiGateway::new(gateway_config));

    // ── Pipeline + routes ────────────────────────────────────────────────
    let orchestrator = Arc::new(ChatOrchestrator::new(
        Arc::clone(&db),
        gateway,
        ChatConfig::default(),
    ));

    let app = chat_routes(ChatRouteState {
        db: Arc::clone(&db),
        orchestrator,
        billing: billing_config.clone(),
    })
    .merge(profile_routes(ProfileRouteState {
        db: Arc::clone(&db),
    }))
    .merge(billing_routes(BillingRouteState {
        db: Arc::clone(&db),
        config: billing_config,
    }))
    .route("/health", axum::routing::get(|| async { "ok" }));

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
    tracing::info!(port, "Chat API server started");
    axum::serve(listener, app).await?;

    Ok(())
}
