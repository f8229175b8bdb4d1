use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use podium_ledger::{Asset, HorizonGateway};
use podium_service::{
    api, AppState, ConfirmationLoop, MemoryStore, RedisStore, SchedulerLoop, ServiceConfig,
    TourneyService, TourneyStore,
};

#[derive(Parser, Debug)]
#[command(name = "podium", about = "Timed contest service with on-chain funded prizes")]
struct Args {
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    #[arg(long, default_value_t = 5000)]
    port: u16,

    /// Redis connection string. Without it the service keeps tourneys in
    /// memory, which only makes sense for local development.
    #[arg(long, env = "REDIS_URL")]
    redis_url: Option<String>,

    /// Base URL of the Horizon-style ledger API.
    #[arg(long, env = "HORIZON_URL", default_value = "https://horizon-kik.kininfrastructure.com")]
    horizon_url: String,

    #[arg(long, default_value = "KIN")]
    asset_code: String,

    #[arg(
        long,
        default_value = "GBQ3DQOA7NF52FVV7ES3CR3ZMHUEY4LTHDAQKDTO6S546JCLFPEQGCPK"
    )]
    asset_issuer: String,

    /// Wallet that funding transactions must pay into.
    #[arg(long, env = "RECEIVING_PUBLIC_KEY")]
    receiving_public_key: String,

    /// Bearer token for the payment-send endpoint.
    #[arg(long, env = "LEDGER_AUTH_TOKEN")]
    ledger_auth_token: Option<String>,

    /// File to read the token from instead of passing it inline.
    #[arg(long)]
    ledger_auth_token_file: Option<PathBuf>,

    /// Template for public tourney links; `{id}` is substituted.
    #[arg(long, default_value = "http://127.0.0.1/api/v1/tourneys/{id}")]
    tourney_url_template: String,

    #[arg(long, default_value_t = 10)]
    confirm_interval_secs: u64,

    #[arg(long, default_value_t = 600)]
    pay_timeout_secs: u64,

    #[arg(long, default_value_t = 10)]
    scheduler_idle_secs: u64,
}

fn build_config(args: &Args) -> Result<ServiceConfig> {
    let ledger_auth_token = match (&args.ledger_auth_token, &args.ledger_auth_token_file) {
        (Some(token), _) => Some(token.clone()),
        (None, Some(path)) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read token file {}", path.display()))?;
            Some(raw.trim().to_string())
        }
        (None, None) => None,
    };

    Ok(ServiceConfig {
        host: args.host.clone(),
        port: args.port,
        redis_url: args.redis_url.clone(),
        horizon_url: args.horizon_url.clone(),
        asset: Asset::new(args.asset_code.clone(), args.asset_issuer.clone()),
        receiving_public_key: args.receiving_public_key.clone(),
        ledger_auth_token,
        tourney_url_template: args.tourney_url_template.clone(),
        confirm_interval: Duration::from_secs(args.confirm_interval_secs),
        pay_timeout: Duration::from_secs(args.pay_timeout_secs),
        scheduler_idle: Duration::from_secs(args.scheduler_idle_secs),
    })
}

async fn run<S>(store: S, gateway: HorizonGateway, config: ServiceConfig) -> Result<()>
where
    S: TourneyStore + Clone + Send + Sync + 'static,
{
    let confirmation = ConfirmationLoop::new(store.clone(), gateway.clone(), &config);
    tokio::spawn(confirmation.run());
    let scheduler = SchedulerLoop::new(store.clone(), gateway, &config);
    tokio::spawn(scheduler.run());

    let state = AppState {
        service: TourneyService::new(store),
        link_template: config.tourney_url_template.clone(),
    };
    let router = api::router(state);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "listening");
    axum::serve(listener, router.into_make_service())
        .await
        .context("server exited")?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let args = Args::parse();
    let config = build_config(&args)?;

    let mut gateway = HorizonGateway::new(&config.horizon_url, config.asset.clone())
        .context("invalid horizon URL")?;
    if let Some(token) = &config.ledger_auth_token {
        gateway = gateway.with_auth_token(token.clone());
    }

    match &config.redis_url {
        Some(url) => {
            let store = RedisStore::connect(url)
                .await
                .context("failed to connect to redis")?;
            run(store, gateway, config).await
        }
        None => {
            warn!("no redis URL configured, tourneys will not survive a restart");
            run(MemoryStore::new(), gateway, config).await
        }
    }
}
