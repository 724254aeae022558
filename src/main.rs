use clap::Parser;
use lapin::{Connection, ConnectionProperties};
use miette::{IntoDiagnostic, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use userhub::application::balance::BalanceService;
use userhub::application::lookup::LookupService;
use userhub::domain::ports::{SharedUserCache, SharedUserStore};
use userhub::infrastructure::in_memory::{InMemoryUserCache, InMemoryUserStore};
use userhub::infrastructure::redis::RedisUserCache;
use userhub::interfaces::amqp::dispatcher::RpcDispatcher;
use userhub::interfaces::amqp::handlers::{ApplyTransaction, CheckBalance, ValidateUsers};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// AMQP broker address
    #[arg(long, env = "AMQP_ADDR", default_value = "amqp://127.0.0.1:5672/%2f")]
    amqp_addr: String,

    /// Redis URL for the user cache (optional). If absent, uses an in-process cache.
    #[arg(long, env = "REDIS_URL")]
    redis_url: Option<String>,

    /// Cache entry time-to-live in seconds
    #[arg(long, env = "CACHE_TTL_SECS", default_value_t = 300)]
    cache_ttl_secs: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    // Composition root: every service gets its collaborators here, once.
    let store: SharedUserStore = Arc::new(InMemoryUserStore::new());
    let cache: SharedUserCache = match &cli.redis_url {
        Some(url) => Arc::new(RedisUserCache::connect(url).await.into_diagnostic()?),
        None => Arc::new(InMemoryUserCache::new()),
    };

    let ttl = Duration::from_secs(cli.cache_ttl_secs);
    let lookup = Arc::new(LookupService::with_ttl(store.clone(), cache.clone(), ttl));
    let balance = Arc::new(BalanceService::new(store.clone(), cache.clone()));

    let conn = Connection::connect(&cli.amqp_addr, ConnectionProperties::default())
        .await
        .into_diagnostic()?;
    info!(addr = %cli.amqp_addr, "connected to broker");

    // One channel per queue; the consumer loops never share a lock.
    let validate = RpcDispatcher::bind(&conn).await.into_diagnostic()?;
    let check = RpcDispatcher::bind(&conn).await.into_diagnostic()?;
    let transactions = RpcDispatcher::bind(&conn).await.into_diagnostic()?;

    let validate_task = tokio::spawn(validate.serve(ValidateUsers::new(lookup.clone())));
    let check_task = tokio::spawn(check.serve(CheckBalance::new(lookup.clone())));
    let transactions_task = tokio::spawn(transactions.serve(ApplyTransaction::new(balance)));

    let (validate_result, check_result, transactions_result) =
        tokio::try_join!(validate_task, check_task, transactions_task).into_diagnostic()?;
    validate_result.into_diagnostic()?;
    check_result.into_diagnostic()?;
    transactions_result.into_diagnostic()?;

    Ok(())
}
