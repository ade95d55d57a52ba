use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use persistcache::backend::RedisStore;
use persistcache::invalidation::InvalidatorManager;
use persistcache::stores::{AclResourcesStore, AncestorsStore, GroupsStore};
use persistcache::Config;
use persistcache_core::cache::KeyValueStore;
use persistcache_core::invalidation::{AnyInvalidateEvent, LifecyclePhase};

/// Inspect and invalidate the persistent authorization caches
#[derive(Parser, Debug)]
#[command(name = "persistcache")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Redis connection URL
    #[arg(long, env = "PERSISTENT_CACHE_REDIS_URL")]
    redis_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Dispatch invalidation events for a lifecycle phase
    Invalidate {
        /// Lifecycle phase: create, update or delete
        #[arg(long)]
        phase: LifecyclePhase,

        /// JSON array of events, e.g. '[{"name":"account","accountId":"acc-1"}]'
        #[arg(long)]
        events: String,
    },
    /// Print the cached ancestors of items
    Ancestors {
        #[arg(required = true)]
        item_ids: Vec<String>,
    },
    /// Print the cached usergroups of a user
    Groups {
        user_id: String,

        /// Only groups of this account
        #[arg(long)]
        account: Option<String>,
    },
    /// Print which resources have an ACL according to the account's cached set
    AclResources {
        account_id: String,

        #[arg(required = true)]
        resource_ids: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "persistcache=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::from_env();
    let redis_url = cli.redis_url.unwrap_or(config.redis_url);
    let store: Arc<dyn KeyValueStore> = Arc::new(
        RedisStore::connect(&redis_url)
            .await
            .with_context(|| format!("Failed to connect to {redis_url}"))?,
    );

    match cli.command {
        Command::Invalidate { phase, events } => {
            let events: Vec<AnyInvalidateEvent> =
                serde_json::from_str(&events).context("Invalid events JSON")?;
            InvalidatorManager::new(store)
                .invalidate(phase, &events)
                .await?;
            tracing::info!(%phase, count = events.len(), "Invalidated");
        }
        Command::Ancestors { item_ids } => {
            let result = AncestorsStore::new(store)
                .fetch_cached_ancestors(&item_ids)
                .await?;
            print_json(&serde_json::json!({
                "ancestors": result.ancestors,
                "notFoundIds": result.not_found_ids,
            }))?;
        }
        Command::Groups { user_id, account } => {
            let groups = GroupsStore::new(store)
                .get_groups(&user_id, account.as_deref())
                .await?;
            print_json(&groups)?;
        }
        Command::AclResources {
            account_id,
            resource_ids,
        } => {
            let store = AclResourcesStore::new(store);
            if !store.has_resource_ids_for_account(&account_id).await? {
                tracing::warn!(account_id = %account_id, "No cached resource ids for account");
            }
            let with_acl = store
                .filter_resource_ids_without_acl(&account_id, &resource_ids)
                .await?;
            print_json(&with_acl)?;
        }
    }

    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
