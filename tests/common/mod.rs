//! Shared setup for integration tests.

use once_cell::sync::OnceCell;
use tracing_subscriber::{fmt, EnvFilter};

use txprop::service::{user_services, FirstUserService};
use txprop::storage::InMemoryUserStore;
use txprop::transaction::TransactionManagerConfig;

static INITIALIZED: OnceCell<()> = OnceCell::new();

/// Install a test-writer subscriber once.
///
/// The level comes from `TEST_LOG`, then `RUST_LOG`, then `warn`.
pub fn init_logging() {
    INITIALIZED.get_or_init(|| {
        let filter = std::env::var("TEST_LOG")
            .or_else(|_| std::env::var("RUST_LOG"))
            .map(EnvFilter::new)
            .unwrap_or_else(|_| EnvFilter::new("warn"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .without_time()
            .try_init()
            .ok();
    });
}

/// Services on a store without savepoints (default config).
pub fn setup() -> (InMemoryUserStore, FirstUserService) {
    setup_with(TransactionManagerConfig::default(), false)
}

pub fn setup_with(
    config: TransactionManagerConfig,
    savepoints: bool,
) -> (InMemoryUserStore, FirstUserService) {
    init_logging();
    let store = InMemoryUserStore::with_savepoints(savepoints);
    let first = user_services(store.clone(), config);
    (store, first)
}
