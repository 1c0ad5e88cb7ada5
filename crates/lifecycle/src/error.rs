use hirely_core::error::CoreError;
use hirely_db::StoreError;

/// Errors surfaced by lifecycle operations.
///
/// Guard failures and duplicates are not errors; they come back as
/// `false` or `None`.
#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Core(#[from] CoreError),
}
