mod key;
mod query_cache;
mod retry;

pub use key::{QueryKey, MEALS_NAMESPACE, WEEKLY_MEMOS_NAMESPACE};
pub use query_cache::QueryCache;
pub use retry::{with_retries, RetryFailure, RetryPolicy};
