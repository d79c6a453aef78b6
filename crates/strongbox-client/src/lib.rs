//! Client side of Strongbox.
//!
//! - [`RpcClient`]: typed calls against the server's JSON-RPC endpoint
//! - [`SecretCache`]: local plaintext copy of the user's secrets
//! - [`Synchronizer`]: brings the cache in line with the server
//! - [`OfflineFallback`]: serves reads from the cache when the server is down

pub mod cache;
pub mod error;
pub mod fallback;
pub mod remote;
pub mod sync;

pub use cache::{CacheError, SecretCache};
pub use error::{ClientError, Result};
pub use fallback::{Fetched, OfflineFallback, Source};
pub use remote::{RemoteSecrets, RpcClient};
pub use sync::{SyncError, SyncReport, SyncStage, Synchronizer};
