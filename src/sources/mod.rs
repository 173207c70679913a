//! Remote sources of version information.
//!
//! Sources are responsible for fetching and interpreting the
//! supported-versions index and the compiler release feeds.

pub mod cache;
pub mod defaults;
pub mod feed;
pub mod index;

pub use cache::{ArtifactCache, FetchError, FileCache};
pub use feed::{FeedError, NightlyFeedResolver, ReleaseFeed, StableFeedResolver};
pub use index::{RemoteVersionIndex, SupportedVersions, SupportedVersionsRecord};
