pub mod entry;
pub mod hash;
pub mod message;
pub mod metadata;

pub use entry::{EmptyResultNotice, TimelineEntry};
pub use hash::compute_twt_hash;
pub use message::{FormattedMessage, Span};
pub use metadata::{FeedKind, FeedMetadata, Link};
