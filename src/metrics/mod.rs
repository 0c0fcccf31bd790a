pub mod feed;
pub mod policy;
pub mod snapshot;
pub mod stream;
pub mod view;

pub use feed::{ActiveFeed, LiveMetricsFeed, Observer, Subscription};
pub use snapshot::{MetricsSnapshot, HISTORY_LEN};
pub use view::DashboardView;
