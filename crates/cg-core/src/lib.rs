pub mod error;
pub mod poll;

pub use error::{CoreError, Result as CoreResult};
pub use poll::poll_until;

use chrono::{DateTime, Utc};

/// Wall-clock timestamp used across every component snapshot.
pub type Timestamp = DateTime<Utc>;

/// Current wall-clock time.
pub fn now() -> Timestamp {
    Utc::now()
}
