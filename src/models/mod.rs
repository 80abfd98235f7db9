pub mod detection;
pub mod session;
pub mod snapshot;

pub use detection::{AnimalType, Classification, DetectionEvent, NotificationScope};
pub use session::{UserProfile, UserSession};
pub use snapshot::{AnimalCounts, DeltaEvent, DetectionSnapshot};
