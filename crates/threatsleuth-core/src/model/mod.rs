/// Data model for the ThreatSleuth detection engine.
///
/// Re-exports the identity, threat, sample, and snapshot types.
pub mod identity;
pub mod sample;
pub mod snapshot;
pub mod threat;

pub use identity::FileIdentity;
pub use sample::{ConnectionSample, ConnectionStatus, ProcessSample};
pub use snapshot::SystemSnapshot;
pub use threat::{ThreatCategory, ThreatRecord};
