pub mod bucketing;
pub mod diversity;
pub mod exploration;
pub mod media;
pub mod orchestrator;
pub mod ranking;
pub mod remote;
pub mod telemetry;

pub use bucketing::BucketAssigner;
pub use diversity::ExposureBalancer;
pub use exploration::ColdStartAnnotator;
pub use media::{MediaCache, PrefetchCoordinator, SharedMediaCache};
pub use orchestrator::{RankerOrchestrator, RankingPath};
pub use ranking::{IdentityStrategy, ScoringEngine, Ucb1Strategy};
pub use remote::{HttpRemoteRanker, RemoteRanker};
pub use telemetry::{LogTelemetry, Telemetry};
