pub mod discrepancy;
pub mod engine;
pub mod lookup;
pub mod outcome;
pub mod router;

pub use discrepancy::{DiscrepancyChecks, DiscrepancyDecision, DiscrepancyOutcome};
pub use engine::{classify_run, classify_well, RunOptions};
pub use lookup::{CategoryLookup, Resolution};
pub use outcome::{ClassifiedWell, Diagnostics, MissingKey, MixStats, RunResult, RunSummary};
pub use router::{route, Bucket, RoutingTable};
