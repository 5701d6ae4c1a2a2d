// Pipeline processing: pure table transformations, no IO

pub mod clean;
pub mod features;
pub mod merge;
pub mod stats;

pub use clean::{clean, CleanOptions, CleanOutcome, CleanReport};
pub use features::{engineer_features, FeatureOptions, FeatureOutcome, FeatureReport};
pub use merge::{merge_partitions, MergeOutcome, MergeReport, RawPartition};
