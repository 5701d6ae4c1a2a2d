use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::types::{MergedRecord, RawRecord};

/// One language partition after loading
#[derive(Debug, Clone)]
pub struct RawPartition {
    /// Key the partition was configured under; becomes `language_source`
    pub language_source: String,
    pub records: Vec<RawRecord>,
}

/// Rows contributed by one partition
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartitionCount {
    pub language_source: String,
    pub rows: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergeReport {
    pub partitions: Vec<PartitionCount>,
    pub total_rows: usize,
}

#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub records: Vec<MergedRecord>,
    pub report: MergeReport,
}

/// Concatenate partitions in the given order, tagging every row with its
/// partition key. Nothing is dropped or deduplicated here.
#[instrument(skip_all, fields(partitions = partitions.len()))]
pub fn merge_partitions(partitions: Vec<RawPartition>) -> MergeOutcome {
    let total: usize = partitions.iter().map(|p| p.records.len()).sum();
    let mut records = Vec::with_capacity(total);
    let mut counts = Vec::with_capacity(partitions.len());

    for partition in partitions {
        debug!(
            "Merging {} rows from partition '{}'",
            partition.records.len(),
            partition.language_source
        );
        counts.push(PartitionCount {
            language_source: partition.language_source.clone(),
            rows: partition.records.len(),
        });
        let source = partition.language_source;
        records.extend(
            partition
                .records
                .into_iter()
                .map(|raw| MergedRecord::from_raw(raw, &source)),
        );
    }

    info!("Merged {} rows from {} partitions", records.len(), counts.len());

    MergeOutcome {
        report: MergeReport {
            partitions: counts,
            total_rows: records.len(),
        },
        records,
    }
}
