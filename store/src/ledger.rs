use crate::StoreError;
use serde::{Deserialize, Serialize};

/// Record tables persisted by the voting engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Table {
    Gauges,
    VoterBooks,
    GaugeWeights,
    EpochGauges,
    EpochVoters,
    EpochVotes,
    Bribes,
    BribeClaims,
    BribeClawbacks,
}

impl Table {
    pub const ALL: [Table; 9] = [
        Table::Gauges,
        Table::VoterBooks,
        Table::GaugeWeights,
        Table::EpochGauges,
        Table::EpochVoters,
        Table::EpochVotes,
        Table::Bribes,
        Table::BribeClaims,
        Table::BribeClawbacks,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Gauges => "gauges",
            Self::VoterBooks => "voter_books",
            Self::GaugeWeights => "gauge_weights",
            Self::EpochGauges => "epoch_gauges",
            Self::EpochVoters => "epoch_voters",
            Self::EpochVotes => "epoch_votes",
            Self::Bribes => "bribes",
            Self::BribeClaims => "bribe_claims",
            Self::BribeClawbacks => "bribe_clawbacks",
        }
    }
}

/// Store trait for persisting voting-engine records to durable storage.
///
/// Keys and values are opaque bytes so the store doesn't depend on the
/// `gauge-voting` crate. The engine encodes its own records.
pub trait LedgerStore {
    fn get_record(&self, table: Table, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError>;
    fn put_record(&self, table: Table, key: &[u8], value: &[u8]) -> Result<(), StoreError>;
    fn delete_record(&self, table: Table, key: &[u8]) -> Result<(), StoreError>;
    fn iter_records(&self, table: Table) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError>;

    /// Remove every record in `table`.
    fn clear_table(&self, table: Table) -> Result<(), StoreError>;

    fn get_meta(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError>;
    fn put_meta(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError>;
}
