//! Engine persistence through a [`LedgerStore`].
//!
//! Each record kind gets its own table. Keys are the bincode encoding of the
//! record's identity tuple, values the bincode encoding of the record. The
//! factory lives in the meta table.

use crate::bribe::{Bribe, BribeClaim, BribeClawback, BribeLedger};
use crate::clock::Factory;
use crate::commit::{EpochCommitEngine, EpochGauge, EpochVote, EpochVoterSnapshot};
use crate::engine::GaugeEngine;
use crate::error::VotingError;
use crate::registry::{Gauge, GaugeRegistry};
use crate::weights::{GaugeWeight, VoterBook, VoterWeightBook};
use gauge_store::{LedgerStore, StoreError, Table};
use serde::de::DeserializeOwned;
use serde::Serialize;

const FACTORY_KEY: &[u8] = b"factory";

fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, VotingError> {
    bincode::serialize(value).map_err(|e| VotingError::Serialization(e.to_string()))
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, VotingError> {
    bincode::deserialize(bytes).map_err(|e| VotingError::Serialization(e.to_string()))
}

fn put<K: Serialize, V: Serialize>(
    store: &dyn LedgerStore,
    table: Table,
    key: &K,
    value: &V,
) -> Result<(), VotingError> {
    store.put_record(table, &encode(key)?, &encode(value)?)?;
    Ok(())
}

fn load_table<T: DeserializeOwned>(
    store: &dyn LedgerStore,
    table: Table,
) -> Result<Vec<T>, VotingError> {
    store
        .iter_records(table)?
        .iter()
        .map(|(_, bytes)| decode(bytes))
        .collect()
}

impl GaugeEngine {
    /// Replace the store's contents with the full engine state.
    pub fn save_to_store(&self, store: &dyn LedgerStore) -> Result<(), VotingError> {
        for table in Table::ALL {
            store.clear_table(table)?;
        }
        store.put_meta(FACTORY_KEY, &encode(&self.factory)?)?;

        for g in self.registry.iter() {
            put(store, Table::Gauges, &g.target, g)?;
        }
        for b in self.book.books() {
            put(store, Table::VoterBooks, &b.voter, b)?;
        }
        for w in self.book.weights() {
            put(store, Table::GaugeWeights, &(w.voter, w.gauge), w)?;
        }
        for eg in self.epochs.epoch_gauges() {
            put(store, Table::EpochGauges, &(eg.gauge, eg.epoch), eg)?;
        }
        for s in self.epochs.voters() {
            put(store, Table::EpochVoters, &(s.voter, s.epoch), s)?;
        }
        for v in self.epochs.votes() {
            put(store, Table::EpochVotes, &(v.voter, v.gauge, v.epoch), v)?;
        }
        for b in self.bribes.bribes() {
            put(store, Table::Bribes, &b.id, b)?;
        }
        for c in self.bribes.claims() {
            put(store, Table::BribeClaims, &(c.voter, c.bribe, c.epoch), c)?;
        }
        for c in self.bribes.clawbacks() {
            put(store, Table::BribeClawbacks, &(c.bribe, c.epoch), c)?;
        }

        tracing::debug!(
            epoch = self.factory.current_epoch,
            gauges = self.registry.len(),
            "engine state saved"
        );
        Ok(())
    }

    /// Rebuild an engine from a store written by [`GaugeEngine::save_to_store`].
    pub fn load_from_store(store: &dyn LedgerStore) -> Result<Self, VotingError> {
        let factory: Factory = match store.get_meta(FACTORY_KEY)? {
            Some(bytes) => decode(&bytes)?,
            None => {
                return Err(StoreError::NotFound("factory".into()).into());
            }
        };

        let mut registry = GaugeRegistry::new();
        for g in load_table::<Gauge>(store, Table::Gauges)? {
            registry.restore(g);
        }

        let mut book = VoterWeightBook::new();
        for b in load_table::<VoterBook>(store, Table::VoterBooks)? {
            book.restore_book(b);
        }
        for w in load_table::<GaugeWeight>(store, Table::GaugeWeights)? {
            book.restore_weight(w);
        }

        let mut epochs = EpochCommitEngine::new();
        for eg in load_table::<EpochGauge>(store, Table::EpochGauges)? {
            epochs.restore_epoch_gauge(eg);
        }
        for s in load_table::<EpochVoterSnapshot>(store, Table::EpochVoters)? {
            epochs.restore_voter(s);
        }
        for v in load_table::<EpochVote>(store, Table::EpochVotes)? {
            epochs.restore_vote(v);
        }

        let mut bribes = BribeLedger::new();
        for b in load_table::<Bribe>(store, Table::Bribes)? {
            bribes.insert(b);
        }
        for c in load_table::<BribeClaim>(store, Table::BribeClaims)? {
            bribes.restore_claim(c);
        }
        for c in load_table::<BribeClawback>(store, Table::BribeClawbacks)? {
            bribes.restore_clawback(c);
        }

        tracing::debug!(
            epoch = factory.current_epoch,
            gauges = registry.len(),
            "engine state loaded"
        );
        Ok(Self {
            factory,
            registry,
            book,
            epochs,
            bribes,
        })
    }
}
