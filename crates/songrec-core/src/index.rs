//! Fingerprint index
//!
//! Append-only multimap from fingerprint address to the couples observed at
//! that address. Each address is one document in the `fingerprints`
//! collection:
//!
//! ```text
//! { _id: <address>, couples: [ { anchorTimeMs, songID }, ... ] }
//! ```
//!
//! Appends go through a single upsert-with-push per address, so concurrent
//! writers to the same address never lose couples. Nothing spans addresses:
//! a batch read running next to writers may see some addresses before and
//! others after a concurrent append.

use std::collections::HashMap;
use std::sync::Arc;

use songrec_db::models::{self, CoupleDocument, FingerprintDocument, COUPLES_FIELD, FINGERPRINTS_COLLECTION};
use songrec_db::{DocumentStore, Filter, StoreError};

use crate::error::IndexError;
use crate::types::{Couple, FingerprintAddress};

#[cfg(test)]
mod tests;

pub struct FingerprintIndex {
    store: Arc<dyn DocumentStore>,
}

impl FingerprintIndex {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Append every address's couples to its bucket, creating buckets as
    /// needed.
    ///
    /// Stops at the first failing address and reports it; buckets written
    /// before the failure are not rolled back. Addresses are visited in no
    /// particular order.
    pub async fn store_fingerprints(
        &self,
        fingerprints: &HashMap<FingerprintAddress, Vec<Couple>>,
    ) -> Result<(), IndexError> {
        for (&address, couples) in fingerprints {
            if couples.is_empty() {
                continue;
            }

            let items = couples
                .iter()
                .map(|&couple| models::encode_bson(&CoupleDocument::from(couple)))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|source| IndexError::Store { address, source })?;

            self.store
                .push_upsert(FINGERPRINTS_COLLECTION, models::id_key(address), COUPLES_FIELD, items)
                .await
                .map_err(|source| IndexError::Store { address, source })?;
        }

        log::debug!("Stored fingerprints for {} addresses", fingerprints.len());
        Ok(())
    }

    /// Fetch the buckets of `addresses`.
    ///
    /// Addresses without a bucket are left out of the result. Couples keep
    /// their append order. A bucket that does not decode fails the whole
    /// call. The result is not a snapshot across addresses.
    pub async fn get_couples(
        &self,
        addresses: &[FingerprintAddress],
    ) -> Result<HashMap<FingerprintAddress, Vec<Couple>>, IndexError> {
        let mut couples = HashMap::with_capacity(addresses.len());

        for &address in addresses {
            if couples.contains_key(&address) {
                continue;
            }

            let document = match self
                .store
                .find_one(FINGERPRINTS_COLLECTION, &Filter::id(models::id_key(address)))
                .await
            {
                Ok(Some(document)) => document,
                Ok(None) => continue,
                // The row exists but the backend cannot turn it into a document
                Err(StoreError::InvalidDocument { reason, .. }) => return Err(corrupt(address, reason)),
                Err(source) => return Err(IndexError::Fetch { address, source }),
            };

            let bucket: FingerprintDocument =
                models::decode(document).map_err(|e| corrupt(address, e))?;

            couples.insert(address, bucket.couples.into_iter().map(Couple::from).collect());
        }

        Ok(couples)
    }

    /// Irreversibly delete every bucket
    pub async fn drop_all(&self) -> Result<(), IndexError> {
        self.store
            .drop_collection(FINGERPRINTS_COLLECTION)
            .await
            .map_err(IndexError::Drop)?;
        log::info!("Dropped collection '{}'", FINGERPRINTS_COLLECTION);
        Ok(())
    }
}

fn corrupt(address: FingerprintAddress, reason: impl ToString) -> IndexError {
    let reason = reason.to_string();
    log::warn!("Corrupt fingerprint bucket at address {}: {}", address, reason);
    IndexError::CorruptRecord { address, reason }
}
