//! Registry entry resolution
//!
//! Produces one authoritative availability/ownership/expiry record per name by
//! snapshotting the permanent registrar. A legacy auction registrar slot is
//! kept in the merged view for interoperability, but no legacy source is
//! fetched: the deployed networks never populate one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;

use crate::namehash::{is_encoded_labelhash, label_hash};
use crate::rpc::RegistryRpc;
use crate::session::Session;
use crate::utils::to_datetime;
use crate::{Address, TnsError, TnsResult};

/// Merged view of a name's registration status
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrarEntry {
    /// Whether the name can currently be registered
    pub available: Option<bool>,
    /// Registration expiry
    pub name_expires: Option<DateTime<Utc>>,
    /// Current registrant under the permanent registrar
    pub registrant: Option<Address>,
    /// Registry-wide grace period, in seconds
    pub grace_period: Option<u64>,
    /// Whether the name is governed by the permanent registrar: either it has
    /// a current owner, or it sits inside its post-expiry grace window
    pub is_new_registrar: bool,
    /// End of the grace window, set only while the name is inside it
    pub grace_period_end: Option<DateTime<Utc>>,
    /// Legacy registrar transfer deadline; always unset on current networks
    pub transfer_end: Option<DateTime<Utc>>,
    /// Block time the entry was computed at
    pub current_block_time: DateTime<Utc>,
}

/// Snapshot of the permanent registrar's view of one label
#[derive(Debug, Clone)]
struct PermanentSnapshot {
    available: bool,
    name_expires: Option<u64>,
    grace_period: u64,
    owner: Option<Address>,
}

/// Resolves registry entries for single labels
pub struct EntryResolver<R: RegistryRpc> {
    session: Session<R>,
    // Registry-wide constant, fetched once per resolver instance
    grace_period: OnceCell<u64>,
}

impl<R: RegistryRpc> EntryResolver<R> {
    /// Create a resolver over a session
    pub fn new(session: Session<R>) -> Self {
        Self { session, grace_period: OnceCell::new() }
    }

    /// The registry's grace period constant, in seconds
    pub async fn grace_period(&self) -> TnsResult<u64> {
        self.grace_period
            .get_or_try_init(|| async {
                let period = self.session.rpc().grace_period().await?;
                tracing::debug!(grace_period = period, "fetched registry grace period");
                Ok::<u64, TnsError>(period)
            })
            .await
            .copied()
    }

    async fn permanent_snapshot(&self, label: &str) -> TnsResult<PermanentSnapshot> {
        let hash = label_hash(label)?;
        let rpc = self.session.rpc();

        // Encoded labels can only be checked by hash; plain labels go through
        // the controller, which applies extra validity rules the low-level
        // registrar does not.
        let (available, expires, grace_period) = if is_encoded_labelhash(label) {
            tokio::join!(
                async { rpc.registrar_available(hash).await.map_err(TnsError::from) },
                async { rpc.name_expires(hash).await.map_err(TnsError::from) },
                self.grace_period(),
            )
        } else {
            tokio::join!(
                async { rpc.controller_available(label).await.map_err(TnsError::from) },
                async { rpc.name_expires(hash).await.map_err(TnsError::from) },
                self.grace_period(),
            )
        };
        let available = available?;
        let expires = expires?;
        let grace_period = grace_period?;

        // Kept separate from the snapshot fan-out: owner_of reverts for
        // unregistered names, and that failure means "no current owner"
        // rather than a resolution error.
        let owner = match rpc.owner_of(hash).await {
            Ok(addr) if !addr.is_zero() => Some(addr),
            Ok(_) => None,
            Err(e) => {
                tracing::debug!(label, error = %e, "owner_of reverted, treating as unowned");
                None
            }
        };

        Ok(PermanentSnapshot {
            available,
            name_expires: (expires > 0).then_some(expires),
            grace_period,
            owner,
        })
    }

    /// Resolve the authoritative entry for a label.
    ///
    /// Block time and the registrar snapshot are fetched concurrently. A name
    /// with a current owner is registered under the permanent registrar; an
    /// expired name whose grace window is still open remains exclusively
    /// renewable by its prior owner, judged against block time so the answer
    /// stays consistent with on-chain state.
    pub async fn resolve_entry(&self, label: &str) -> TnsResult<RegistrarEntry> {
        let (block, snapshot) = tokio::join!(
            async { self.session.rpc().latest_block().await.map_err(TnsError::from) },
            self.permanent_snapshot(label),
        );
        Ok(merge_entry(block?.timestamp, &snapshot?))
    }

    /// Resolve a name to its `addr` record
    pub async fn resolve_address(&self, name: &str) -> TnsResult<Address> {
        self.session.resolved_address(name).await
    }

    /// Resolve a text record of a name
    pub async fn text_record(&self, name: &str, key: &str) -> TnsResult<String> {
        self.session.text_record(name, key).await
    }
}

/// Merge the permanent registrar snapshot into the authoritative entry.
///
/// `block_timestamp` must be block time, not client wall-clock time; the
/// grace-window comparison has to agree with what the contracts would decide.
fn merge_entry(block_timestamp: u64, snapshot: &PermanentSnapshot) -> RegistrarEntry {
    let mut entry = RegistrarEntry {
        available: Some(snapshot.available),
        name_expires: snapshot.name_expires.map(to_datetime),
        registrant: None,
        grace_period: Some(snapshot.grace_period),
        is_new_registrar: false,
        grace_period_end: None,
        transfer_end: None,
        current_block_time: to_datetime(block_timestamp),
    };

    if let Some(owner) = snapshot.owner {
        entry.registrant = Some(owner);
        entry.is_new_registrar = true;
    } else if let Some(expires) = snapshot.name_expires {
        let grace_end = expires + snapshot.grace_period;
        if block_timestamp > expires && block_timestamp < grace_end {
            entry.is_new_registrar = true;
            entry.grace_period_end = Some(to_datetime(grace_end));
        }
    }

    entry
}
