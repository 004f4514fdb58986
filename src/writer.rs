//! Restoring a backup document onto a store.
//!
//! Items on the device keep the length they were created with, so a value whose length
//! changed cannot be written over the old one: the item is deleted and created again.

use std::collections::BTreeSet;
use std::str::FromStr;

use tracing::{
    debug,
    info,
};

use crate::backup::BackupDocument;
use crate::catalog::Namespace;
use crate::error::Error;
use crate::resolver;
use crate::store::NvramStore;

/// What [`write_item`] had to do to store a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The item did not exist.
    Created,
    /// The item existed with the same length.
    Overwritten,
    /// The item existed with another length and was recreated.
    Resized,
    /// The item already held exactly this value, nothing was written.
    Unchanged,
}

/// Per-outcome item counts of a [`restore`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RestoreSummary {
    pub created: usize,
    pub overwritten: usize,
    pub resized: usize,
    pub unchanged: usize,
}

impl RestoreSummary {
    pub fn total(&self) -> usize {
        self.created + self.overwritten + self.resized + self.unchanged
    }

    fn record(&mut self, outcome: WriteOutcome) {
        match outcome {
            WriteOutcome::Created => self.created += 1,
            WriteOutcome::Overwritten => self.overwritten += 1,
            WriteOutcome::Resized => self.resized += 1,
            WriteOutcome::Unchanged => self.unchanged += 1,
        }
    }
}

/// A fully resolved and decoded backup entry.
#[derive(Debug, Clone, PartialEq, Eq)]
struct PlannedWrite {
    namespace: Namespace,
    sub_id: u16,
    value: Vec<u8>,
}

/// Store `value` at `namespace`/`sub_id`, recreating the item if its length changes.
pub fn write_item<S: NvramStore + ?Sized>(
    store: &mut S,
    namespace: Namespace,
    sub_id: u16,
    value: &[u8],
) -> Result<WriteOutcome, Error> {
    let outcome = match store.length(namespace, sub_id)? {
        None => WriteOutcome::Created,
        Some(length) if length == value.len() => {
            // Only a value of the same length can be unchanged
            if store.get(namespace, sub_id)?.as_deref() == Some(value) {
                return Ok(WriteOutcome::Unchanged);
            }
            WriteOutcome::Overwritten
        }
        Some(_) => {
            store.delete(namespace, sub_id)?;
            WriteOutcome::Resized
        }
    };

    store.set(namespace, sub_id, value)?;
    Ok(outcome)
}

/// Apply every entry of `document` to `store`.
///
/// The whole document is resolved and decoded before the first write, so an unknown
/// name or a bad hex string leaves the store untouched. Items that are not part of the
/// document are left as they are.
pub fn restore<S: NvramStore + ?Sized>(
    store: &mut S,
    document: &BackupDocument,
) -> Result<RestoreSummary, Error> {
    let plan = plan(document)?;
    let mut summary = RestoreSummary::default();

    for write in &plan {
        let outcome = write_item(store, write.namespace, write.sub_id, &write.value)?;
        debug!(
            "{outcome:?} {}/0x{:04X} [{} bytes]",
            write.namespace,
            write.sub_id,
            write.value.len()
        );
        summary.record(outcome);
    }

    info!(
        "restored {} items: {} created, {} overwritten, {} resized, {} unchanged",
        summary.total(),
        summary.created,
        summary.overwritten,
        summary.resized,
        summary.unchanged
    );
    Ok(summary)
}

fn plan(document: &BackupDocument) -> Result<Vec<PlannedWrite>, Error> {
    let mut plan = Vec::with_capacity(document.len());
    let mut seen = BTreeSet::new();

    for (namespace_name, name, hex_value) in document.iter() {
        let namespace = Namespace::from_str(namespace_name)
            .map_err(|_| Error::UnknownIdentifier(namespace_name.to_string()))?;
        let sub_id = resolver::unresolve(namespace, name)?;
        if !seen.insert((namespace, sub_id)) {
            return Err(Error::MalformedBackup(format!(
                "{namespace_name}/{name} names 0x{sub_id:04X} a second time"
            )));
        }
        let value = hex::decode(hex_value).map_err(|e| {
            Error::MalformedBackup(format!("{namespace_name}/{name}: {e}"))
        })?;

        plan.push(PlannedWrite {
            namespace,
            sub_id,
            value,
        });
    }

    Ok(plan)
}
