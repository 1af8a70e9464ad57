// Serializable copy of every offset table
//
// Persistence itself belongs to the settings store; this is the raw
// read/write surface it serializes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::channel::SensorChannel;
use crate::compensation::context::CompensationContext;
use crate::error::{log_compensation_error, CompensationError};

/// Offsets (µm) of every configured channel plus the winter flag
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OffsetSnapshot {
    #[serde(default)]
    pub is_winter: bool,
    pub tables: BTreeMap<SensorChannel, Vec<i16>>,
}

impl CompensationContext {
    /// Copy out every table
    pub fn snapshot(&self) -> OffsetSnapshot {
        OffsetSnapshot {
            is_winter: self.is_winter,
            tables: self
                .tables
                .iter()
                .map(|(&channel, table)| (channel, table.offsets().to_vec()))
                .collect(),
        }
    }

    /// Load tables from a snapshot
    ///
    /// Every entry is checked before anything is written, so a rejected
    /// snapshot leaves the context unchanged. Channels missing from the
    /// snapshot keep their current offsets.
    ///
    /// # Errors
    /// * `UnsupportedChannel` - snapshot names a channel that is not configured
    /// * `SnapshotMismatch` - a table length differs from the configured capacity
    pub fn restore(&mut self, snapshot: &OffsetSnapshot) -> Result<(), CompensationError> {
        for (&channel, offsets) in &snapshot.tables {
            let table = self
                .tables
                .get(&channel)
                .ok_or(CompensationError::UnsupportedChannel { channel })
                .inspect_err(|err| log_compensation_error(err, "restore"))?;

            if table.capacity() != offsets.len() {
                let err = CompensationError::SnapshotMismatch {
                    channel,
                    expected: table.capacity(),
                    found: offsets.len(),
                };
                log_compensation_error(&err, "restore");
                return Err(err);
            }
        }

        for (channel, offsets) in &snapshot.tables {
            if let Some(table) = self.tables.get_mut(channel) {
                table.offsets_mut().copy_from_slice(offsets);
            }
        }
        self.set_winter_mode(snapshot.is_winter);
        Ok(())
    }
}
