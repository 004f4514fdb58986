//! The two reset policies: a soft reset that only makes Z-Stack forget its network on the
//! next boot, and a full reset that erases every item.

use bitflags::bitflags;
use tracing::{
    debug,
    info,
};

use crate::catalog::{
    LegacyItem,
    Namespace,
};
use crate::error::Error;
use crate::store::NvramStore;
use crate::writer;

bitflags! {
    /// Value of the `STARTUP_OPTION` item, evaluated by Z-Stack when it boots.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct StartupOptions: u8 {
        const CLEAR_CONFIG = 1 << 0;
        const CLEAR_STATE = 1 << 1;
        const AUTO_START = 1 << 2;
        const CLEAR_NWK_FRAME_COUNTER = 1 << 7;
    }
}

impl StartupOptions {
    pub fn serialize(self) -> [u8; 1] {
        [self.bits()]
    }

    /// Decode a stored value. Only a single byte is a valid encoding, unknown bits are kept.
    pub fn deserialize(data: &[u8]) -> Option<Self> {
        match data {
            [bits] => Some(Self::from_bits_retain(*bits)),
            _ => None,
        }
    }
}

/// Items that other host stacks write once they have configured the device.
pub const CONFIGURED_MARKERS: [LegacyItem; 2] = [
    LegacyItem::HasConfiguredZstack1,
    LegacyItem::HasConfiguredZstack3,
];

/// The only item left after a full reset. Z-Stack recreates it on its own right after
/// its NVRAM is wiped.
pub const SYNTHETIC_DEFAULT: LegacyItem = LegacyItem::PollRateOld16;

/// 16-bit little endian zero.
pub const SYNTHETIC_DEFAULT_VALUE: [u8; 2] = [0x00, 0x00];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetMode {
    /// Ask Z-Stack to clear its configuration and state on the next boot and drop the
    /// "configured" markers. Everything else is kept.
    Soft,
    /// Delete every item of every namespace, including the network information base.
    Full,
}

pub fn reset<S: NvramStore + ?Sized>(store: &mut S, mode: ResetMode) -> Result<(), Error> {
    match mode {
        ResetMode::Soft => soft_reset(store),
        ResetMode::Full => full_reset(store),
    }
}

fn soft_reset<S: NvramStore + ?Sized>(store: &mut S) -> Result<(), Error> {
    let options = StartupOptions::CLEAR_CONFIG | StartupOptions::CLEAR_STATE;
    writer::write_item(
        store,
        Namespace::Legacy,
        LegacyItem::StartupOption.id(),
        &options.serialize(),
    )?;

    for marker in CONFIGURED_MARKERS {
        debug!("deleting {marker}");
        store.delete(Namespace::Legacy, marker.id())?;
    }

    info!("soft reset done, startup options set to {options:?}");
    Ok(())
}

fn full_reset<S: NvramStore + ?Sized>(store: &mut S) -> Result<(), Error> {
    let mut deleted = 0;

    for namespace in store.namespaces()? {
        for sub_id in store.list_populated(namespace)? {
            debug!("deleting {namespace}/0x{sub_id:04X}");
            store.delete(namespace, sub_id)?;
            deleted += 1;
        }
    }
    store.clear_nib()?;

    store.set(
        Namespace::Legacy,
        SYNTHETIC_DEFAULT.id(),
        &SYNTHETIC_DEFAULT_VALUE,
    )?;

    info!("full reset done, deleted {deleted} items");
    Ok(())
}
