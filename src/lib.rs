//! Backup, restore and reset of the NVRAM of Z-Stack (ZNP) Zigbee coordinators.
//!
//! The device addresses its non-volatile items by `(namespace, sub_id)`. Backups name
//! every item instead, so they can be diffed and restored onto another device:
//!
//! ```json
//! {
//!   "LEGACY": {
//!     "STARTUP_OPTION": "00",
//!     "LEGACY_TCLK_TABLE_START+3": "0a0b0c..."
//!   },
//!   "TCLK_TABLE": {
//!     "0x0000": "..."
//!   }
//! }
//! ```
//!
//! [`dump`] reads a store into a [`BackupDocument`], [`restore`] writes one back and
//! [`reset`] clears a store. All of them work on anything implementing [`NvramStore`]:
//! a [`MemoryStore`], or a device speaking the frame-limited NVRAM commands wrapped in a
//! [`ChunkedStore`].

pub mod backup;
pub mod catalog;
pub mod device;
pub mod error;
pub mod reader;
pub mod reset;
pub mod resolver;
pub mod store;
pub mod writer;

mod image;
mod persist;

pub use backup::BackupDocument;
pub use catalog::{
    LegacyItem,
    LegacyTable,
    Namespace,
    TABLES,
};
pub use device::{
    ChunkedStore,
    NvramDevice,
    DEFAULT_FRAME_SIZE,
};
pub use error::Error;
pub use reader::dump;
pub use reset::{
    reset,
    ResetMode,
    StartupOptions,
};
pub use resolver::{
    resolve,
    unresolve,
    Name,
};
pub use store::{
    MemoryStore,
    NvramStore,
};
pub use writer::{
    restore,
    write_item,
    RestoreSummary,
    WriteOutcome,
};
