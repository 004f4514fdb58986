//! Adapter from the frame-limited NVRAM commands of a Z-Stack device to [`NvramStore`].
//!
//! A single request or response frame carries at most a couple of hundred bytes, so
//! values are read and written in chunks. Items on the device have a fixed length that
//! is set when they are created.

use strum::IntoEnumIterator;
use tracing::{
    debug,
    trace,
    warn,
};

use crate::catalog::{
    self,
    Namespace,
};
use crate::error::Error;
use crate::store::NvramStore;

/// Largest item payload carried by one frame.
pub const DEFAULT_FRAME_SIZE: usize = 244;

/// The NVRAM commands offered by the device. One call is one request/response exchange.
///
/// Retries, framing and request correlation are the implementor's concern.
pub trait NvramDevice {
    /// Older firmware only knows the legacy namespace.
    fn supports(&mut self, namespace: Namespace) -> Result<bool, Error>;

    /// Length of an item, `None` if it does not exist.
    fn length(&mut self, namespace: Namespace, sub_id: u16) -> Result<Option<usize>, Error>;

    /// Read at most `max_len` bytes of an item starting at `offset`.
    fn read(
        &mut self,
        namespace: Namespace,
        sub_id: u16,
        offset: usize,
        max_len: usize,
    ) -> Result<Vec<u8>, Error>;

    /// Create a zero-filled item of `len` bytes.
    fn create(&mut self, namespace: Namespace, sub_id: u16, len: usize) -> Result<(), Error>;

    /// Overwrite part of an existing item.
    fn write(
        &mut self,
        namespace: Namespace,
        sub_id: u16,
        offset: usize,
        data: &[u8],
    ) -> Result<(), Error>;

    fn delete(&mut self, namespace: Namespace, sub_id: u16) -> Result<(), Error>;

    /// The network information base as kept in RAM by the running stack.
    fn read_nib(&mut self) -> Result<Option<Vec<u8>>, Error> {
        Ok(None)
    }

    /// Drop the network information base kept in RAM, so it does not outlive a wipe.
    fn clear_nib(&mut self) -> Result<(), Error> {
        Ok(())
    }
}

impl<D: NvramDevice + ?Sized> NvramDevice for &mut D {
    fn supports(&mut self, namespace: Namespace) -> Result<bool, Error> {
        (**self).supports(namespace)
    }

    fn length(&mut self, namespace: Namespace, sub_id: u16) -> Result<Option<usize>, Error> {
        (**self).length(namespace, sub_id)
    }

    fn read(
        &mut self,
        namespace: Namespace,
        sub_id: u16,
        offset: usize,
        max_len: usize,
    ) -> Result<Vec<u8>, Error> {
        (**self).read(namespace, sub_id, offset, max_len)
    }

    fn create(&mut self, namespace: Namespace, sub_id: u16, len: usize) -> Result<(), Error> {
        (**self).create(namespace, sub_id, len)
    }

    fn write(
        &mut self,
        namespace: Namespace,
        sub_id: u16,
        offset: usize,
        data: &[u8],
    ) -> Result<(), Error> {
        (**self).write(namespace, sub_id, offset, data)
    }

    fn delete(&mut self, namespace: Namespace, sub_id: u16) -> Result<(), Error> {
        (**self).delete(namespace, sub_id)
    }

    fn read_nib(&mut self) -> Result<Option<Vec<u8>>, Error> {
        (**self).read_nib()
    }

    fn clear_nib(&mut self) -> Result<(), Error> {
        (**self).clear_nib()
    }
}

/// Presents an [`NvramDevice`] as an [`NvramStore`], splitting and reassembling values
/// that do not fit in a single frame.
pub struct ChunkedStore<D: NvramDevice> {
    device: D,
    frame_size: usize,
}

impl<D: NvramDevice> ChunkedStore<D> {
    pub fn new(device: D) -> Self {
        Self {
            device,
            frame_size: DEFAULT_FRAME_SIZE,
        }
    }

    /// Use a different chunk size. Panics if `frame_size` is zero.
    pub fn with_frame_size(mut self, frame_size: usize) -> Self {
        assert!(frame_size > 0, "frame size must not be zero");
        self.frame_size = frame_size;
        self
    }

    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    fn write_chunks(&mut self, namespace: Namespace, sub_id: u16, value: &[u8]) -> Result<(), Error> {
        for (index, chunk) in value.chunks(self.frame_size).enumerate() {
            let offset = index * self.frame_size;
            trace!(
                "write chunk {namespace}/0x{sub_id:04X} @{offset} [{} bytes]",
                chunk.len()
            );
            self.device.write(namespace, sub_id, offset, chunk)?;
        }
        Ok(())
    }
}

impl<D: NvramDevice> NvramStore for ChunkedStore<D> {
    fn namespaces(&mut self) -> Result<Vec<Namespace>, Error> {
        let mut supported = Vec::new();
        for namespace in Namespace::iter() {
            if self.device.supports(namespace)? {
                supported.push(namespace);
            }
        }
        Ok(supported)
    }

    /// The device cannot enumerate its items, so they are probed: every catalogued legacy
    /// sub-id, and for the array-like namespaces every index up to the first missing one.
    fn list_populated(&mut self, namespace: Namespace) -> Result<Vec<u16>, Error> {
        if !self.device.supports(namespace)? {
            return Ok(Vec::new());
        }

        let mut populated = Vec::new();

        if namespace == Namespace::Legacy {
            for sub_id in catalog::legacy_sub_ids() {
                if self.device.length(namespace, sub_id)?.is_some() {
                    populated.push(sub_id);
                }
            }
        } else {
            for sub_id in 0..=u16::MAX {
                if self.device.length(namespace, sub_id)?.is_none() {
                    break;
                }
                populated.push(sub_id);
            }
        }

        debug!("{namespace}: {} populated items", populated.len());
        Ok(populated)
    }

    fn get(&mut self, namespace: Namespace, sub_id: u16) -> Result<Option<Vec<u8>>, Error> {
        let Some(length) = self.device.length(namespace, sub_id)? else {
            return Ok(None);
        };

        let mut value = Vec::with_capacity(length);
        while value.len() < length {
            let offset = value.len();
            let requested = self.frame_size.min(length - offset);
            let chunk = self.device.read(namespace, sub_id, offset, requested)?;
            trace!(
                "read chunk {namespace}/0x{sub_id:04X} @{offset} [{} bytes]",
                chunk.len()
            );

            if chunk.is_empty() || chunk.len() > requested {
                return Err(Error::transport(format!(
                    "read of {namespace}/0x{sub_id:04X} at offset {offset} returned {} bytes, expected up to {requested}",
                    chunk.len()
                )));
            }
            value.extend_from_slice(&chunk);
        }

        Ok(Some(value))
    }

    fn length(&mut self, namespace: Namespace, sub_id: u16) -> Result<Option<usize>, Error> {
        self.device.length(namespace, sub_id)
    }

    fn set(&mut self, namespace: Namespace, sub_id: u16, value: &[u8]) -> Result<(), Error> {
        match self.device.length(namespace, sub_id)? {
            None => self.device.create(namespace, sub_id, value.len())?,
            Some(stored) if stored != value.len() => {
                return Err(Error::LengthMismatch {
                    namespace,
                    sub_id,
                    stored,
                    new: value.len(),
                });
            }
            Some(_) => {}
        }

        if let Err(err) = self.write_chunks(namespace, sub_id, value) {
            // Never leave a half-written value behind for the next reader
            if let Err(cleanup) = self.device.delete(namespace, sub_id) {
                warn!("failed to delete partially written {namespace}/0x{sub_id:04X}: {cleanup}");
            }
            return Err(err);
        }

        Ok(())
    }

    fn delete(&mut self, namespace: Namespace, sub_id: u16) -> Result<(), Error> {
        if self.device.length(namespace, sub_id)?.is_none() {
            return Ok(());
        }
        self.device.delete(namespace, sub_id)
    }

    fn get_nib(&mut self) -> Result<Option<Vec<u8>>, Error> {
        self.device.read_nib()
    }

    fn clear_nib(&mut self) -> Result<(), Error> {
        self.device.clear_nib()
    }
}
