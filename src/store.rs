//! The minimal store interface the reader, writer and reset policy operate on, and an
//! in-memory implementation of it.

use std::collections::BTreeMap;

use crate::catalog::Namespace;
use crate::error::Error;

/// Item-level access to an NVRAM store.
///
/// Every call is a discrete request against the store, which is why even reads take
/// `&mut self`. Implementations hide any chunking needed for large values, a caller
/// only ever sees complete values.
pub trait NvramStore {
    /// Namespaces present in the store, in ascending id order.
    fn namespaces(&mut self) -> Result<Vec<Namespace>, Error>;

    /// Populated sub-ids of `namespace`, in ascending order.
    fn list_populated(&mut self, namespace: Namespace) -> Result<Vec<u16>, Error>;

    fn get(&mut self, namespace: Namespace, sub_id: u16) -> Result<Option<Vec<u8>>, Error>;

    /// Length of an item, `None` if it does not exist. Stores that can answer without
    /// reading the value should override this.
    fn length(&mut self, namespace: Namespace, sub_id: u16) -> Result<Option<usize>, Error> {
        Ok(self.get(namespace, sub_id)?.map(|value| value.len()))
    }

    /// Create or overwrite an item. Stores with fixed-size slots reject a value whose
    /// length differs from the existing item with [`Error::LengthMismatch`].
    fn set(&mut self, namespace: Namespace, sub_id: u16, value: &[u8]) -> Result<(), Error>;

    /// Delete an item. Missing items are ignored.
    fn delete(&mut self, namespace: Namespace, sub_id: u16) -> Result<(), Error>;

    /// The serialized network information base, if the store keeps one outside of the
    /// regular sub-id addressing.
    fn get_nib(&mut self) -> Result<Option<Vec<u8>>, Error> {
        Ok(None)
    }

    /// Forget the network information base returned by [`NvramStore::get_nib`].
    fn clear_nib(&mut self) -> Result<(), Error> {
        Ok(())
    }
}

impl<S: NvramStore + ?Sized> NvramStore for &mut S {
    fn namespaces(&mut self) -> Result<Vec<Namespace>, Error> {
        (**self).namespaces()
    }

    fn list_populated(&mut self, namespace: Namespace) -> Result<Vec<u16>, Error> {
        (**self).list_populated(namespace)
    }

    fn get(&mut self, namespace: Namespace, sub_id: u16) -> Result<Option<Vec<u8>>, Error> {
        (**self).get(namespace, sub_id)
    }

    fn length(&mut self, namespace: Namespace, sub_id: u16) -> Result<Option<usize>, Error> {
        (**self).length(namespace, sub_id)
    }

    fn set(&mut self, namespace: Namespace, sub_id: u16, value: &[u8]) -> Result<(), Error> {
        (**self).set(namespace, sub_id, value)
    }

    fn delete(&mut self, namespace: Namespace, sub_id: u16) -> Result<(), Error> {
        (**self).delete(namespace, sub_id)
    }

    fn get_nib(&mut self) -> Result<Option<Vec<u8>>, Error> {
        (**self).get_nib()
    }

    fn clear_nib(&mut self) -> Result<(), Error> {
        (**self).clear_nib()
    }
}

/// An NVRAM store held entirely in memory: namespace -> sub-id -> value.
///
/// With [`MemoryStore::with_fixed_slots`] it behaves like the device, where the length of
/// an item is fixed when it is created.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryStore {
    pub(crate) items: BTreeMap<Namespace, BTreeMap<u16, Vec<u8>>>,
    pub(crate) nib: Option<Vec<u8>>,
    pub(crate) fixed_slots: bool,
}

impl MemoryStore {
    /// Creates a store without any namespace.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding every given namespace, all of them empty.
    pub fn with_namespaces<I: IntoIterator<Item = Namespace>>(namespaces: I) -> Self {
        Self {
            items: namespaces
                .into_iter()
                .map(|namespace| (namespace, BTreeMap::new()))
                .collect(),
            ..Default::default()
        }
    }

    /// Reject writes that would change the length of an existing item.
    pub fn with_fixed_slots(mut self) -> Self {
        self.fixed_slots = true;
        self
    }

    /// Inserts a value directly, bypassing the fixed slot check.
    pub fn insert(&mut self, namespace: Namespace, sub_id: u16, value: impl Into<Vec<u8>>) {
        self.items
            .entry(namespace)
            .or_default()
            .insert(sub_id, value.into());
    }

    pub fn value(&self, namespace: Namespace, sub_id: u16) -> Option<&[u8]> {
        self.items
            .get(&namespace)
            .and_then(|items| items.get(&sub_id))
            .map(Vec::as_slice)
    }

    /// All items of a namespace, or `None` if the namespace does not exist.
    pub fn namespace(&self, namespace: Namespace) -> Option<&BTreeMap<u16, Vec<u8>>> {
        self.items.get(&namespace)
    }

    /// Makes sure `namespace` exists, even if it stays empty.
    pub fn add_namespace(&mut self, namespace: Namespace) {
        self.items.entry(namespace).or_default();
    }

    /// Total number of items over all namespaces.
    pub fn len(&self) -> usize {
        self.items.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn set_nib(&mut self, nib: Option<Vec<u8>>) {
        self.nib = nib;
    }

    pub fn nib(&self) -> Option<&[u8]> {
        self.nib.as_deref()
    }
}

impl NvramStore for MemoryStore {
    fn namespaces(&mut self) -> Result<Vec<Namespace>, Error> {
        Ok(self.items.keys().copied().collect())
    }

    fn list_populated(&mut self, namespace: Namespace) -> Result<Vec<u16>, Error> {
        Ok(self
            .items
            .get(&namespace)
            .map(|items| items.keys().copied().collect())
            .unwrap_or_default())
    }

    fn get(&mut self, namespace: Namespace, sub_id: u16) -> Result<Option<Vec<u8>>, Error> {
        Ok(self.value(namespace, sub_id).map(<[u8]>::to_vec))
    }

    fn length(&mut self, namespace: Namespace, sub_id: u16) -> Result<Option<usize>, Error> {
        Ok(self.value(namespace, sub_id).map(<[u8]>::len))
    }

    fn set(&mut self, namespace: Namespace, sub_id: u16, value: &[u8]) -> Result<(), Error> {
        let items = self.items.entry(namespace).or_default();

        if let Some(existing) = items.get(&sub_id) {
            if self.fixed_slots && existing.len() != value.len() {
                return Err(Error::LengthMismatch {
                    namespace,
                    sub_id,
                    stored: existing.len(),
                    new: value.len(),
                });
            }
        }

        items.insert(sub_id, value.to_vec());
        Ok(())
    }

    fn delete(&mut self, namespace: Namespace, sub_id: u16) -> Result<(), Error> {
        if let Some(items) = self.items.get_mut(&namespace) {
            items.remove(&sub_id);
        }
        Ok(())
    }

    fn get_nib(&mut self) -> Result<Option<Vec<u8>>, Error> {
        Ok(self.nib.clone())
    }

    fn clear_nib(&mut self) -> Result<(), Error> {
        self.nib = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_set_get_delete() {
        let mut store = MemoryStore::new();

        store.set(Namespace::Legacy, 0x0003, b"\x01").unwrap();
        assert_eq!(
            store.get(Namespace::Legacy, 0x0003).unwrap(),
            Some(vec![0x01])
        );
        assert_eq!(store.namespaces().unwrap(), vec![Namespace::Legacy]);

        store.delete(Namespace::Legacy, 0x0003).unwrap();
        assert_eq!(store.get(Namespace::Legacy, 0x0003).unwrap(), None);

        // deleting twice or in a missing namespace is fine
        store.delete(Namespace::Legacy, 0x0003).unwrap();
        store.delete(Namespace::AddrMgr, 0x0000).unwrap();
        assert_eq!(store.namespaces().unwrap(), vec![Namespace::Legacy]);
    }

    #[test]
    fn test_fixed_slots_reject_resize() {
        let mut store = MemoryStore::new().with_fixed_slots();
        store.insert(Namespace::Legacy, 0x0F00, vec![0xEE, 0xEE]);

        store.set(Namespace::Legacy, 0x0F00, b"\x01\x02").unwrap();
        let err = store.set(Namespace::Legacy, 0x0F00, b"\xFF").unwrap_err();
        assert!(matches!(
            err,
            Error::LengthMismatch {
                stored: 2,
                new: 1,
                ..
            }
        ));
        assert_eq!(store.value(Namespace::Legacy, 0x0F00), Some(&[0x01, 0x02][..]));
    }

    #[test]
    fn test_list_populated_is_sorted() {
        let mut store = MemoryStore::with_namespaces([Namespace::Legacy, Namespace::AddrMgr]);
        store.insert(Namespace::Legacy, 0x0300, b"b".to_vec());
        store.insert(Namespace::Legacy, 0x0001, b"a".to_vec());

        assert_eq!(
            store.list_populated(Namespace::Legacy).unwrap(),
            vec![0x0001, 0x0300]
        );
        assert!(store.list_populated(Namespace::AddrMgr).unwrap().is_empty());
        assert!(store.list_populated(Namespace::TclkTable).unwrap().is_empty());
        assert_eq!(store.len(), 2);
    }
}
