use tracing::{
    debug,
    info,
};

use crate::backup::BackupDocument;
use crate::catalog::{
    LegacyItem,
    Namespace,
};
use crate::error::Error;
use crate::resolver;
use crate::store::NvramStore;

/// Read every populated item of `store` into a backup document.
///
/// Every namespace the store reports is present in the document, even when empty. If
/// the store exposes a network information base it is recorded as `LEGACY`/`NIB`.
/// Fails with [`Error::UnknownIdentifier`] on the first sub-id that has no name instead
/// of producing a partial backup.
pub fn dump<S: NvramStore + ?Sized>(store: &mut S) -> Result<BackupDocument, Error> {
    let mut document = BackupDocument::new();

    for namespace in store.namespaces()? {
        document.add_namespace(namespace.name());

        for sub_id in store.list_populated(namespace)? {
            let name = resolver::resolve(namespace, sub_id)?;

            // Listed items only disappear if someone else writes to the store
            let Some(value) = store.get(namespace, sub_id)? else {
                debug!("{namespace}/{name} vanished while reading");
                continue;
            };

            debug!("read {namespace}/{name} [{} bytes]", value.len());
            document.insert(namespace.name(), name.to_string(), hex::encode(&value));
        }
    }

    if let Some(nib) = store.get_nib()? {
        debug!("read NIB [{} bytes]", nib.len());
        document.insert(
            Namespace::Legacy.name(),
            LegacyItem::Nib.name(),
            hex::encode(&nib),
        );
    }

    info!("read {} items", document.len());
    Ok(document)
}
