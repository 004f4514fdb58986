//! Store images: the raw contents of an NVRAM store as CSV, used to emulate a device on
//! disk.
//!
//! ```text
//! namespace,sub_id,value
//! LEGACY,,
//! LEGACY,0x0003,03
//! LEGACY,NIB,02140500
//! ADDRMGR,,
//! ```
//!
//! A row with an empty `sub_id` and `value` declares a namespace, so empty namespaces
//! survive a round trip. The `NIB` row holds the network information base.

use std::fs;
use std::path::Path;
use std::str::FromStr;

use csv::Writer;

use crate::catalog::Namespace;
use crate::error::Error;
use crate::persist::write_atomic;
use crate::store::MemoryStore;

const NIB_ROW: &str = "NIB";

#[derive(Debug, serde::Deserialize)]
struct ImageRow {
    namespace: String,
    sub_id: String,
    value: String,
}

impl MemoryStore {
    /// Parse a store image from CSV content.
    pub fn from_image(content: &str) -> Result<Self, Error> {
        let mut store = MemoryStore::new();
        let mut reader = csv::Reader::from_reader(content.as_bytes());

        for result in reader.deserialize() {
            let row: ImageRow = result?;
            let namespace = Namespace::from_str(&row.namespace)
                .map_err(|_| Error::InvalidImage(format!("unknown namespace '{}'", row.namespace)))?;

            if row.sub_id.is_empty() {
                if !row.value.is_empty() {
                    return Err(Error::InvalidImage(format!(
                        "namespace row '{}' must not have a value",
                        row.namespace
                    )));
                }
                store.add_namespace(namespace);
                continue;
            }

            let value = hex::decode(row.value.trim()).map_err(|e| {
                Error::InvalidImage(format!("{}/{}: {}", row.namespace, row.sub_id, e))
            })?;

            if row.sub_id == NIB_ROW {
                if namespace != Namespace::Legacy {
                    return Err(Error::InvalidImage(
                        "the NIB belongs to the LEGACY namespace".to_string(),
                    ));
                }
                store.set_nib(Some(value));
                continue;
            }

            let sub_id = parse_sub_id(&row.sub_id)?;
            if store.value(namespace, sub_id).is_some() {
                return Err(Error::InvalidImage(format!(
                    "duplicate item {}/{}",
                    row.namespace, row.sub_id
                )));
            }
            store.insert(namespace, sub_id, value);
        }

        Ok(store)
    }

    pub fn from_image_file<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let content = fs::read_to_string(path)?;
        Self::from_image(&content)
    }

    /// Serialize the store to CSV. Namespaces and items are written in ascending id order.
    pub fn to_image(&self) -> Result<String, Error> {
        let mut wtr = Writer::from_writer(Vec::new());
        wtr.write_record(["namespace", "sub_id", "value"])?;

        for (namespace, items) in &self.items {
            let name = namespace.name();
            wtr.write_record([name, "", ""])?;

            if *namespace == Namespace::Legacy {
                if let Some(nib) = &self.nib {
                    wtr.write_record([name, NIB_ROW, hex::encode(nib).as_str()])?;
                }
            }

            for (sub_id, value) in items {
                let sub_id = format!("0x{sub_id:04X}");
                wtr.write_record([name, sub_id.as_str(), hex::encode(value).as_str()])?;
            }
        }

        // A NIB without any legacy item still needs its namespace
        if self.nib.is_some() && !self.items.contains_key(&Namespace::Legacy) {
            let name = Namespace::Legacy.name();
            wtr.write_record([name, "", ""])?;
            if let Some(nib) = &self.nib {
                wtr.write_record([name, NIB_ROW, hex::encode(nib).as_str()])?;
            }
        }

        wtr.flush()?;
        let bytes = wtr
            .into_inner()
            .map_err(|e| Error::Io(e.into_error()))?;
        String::from_utf8(bytes)
            .map_err(|e| Error::InvalidImage(format!("CSV output is not valid UTF-8: {}", e)))
    }

    /// Write the image to `path`, replacing the previous file atomically.
    pub fn to_image_file<P: AsRef<Path>>(&self, path: P) -> Result<(), Error> {
        write_atomic(path, self.to_image()?.as_bytes())
    }
}

fn parse_sub_id(s: &str) -> Result<u16, Error> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => s.parse::<u16>(),
    };
    parsed.map_err(|e| Error::InvalidImage(format!("invalid sub-id '{}': {}", s, e)))
}
