//! Translation between `(namespace, sub_id)` addresses and the names used in backups.
//!
//! Legacy sub-ids render as their catalog item name, or as `TABLE_NAME+offset` when they
//! fall inside a table. Sub-ids of every other namespace render as `0xNNNN`.

use std::fmt;
use std::str::FromStr;

use crate::catalog::{
    self,
    LegacyItem,
    Namespace,
};
use crate::error::Error;

const TABLE_OFFSET_SEPARATOR: char = '+';

/// The resolved name of a single sub-id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Name {
    /// A discrete item. For non-legacy namespaces this is the `0xNNNN` index.
    Item(String),
    /// Element `offset` of the legacy table starting at `table`.
    TableElement { table: &'static str, offset: u16 },
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Item(name) => f.write_str(name),
            Self::TableElement { table, offset } => {
                write!(f, "{table}{TABLE_OFFSET_SEPARATOR}{offset}")
            }
        }
    }
}

/// Resolve a raw address to its name.
pub fn resolve(namespace: Namespace, sub_id: u16) -> Result<Name, Error> {
    if namespace != Namespace::Legacy {
        return Ok(Name::Item(format!("0x{sub_id:04X}")));
    }

    if let Some(table) = catalog::table_containing(sub_id) {
        return Ok(Name::TableElement {
            table: table.name,
            offset: sub_id - table.start,
        });
    }

    LegacyItem::from_repr(sub_id)
        .map(|item| Name::Item(item.name().to_string()))
        .ok_or_else(|| Error::UnknownIdentifier(format!("{namespace}/0x{sub_id:04X}")))
}

/// Resolve a name produced by [`resolve`] back to its sub-id.
///
/// A name containing `+` is always a table element reference, even if the part before
/// the last `+` happens to be an item name.
pub fn unresolve(namespace: Namespace, name: &str) -> Result<u16, Error> {
    let unknown = || Error::UnknownIdentifier(format!("{namespace}/{name}"));

    if namespace != Namespace::Legacy {
        return parse_index(name).ok_or_else(unknown);
    }

    if let Some((table_name, offset)) = name.rsplit_once(TABLE_OFFSET_SEPARATOR) {
        catalog::ensure_valid();

        let table = catalog::table_by_name(table_name).ok_or_else(unknown)?;
        let offset = u16::from_str(offset).map_err(|_| unknown())?;
        if offset > table.end - table.start {
            return Err(unknown());
        }
        return Ok(table.start + offset);
    }

    LegacyItem::from_str(name)
        .map(LegacyItem::id)
        .map_err(|_| unknown())
}

/// Parses exactly the `0xNNNN` form [`resolve`] renders: four upper-case hex digits.
fn parse_index(name: &str) -> Option<u16> {
    let digits = name.strip_prefix("0x")?;
    if digits.len() != 4
        || !digits
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'A'..=b'F').contains(&b))
    {
        return None;
    }
    u16::from_str_radix(digits, 16).ok()
}
