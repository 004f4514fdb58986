#![allow(dead_code)]

// filename according to https://doc.rust-lang.org/book/ch11-03-test-organization.html
use std::collections::BTreeMap;
use std::fmt;

use strum::IntoEnumIterator;
use znp_nvram::{
    BackupDocument,
    Error,
    LegacyItem,
    Namespace,
    NvramDevice,
    TABLES,
};

/// Largest payload the simulated firmware accepts in one frame.
pub const FRAME_SIZE: usize = 244;

/// An in-memory Z-Stack: fixed-size items, frame-limited reads and writes and optional
/// fault injection.
pub struct Device {
    pub nvram: BTreeMap<Namespace, BTreeMap<u16, Vec<u8>>>,
    pub nib: Option<Vec<u8>>,
    pub supported: Vec<Namespace>,
    pub frame_size: usize,
    /// Every operation from this attempt on fails.
    pub fail_after_operation: usize,
    /// Only this attempt fails.
    pub fail_operation: Option<usize>,
    pub attempts: usize,
    pub operations: Vec<Operation>,
}

#[derive(Debug, PartialEq, Clone)]
pub enum Operation {
    Length { namespace: Namespace, sub_id: u16 },
    Read { namespace: Namespace, sub_id: u16, offset: usize, len: usize },
    Create { namespace: Namespace, sub_id: u16, len: usize },
    Write { namespace: Namespace, sub_id: u16, offset: usize, len: usize },
    Delete { namespace: Namespace, sub_id: u16 },
}

impl Operation {
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Operation::Create { .. } | Operation::Write { .. } | Operation::Delete { .. }
        )
    }
}

#[derive(Debug)]
pub struct DeviceError(pub String);

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "device error: {}", self.0)
    }
}

impl std::error::Error for DeviceError {}

fn device_error(message: impl Into<String>) -> Error {
    Error::transport(DeviceError(message.into()))
}

impl Device {
    fn empty(supported: Vec<Namespace>) -> Self {
        let mut device = Self {
            nvram: BTreeMap::new(),
            nib: None,
            supported,
            frame_size: FRAME_SIZE,
            fail_after_operation: usize::MAX,
            fail_operation: None,
            attempts: 0,
            operations: Vec::new(),
        };
        device.clear();
        device
    }

    /// Z-Stack 1.2 only has the legacy namespace.
    pub fn zstack12() -> Self {
        let mut device = Self::empty(vec![Namespace::Legacy]);
        device.populate_legacy();
        device
    }

    /// Z-Stack 3.x stores its tables in the extended namespaces.
    pub fn zstack3() -> Self {
        let mut device = Self::empty(Namespace::iter().collect());
        device.populate_legacy();

        let nvram = &mut device.nvram;
        let addr_mgr = nvram.entry(Namespace::AddrMgr).or_default();
        for index in 0..3u16 {
            addr_mgr.insert(index, vec![0x01, 0xFF, 0xFE, index as u8, 0, 0, 0, 0, 0, 0, 0, 0]);
        }
        let tclk = nvram.entry(Namespace::TclkTable).or_default();
        tclk.insert(0x0000, vec![0x00; 19]);
        tclk.insert(0x0001, vec![0x01; 19]);
        let sec_material = nvram.entry(Namespace::NwkSecMaterialTable).or_default();
        sec_material.insert(0x0000, vec![0x5A; 12]);

        device
    }

    pub fn all() -> Vec<Self> {
        vec![Self::zstack12(), Self::zstack3()]
    }

    fn populate_legacy(&mut self) {
        let legacy = self.nvram.entry(Namespace::Legacy).or_default();
        legacy.insert(LegacyItem::ExtAddr.id(), vec![0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88]);
        legacy.insert(LegacyItem::StartupOption.id(), vec![0x00]);
        legacy.insert(LegacyItem::Nib.id(), vec![0xAA; 116]);
        legacy.insert(LegacyItem::PanId.id(), vec![0x34, 0x12]);
        legacy.insert(LegacyItem::ChanList.id(), vec![0x00, 0x08, 0x00, 0x00]);
        legacy.insert(LegacyItem::NwkKey.id(), vec![0x0F; 24]);
        legacy.insert(LegacyItem::HasConfiguredZstack1.id(), vec![0x55]);
        legacy.insert(LegacyItem::HasConfiguredZstack3.id(), vec![0x55]);
        legacy.insert(0x0075, vec![0x01; 12]);
        legacy.insert(0x0111, vec![0x02; 19]);
        legacy.insert(0x0112, vec![0x03; 19]);

        self.nib = Some(vec![0xAA; 116]);
    }

    /// Removes every item, keeping the supported namespaces.
    pub fn clear(&mut self) {
        self.nvram = self
            .supported
            .iter()
            .map(|&namespace| (namespace, BTreeMap::new()))
            .collect();
    }

    pub fn item(&self, namespace: Namespace, sub_id: u16) -> Option<&Vec<u8>> {
        self.nvram.get(&namespace).and_then(|items| items.get(&sub_id))
    }

    pub fn legacy(&mut self) -> &mut BTreeMap<u16, Vec<u8>> {
        self.nvram.entry(Namespace::Legacy).or_default()
    }

    pub fn mutations(&self) -> usize {
        self.operations.iter().filter(|op| op.is_mutation()).count()
    }

    pub fn dump_operations(&self) {
        println!("Operations:");
        for op in &self.operations {
            println!("  {:?}", op);
        }
    }

    fn check_fault(&mut self) -> Result<(), Error> {
        let attempt = self.attempts;
        self.attempts += 1;

        if attempt >= self.fail_after_operation || self.fail_operation == Some(attempt) {
            println!("    device: FAULT #{attempt}");
            return Err(device_error(format!("fault injected at operation {attempt}")));
        }
        Ok(())
    }

    fn check_supported(&self, namespace: Namespace) -> Result<(), Error> {
        if self.supported.contains(&namespace) {
            Ok(())
        } else {
            Err(device_error(format!("{namespace} is not supported")))
        }
    }
}

impl NvramDevice for Device {
    fn supports(&mut self, namespace: Namespace) -> Result<bool, Error> {
        Ok(self.supported.contains(&namespace))
    }

    fn length(&mut self, namespace: Namespace, sub_id: u16) -> Result<Option<usize>, Error> {
        self.check_fault()?;
        self.check_supported(namespace)?;
        self.operations.push(Operation::Length { namespace, sub_id });

        Ok(self.item(namespace, sub_id).map(Vec::len))
    }

    fn read(
        &mut self,
        namespace: Namespace,
        sub_id: u16,
        offset: usize,
        max_len: usize,
    ) -> Result<Vec<u8>, Error> {
        self.check_fault()?;
        self.check_supported(namespace)?;
        println!("    device: read:  {namespace}/0x{sub_id:04X} @{offset} [{max_len}]");

        if max_len > self.frame_size {
            return Err(device_error("read exceeds frame size"));
        }
        let value = self
            .item(namespace, sub_id)
            .ok_or_else(|| device_error("read of missing item"))?;
        if offset >= value.len() {
            return Err(device_error("read offset out of bounds"));
        }
        let end = value.len().min(offset + max_len);
        let chunk = value[offset..end].to_vec();

        self.operations.push(Operation::Read {
            namespace,
            sub_id,
            offset,
            len: chunk.len(),
        });
        Ok(chunk)
    }

    fn create(&mut self, namespace: Namespace, sub_id: u16, len: usize) -> Result<(), Error> {
        self.check_fault()?;
        self.check_supported(namespace)?;
        println!("    device: create: {namespace}/0x{sub_id:04X} [{len}]");

        if self.item(namespace, sub_id).is_some() {
            return Err(device_error("item already exists"));
        }
        self.operations.push(Operation::Create {
            namespace,
            sub_id,
            len,
        });
        self.nvram
            .entry(namespace)
            .or_default()
            .insert(sub_id, vec![0x00; len]);
        Ok(())
    }

    fn write(
        &mut self,
        namespace: Namespace,
        sub_id: u16,
        offset: usize,
        data: &[u8],
    ) -> Result<(), Error> {
        self.check_fault()?;
        self.check_supported(namespace)?;
        println!(
            "    device: write: {namespace}/0x{sub_id:04X} @{offset} [{}]",
            data.len()
        );

        if data.len() > self.frame_size {
            return Err(device_error("write exceeds frame size"));
        }
        let value = self
            .nvram
            .get_mut(&namespace)
            .and_then(|items| items.get_mut(&sub_id))
            .ok_or_else(|| device_error("write to missing item"))?;
        if offset + data.len() > value.len() {
            return Err(device_error("write past the end of the item"));
        }
        value[offset..offset + data.len()].copy_from_slice(data);

        self.operations.push(Operation::Write {
            namespace,
            sub_id,
            offset,
            len: data.len(),
        });
        Ok(())
    }

    fn delete(&mut self, namespace: Namespace, sub_id: u16) -> Result<(), Error> {
        self.check_fault()?;
        self.check_supported(namespace)?;
        println!("    device: delete: {namespace}/0x{sub_id:04X}");

        let removed = self
            .nvram
            .get_mut(&namespace)
            .and_then(|items| items.remove(&sub_id));
        if removed.is_none() {
            return Err(device_error("delete of missing item"));
        }

        self.operations.push(Operation::Delete { namespace, sub_id });
        Ok(())
    }

    fn read_nib(&mut self) -> Result<Option<Vec<u8>>, Error> {
        self.check_fault()?;
        Ok(self.nib.clone())
    }

    fn clear_nib(&mut self) -> Result<(), Error> {
        self.check_fault()?;
        self.nib = None;
        Ok(())
    }
}

/// Expected backup of a device, built straight from its items.
pub fn dump_nvram(device: &Device) -> BackupDocument {
    let mut document = BackupDocument::new();

    for (namespace, items) in &device.nvram {
        document.add_namespace(namespace.name());

        for (&sub_id, value) in items {
            let name = if *namespace != Namespace::Legacy {
                format!("0x{sub_id:04X}")
            } else if let Some(table) = TABLES
                .iter()
                .find(|table| table.start <= sub_id && sub_id <= table.end)
            {
                format!("{}+{}", table.name, sub_id - table.start)
            } else {
                LegacyItem::from_repr(sub_id).unwrap().to_string()
            };

            document.insert(namespace.name(), name, hex::encode(value));
        }
    }

    if let Some(nib) = &device.nib {
        document.insert("LEGACY", "NIB", hex::encode(nib));
    }

    document
}
