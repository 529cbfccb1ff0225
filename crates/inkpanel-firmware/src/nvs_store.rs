//! NVS-backed key-value store.

use esp_idf_svc::nvs::{EspDefaultNvsPartition, EspNvs, NvsDefault};
use inkpanel_core::{KeyValueStore, StoreError};

pub const NAMESPACE: &str = "inkpanel";

pub struct NvsStore {
    nvs: EspNvs<NvsDefault>,
}

impl NvsStore {
    pub fn open(partition: EspDefaultNvsPartition) -> Result<Self, StoreError> {
        let nvs = EspNvs::new(partition, NAMESPACE, true)
            .map_err(|err| StoreError::Unavailable(err.to_string()))?;
        Ok(Self { nvs })
    }

    /// Return `key`, writing `default` first if the key is absent.
    pub fn get_or_seed(&mut self, key: &str, default: &str) -> Result<String, StoreError> {
        if let Some(value) = self.get_string(key)? {
            return Ok(value);
        }
        log::info!("{} key not present, seeding from build config", key);
        self.set_string(key, default)?;
        self.commit()?;
        Ok(default.to_string())
    }
}

impl KeyValueStore for NvsStore {
    fn contains(&self, key: &str) -> Result<bool, StoreError> {
        self.nvs.contains(key).map_err(|err| StoreError::Read {
            key: key.to_owned(),
            reason: err.to_string(),
        })
    }

    fn get_string(&self, key: &str) -> Result<Option<String>, StoreError> {
        let read_err = |err: esp_idf_svc::sys::EspError| StoreError::Read {
            key: key.to_owned(),
            reason: err.to_string(),
        };
        let Some(len) = self.nvs.str_len(key).map_err(read_err)? else {
            return Ok(None);
        };
        let mut buf = vec![0u8; len];
        let value = self.nvs.get_str(key, &mut buf).map_err(read_err)?;
        Ok(value.map(|value| value.trim_end_matches('\0').to_owned()))
    }

    fn set_string(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.nvs.set_str(key, value).map_err(|err| StoreError::Write {
            key: key.to_owned(),
            reason: err.to_string(),
        })
    }

    fn erase(&mut self, key: &str) -> Result<(), StoreError> {
        self.nvs.remove(key).map(|_| ()).map_err(|err| StoreError::Write {
            key: key.to_owned(),
            reason: err.to_string(),
        })
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        // EspNvs commits inside every set and remove.
        Ok(())
    }
}
