//! Persistent key-value storage seam (NVS on the device).

use crate::error::StoreError;

pub trait KeyValueStore: Send {
    fn contains(&self, key: &str) -> Result<bool, StoreError>;
    fn get_string(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set_string(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
    fn erase(&mut self, key: &str) -> Result<(), StoreError>;
    /// Flush pending writes. Writes are durable only after a commit.
    fn commit(&mut self) -> Result<(), StoreError>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Box<S> {
    fn contains(&self, key: &str) -> Result<bool, StoreError> {
        (**self).contains(key)
    }

    fn get_string(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get_string(key)
    }

    fn set_string(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set_string(key, value)
    }

    fn erase(&mut self, key: &str) -> Result<(), StoreError> {
        (**self).erase(key)
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        (**self).commit()
    }
}
