//! Unit serial numbers captured on a hardware tracking card.
//!
//! One serial per unit: the list is capped at the card's quantity and never
//! holds the same serial twice.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SerialListError {
    #[error("serial number is blank")]
    Blank,

    #[error("serial number '{0}' is already listed")]
    Duplicate(String),

    #[error("all {0} serial numbers are already entered")]
    CapacityReached(usize),

    #[error("serial number '{0}' is not listed")]
    NotFound(String),

    #[error("quantity {requested} is below the {listed} serial numbers already entered")]
    CapacityBelowLength { requested: usize, listed: usize },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerialNumberList {
    /// Maximum number of serials; `None` while the quantity is unknown.
    capacity: Option<usize>,
    serials: Vec<String>,
}

impl SerialNumberList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: Some(capacity),
            serials: Vec::new(),
        }
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    pub fn as_slice(&self) -> &[String] {
        &self.serials
    }

    pub fn len(&self) -> usize {
        self.serials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.serials.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.capacity.is_some_and(|cap| self.serials.len() >= cap)
    }

    /// Changes the cap. Lowering it below the number already listed is refused.
    pub fn set_capacity(
        &mut self,
        capacity: Option<usize>,
    ) -> Result<(), SerialListError> {
        if let Some(requested) = capacity.filter(|cap| *cap < self.serials.len()) {
            return Err(SerialListError::CapacityBelowLength {
                requested,
                listed: self.serials.len(),
            });
        }
        self.capacity = capacity;
        Ok(())
    }

    pub fn append(
        &mut self,
        serial: &str,
    ) -> Result<(), SerialListError> {
        let serial = serial.trim();
        if serial.is_empty() {
            return Err(SerialListError::Blank);
        }
        if self.serials.iter().any(|s| s == serial) {
            return Err(SerialListError::Duplicate(serial.to_string()));
        }
        if let Some(cap) = self.capacity.filter(|cap| self.serials.len() >= *cap) {
            return Err(SerialListError::CapacityReached(cap));
        }

        self.serials.push(serial.to_string());
        debug!(serial, count = self.serials.len(), "serial number added");
        Ok(())
    }

    pub fn remove(
        &mut self,
        serial: &str,
    ) -> Result<(), SerialListError> {
        let serial = serial.trim();
        let position = self
            .serials
            .iter()
            .position(|s| s == serial)
            .ok_or_else(|| SerialListError::NotFound(serial.to_string()))?;

        self.serials.remove(position);
        debug!(serial, count = self.serials.len(), "serial number removed");
        Ok(())
    }

    pub fn clear(&mut self) {
        self.serials.clear();
    }
}
