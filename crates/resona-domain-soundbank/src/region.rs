use crate::connection::ConnectionBlock;
use crate::generator::{default_value, GeneratorId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Generator values and modulators of one instrument zone.
///
/// Values are signed 16-bit; an id that was never set reads as its
/// default. Ids outside the assigned table are stored like any other.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorRegion {
    generators: BTreeMap<GeneratorId, i16>,
    modulators: Vec<ConnectionBlock>,
}

impl GeneratorRegion {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: GeneratorId) -> bool {
        self.generators.contains_key(&id)
    }

    pub fn short(&self, id: GeneratorId) -> i16 {
        self.generators
            .get(&id)
            .copied()
            .unwrap_or_else(|| default_value(id))
    }

    pub fn set_short(&mut self, id: GeneratorId, value: i16) {
        self.generators.insert(id, value);
    }

    /// The stored bits zero-extended, for ids whose domain is unsigned.
    pub fn integer(&self, id: GeneratorId) -> u16 {
        self.short(id) as u16
    }

    /// Keeps the low 16 bits of `value`.
    pub fn set_integer(&mut self, id: GeneratorId, value: i32) {
        self.set_short(id, value as i16);
    }

    /// Little-endian wire form of the value.
    pub fn bytes(&self, id: GeneratorId) -> [u8; 2] {
        self.integer(id).to_le_bytes()
    }

    pub fn set_bytes(&mut self, id: GeneratorId, bytes: [u8; 2]) {
        self.set_short(id, i16::from_le_bytes(bytes));
    }

    /// `(lo, hi)` of a key or velocity range generator.
    pub fn range(&self, id: GeneratorId) -> (u8, u8) {
        let [lo, hi] = self.bytes(id);
        (lo, hi)
    }

    pub fn set_range(&mut self, id: GeneratorId, lo: u8, hi: u8) {
        self.set_bytes(id, [lo, hi]);
    }

    pub fn remove(&mut self, id: GeneratorId) -> Option<i16> {
        self.generators.remove(&id)
    }

    /// Explicitly set generators, ascending by id.
    pub fn generators(&self) -> impl Iterator<Item = (GeneratorId, i16)> + '_ {
        self.generators.iter().map(|(id, value)| (*id, *value))
    }

    pub fn generator_count(&self) -> usize {
        self.generators.len()
    }

    pub fn modulators(&self) -> &[ConnectionBlock] {
        &self.modulators
    }

    pub fn modulators_mut(&mut self) -> &mut Vec<ConnectionBlock> {
        &mut self.modulators
    }

    pub fn push_modulator(&mut self, block: ConnectionBlock) {
        self.modulators.push(block);
    }
}
