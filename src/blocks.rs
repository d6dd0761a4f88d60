use serde::{Deserialize, Serialize};

/// Raw block state as sent by the server: block id in the high 12 bits,
/// metadata in the low 4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct BlockState(pub u16);

pub const AIR: u16 = 0;
pub const TALL_GRASS: u16 = 31;
pub const DEAD_BUSH: u16 = 32;

impl BlockState {
    pub fn from_parts(id: u16, meta: u8) -> Self {
        Self((id << 4) | (meta as u16 & 0x0F))
    }

    pub fn id(&self) -> u16 {
        self.0 >> 4
    }

    pub fn meta(&self) -> u8 {
        (self.0 & 0x0F) as u8
    }

    /// Whether an entity can stand inside this block
    pub fn is_passable(&self) -> bool {
        matches!(self.id(), AIR | TALL_GRASS | DEAD_BUSH)
    }
}
