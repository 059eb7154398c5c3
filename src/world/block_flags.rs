use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Static classification bits for a block type.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct BlockFlags: u8 {
        const NONE = 0;
        const OPAQUE = 1 << 0;
        const TRANSPARENT = 1 << 1;
        const SOLID = 1 << 2;
        const LIQUID = 1 << 3;
        const FLORA = 1 << 4;
    }
}

impl BlockFlags {
    pub const fn opaque_solid() -> Self {
        Self::OPAQUE.union(Self::SOLID)
    }

    pub const fn see_through_solid() -> Self {
        Self::TRANSPARENT.union(Self::SOLID)
    }

    pub const fn liquid() -> Self {
        Self::TRANSPARENT.union(Self::LIQUID)
    }

    pub const fn flora() -> Self {
        Self::TRANSPARENT.union(Self::SOLID).union(Self::FLORA)
    }

    pub fn with_solid(self, value: bool) -> Self {
        if value {
            self | Self::SOLID
        } else {
            self & !Self::SOLID
        }
    }
}

bitflags! {
    /// Lifecycle state of a chunk; says nothing about block content.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct ChunkFlags: u8 {
        const LOADED = 1 << 0;
        const MODIFIED = 1 << 1;
        const DIRTY = 1 << 2;
    }
}
