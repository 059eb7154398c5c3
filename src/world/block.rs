use crate::world::block_flags::BlockFlags;
use crate::world::blocks_data::{BlockProperties, BLOCK_TABLE};
use glam::IVec3;
use serde::{Deserialize, Serialize};

pub const MAX_LIGHT: u8 = 15;

/// Closed set of block identities. The discriminant is the on-disk ordinal.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BlockType {
    Air = 0,
    Stone,
    Grass,
    Dirt,
    Cobblestone,
    Bedrock,
    Sand,
    Gravel,
    Water,
    Lava,
    CoalOre,
    IronOre,
    GoldOre,
    RedstoneOre,
    LapisOre,
    DiamondOre,
    EmeraldOre,
    OakLog,
    SpruceLog,
    BirchLog,
    OakLeaves,
    SpruceLeaves,
    BirchLeaves,
    Planks,
    Sapling,
    Flower,
    Rose,
    DeadBush,
    Mushroom,
    MushroomBlock,
    SugarCane,
    Cactus,
    Glass,
    Tnt,
    CraftingTable,
    Furnace,
    Chest,
    Bookshelf,
    Fence,
    FenceGate,
    Door,
    Trapdoor,
    Torch,
    Ladder,
    Rail,
    Lever,
    Button,
    PressurePlate,
    Sign,
    Snow,
    Ice,
    Glowstone,
    Fire,
    JackOLantern,
    WhiteWool,
    OrangeWool,
    MagentaWool,
    LightBlueWool,
    YellowWool,
    LimeWool,
    PinkWool,
    GrayWool,
    LightGrayWool,
    CyanWool,
    PurpleWool,
    BlueWool,
    BrownWool,
    GreenWool,
    RedWool,
    BlackWool,
}

impl BlockType {
    pub const COUNT: usize = 70;

    pub const ALL: [BlockType; Self::COUNT] = [
        BlockType::Air,
        BlockType::Stone,
        BlockType::Grass,
        BlockType::Dirt,
        BlockType::Cobblestone,
        BlockType::Bedrock,
        BlockType::Sand,
        BlockType::Gravel,
        BlockType::Water,
        BlockType::Lava,
        BlockType::CoalOre,
        BlockType::IronOre,
        BlockType::GoldOre,
        BlockType::RedstoneOre,
        BlockType::LapisOre,
        BlockType::DiamondOre,
        BlockType::EmeraldOre,
        BlockType::OakLog,
        BlockType::SpruceLog,
        BlockType::BirchLog,
        BlockType::OakLeaves,
        BlockType::SpruceLeaves,
        BlockType::BirchLeaves,
        BlockType::Planks,
        BlockType::Sapling,
        BlockType::Flower,
        BlockType::Rose,
        BlockType::DeadBush,
        BlockType::Mushroom,
        BlockType::MushroomBlock,
        BlockType::SugarCane,
        BlockType::Cactus,
        BlockType::Glass,
        BlockType::Tnt,
        BlockType::CraftingTable,
        BlockType::Furnace,
        BlockType::Chest,
        BlockType::Bookshelf,
        BlockType::Fence,
        BlockType::FenceGate,
        BlockType::Door,
        BlockType::Trapdoor,
        BlockType::Torch,
        BlockType::Ladder,
        BlockType::Rail,
        BlockType::Lever,
        BlockType::Button,
        BlockType::PressurePlate,
        BlockType::Sign,
        BlockType::Snow,
        BlockType::Ice,
        BlockType::Glowstone,
        BlockType::Fire,
        BlockType::JackOLantern,
        BlockType::WhiteWool,
        BlockType::OrangeWool,
        BlockType::MagentaWool,
        BlockType::LightBlueWool,
        BlockType::YellowWool,
        BlockType::LimeWool,
        BlockType::PinkWool,
        BlockType::GrayWool,
        BlockType::LightGrayWool,
        BlockType::CyanWool,
        BlockType::PurpleWool,
        BlockType::BlueWool,
        BlockType::BrownWool,
        BlockType::GreenWool,
        BlockType::RedWool,
        BlockType::BlackWool,
    ];

    #[inline]
    pub fn ordinal(self) -> u16 {
        self as u16
    }

    /// Unknown ordinals have no block type; callers decide whether that is corruption.
    pub fn from_u16(value: u16) -> Option<Self> {
        Self::ALL.get(value as usize).copied()
    }

    #[inline]
    pub fn properties(self) -> &'static BlockProperties {
        &BLOCK_TABLE[self as usize]
    }

    pub fn name(self) -> &'static str {
        self.properties().name
    }

    #[inline]
    pub fn is_air(self) -> bool {
        self == BlockType::Air
    }

    #[inline]
    pub fn is_opaque(self) -> bool {
        self.properties().flags.contains(BlockFlags::OPAQUE)
    }

    #[inline]
    pub fn is_transparent(self) -> bool {
        self.properties().flags.contains(BlockFlags::TRANSPARENT)
    }

    #[inline]
    pub fn is_solid(self) -> bool {
        self.properties().flags.contains(BlockFlags::SOLID)
    }

    #[inline]
    pub fn is_liquid(self) -> bool {
        self.properties().flags.contains(BlockFlags::LIQUID)
    }

    #[inline]
    pub fn light_emission(self) -> u8 {
        self.properties().emission
    }

    pub fn hardness(self) -> f32 {
        self.properties().hardness
    }

    pub fn material(self) -> BlockMaterial {
        self.properties().material
    }

    pub fn texture(self, face: BlockFace) -> u16 {
        self.properties().textures.for_face(face)
    }

    /// How much sky light is lost passing down through this block.
    pub fn sky_attenuation(self) -> u8 {
        if self.is_air() {
            0
        } else if self.is_opaque() {
            MAX_LIGHT
        } else if self.is_liquid() {
            2
        } else {
            1
        }
    }

    pub fn tool_efficiency(self, tool: ToolKind) -> f32 {
        use BlockType::*;
        let preferred = match self {
            Stone | Cobblestone | CoalOre | IronOre | GoldOre | RedstoneOre | LapisOre
            | DiamondOre | EmeraldOre => ToolKind::Pickaxe,
            Dirt | Grass | Sand | Gravel | Snow => ToolKind::Shovel,
            OakLog | SpruceLog | BirchLog | Planks => ToolKind::Axe,
            _ => return 1.0,
        };
        if tool == preferred {
            1.5
        } else {
            1.0
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockMaterial {
    Air,
    Solid,
    Liquid,
    Transparent,
    Leaves,
    Fire,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ToolKind {
    Hand,
    Pickaxe,
    Shovel,
    Axe,
}

/// The six faces of a unit cube. Front faces +Z, right faces +X.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockFace {
    Top,
    Bottom,
    Front,
    Back,
    Right,
    Left,
}

impl BlockFace {
    pub const ALL: [BlockFace; 6] = [
        BlockFace::Top,
        BlockFace::Bottom,
        BlockFace::Front,
        BlockFace::Back,
        BlockFace::Right,
        BlockFace::Left,
    ];

    pub fn normal(self) -> IVec3 {
        match self {
            BlockFace::Top => IVec3::Y,
            BlockFace::Bottom => IVec3::NEG_Y,
            BlockFace::Front => IVec3::Z,
            BlockFace::Back => IVec3::NEG_Z,
            BlockFace::Right => IVec3::X,
            BlockFace::Left => IVec3::NEG_X,
        }
    }

    /// Face pointing along `axis` (0 = x, 1 = y, 2 = z), positive or negative.
    pub fn from_axis(axis: usize, positive: bool) -> Self {
        match (axis, positive) {
            (0, true) => BlockFace::Right,
            (0, false) => BlockFace::Left,
            (1, true) => BlockFace::Top,
            (1, false) => BlockFace::Bottom,
            (_, true) => BlockFace::Front,
            (_, false) => BlockFace::Back,
        }
    }

    /// Directional shading: tops brightest, sides mid, bottoms darkest.
    pub fn shade(self) -> f32 {
        match self {
            BlockFace::Top => 1.0,
            BlockFace::Bottom => 0.5,
            _ => 0.8,
        }
    }
}

/// A snapshot of one occupied cell. Air is never represented as a `Block`
/// inside storage; see [`Cell`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Block {
    pub block_type: BlockType,
    pub metadata: u8,
    pub light_level: u8,
    pub sky_light: u8,
}

impl Block {
    pub fn new(block_type: BlockType) -> Self {
        Self {
            block_type,
            metadata: 0,
            light_level: block_type.light_emission(),
            sky_light: 0,
        }
    }

    pub fn with_metadata(mut self, metadata: u8) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn is_opaque(&self) -> bool {
        self.block_type.is_opaque()
    }

    pub fn is_transparent(&self) -> bool {
        self.block_type.is_transparent()
    }

    pub fn is_solid(&self) -> bool {
        self.block_type.is_solid()
    }

    pub fn is_liquid(&self) -> bool {
        self.block_type.is_liquid()
    }

    pub fn light_emission(&self) -> u8 {
        self.block_type.light_emission()
    }

    pub fn hardness(&self) -> f32 {
        self.block_type.hardness()
    }

    pub fn texture(&self, face: BlockFace) -> u16 {
        self.block_type.texture(face)
    }
}

impl From<BlockType> for Block {
    fn from(block_type: BlockType) -> Self {
        Block::new(block_type)
    }
}

/// Content of an in-bounds cell. Out-of-bounds lookups return `None`
/// instead of a `Cell`, so the two cases never alias.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cell {
    Air,
    Occupied(Block),
}

impl Cell {
    pub fn block(self) -> Option<Block> {
        match self {
            Cell::Air => None,
            Cell::Occupied(block) => Some(block),
        }
    }

    pub fn block_type(&self) -> BlockType {
        match self {
            Cell::Air => BlockType::Air,
            Cell::Occupied(block) => block.block_type,
        }
    }

    pub fn is_air(&self) -> bool {
        matches!(self, Cell::Air)
    }
}

impl From<Block> for Cell {
    fn from(block: Block) -> Self {
        if block.block_type.is_air() {
            Cell::Air
        } else {
            Cell::Occupied(block)
        }
    }
}

impl From<Option<Block>> for Cell {
    fn from(block: Option<Block>) -> Self {
        block.map(Cell::from).unwrap_or(Cell::Air)
    }
}
