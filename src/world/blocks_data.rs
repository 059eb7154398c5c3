// blocks_data.rs - static property table for every block type

use crate::world::block::{BlockFace, BlockMaterial, BlockType};
use crate::world::block_flags::BlockFlags;
use lazy_static::lazy_static;

const DEFAULT_TEXTURE: u16 = 1;
const DEFAULT_HARDNESS: f32 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceTextures {
    pub top: u16,
    pub bottom: u16,
    pub side: u16,
    pub front: u16,
}

impl FaceTextures {
    pub const fn all(id: u16) -> Self {
        Self {
            top: id,
            bottom: id,
            side: id,
            front: id,
        }
    }

    pub const fn column(top: u16, bottom: u16, side: u16) -> Self {
        Self {
            top,
            bottom,
            side,
            front: side,
        }
    }

    pub const fn fronted(top: u16, bottom: u16, side: u16, front: u16) -> Self {
        Self {
            top,
            bottom,
            side,
            front,
        }
    }

    pub fn for_face(&self, face: BlockFace) -> u16 {
        match face {
            BlockFace::Top => self.top,
            BlockFace::Bottom => self.bottom,
            BlockFace::Front => self.front,
            BlockFace::Back | BlockFace::Left | BlockFace::Right => self.side,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockProperties {
    pub name: &'static str,
    pub flags: BlockFlags,
    pub material: BlockMaterial,
    pub emission: u8,
    pub hardness: f32,
    pub textures: FaceTextures,
}

lazy_static! {
    /// Indexed by `BlockType as usize`.
    pub static ref BLOCK_TABLE: [BlockProperties; BlockType::COUNT] =
        BlockType::ALL.map(describe);
}

fn describe(ty: BlockType) -> BlockProperties {
    use BlockType::*;

    let (name, flags) = match ty {
        Air => ("air", BlockFlags::TRANSPARENT),
        Stone => ("stone", BlockFlags::opaque_solid()),
        Grass => ("grass", BlockFlags::opaque_solid()),
        Dirt => ("dirt", BlockFlags::opaque_solid()),
        Cobblestone => ("cobblestone", BlockFlags::opaque_solid()),
        Bedrock => ("bedrock", BlockFlags::opaque_solid()),
        Sand => ("sand", BlockFlags::opaque_solid()),
        Gravel => ("gravel", BlockFlags::opaque_solid()),
        Water => ("water", BlockFlags::liquid()),
        Lava => ("lava", BlockFlags::liquid()),
        CoalOre => ("coal_ore", BlockFlags::opaque_solid()),
        IronOre => ("iron_ore", BlockFlags::opaque_solid()),
        GoldOre => ("gold_ore", BlockFlags::opaque_solid()),
        RedstoneOre => ("redstone_ore", BlockFlags::opaque_solid()),
        LapisOre => ("lapis_ore", BlockFlags::opaque_solid()),
        DiamondOre => ("diamond_ore", BlockFlags::opaque_solid()),
        EmeraldOre => ("emerald_ore", BlockFlags::opaque_solid()),
        OakLog => ("oak_log", BlockFlags::opaque_solid()),
        SpruceLog => ("spruce_log", BlockFlags::opaque_solid()),
        BirchLog => ("birch_log", BlockFlags::opaque_solid()),
        OakLeaves => ("oak_leaves", BlockFlags::see_through_solid()),
        SpruceLeaves => ("spruce_leaves", BlockFlags::see_through_solid()),
        BirchLeaves => ("birch_leaves", BlockFlags::see_through_solid()),
        Planks => ("planks", BlockFlags::opaque_solid()),
        Sapling => ("sapling", BlockFlags::flora().with_solid(false)),
        Flower => ("flower", BlockFlags::flora().with_solid(false)),
        Rose => ("rose", BlockFlags::flora().with_solid(false)),
        DeadBush => ("dead_bush", BlockFlags::flora().with_solid(false)),
        Mushroom => ("mushroom", BlockFlags::flora().with_solid(false)),
        MushroomBlock => ("mushroom_block", BlockFlags::opaque_solid()),
        SugarCane => ("sugar_cane", BlockFlags::flora().with_solid(false)),
        Cactus => ("cactus", BlockFlags::opaque_solid()),
        Glass => ("glass", BlockFlags::see_through_solid()),
        Tnt => ("tnt", BlockFlags::opaque_solid()),
        CraftingTable => ("crafting_table", BlockFlags::opaque_solid()),
        Furnace => ("furnace", BlockFlags::opaque_solid()),
        Chest => ("chest", BlockFlags::opaque_solid()),
        Bookshelf => ("bookshelf", BlockFlags::opaque_solid()),
        Fence => ("fence", BlockFlags::see_through_solid()),
        FenceGate => ("fence_gate", BlockFlags::see_through_solid()),
        Door => ("door", BlockFlags::see_through_solid()),
        Trapdoor => ("trapdoor", BlockFlags::see_through_solid()),
        Torch => ("torch", BlockFlags::TRANSPARENT),
        Ladder => ("ladder", BlockFlags::see_through_solid()),
        Rail => ("rail", BlockFlags::TRANSPARENT),
        Lever => ("lever", BlockFlags::see_through_solid()),
        Button => ("button", BlockFlags::see_through_solid()),
        PressurePlate => ("pressure_plate", BlockFlags::see_through_solid()),
        Sign => ("sign", BlockFlags::see_through_solid()),
        Snow => ("snow", BlockFlags::opaque_solid()),
        Ice => ("ice", BlockFlags::see_through_solid()),
        Glowstone => ("glowstone", BlockFlags::opaque_solid()),
        Fire => ("fire", BlockFlags::TRANSPARENT),
        JackOLantern => ("jack_o_lantern", BlockFlags::opaque_solid()),
        WhiteWool => ("white_wool", BlockFlags::opaque_solid()),
        OrangeWool => ("orange_wool", BlockFlags::opaque_solid()),
        MagentaWool => ("magenta_wool", BlockFlags::opaque_solid()),
        LightBlueWool => ("light_blue_wool", BlockFlags::opaque_solid()),
        YellowWool => ("yellow_wool", BlockFlags::opaque_solid()),
        LimeWool => ("lime_wool", BlockFlags::opaque_solid()),
        PinkWool => ("pink_wool", BlockFlags::opaque_solid()),
        GrayWool => ("gray_wool", BlockFlags::opaque_solid()),
        LightGrayWool => ("light_gray_wool", BlockFlags::opaque_solid()),
        CyanWool => ("cyan_wool", BlockFlags::opaque_solid()),
        PurpleWool => ("purple_wool", BlockFlags::opaque_solid()),
        BlueWool => ("blue_wool", BlockFlags::opaque_solid()),
        BrownWool => ("brown_wool", BlockFlags::opaque_solid()),
        GreenWool => ("green_wool", BlockFlags::opaque_solid()),
        RedWool => ("red_wool", BlockFlags::opaque_solid()),
        BlackWool => ("black_wool", BlockFlags::opaque_solid()),
    };

    let material = match ty {
        Air => BlockMaterial::Air,
        Water | Lava => BlockMaterial::Liquid,
        Glass | Ice => BlockMaterial::Transparent,
        OakLeaves | SpruceLeaves | BirchLeaves => BlockMaterial::Leaves,
        Fire => BlockMaterial::Fire,
        _ => BlockMaterial::Solid,
    };

    let emission = match ty {
        Torch => 14,
        Lava | Fire | Glowstone | JackOLantern => 15,
        _ => 0,
    };

    let hardness = match ty {
        Air => 0.0,
        Bedrock => -1.0,
        Stone => 1.5,
        Cobblestone => 2.0,
        Dirt | Grass | Sand => 0.5,
        Gravel => 0.6,
        Planks | OakLog | SpruceLog | BirchLog => 2.0,
        Glass => 0.3,
        Button | Lever => 0.5,
        _ => DEFAULT_HARDNESS,
    };

    let textures = match ty {
        Grass => FaceTextures::column(0, 2, 3),
        Dirt => FaceTextures::all(2),
        Stone => FaceTextures::all(1),
        Cobblestone => FaceTextures::all(16),
        Bedrock => FaceTextures::all(17),
        Sand => FaceTextures::all(18),
        Gravel => FaceTextures::all(19),
        Water => FaceTextures::all(207),
        Lava => FaceTextures::all(225),
        CoalOre => FaceTextures::all(20),
        IronOre => FaceTextures::all(21),
        GoldOre => FaceTextures::all(22),
        RedstoneOre => FaceTextures::all(23),
        LapisOre => FaceTextures::all(24),
        DiamondOre => FaceTextures::all(25),
        EmeraldOre => FaceTextures::all(26),
        OakLog => FaceTextures::column(20, 20, 21),
        SpruceLog => FaceTextures::column(20, 20, 22),
        BirchLog => FaceTextures::column(20, 20, 23),
        OakLeaves | Planks | Sign | FenceGate => FaceTextures::all(4),
        SpruceLeaves => FaceTextures::all(29),
        BirchLeaves => FaceTextures::all(30),
        Sapling => FaceTextures::all(15),
        Flower => FaceTextures::all(13),
        Rose => FaceTextures::all(12),
        DeadBush => FaceTextures::all(55),
        Mushroom => FaceTextures::all(28),
        MushroomBlock => FaceTextures::all(125),
        SugarCane => FaceTextures::all(73),
        Cactus => FaceTextures::column(70, 69, 71),
        Glass => FaceTextures::all(49),
        Tnt => FaceTextures::column(226, 227, 225),
        CraftingTable => FaceTextures::fronted(58, 4, 57, 56),
        Furnace => FaceTextures::fronted(62, 62, 61, 63),
        Chest => FaceTextures::all(54),
        Bookshelf => FaceTextures::column(4, 4, 47),
        Fence => FaceTextures::all(85),
        Door => FaceTextures::all(81),
        Trapdoor => FaceTextures::all(84),
        Torch => FaceTextures::all(50),
        Ladder => FaceTextures::all(83),
        Rail => FaceTextures::all(128),
        Lever => FaceTextures::all(69),
        Button => FaceTextures::all(77),
        PressurePlate => FaceTextures::all(72),
        Snow => FaceTextures::all(66),
        Ice => FaceTextures::all(67),
        Glowstone => FaceTextures::all(105),
        Fire => FaceTextures::all(31),
        JackOLantern => FaceTextures::fronted(102, 102, 118, 120),
        WhiteWool => FaceTextures::all(64),
        OrangeWool => FaceTextures::all(210),
        MagentaWool => FaceTextures::all(194),
        LightBlueWool => FaceTextures::all(178),
        YellowWool => FaceTextures::all(162),
        LimeWool => FaceTextures::all(146),
        PinkWool => FaceTextures::all(130),
        GrayWool => FaceTextures::all(114),
        LightGrayWool => FaceTextures::all(225),
        CyanWool => FaceTextures::all(209),
        PurpleWool => FaceTextures::all(193),
        BlueWool => FaceTextures::all(177),
        BrownWool => FaceTextures::all(161),
        GreenWool => FaceTextures::all(145),
        RedWool => FaceTextures::all(129),
        BlackWool => FaceTextures::all(113),
        Air => FaceTextures::all(DEFAULT_TEXTURE),
    };

    BlockProperties {
        name,
        flags,
        material,
        emission,
        hardness,
        textures,
    }
}
