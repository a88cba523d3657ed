//! Simulated block worlds: a generator plus per-block overrides.

use std::collections::HashMap;

use trampoline_api::{BlockPos, Material, WorldBorder, WorldInfo};

use crate::config::{Generator, WorldSection};

/// Solid layers laid down by the flat generator, starting at `min_y`
/// (bedrock, two dirt, grass).
pub const FLAT_LAYERS: i32 = 4;

pub struct SimWorld {
    info: WorldInfo,
    generator: Generator,
    overrides: HashMap<BlockPos, Material>,
}

impl SimWorld {
    pub fn new(info: WorldInfo, generator: Generator) -> Self {
        Self {
            info,
            generator,
            overrides: HashMap::new(),
        }
    }

    pub fn from_config(section: &WorldSection) -> Self {
        Self::new(
            WorldInfo {
                name: section.name.clone(),
                min_y: section.min_y,
                max_y: section.max_y,
                border: WorldBorder {
                    center_x: section.border_center_x,
                    center_z: section.border_center_z,
                    size: section.border_size,
                },
            },
            section.generator,
        )
    }

    pub fn name(&self) -> &str {
        &self.info.name
    }

    pub fn info(&self) -> &WorldInfo {
        &self.info
    }

    /// Y of the top generated layer, if the generator produces any terrain.
    pub fn surface_y(&self) -> Option<i32> {
        match self.generator {
            Generator::Flat => Some(self.info.min_y + FLAT_LAYERS - 1),
            Generator::Void => None,
        }
    }

    pub fn set_block(&mut self, pos: BlockPos, material: Material) {
        self.overrides.insert(pos, material);
    }

    pub fn block_at(&self, pos: BlockPos) -> Material {
        if pos.y < self.info.min_y || pos.y > self.info.max_y {
            return Material::VoidAir;
        }
        if let Some(material) = self.overrides.get(&pos) {
            return *material;
        }
        match self.surface_y() {
            Some(top) if pos.y <= top => Material::Solid,
            _ => Material::Air,
        }
    }

    /// Y of the highest non-air block in the column.
    pub fn highest_block_y(&self, x: i32, z: i32) -> Option<i32> {
        let placed = self
            .overrides
            .iter()
            .filter(|(pos, material)| pos.x == x && pos.z == z && **material != Material::Air)
            .map(|(pos, _)| pos.y)
            .max();
        let top = self
            .surface_y()
            .into_iter()
            .flat_map(|top| (self.info.min_y..=top).rev())
            .find(|&y| self.block_at(BlockPos::new(x, y, z)) != Material::Air);
        placed.max(top)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world(generator: Generator) -> SimWorld {
        SimWorld::new(
            WorldInfo {
                name: "world".into(),
                min_y: -64,
                max_y: 319,
                border: WorldBorder {
                    center_x: 0.0,
                    center_z: 0.0,
                    size: 1000.0,
                },
            },
            generator,
        )
    }

    #[test]
    fn flat_world_layers() {
        let w = world(Generator::Flat);
        assert_eq!(w.block_at(BlockPos::new(5, -64, 5)), Material::Solid);
        assert_eq!(w.block_at(BlockPos::new(5, -61, 5)), Material::Solid);
        assert_eq!(w.block_at(BlockPos::new(5, -60, 5)), Material::Air);
        assert_eq!(w.block_at(BlockPos::new(5, -65, 5)), Material::VoidAir);
        assert_eq!(w.highest_block_y(5, 5), Some(-61));
    }

    #[test]
    fn void_world_is_empty() {
        let w = world(Generator::Void);
        assert_eq!(w.block_at(BlockPos::new(0, 0, 0)), Material::Air);
        assert_eq!(w.highest_block_y(0, 0), None);
    }

    #[test]
    fn overrides_win() {
        let mut w = world(Generator::Flat);
        w.set_block(BlockPos::new(0, 10, 0), Material::Water);
        w.set_block(BlockPos::new(1, -61, 1), Material::Air);
        w.set_block(BlockPos::new(1, -62, 1), Material::Air);
        assert_eq!(w.block_at(BlockPos::new(0, 10, 0)), Material::Water);
        assert_eq!(w.highest_block_y(0, 0), Some(10));
        assert_eq!(w.highest_block_y(1, 1), Some(-63));
    }

    #[test]
    fn fully_dug_column_is_empty() {
        let mut w = world(Generator::Flat);
        for y in -64..=-61 {
            w.set_block(BlockPos::new(2, y, 2), Material::Air);
        }
        assert_eq!(w.highest_block_y(2, 2), None);
    }
}
