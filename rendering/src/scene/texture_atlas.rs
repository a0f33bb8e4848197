use etagere::{AllocId, AtlasAllocator, size2};
use glam::Vec2;

/// Normalized region of one sprite frame inside the atlas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AtlasRegion {
    pub id: AllocId,
    pub tex_min: Vec2,
    pub tex_max: Vec2,
}

/// Packs sprite frames into one atlas texture. Only the layout is tracked
/// here; uploading pixel data is left to the renderer owning the texture.
pub struct SpriteAtlas {
    allocator: AtlasAllocator,
    width: i32,
    height: i32,
}

impl SpriteAtlas {
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            allocator: AtlasAllocator::new(size2(width, height)),
            width,
            height,
        }
    }

    pub fn size(&self) -> (i32, i32) {
        (self.width, self.height)
    }

    pub fn allocate(&mut self, width: i32, height: i32) -> Option<AtlasRegion> {
        let allocation = self.allocator.allocate(size2(width.max(1), height.max(1)))?;
        let min = allocation.rectangle.min;
        let atlas = Vec2::new(self.width as f32, self.height as f32);
        let tex_min = Vec2::new(min.x as f32, min.y as f32) / atlas;
        let tex_max = Vec2::new((min.x + width) as f32, (min.y + height) as f32) / atlas;
        Some(AtlasRegion {
            id: allocation.id,
            tex_min,
            tex_max,
        })
    }

    pub fn deallocate(&mut self, id: AllocId) {
        self.allocator.deallocate(id);
    }

    pub fn is_empty(&self) -> bool {
        self.allocator.is_empty()
    }
}
