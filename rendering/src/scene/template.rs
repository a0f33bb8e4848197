//! Immutable descriptions shared by all entities of a kind.

use super::markers::MarkerKind;
use super::players::cloth::AvatarClothManager;
use super::players::types::{AvatarClothGroup, Direction};
use super::texture_atlas::SpriteAtlas;
use crate::color::Color;
use crate::geometry::{DisplayCoordinate, Rectangle};
use anyhow::{Context, anyhow};
use glam::{IVec2, Vec2};
use rustc_hash::FxHashMap;
use std::sync::Arc;
use tracing::debug;

/// One bit per pixel telling whether the pixel is opaque enough to be hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpacityMask {
    width: u32,
    height: u32,
    bits: Vec<u8>,
}

impl OpacityMask {
    pub fn from_alpha(width: u32, height: u32, alpha: &[u8], threshold: u8) -> Self {
        let len = (width * height) as usize;
        let mut bits = vec![0u8; len.div_ceil(8)];
        for (i, a) in alpha.iter().take(len).enumerate() {
            if *a >= threshold {
                bits[i / 8] |= 1 << (i % 8);
            }
        }
        Self {
            width,
            height,
            bits,
        }
    }

    pub fn is_opaque(&self, x: u32, y: u32) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        let i = (y * self.width + x) as usize;
        self.bits[i / 8] & (1 << (i % 8)) != 0
    }
}

#[derive(Debug, Clone)]
pub struct SpriteFrame {
    pub tex_min: Vec2,
    pub tex_max: Vec2,
    pub mask: Option<Arc<OpacityMask>>,
}

/// Where the display coordinate sits on the sprite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Center,
    /// Centered horizontally, standing on the coordinate.
    Bottom,
}

#[derive(Debug)]
pub struct Sprite {
    pub name: String,
    pub width: i32,
    pub height: i32,
    /// From the display coordinate to the top left corner, unscaled.
    pub offset: IVec2,
    frames: Vec<SpriteFrame>,
}

impl Sprite {
    pub fn new(
        name: &str,
        width: i32,
        height: i32,
        anchor: Anchor,
        frames: Vec<SpriteFrame>,
    ) -> Self {
        let offset = match anchor {
            Anchor::Center => IVec2::new(-width / 2, -height / 2),
            Anchor::Bottom => IVec2::new(-width / 2, -height),
        };
        Self {
            name: name.to_owned(),
            width,
            height,
            offset,
            frames,
        }
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len().max(1)
    }

    pub fn frame(&self, index: usize) -> Option<&SpriteFrame> {
        if self.frames.is_empty() {
            return None;
        }
        self.frames.get(index % self.frames.len())
    }

    pub fn display_rect(&self, at: DisplayCoordinate, scale: f32) -> Rectangle {
        Rectangle::new(
            at.x + (self.offset.x as f32 * scale).round() as i32,
            at.y + (self.offset.y as f32 * scale).round() as i32,
            (self.width as f32 * scale).round() as i32,
            (self.height as f32 * scale).round() as i32,
        )
    }

    /// Hit test in display coordinates against the frame drawn at `rect`.
    pub fn is_opaque_at(&self, frame: usize, rect: &Rectangle, x: i32, y: i32) -> bool {
        if !rect.contains(x, y) {
            return false;
        }
        let Some(frame) = self.frame(frame) else {
            return false;
        };
        let Some(mask) = &frame.mask else {
            return true;
        };
        let sx = (x - rect.x) as f32 * self.width as f32 / rect.width as f32;
        let sy = (y - rect.y) as f32 * self.height as f32 / rect.height as f32;
        mask.is_opaque(sx as u32, sy as u32)
    }
}

#[derive(Debug)]
pub struct TileTemplate {
    pub id: u32,
    pub sprite: Arc<Sprite>,
    /// Milliseconds for one pass over all frames, zero for still tiles.
    pub animation_speed: u32,
    pub default_color: Option<Color>,
}

#[derive(Debug)]
pub struct OverlayTemplate {
    pub id: u32,
    /// One frame per overlay shape, shape `n` uses frame `n - 1`.
    pub sprite: Arc<Sprite>,
}

#[derive(Debug)]
pub struct ItemTemplate {
    pub id: u32,
    pub name: String,
    pub sprite: Arc<Sprite>,
    /// Height added to the stack by this item.
    pub level: i32,
    pub paperdoll_id: Option<u32>,
    pub paperdoll_color: Option<Color>,
    pub default_color: Option<Color>,
}

#[derive(Debug)]
pub struct AvatarTemplate {
    pub appearance: u32,
    pub direction: Direction,
    pub sprite: Arc<Sprite>,
    pub still_frame: usize,
    pub default_color: Option<Color>,
    pub clothes: Arc<AvatarClothManager>,
    /// Vertical distance of the name tag above the display coordinate.
    pub name_offset: i32,
}

#[derive(Debug)]
pub struct ClothTemplate {
    pub id: u32,
    pub group: AvatarClothGroup,
    pub sprite: Arc<Sprite>,
}

#[derive(Debug)]
pub struct EffectTemplate {
    pub id: u32,
    pub sprite: Arc<Sprite>,
    /// Display time of a single frame in milliseconds.
    pub frame_duration: u32,
}

#[derive(Debug)]
pub struct MarkerTemplate {
    pub kind: MarkerKind,
    pub sprite: Arc<Sprite>,
}

/// Source of templates for entity creation.
pub trait TemplateProvider {
    fn tile(&self, id: u32) -> Option<Arc<TileTemplate>>;
    fn overlay(&self, id: u32) -> Option<Arc<OverlayTemplate>>;
    fn item(&self, id: u32) -> Option<Arc<ItemTemplate>>;
    fn avatar(&self, appearance: u32, direction: Direction) -> Option<Arc<AvatarTemplate>>;
    fn effect(&self, id: u32) -> Option<Arc<EffectTemplate>>;
    fn marker(&self, kind: MarkerKind) -> Option<Arc<MarkerTemplate>>;
}

/// In-memory template registry backed by a sprite atlas layout.
pub struct TemplateStore {
    atlas: SpriteAtlas,
    tiles: FxHashMap<u32, Arc<TileTemplate>>,
    overlays: FxHashMap<u32, Arc<OverlayTemplate>>,
    items: FxHashMap<u32, Arc<ItemTemplate>>,
    avatars: FxHashMap<(u32, Direction), Arc<AvatarTemplate>>,
    effects: FxHashMap<u32, Arc<EffectTemplate>>,
    markers: FxHashMap<MarkerKind, Arc<MarkerTemplate>>,
}

impl TemplateStore {
    pub fn new(atlas_width: i32, atlas_height: i32) -> Self {
        Self {
            atlas: SpriteAtlas::new(atlas_width, atlas_height),
            tiles: FxHashMap::default(),
            overlays: FxHashMap::default(),
            items: FxHashMap::default(),
            avatars: FxHashMap::default(),
            effects: FxHashMap::default(),
            markers: FxHashMap::default(),
        }
    }

    /// Reserves atlas space for `frames` frames of a new sprite.
    pub fn create_sprite(
        &mut self,
        name: &str,
        width: i32,
        height: i32,
        anchor: Anchor,
        frames: usize,
    ) -> anyhow::Result<Arc<Sprite>> {
        self.create_masked_sprite(name, width, height, anchor, vec![None; frames.max(1)])
    }

    /// Like [`TemplateStore::create_sprite`] with one optional opacity mask per frame.
    pub fn create_masked_sprite(
        &mut self,
        name: &str,
        width: i32,
        height: i32,
        anchor: Anchor,
        masks: Vec<Option<OpacityMask>>,
    ) -> anyhow::Result<Arc<Sprite>> {
        let mut frames = Vec::with_capacity(masks.len());
        for (index, mask) in masks.into_iter().enumerate() {
            let region = self
                .atlas
                .allocate(width, height)
                .ok_or_else(|| anyhow!("no atlas space for {width}x{height}"))
                .with_context(|| format!("packing frame {index} of sprite {name}"))?;
            frames.push(SpriteFrame {
                tex_min: region.tex_min,
                tex_max: region.tex_max,
                mask: mask.map(Arc::new),
            });
        }
        debug!(name, frames = frames.len(), "sprite packed");
        Ok(Arc::new(Sprite::new(name, width, height, anchor, frames)))
    }

    pub fn add_tile(&mut self, template: TileTemplate) -> Arc<TileTemplate> {
        let template = Arc::new(template);
        self.tiles.insert(template.id, template.clone());
        template
    }

    pub fn add_overlay(&mut self, template: OverlayTemplate) -> Arc<OverlayTemplate> {
        let template = Arc::new(template);
        self.overlays.insert(template.id, template.clone());
        template
    }

    pub fn add_item(&mut self, template: ItemTemplate) -> Arc<ItemTemplate> {
        let template = Arc::new(template);
        self.items.insert(template.id, template.clone());
        template
    }

    pub fn add_avatar(&mut self, template: AvatarTemplate) -> Arc<AvatarTemplate> {
        let template = Arc::new(template);
        self.avatars
            .insert((template.appearance, template.direction), template.clone());
        template
    }

    pub fn add_effect(&mut self, template: EffectTemplate) -> Arc<EffectTemplate> {
        let template = Arc::new(template);
        self.effects.insert(template.id, template.clone());
        template
    }

    pub fn add_marker(&mut self, template: MarkerTemplate) -> Arc<MarkerTemplate> {
        let template = Arc::new(template);
        self.markers.insert(template.kind, template.clone());
        template
    }
}

impl TemplateProvider for TemplateStore {
    fn tile(&self, id: u32) -> Option<Arc<TileTemplate>> {
        self.tiles.get(&id).cloned()
    }

    fn overlay(&self, id: u32) -> Option<Arc<OverlayTemplate>> {
        self.overlays.get(&id).cloned()
    }

    fn item(&self, id: u32) -> Option<Arc<ItemTemplate>> {
        self.items.get(&id).cloned()
    }

    fn avatar(&self, appearance: u32, direction: Direction) -> Option<Arc<AvatarTemplate>> {
        self.avatars.get(&(appearance, direction)).cloned()
    }

    fn effect(&self, id: u32) -> Option<Arc<EffectTemplate>> {
        self.effects.get(&id).cloned()
    }

    fn marker(&self, kind: MarkerKind) -> Option<Arc<MarkerTemplate>> {
        self.markers.get(&kind).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bottom_anchor_stands_on_coordinate() {
        let sprite = Sprite::new("crate", 40, 60, Anchor::Bottom, Vec::new());
        let rect = sprite.display_rect(DisplayCoordinate::new(100, 200, 0), 1.0);
        assert_eq!(rect, Rectangle::new(80, 140, 40, 60));
        let scaled = sprite.display_rect(DisplayCoordinate::new(100, 200, 0), 0.5);
        assert_eq!(scaled, Rectangle::new(90, 170, 20, 30));
    }

    #[test]
    fn masks_decide_hits() {
        let alpha = [0, 255, 0, 255];
        let mask = OpacityMask::from_alpha(2, 2, &alpha, 128);
        assert!(!mask.is_opaque(0, 0));
        assert!(mask.is_opaque(1, 0));
        assert!(mask.is_opaque(1, 1));
        assert!(!mask.is_opaque(2, 0));
    }

    #[test]
    fn sprites_without_mask_are_solid() {
        let mut store = TemplateStore::new(256, 256);
        let sprite = store.create_sprite("rock", 10, 10, Anchor::Center, 1).unwrap();
        let rect = sprite.display_rect(DisplayCoordinate::default(), 1.0);
        assert!(sprite.is_opaque_at(0, &rect, 0, 0));
        assert!(!sprite.is_opaque_at(0, &rect, 20, 0));
    }

    #[test]
    fn frames_wrap_around() {
        let mut store = TemplateStore::new(256, 256);
        let sprite = store.create_sprite("fire", 8, 8, Anchor::Center, 3).unwrap();
        assert_eq!(sprite.frame_count(), 3);
        assert_eq!(
            sprite.frame(4).map(|f| f.tex_min),
            sprite.frame(1).map(|f| f.tex_min)
        );
    }

    #[test]
    fn packing_fails_with_context() {
        let mut store = TemplateStore::new(16, 16);
        let err = store
            .create_sprite("huge", 64, 64, Anchor::Center, 1)
            .unwrap_err();
        assert!(format!("{err:#}").contains("sprite huge"));
    }
}
