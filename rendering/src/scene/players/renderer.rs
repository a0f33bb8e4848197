use super::cloth::AvatarCloth;
use super::types::{AvatarClothGroup, Direction};
use crate::color::Color;
use crate::geometry::DisplayCoordinate;
use crate::instance::RenderBatch;
use crate::scene::entity::{EntityError, FrameContext, Highlight};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use AvatarClothGroup::*;

/// Back to front drawing order of the cloth slots, per facing.
const DRAW_ORDER: [[AvatarClothGroup; AvatarClothGroup::COUNT]; 8] = [
    // north
    [FirstHand, SecondHand, Shoes, Trousers, Chest, Coat, Beard, Hair, Hat],
    // north east
    [SecondHand, Shoes, Trousers, Chest, Coat, Beard, Hair, Hat, FirstHand],
    // east
    [SecondHand, Shoes, Trousers, Chest, Coat, Hair, Beard, Hat, FirstHand],
    // south east
    [SecondHand, Shoes, Trousers, Chest, Coat, Hair, Beard, Hat, FirstHand],
    // south
    [Shoes, Trousers, Chest, Coat, Hair, Beard, Hat, SecondHand, FirstHand],
    // south west
    [FirstHand, Shoes, Trousers, Chest, Coat, Hair, Beard, Hat, SecondHand],
    // west
    [FirstHand, Shoes, Trousers, Chest, Coat, Hair, Beard, Hat, SecondHand],
    // north west
    [FirstHand, Shoes, Trousers, Chest, Coat, Beard, Hair, Hat, SecondHand],
];

pub fn draw_order(direction: Direction) -> [AvatarClothGroup; AvatarClothGroup::COUNT] {
    DRAW_ORDER[u8::from(direction) as usize]
}

/// Frame of a cloth with `cloth_frames` frames matching avatar frame `frame`.
pub fn cloth_frame(cloth_frames: usize, frame: usize, avatar_frames: usize) -> usize {
    if cloth_frames == 0 || avatar_frames == 0 {
        return 0;
    }
    (cloth_frames * frame / avatar_frames).min(cloth_frames - 1)
}

#[derive(Debug)]
struct ClothSlots {
    direction: Direction,
    avatar_frames: usize,
    frame: usize,
    alpha: u8,
    scale: f32,
    highlight: Highlight,
    coordinate: Option<DisplayCoordinate>,
    clothes: [Option<AvatarCloth>; AvatarClothGroup::COUNT],
}

impl ClothSlots {
    /// Brings a cloth in line with the avatar it is worn by.
    fn sync(&self, cloth: &mut AvatarCloth) -> Result<(), EntityError> {
        let frame = cloth_frame(cloth.frame_count(), self.frame, self.avatar_frames);
        let core = cloth.core_mut();
        core.set_alpha(self.alpha)?;
        core.set_frame(frame)?;
        core.set_scale(self.scale)?;
        core.set_highlight(self.highlight)?;
        if let Some(coordinate) = self.coordinate {
            cloth.place(coordinate)?;
        }
        Ok(())
    }

    fn sync_all(&mut self) -> Result<(), EntityError> {
        let mut clothes = std::mem::take(&mut self.clothes);
        let result = clothes
            .iter_mut()
            .flatten()
            .try_for_each(|cloth| self.sync(cloth));
        self.clothes = clothes;
        result
    }
}

/// The clothes of one avatar. Slots may be replaced from any thread while the
/// game loop renders.
#[derive(Debug)]
pub struct AvatarClothRenderer {
    slots: RwLock<ClothSlots>,
}

impl AvatarClothRenderer {
    pub fn new(direction: Direction, avatar_frames: usize) -> Self {
        Self {
            slots: RwLock::new(ClothSlots {
                direction,
                avatar_frames,
                frame: 0,
                alpha: 255,
                scale: 1.0,
                highlight: Highlight::None,
                coordinate: None,
                clothes: Default::default(),
            }),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, ClothSlots> {
        self.slots.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, ClothSlots> {
        self.slots.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Puts `cloth` into its slot, returning the cloth it replaces.
    pub fn set_cloth(&self, cloth: AvatarCloth) -> Result<Option<AvatarCloth>, EntityError> {
        let mut slots = self.write();
        let mut cloth = cloth;
        slots.sync(&mut cloth)?;
        Ok(slots.clothes[cloth.group().index()].replace(cloth))
    }

    pub fn remove_cloth(&self, group: AvatarClothGroup) -> Option<AvatarCloth> {
        self.write().clothes[group.index()].take()
    }

    pub fn has_cloth(&self, group: AvatarClothGroup) -> bool {
        self.read().clothes[group.index()].is_some()
    }

    pub fn cloth_id(&self, group: AvatarClothGroup) -> Option<u32> {
        self.read().clothes[group.index()]
            .as_ref()
            .map(AvatarCloth::cloth_id)
    }

    pub fn cloth_frame_of(&self, group: AvatarClothGroup) -> Option<usize> {
        self.read().clothes[group.index()]
            .as_ref()
            .map(|cloth| cloth.core().frame())
    }

    pub fn len(&self) -> usize {
        self.read().clothes.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Recolors a worn cloth. Nothing happens for an empty slot.
    pub fn set_cloth_color(
        &self,
        group: AvatarClothGroup,
        color: Option<Color>,
    ) -> Result<(), EntityError> {
        match self.write().clothes[group.index()].as_mut() {
            Some(cloth) => cloth.core_mut().set_base_color(color),
            None => Ok(()),
        }
    }

    pub fn direction(&self) -> Direction {
        self.read().direction
    }

    pub fn set_direction(
        &self,
        direction: Direction,
        avatar_frames: usize,
    ) -> Result<(), EntityError> {
        let mut slots = self.write();
        slots.direction = direction;
        slots.avatar_frames = avatar_frames;
        slots.sync_all()
    }

    pub fn set_frame(&self, frame: usize) -> Result<(), EntityError> {
        let mut slots = self.write();
        slots.frame = frame;
        slots.sync_all()
    }

    pub fn set_alpha(&self, alpha: u8) -> Result<(), EntityError> {
        let mut slots = self.write();
        if slots.alpha == alpha {
            return Ok(());
        }
        slots.alpha = alpha;
        slots.sync_all()
    }

    pub fn set_scale(&self, scale: f32) -> Result<(), EntityError> {
        let mut slots = self.write();
        slots.scale = scale;
        slots.sync_all()
    }

    pub fn set_highlight(&self, highlight: Highlight) -> Result<(), EntityError> {
        let mut slots = self.write();
        slots.highlight = highlight;
        slots.sync_all()
    }

    pub fn set_coordinate(&self, coordinate: DisplayCoordinate) -> Result<(), EntityError> {
        let mut slots = self.write();
        slots.coordinate = Some(coordinate);
        slots.sync_all()
    }

    pub fn clear(&self) {
        self.write().clothes = Default::default();
    }

    /// Updates every cloth, lit by the light of the avatar.
    pub fn update(
        &self,
        ctx: &FrameContext<'_>,
        avatar_light: Color,
        delta: u32,
    ) -> Result<(), EntityError> {
        self.write()
            .clothes
            .iter_mut()
            .flatten()
            .try_for_each(|cloth| cloth.update(ctx, avatar_light, delta))
    }

    /// Draws the clothes in the order required by the current direction.
    /// Returns the number of clothes drawn.
    pub fn render(
        &self,
        ctx: &FrameContext<'_>,
        out: &mut RenderBatch,
    ) -> Result<usize, EntityError> {
        let slots = self.read();
        let mut drawn = 0;
        for group in draw_order(slots.direction) {
            if let Some(cloth) = &slots.clothes[group.index()] {
                if cloth.render(ctx, out)? {
                    drawn += 1;
                }
            }
        }
        Ok(drawn)
    }
}
