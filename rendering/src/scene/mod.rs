pub mod constants;
pub mod effects;
pub mod entity;
pub mod fading;
pub mod graph;
pub mod input;
pub mod items;
pub mod map;
pub mod markers;
pub mod players;
pub mod template;
pub mod texture_atlas;
pub mod utils;

pub use constants::*;
pub use effects::Effect;
pub use entity::{
    EntityCore, EntityError, EntityId, Fadeable, FrameContext, Highlight, InputContext,
    Interactive, Lifecycle, LightBlended, Renderable,
};
pub use fading::FadingCorridor;
pub use graph::{DisplayList, SceneGraph};
pub use input::{HoverTarget, InteractionHandler, MapEvent, MouseButton};
pub use items::{Item, ItemStack};
pub use map::{Overlay, Tile, TileId};
pub use markers::{AttackState, AvatarMarker, MarkerKind, QuestMarker, QuestMarkerKind};
pub use players::{
    Avatar, AvatarCloth, AvatarClothGroup, AvatarClothManager, AvatarClothRenderer, CharacterId,
    Direction,
};
pub use template::{
    Anchor, AvatarTemplate, ClothTemplate, EffectTemplate, ItemTemplate, MarkerTemplate,
    OpacityMask, OverlayTemplate, Sprite, SpriteFrame, TemplateProvider, TemplateStore,
    TileTemplate,
};
pub use texture_atlas::{AtlasRegion, SpriteAtlas};
pub use utils::{display_to_map_location, get_isometric_coordinate};
