// Constants used throughout the scene module

// Tile rendering constants
pub const TILE_WIDTH: i32 = 76;
pub const TILE_WIDTH_HALF: i32 = 38;
pub const TILE_HEIGHT: i32 = 37;
pub const TILE_HEIGHT_HALF: i32 = 18;
/// Screen offset between two map levels.
pub const LEVEL_HEIGHT: i32 = 27;

// Display layers. A lower layer is nearer to the viewer and is drawn later.
pub const LAYER_ROW_DISTANCE: i32 = 10;
pub const LAYER_LEVEL_DISTANCE: i32 = 1_000_000;
pub const TILE_LAYER_OFFSET: i32 = LAYER_LEVEL_DISTANCE / 2;
pub const OVERLAY_LAYER_OFFSET: i32 = TILE_LAYER_OFFSET - 1;
pub const ITEM_LAYER_OFFSET: i32 = 0;
pub const AVATAR_LAYER_OFFSET: i32 = -5;
pub const EFFECT_LAYER_OFFSET: i32 = -7;
pub const QUEST_MARKER_LAYER_OFFSET: i32 = -8;

// Alpha handling
pub const ALPHA_CHANGE_FACTOR: f32 = 0.015;
pub const FADING_CORRIDOR_ALPHA: u8 = 102; // 40% of 255

// Fading corridor
pub const CORRIDOR_TOLERANCE: i32 = 5;
/// Half of the layer step between two objects.
pub const CORRIDOR_DEPTH_TOLERANCE: f32 = 0.5;

// Post effects
pub const FOG_CHANGE_FACTOR: f32 = 0.002;
pub const GRAYSCALE_CHANGE_FACTOR: f32 = 0.003;
