use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Server side id of a character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CharacterId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum Direction {
    North = 0,
    NorthEast = 1,
    East = 2,
    SouthEast = 3,
    South = 4,
    SouthWest = 5,
    West = 6,
    NorthWest = 7,
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Direction::North,
        Direction::NorthEast,
        Direction::East,
        Direction::SouthEast,
        Direction::South,
        Direction::SouthWest,
        Direction::West,
        Direction::NorthWest,
    ];

    /// Map offset of one step in this direction.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::North => (0, -1),
            Direction::NorthEast => (1, -1),
            Direction::East => (1, 0),
            Direction::SouthEast => (1, 1),
            Direction::South => (0, 1),
            Direction::SouthWest => (-1, 1),
            Direction::West => (-1, 0),
            Direction::NorthWest => (-1, -1),
        }
    }

    /// Direction of a step, `None` for no movement.
    pub fn from_delta(dx: i32, dy: i32) -> Option<Direction> {
        let step = (dx.signum(), dy.signum());
        Direction::ALL.into_iter().find(|d| d.delta() == step)
    }
}

/// Cloth slots of an avatar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum AvatarClothGroup {
    Hair = 0,
    Beard = 1,
    Chest = 2,
    Coat = 3,
    FirstHand = 4,
    SecondHand = 5,
    Hat = 6,
    Shoes = 7,
    Trousers = 8,
}

impl AvatarClothGroup {
    pub const COUNT: usize = 9;

    pub const ALL: [AvatarClothGroup; Self::COUNT] = [
        AvatarClothGroup::Hair,
        AvatarClothGroup::Beard,
        AvatarClothGroup::Chest,
        AvatarClothGroup::Coat,
        AvatarClothGroup::FirstHand,
        AvatarClothGroup::SecondHand,
        AvatarClothGroup::Hat,
        AvatarClothGroup::Shoes,
        AvatarClothGroup::Trousers,
    ];

    pub fn index(self) -> usize {
        u8::from(self) as usize
    }

    /// Hair and beard are chosen by cloth id, everything else through the
    /// paperdoll id of the worn item.
    pub fn is_body_part(self) -> bool {
        matches!(self, AvatarClothGroup::Hair | AvatarClothGroup::Beard)
    }
}
