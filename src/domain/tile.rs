/// Tile types and their properties.
/// Properties are queried via methods, not stored as flags,
/// so tile semantics are centralized here.

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Tile {
    Sky,
    Ground, // Solid
    Goal,   // Win target
    Ladder, // Climbable
    Water,  // Deadly
    Rubble, // Solid
}

impl Tile {
    /// Look up a tile by its level-file character code.
    pub fn from_code(code: char) -> Option<Tile> {
        match code {
            '0' => Some(Tile::Sky),
            '1' => Some(Tile::Ground),
            '2' => Some(Tile::Goal),
            '3' => Some(Tile::Ladder),
            '4' => Some(Tile::Water),
            '5' => Some(Tile::Rubble),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Tile::Sky => "Sky",
            Tile::Ground => "Ground",
            Tile::Goal => "Goal",
            Tile::Ladder => "Ladder",
            Tile::Water => "Water",
            Tile::Rubble => "Rubble",
        }
    }

    /// Does this tile obstruct movement? A blocking tile is never occupiable.
    pub fn is_blocking(self) -> bool {
        matches!(self, Tile::Ground | Tile::Rubble)
    }

    /// Can an actor climb (move up without falling) on this tile?
    pub fn is_climbable(self) -> bool {
        matches!(self, Tile::Ladder)
    }

    /// Does contact with this tile end the level?
    pub fn is_deadly(self) -> bool {
        matches!(self, Tile::Water)
    }

    /// Is this the win tile?
    pub fn is_goal(self) -> bool {
        matches!(self, Tile::Goal)
    }

    /// How an actor standing here died, without the leading name.
    /// Only meaningful when `is_deadly()` is true.
    pub fn death_message(self) -> &'static str {
        match self {
            Tile::Water => "drowned in the water",
            _ => "perished",
        }
    }
}

impl Default for Tile {
    fn default() -> Self {
        Tile::Sky
    }
}
