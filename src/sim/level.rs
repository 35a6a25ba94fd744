/// Level loader.
///
/// ## Sources (priority order):
///   1. `<levels_dir>/<id>.json` on disk
///   2. Built-in embedded levels
///
/// Both go through the same JSON parse path, so there is exactly one
/// loader and one set of validation rules.
///
/// ## Level file format:
///   ```json
///   {
///     "name": "...",
///     "nextLevel": "level2",
///     "startText": "...",
///     "completeText": "...",
///     "tiles": "00000\n00002\n11111",
///     "characters": [
///       { "type": "prophet", "position": [0, 1], "name": "Aaron" }
///     ]
///   }
///   ```
///
/// `tiles` is one character code per cell, rows newline-separated and
/// all the same width; `position` is `[column, row]` with row 0 at the
/// top. Unknown codes, unknown character types, ragged rows or spawns
/// inside walls are load-time errors — nothing is re-validated later.
///
/// ## Tile legend:
///   '0' = Sky        '1' = Ground (solid)   '2' = Goal
///   '3' = Ladder     '4' = Water (deadly)   '5' = Rubble (solid)

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::domain::actor::{Actor, ActorKind};
use crate::domain::grid::{Cell, GridParseError, TileGrid};
use crate::domain::motion;

/// Id of the level a fresh game starts on.
pub const FIRST_LEVEL: &str = "level1";

#[derive(Debug, Error)]
pub enum LevelError {
    #[error("could not read level file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("level file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unknown tile code {code:?} at column {x}, row {y}")]
    UnknownTile { code: char, x: i32, y: i32 },
    #[error("tile row {row} does not match the width of row 0")]
    RaggedRow { row: i32 },
    #[error("level has no tiles")]
    EmptyGrid,
    #[error("unknown character type {0:?}")]
    UnknownCharacter(String),
    #[error("character {name:?} spawns out of bounds or inside a wall at column {x}, row {y}")]
    BadSpawn { name: String, x: i32, y: i32 },
    #[error("no such level: {0:?}")]
    UnknownLevel(String),
}

impl From<GridParseError> for LevelError {
    fn from(e: GridParseError) -> Self {
        match e {
            GridParseError::UnknownCode { code, x, y } => LevelError::UnknownTile { code, x, y },
            GridParseError::RaggedRow { row } => LevelError::RaggedRow { row },
            GridParseError::Empty => LevelError::EmptyGrid,
        }
    }
}

/// One roster entry as loaded: enough to (re)build the actor.
#[derive(Clone, Debug)]
pub struct SpawnDef {
    pub kind: ActorKind,
    pub name: Option<String>,
    pub cell: Cell,
}

/// A loaded, validated level.
#[derive(Debug)]
pub struct LevelDef {
    pub name: String,
    pub next_level: Option<String>,
    pub start_text: String,
    pub complete_text: String,
    pub grid: TileGrid,
    pub spawns: Vec<SpawnDef>,
}

// ── JSON schema ──

#[derive(Deserialize)]
struct LevelFile {
    name: String,
    #[serde(rename = "nextLevel", default)]
    next_level: Option<String>,
    #[serde(rename = "startText", default)]
    start_text: String,
    #[serde(rename = "completeText", default)]
    complete_text: String,
    tiles: String,
    #[serde(default)]
    characters: Vec<CharacterFile>,
}

#[derive(Deserialize)]
struct CharacterFile {
    #[serde(rename = "type")]
    kind: String,
    position: [i32; 2],
    #[serde(default)]
    name: Option<String>,
}

impl LevelDef {
    /// Parse and validate one level. Pure with respect to `text`:
    /// the same input always yields the same level.
    pub fn parse(text: &str) -> Result<LevelDef, LevelError> {
        let file: LevelFile = serde_json::from_str(text)?;
        let grid = TileGrid::parse(&file.tiles)?;

        let mut spawns = Vec::with_capacity(file.characters.len());
        for entry in &file.characters {
            let kind = ActorKind::from_code(&entry.kind)
                .ok_or_else(|| LevelError::UnknownCharacter(entry.kind.clone()))?;
            let cell = Cell::new(entry.position[0], entry.position[1]);
            let open = motion::footprint(cell, kind.footprint_edge())
                .all(|c| grid.in_bounds(c) && !grid.is_blocking(c));
            if !open {
                return Err(LevelError::BadSpawn {
                    name: entry.name.clone().unwrap_or_else(|| entry.kind.clone()),
                    x: cell.x,
                    y: cell.y,
                });
            }
            spawns.push(SpawnDef { kind, name: entry.name.clone(), cell });
        }

        Ok(LevelDef {
            name: file.name,
            next_level: file.next_level,
            start_text: file.start_text,
            complete_text: file.complete_text,
            grid,
            spawns,
        })
    }

    /// Build a fresh roster in level-file order.
    pub fn actors(&self) -> Vec<Actor> {
        self.spawns
            .iter()
            .map(|s| Actor::new(s.kind, s.name.clone(), s.cell))
            .collect()
    }
}

/// Load a level by id: `<levels_dir>/<id>.json` first, then the
/// embedded set. A file that exists but fails to parse is fatal —
/// it does not fall through to the embedded copy.
pub fn load(id: &str, levels_dir: &Path) -> Result<LevelDef, LevelError> {
    let path = levels_dir.join(format!("{id}.json"));
    if path.is_file() {
        let text = std::fs::read_to_string(&path)
            .map_err(|source| LevelError::Io { path: path.clone(), source })?;
        return LevelDef::parse(&text);
    }
    match embedded(id) {
        Some(text) => LevelDef::parse(text),
        None => Err(LevelError::UnknownLevel(id.to_string())),
    }
}

// ── Embedded fallback levels ──

fn embedded(id: &str) -> Option<&'static str> {
    match id {
        "level1" => Some(LEVEL_1),
        "level2" => Some(LEVEL_2),
        "level3" => Some(LEVEL_3),
        _ => None,
    }
}

const LEVEL_1: &str = r#"{
    "name": "The First Step",
    "nextLevel": "level2",
    "startText": "Your disciple awaits the word. Lead him to the promised ground.",
    "completeText": "He walked, and did not stray.",
    "tiles": "00000\n00002\n11111",
    "characters": [
        { "type": "prophet", "position": [0, 1] }
    ]
}"#;

const LEVEL_2: &str = r#"{
    "name": "The High Road",
    "nextLevel": "level3",
    "startText": "The ladder rises and the ledge is far. Climb, then leap.",
    "completeText": "Faith carried him over the gap.",
    "tiles": "00000000\n00000002\n00301111\n11111111",
    "characters": [
        { "type": "prophet", "position": [0, 2] }
    ]
}"#;

const LEVEL_3: &str = r#"{
    "name": "The Parting",
    "startText": "Two disciples, two promised lands, one word between them. Mind the water.",
    "completeText": "Each found a home. The tablets rest.",
    "tiles": "00000000\n00000000\n20000002\n11141111",
    "characters": [
        { "type": "prophet", "position": [5, 2], "name": "Aaron" },
        { "type": "pride", "position": [2, 2] }
    ]
}"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::actor::Facing;

    #[test]
    fn parses_a_complete_level() {
        let def = LevelDef::parse(LEVEL_1).unwrap();
        assert_eq!(def.name, "The First Step");
        assert_eq!(def.next_level.as_deref(), Some("level2"));
        assert_eq!(def.grid.width(), 5);
        assert_eq!(def.grid.height(), 3);
        assert_eq!(def.spawns.len(), 1);
        assert_eq!(def.spawns[0].cell, Cell::new(0, 1));
    }

    #[test]
    fn loading_is_deterministic() {
        let a = LevelDef::parse(LEVEL_3).unwrap();
        let b = LevelDef::parse(LEVEL_3).unwrap();
        let ra = a.actors();
        let rb = b.actors();
        assert_eq!(ra.len(), rb.len());
        for (x, y) in ra.iter().zip(rb.iter()) {
            assert_eq!(x.position, y.position);
            assert_eq!(x.facing, y.facing);
            assert_eq!(x.name, y.name);
        }
    }

    #[test]
    fn named_character_overrides_kind_name() {
        let def = LevelDef::parse(LEVEL_3).unwrap();
        let roster = def.actors();
        assert_eq!(roster[0].name, "Aaron");
        assert_eq!(roster[1].name, "Pride");
        assert_eq!(roster[1].facing, Facing::Left);
    }

    #[test]
    fn unknown_tile_code_fails_the_load() {
        let text = r#"{ "name": "x", "tiles": "0q0", "characters": [] }"#;
        assert!(matches!(
            LevelDef::parse(text),
            Err(LevelError::UnknownTile { code: 'q', .. })
        ));
    }

    #[test]
    fn unknown_character_type_fails_the_load() {
        let text = r#"{
            "name": "x", "tiles": "000\n111",
            "characters": [{ "type": "wrath", "position": [0, 0] }]
        }"#;
        assert!(matches!(
            LevelDef::parse(text),
            Err(LevelError::UnknownCharacter(k)) if k == "wrath"
        ));
    }

    #[test]
    fn spawn_inside_a_wall_fails_the_load() {
        let text = r#"{
            "name": "x", "tiles": "000\n111",
            "characters": [{ "type": "prophet", "position": [1, 1] }]
        }"#;
        assert!(matches!(
            LevelDef::parse(text),
            Err(LevelError::BadSpawn { x: 1, y: 1, .. })
        ));
    }

    #[test]
    fn multi_cell_spawn_needs_room_for_the_whole_footprint() {
        // A 2×2 footprint anchored on the top row pokes out of bounds.
        let text = r#"{
            "name": "x", "tiles": "000\n000\n111",
            "characters": [{ "type": "gluttony", "position": [0, 0] }]
        }"#;
        assert!(matches!(LevelDef::parse(text), Err(LevelError::BadSpawn { .. })));

        let text = r#"{
            "name": "x", "tiles": "000\n000\n111",
            "characters": [{ "type": "gluttony", "position": [0, 1] }]
        }"#;
        assert!(LevelDef::parse(text).is_ok());
    }

    #[test]
    fn malformed_json_fails_the_load() {
        assert!(matches!(
            LevelDef::parse("{ not json"),
            Err(LevelError::Json(_))
        ));
    }

    #[test]
    fn embedded_levels_all_parse_and_chain() {
        let mut id = FIRST_LEVEL.to_string();
        let mut seen = 0;
        loop {
            let def = LevelDef::parse(embedded(&id).expect("missing embedded level")).unwrap();
            assert!(!def.spawns.is_empty(), "{id} has no characters");
            seen += 1;
            match def.next_level {
                Some(next) => id = next,
                None => break,
            }
        }
        assert_eq!(seen, 3);
    }

    #[test]
    fn missing_level_id_is_an_error() {
        let err = load("level99", Path::new("/nonexistent")).unwrap_err();
        assert!(matches!(err, LevelError::UnknownLevel(_)));
    }
}
