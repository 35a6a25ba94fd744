/// Movement legality, occupancy and gravity queries — single source of truth.
///
/// Two distinct concepts, queried separately:
///   1. TERRAIN   — what a cell IS (`TileGrid`)
///   2. OCCUPANCY — who is claiming a cell (actor footprints)
///
/// A step is legal when every cell of the translated footprint is
/// in bounds, non-blocking terrain, and free of other actors.
///
/// ## Prospective occupancy
///
/// Occupancy is checked against each actor's *target* footprint — its
/// committed position plus any in-flight movement delta. An actor
/// stepping out of a cell has prospectively vacated it, and an actor
/// stepping into a cell has prospectively claimed it. This is what lets
/// simultaneous moves chain without false collisions, and what stops
/// two actors resolving the same destination.
///
/// ## Landing on actors
///
/// A falling actor blocked by an actor below may be landing on a stack.
/// Below the immediate occupant at most two further cells are probed:
/// if the chain reaches terrain support within that depth, the stack is
/// settled and the fall rests on it. Deeper or still-moving chains are
/// reported as unsettled so later gravity passes can follow the cascade.

use super::actor::Actor;
use super::grid::{Cell, TileGrid};

/// All cells of an N×N footprint anchored at its bottom-left cell.
/// The footprint extends rightward and upward (toward smaller `y`).
pub fn footprint(anchor: Cell, edge: i32) -> impl Iterator<Item = Cell> {
    (0..edge).flat_map(move |i| (0..edge).map(move |j| Cell::new(anchor.x + i, anchor.y - j)))
}

/// Is `cell` covered by another actor's prospective footprint?
pub fn is_actor_at(actors: &[Actor], cell: Cell, exclude: Option<usize>) -> bool {
    actors.iter().enumerate().any(|(j, other)| {
        exclude != Some(j) && footprint(other.target, other.footprint_edge()).any(|c| c == cell)
    })
}

/// Can actor `idx` translate its whole footprint by `(dx, dy)`?
pub fn step_clear(grid: &TileGrid, actors: &[Actor], idx: usize, dx: i32, dy: i32) -> bool {
    let anchor = actors[idx].position.offset(dx, dy);
    let edge = actors[idx].footprint_edge();
    footprint(anchor, edge)
        .all(|cell| !grid.is_blocking(cell) && !is_actor_at(actors, cell, Some(idx)))
}

/// Is any cell directly above actor `idx`'s footprint blocked or claimed?
/// A jump is refused outright when this holds.
pub fn blocked_above(grid: &TileGrid, actors: &[Actor], idx: usize) -> bool {
    let a = &actors[idx];
    let edge = a.footprint_edge();
    let top = a.position.y - edge;
    (0..edge).any(|i| {
        let cell = Cell::new(a.position.x + i, top);
        grid.is_blocking(cell) || is_actor_at(actors, cell, Some(idx))
    })
}

/// Is any cell in the row below actor `idx`'s footprint blocked or claimed?
/// Decides whether a jump truncates at its apex.
pub fn landing_blocked(grid: &TileGrid, actors: &[Actor], idx: usize) -> bool {
    let a = &actors[idx];
    let edge = a.footprint_edge();
    (0..edge).any(|i| {
        let cell = Cell::new(a.position.x + i, a.position.y + 1);
        grid.is_blocking(cell) || is_actor_at(actors, cell, Some(idx))
    })
}

/// What a gravity sub-step should do for actor `idx`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FallProbe {
    /// One cell of free fall is legal.
    Fall,
    /// At rest: ladder, terrain support, or a settled actor stack.
    /// Nothing below can change without a new command.
    Rest,
    /// Blocked by another actor that may still move; retry next pass.
    Wait,
}

pub fn probe_fall(grid: &TileGrid, actors: &[Actor], idx: usize) -> FallProbe {
    let a = &actors[idx];

    // On or directly above a ladder: never falls.
    if grid.is_climbable(a.position) || grid.is_climbable(a.position.below()) {
        return FallProbe::Rest;
    }

    let edge = a.footprint_edge();
    let mut waiting = false;
    for i in 0..edge {
        let cell = Cell::new(a.position.x + i, a.position.y + 1);
        if grid.is_blocking(cell) {
            return FallProbe::Rest;
        }
        if is_actor_at(actors, cell, Some(idx)) {
            if stack_settled(grid, actors, idx, cell) {
                return FallProbe::Rest;
            }
            waiting = true;
        }
    }

    if waiting { FallProbe::Wait } else { FallProbe::Fall }
}

/// Walk down from an occupied cell, at most two probes past the first
/// occupant, looking for terrain support under the stack.
fn stack_settled(grid: &TileGrid, actors: &[Actor], exclude: usize, mut cell: Cell) -> bool {
    for _ in 0..3 {
        if !is_actor_at(actors, cell, Some(exclude)) {
            // The chain broke before reaching support: still in motion.
            return false;
        }
        let under = cell.below();
        if grid.is_blocking(under) || grid.is_climbable(cell) || grid.is_climbable(under) {
            return true;
        }
        cell = under;
    }
    false
}

// ── Easing ──

/// Interpolation curve for a motion segment. Samples are taken per
/// axis: jumps ease the horizontal and vertical shifts differently to
/// trace an arc; everything else is linear.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Easing {
    Linear,
    /// Rising jump half: ease-out horizontal, ease-in vertical.
    JumpRise,
    /// Falling jump half: mirrored.
    JumpFall,
}

impl Easing {
    /// Fractions of horizontal and vertical travel at progress `t` in [0, 1].
    pub fn sample(self, t: f32) -> (f32, f32) {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => (t, t),
            Easing::JumpRise => (ease_out(t), ease_in(t)),
            Easing::JumpFall => (ease_in(t), ease_out(t)),
        }
    }
}

fn ease_in(t: f32) -> f32 {
    t * t
}

fn ease_out(t: f32) -> f32 {
    1.0 - (1.0 - t) * (1.0 - t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::actor::ActorKind;

    fn grid(text: &str) -> TileGrid {
        TileGrid::parse(text).unwrap()
    }

    fn actor(kind: ActorKind, x: i32, y: i32) -> Actor {
        Actor::new(kind, None, Cell::new(x, y))
    }

    #[test]
    fn footprint_extends_right_and_up() {
        let cells: Vec<Cell> = footprint(Cell::new(2, 5), 2).collect();
        assert_eq!(cells.len(), 4);
        for c in [
            Cell::new(2, 5),
            Cell::new(2, 4),
            Cell::new(3, 5),
            Cell::new(3, 4),
        ] {
            assert!(cells.contains(&c));
        }
    }

    #[test]
    fn occupancy_is_prospective() {
        let g = grid("000\n000\n111");
        let mut actors = vec![actor(ActorKind::Prophet, 0, 1), actor(ActorKind::Prophet, 1, 1)];

        // At rest, the right actor occupies its own cell.
        assert!(is_actor_at(&actors, Cell::new(1, 1), Some(0)));
        assert!(!step_clear(&g, &actors, 0, 1, 0));

        // Once it claims the cell to its right, it has vacated.
        actors[1].target = Cell::new(2, 1);
        assert!(!is_actor_at(&actors, Cell::new(1, 1), Some(0)));
        assert!(is_actor_at(&actors, Cell::new(2, 1), Some(0)));
        assert!(step_clear(&g, &actors, 0, 1, 0));
    }

    #[test]
    fn step_checks_every_footprint_cell() {
        // Gap of height 1 to the right: a 2×2 actor cannot enter it.
        let g = grid("0010\n0000\n1111");
        let actors = vec![actor(ActorKind::Gluttony, 0, 1)];
        assert!(!step_clear(&g, &actors, 0, 1, 0));
        // A 1×1 actor can.
        let actors = vec![actor(ActorKind::Prophet, 0, 1)];
        assert!(step_clear(&g, &actors, 0, 1, 0));
    }

    #[test]
    fn fall_probe_rests_on_ground_and_ladders() {
        let g = grid("000\n030\n111");
        // On ground.
        let actors = vec![actor(ActorKind::Prophet, 0, 1)];
        assert_eq!(probe_fall(&g, &actors, 0), FallProbe::Rest);
        // On a ladder cell.
        let actors = vec![actor(ActorKind::Prophet, 1, 1)];
        assert_eq!(probe_fall(&g, &actors, 0), FallProbe::Rest);
        // Directly above a ladder.
        let actors = vec![actor(ActorKind::Prophet, 1, 0)];
        assert_eq!(probe_fall(&g, &actors, 0), FallProbe::Rest);
    }

    #[test]
    fn fall_probe_falls_through_open_air() {
        let g = grid("000\n000\n111");
        let actors = vec![actor(ActorKind::Prophet, 1, 0)];
        assert_eq!(probe_fall(&g, &actors, 0), FallProbe::Fall);
    }

    #[test]
    fn fall_rests_on_a_settled_stack() {
        let g = grid("0\n0\n0\n1");
        let actors = vec![actor(ActorKind::Prophet, 0, 1), actor(ActorKind::Prophet, 0, 2)];
        // The lower actor stands on ground, so the upper one lands on it.
        assert_eq!(probe_fall(&g, &actors, 0), FallProbe::Rest);
    }

    #[test]
    fn fall_waits_for_an_unsettled_stack() {
        let g = grid("0\n0\n0\n0\n0\n0\n1");
        // Lower actor is mid-fall: its target has vacated the cell below
        // us but it is three cells from support, so the stack probe
        // cannot see it settle.
        let mut actors =
            vec![actor(ActorKind::Prophet, 0, 1), actor(ActorKind::Prophet, 0, 2)];
        actors[1].target = Cell::new(0, 3);
        // The cell below actor 0 is prospectively free: free fall.
        assert_eq!(probe_fall(&g, &actors, 0), FallProbe::Fall);

        // A resting occupant hanging over deep air: unsettled, wait.
        actors[1].target = Cell::new(0, 2);
        assert_eq!(probe_fall(&g, &actors, 0), FallProbe::Wait);
    }

    #[test]
    fn jump_precheck_sees_the_ceiling() {
        let g = grid("111\n000\n111");
        let actors = vec![actor(ActorKind::Prophet, 1, 1)];
        assert!(blocked_above(&g, &actors, 0));
        let g = grid("000\n000\n111");
        let actors = vec![actor(ActorKind::Prophet, 1, 1)];
        assert!(!blocked_above(&g, &actors, 0));
    }

    #[test]
    fn easing_endpoints_are_exact() {
        for easing in [Easing::Linear, Easing::JumpRise, Easing::JumpFall] {
            assert_eq!(easing.sample(0.0), (0.0, 0.0));
            assert_eq!(easing.sample(1.0), (1.0, 1.0));
        }
    }

    #[test]
    fn jump_rise_leads_with_the_horizontal() {
        let (fx, fy) = Easing::JumpRise.sample(0.5);
        assert!(fx > fy);
        let (fx, fy) = Easing::JumpFall.sample(0.5);
        assert!(fx < fy);
    }
}
