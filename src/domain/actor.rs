/// Actors and the per-command execution state machine.
///
/// Character variants are one `Actor` type parameterized by an
/// `ActorKind` behavior table (footprint edge, horizontal mirroring,
/// vertical inversion, initial facing) instead of a type per variant —
/// the differences are data, not behavior.
///
/// ## Execution model
///
/// "Motion over time" is an explicit state machine advanced by the
/// per-tick scheduler, not a coroutine. Each actor is either idle,
/// animating one motion segment, or waiting one tick to retry a gravity
/// pass. When a segment completes, the continuation is resolved in the
/// same tick against the *current* roster state, so chains (jump apex,
/// fall loops) observe other actors' claims as they happen.
///
/// Every command ends with gravity resolution: up to `GRAVITY_PASSES`
/// probes spaced one tick apart, so an actor blocked by a neighbor that
/// is still settling retries after that neighbor has moved on. A probe
/// that finds permanent support (terrain, ladder, settled stack) ends
/// resolution early — nothing below it can change without a new command.

use super::command::Command;
use super::grid::{Cell, TileGrid};
use super::motion::{self, Easing, FallProbe};
use crate::config::Timings;

/// Gravity probes run after every command's primary motion.
const GRAVITY_PASSES: u8 = 5;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Facing {
    Left,
    Right,
}

impl Facing {
    pub fn dx(self) -> i32 {
        match self {
            Facing::Left => -1,
            Facing::Right => 1,
        }
    }
}

/// Behavior table for the character variants.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ActorKind {
    Prophet,
    /// Horizontal commands act mirrored; spawns facing left.
    Pride,
    /// 2×2 footprint.
    Gluttony,
    /// Vertical commands act inverted.
    Envy,
}

impl ActorKind {
    /// Look up a kind by its level-file type code.
    pub fn from_code(code: &str) -> Option<ActorKind> {
        match code {
            "prophet" => Some(ActorKind::Prophet),
            "pride" => Some(ActorKind::Pride),
            "gluttony" => Some(ActorKind::Gluttony),
            "envy" => Some(ActorKind::Envy),
            _ => None,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            ActorKind::Prophet => "Prophet",
            ActorKind::Pride => "Pride",
            ActorKind::Gluttony => "Gluttony",
            ActorKind::Envy => "Envy",
        }
    }

    /// Edge length of the square footprint.
    pub fn footprint_edge(self) -> i32 {
        match self {
            ActorKind::Gluttony => 2,
            _ => 1,
        }
    }

    fn mirrors_horizontal(self) -> bool {
        matches!(self, ActorKind::Pride)
    }

    fn inverts_vertical(self) -> bool {
        matches!(self, ActorKind::Envy)
    }

    pub fn initial_facing(self) -> Facing {
        match self {
            ActorKind::Pride => Facing::Left,
            _ => Facing::Right,
        }
    }

    /// Map a typed command to the move this kind actually performs.
    fn resolve(self, command: Command) -> Command {
        match command {
            Command::MoveLeft if self.mirrors_horizontal() => Command::MoveRight,
            Command::MoveRight if self.mirrors_horizontal() => Command::MoveLeft,
            Command::MoveUp if self.inverts_vertical() => Command::MoveDown,
            Command::MoveDown if self.inverts_vertical() => Command::MoveUp,
            other => other,
        }
    }
}

/// One in-flight interpolation segment.
#[derive(Clone, Copy, Debug)]
struct Motion {
    from: Cell,
    elapsed: f32,
    duration: f32,
    easing: Easing,
}

/// What to do when the current motion segment completes.
#[derive(Clone, Copy, Debug)]
enum After {
    /// Begin gravity resolution with this pass budget.
    Gravity { passes: u8 },
    /// Jump apex: decide whether the falling half happens.
    JumpApex { passes: u8 },
    /// Mid gravity fall: try the next sub-step.
    FallLoop { passes: u8, steps: i32 },
}

#[derive(Clone, Copy, Debug)]
enum ExecState {
    Idle,
    Moving { motion: Motion, after: After },
    /// Retry a gravity pass next tick (blocked by an unsettled neighbor).
    AwaitPass { passes: u8 },
}

pub struct Actor {
    pub name: String,
    pub kind: ActorKind,
    /// Committed anchor cell (bottom-left of the footprint).
    pub position: Cell,
    /// Destination of the in-flight motion; equals `position` when idle.
    pub target: Cell,
    pub facing: Facing,
    /// Whether the last command's primary motion ran (gravity excluded).
    pub moved: bool,
    state: ExecState,
}

impl Actor {
    pub fn new(kind: ActorKind, name: Option<String>, spawn: Cell) -> Actor {
        Actor {
            name: name.unwrap_or_else(|| kind.display_name().to_string()),
            kind,
            position: spawn,
            target: spawn,
            facing: kind.initial_facing(),
            moved: false,
            state: ExecState::Idle,
        }
    }

    pub fn footprint_edge(&self) -> i32 {
        self.kind.footprint_edge()
    }

    /// Is a motion segment in flight?
    pub fn is_moving(&self) -> bool {
        matches!(self.state, ExecState::Moving { .. })
    }

    /// Has this actor finished its whole command (including gravity)?
    pub fn is_settled(&self) -> bool {
        matches!(self.state, ExecState::Idle)
    }

    /// Eased world-space coordinates for presentation. Matches
    /// `position` exactly whenever the actor is settled.
    pub fn render_position(&self) -> (f32, f32) {
        match self.state {
            ExecState::Moving { motion, .. } => {
                let t = if motion.duration > 0.0 {
                    motion.elapsed / motion.duration
                } else {
                    1.0
                };
                let (fx, fy) = motion.easing.sample(t);
                let from = motion.from;
                (
                    from.x as f32 + (self.target.x - from.x) as f32 * fx,
                    from.y as f32 + (self.target.y - from.y) as f32 * fy,
                )
            }
            _ => (self.position.x as f32, self.position.y as f32),
        }
    }

    fn begin_motion(&mut self, delta: (i32, i32), duration: f32, easing: Easing, after: After) {
        self.target = self.position.offset(delta.0, delta.1);
        self.state = ExecState::Moving {
            motion: Motion { from: self.position, elapsed: 0.0, duration, easing },
            after,
        };
    }
}

// ── Command dispatch ──
//
// Free functions over the roster slice: legality needs every actor's
// prospective footprint, so decisions read `&[Actor]` and mutate only
// `actors[idx]`. Callers start commands in sorted roster order; each
// start sees the targets claimed by the actors before it.

/// Begin `command` for actor `idx`: set facing, claim the primary
/// motion if legal, and fall into gravity resolution otherwise.
pub fn start_command(
    actors: &mut [Actor],
    idx: usize,
    command: Command,
    grid: &TileGrid,
    timings: &Timings,
) {
    actors[idx].moved = false;
    match actors[idx].kind.resolve(command) {
        Command::MoveLeft => {
            actors[idx].facing = Facing::Left;
            try_step(actors, idx, (-1, 0), grid, timings);
        }
        Command::MoveRight => {
            actors[idx].facing = Facing::Right;
            try_step(actors, idx, (1, 0), grid, timings);
        }
        Command::MoveUp => {
            if grid.is_climbable(actors[idx].position) {
                try_step(actors, idx, (0, -1), grid, timings);
            } else {
                try_jump(actors, idx, grid, timings);
            }
        }
        Command::MoveDown => {
            try_step(actors, idx, (0, 1), grid, timings);
        }
    }
}

/// Advance actor `idx` by one tick. Motion time integrates first; a
/// completed segment commits the cell and resolves its continuation
/// against the current roster state.
pub fn advance(actors: &mut [Actor], idx: usize, grid: &TileGrid, dt: f32, timings: &Timings) {
    match actors[idx].state {
        ExecState::Idle => {}
        ExecState::AwaitPass { passes } => {
            run_gravity(actors, idx, grid, timings, passes, 0);
        }
        ExecState::Moving { mut motion, after } => {
            motion.elapsed += dt;
            if motion.elapsed < motion.duration {
                actors[idx].state = ExecState::Moving { motion, after };
                return;
            }
            // Segment complete: commit the cell, then continue.
            actors[idx].position = actors[idx].target;
            actors[idx].state = ExecState::Idle;
            match after {
                After::Gravity { passes } => run_gravity(actors, idx, grid, timings, passes, 0),
                After::JumpApex { passes } => resolve_apex(actors, idx, grid, timings, passes),
                After::FallLoop { passes, steps } => {
                    run_gravity(actors, idx, grid, timings, passes, steps)
                }
            }
        }
    }
}

fn try_step(actors: &mut [Actor], idx: usize, delta: (i32, i32), grid: &TileGrid, timings: &Timings) {
    if motion::step_clear(grid, actors, idx, delta.0, delta.1) {
        actors[idx].moved = true;
        actors[idx].begin_motion(
            delta,
            timings.step_seconds,
            Easing::Linear,
            After::Gravity { passes: GRAVITY_PASSES },
        );
    } else {
        // Refused: target stays put, gravity still resolves.
        run_gravity(actors, idx, grid, timings, GRAVITY_PASSES, 0);
    }
}

/// Two-phase diagonal jump in the facing direction. Refused outright
/// under a ceiling; truncates at the apex when already supported there.
fn try_jump(actors: &mut [Actor], idx: usize, grid: &TileGrid, timings: &Timings) {
    let dx = actors[idx].facing.dx();
    if motion::blocked_above(grid, actors, idx) || !motion::step_clear(grid, actors, idx, dx, -1) {
        run_gravity(actors, idx, grid, timings, GRAVITY_PASSES, 0);
        return;
    }
    actors[idx].moved = true;
    actors[idx].begin_motion(
        (dx, -1),
        timings.step_seconds,
        Easing::JumpRise,
        After::JumpApex { passes: GRAVITY_PASSES },
    );
}

fn resolve_apex(actors: &mut [Actor], idx: usize, grid: &TileGrid, timings: &Timings, passes: u8) {
    let dx = actors[idx].facing.dx();
    if motion::landing_blocked(grid, actors, idx)
        || !motion::step_clear(grid, actors, idx, dx, 1)
    {
        // Landed on something at the apex (or the descent is claimed):
        // the jump ends as a single rising step.
        run_gravity(actors, idx, grid, timings, passes, 0);
        return;
    }
    actors[idx].begin_motion(
        (dx, 1),
        timings.step_seconds,
        Easing::JumpFall,
        After::Gravity { passes },
    );
}

/// One gravity pass: probe, and either rest, fall one sub-step, or
/// wait a tick for a neighbor to settle. `steps` bounds the sub-steps
/// of a single fall to the grid height.
fn run_gravity(
    actors: &mut [Actor],
    idx: usize,
    grid: &TileGrid,
    timings: &Timings,
    passes: u8,
    steps: i32,
) {
    if steps >= grid.height() {
        actors[idx].state = ExecState::Idle;
        return;
    }
    match motion::probe_fall(grid, actors, idx) {
        FallProbe::Rest => actors[idx].state = ExecState::Idle,
        FallProbe::Fall => actors[idx].begin_motion(
            (0, 1),
            timings.fall_seconds,
            Easing::Linear,
            After::FallLoop { passes, steps: steps + 1 },
        ),
        FallProbe::Wait => {
            actors[idx].state = if passes <= 1 {
                ExecState::Idle
            } else {
                ExecState::AwaitPass { passes: passes - 1 }
            };
        }
    }
}
