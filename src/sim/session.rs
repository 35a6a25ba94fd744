/// LevelSimulation: one level attempt loop, driven tick by tick.
///
/// Phase order is strictly cyclic:
///
///   Introduction → Typing → Executing → Failure ─┐
///        ▲                      │                │
///        └──────── retry ───────┘◄───────────────┘
///                               └→ Success → Outcome::Complete
///
/// The Executing phase replays the captured sequence one command at a
/// time. Each command is a fan-out with a join barrier: the roster is
/// sorted by the command's tie-break key, every actor starts the
/// command in that order, and the next command is not dispatched until
/// the slowest actor has fully settled (trailing gravity included) —
/// a later command's legality depends on every position being final.
///
/// Failure and win predicates are evaluated once per executed command,
/// after the barrier, never mid-motion. A failure one sub-step into a
/// jump is noticed a full command-resolution cycle later.

use crate::config::Timings;
use crate::domain::actor::{self, Actor};
use crate::domain::command::{Command, MAX_COMMANDS};
use crate::domain::grid::TileGrid;
use crate::sim::channel::{CommandChannel, InputMode};
use crate::sim::level::LevelDef;

/// Shown when the sequence runs dry without a win.
const RAN_OUT_MESSAGE: &str =
    "Your disciples ran out of commandments. Aimless, they fall away.";

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Introduction,
    Typing,
    Executing,
    Failure,
    Success,
}

/// How a level attempt loop ends. Retry never ends it — only success.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Outcome {
    Complete { next_level: Option<String> },
}

pub struct LevelSimulation {
    level: LevelDef,
    actors: Vec<Actor>,
    instructions: Vec<Command>,
    timings: Timings,

    phase: Phase,
    timer: f32,
    entered: bool,
    /// Failure/Success: the banner is on screen.
    shown: bool,
    /// Executing: the current command has been dispatched to the roster.
    dispatched: bool,
    cursor: usize,
    failure_message: String,
    done: bool,
}

impl LevelSimulation {
    pub fn new(level: LevelDef, timings: Timings) -> LevelSimulation {
        let actors = level.actors();
        LevelSimulation {
            level,
            actors,
            instructions: Vec::new(),
            timings,
            phase: Phase::Introduction,
            timer: 0.0,
            entered: false,
            shown: false,
            dispatched: false,
            cursor: 0,
            failure_message: String::new(),
            done: false,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn grid(&self) -> &TileGrid {
        &self.level.grid
    }

    pub fn actors(&self) -> &[Actor] {
        &self.actors
    }

    pub fn level_name(&self) -> &str {
        &self.level.name
    }

    /// Advance the attempt by one tick. Returns the outcome exactly
    /// once, when the Success banner has run its course.
    pub fn tick(&mut self, dt: f32, channel: &mut dyn CommandChannel) -> Option<Outcome> {
        if self.done {
            return None;
        }
        match self.phase {
            Phase::Introduction => self.tick_introduction(dt, channel),
            Phase::Typing => self.tick_typing(channel),
            Phase::Executing => self.tick_executing(dt, channel),
            Phase::Failure => self.tick_banner(dt, channel, "Failure"),
            Phase::Success => self.tick_banner(dt, channel, "Success"),
        }
    }

    fn enter(&mut self, phase: Phase) {
        self.phase = phase;
        self.timer = 0.0;
        self.entered = false;
        self.shown = false;
        self.dispatched = false;
    }

    // ── Introduction ──

    fn tick_introduction(&mut self, dt: f32, channel: &mut dyn CommandChannel) -> Option<Outcome> {
        if !self.entered {
            channel.set_mode(InputMode::Locked);
            channel.show_message(&self.level.name, &self.level.start_text);
            self.entered = true;
        }
        self.timer += dt;
        if self.timer >= self.timings.intro_seconds {
            channel.hide_message();
            self.enter(Phase::Typing);
        }
        None
    }

    // ── Typing ──

    fn tick_typing(&mut self, channel: &mut dyn CommandChannel) -> Option<Outcome> {
        if !self.entered {
            channel.clear_commands();
            channel.set_mode(InputMode::Inputting);
            self.entered = true;
        }
        if channel.mode() == InputMode::Replaying {
            self.instructions = channel.commands().to_vec();
            self.instructions.truncate(MAX_COMMANDS);
            channel.set_mode(InputMode::Locked);
            self.cursor = 0;
            self.enter(Phase::Executing);
        }
        None
    }

    // ── Executing ──

    fn tick_executing(&mut self, dt: f32, channel: &mut dyn CommandChannel) -> Option<Outcome> {
        if !self.dispatched {
            if self.cursor >= self.instructions.len() {
                self.fail(RAN_OUT_MESSAGE.to_string());
                return None;
            }
            let command = self.instructions[self.cursor];
            channel.mark_executed(self.cursor);
            // Stable sort: ties keep load order, so replays are
            // deterministic for identical levels and sequences.
            self.actors.sort_by_key(|a| command.sort_key(a.position));
            for i in 0..self.actors.len() {
                actor::start_command(&mut self.actors, i, command, &self.level.grid, &self.timings);
            }
            self.dispatched = true;
            return None;
        }

        for i in 0..self.actors.len() {
            actor::advance(&mut self.actors, i, &self.level.grid, dt, &self.timings);
        }
        if !self.actors.iter().all(Actor::is_settled) {
            return None;
        }

        // Join barrier passed: every actor is final. Evaluate.
        if let Some(message) = self.check_failure() {
            self.fail(message);
        } else if self.check_win() {
            self.enter(Phase::Success);
        } else {
            self.cursor += 1;
            self.dispatched = false;
        }
        None
    }

    /// First failing actor wins, in roster order: the void before the
    /// tile's own death message.
    fn check_failure(&self) -> Option<String> {
        for a in &self.actors {
            match self.level.grid.tile_at(a.position) {
                None => return Some(format!("{} fell into the void.", a.name)),
                Some(tile) if tile.is_deadly() => {
                    return Some(format!("{} {}.", a.name, tile.death_message()));
                }
                Some(_) => {}
            }
        }
        None
    }

    fn check_win(&self) -> bool {
        self.actors.iter().any(|a| self.level.grid.is_goal(a.position))
    }

    fn fail(&mut self, message: String) {
        self.failure_message = message;
        self.enter(Phase::Failure);
    }

    // ── Failure / Success banners ──

    fn tick_banner(
        &mut self,
        dt: f32,
        channel: &mut dyn CommandChannel,
        title: &str,
    ) -> Option<Outcome> {
        self.timer += dt;
        if !self.shown {
            if self.timer >= self.timings.banner_lead_seconds {
                let body = match self.phase {
                    Phase::Success => self.level.complete_text.clone(),
                    _ => self.failure_message.clone(),
                };
                channel.show_message(title, &body);
                self.shown = true;
                self.timer = 0.0;
            }
            return None;
        }
        if self.timer < self.timings.banner_seconds {
            return None;
        }
        channel.hide_message();
        match self.phase {
            Phase::Success => {
                self.done = true;
                Some(Outcome::Complete { next_level: self.level.next_level.clone() })
            }
            _ => {
                self.reset_attempt(channel);
                self.enter(Phase::Introduction);
                None
            }
        }
    }

    /// Tear the attempt down to its load state: the roster is rebuilt
    /// from the level's spawn records (restoring load order along with
    /// positions and facing) and the command buffer is wiped.
    fn reset_attempt(&mut self, channel: &mut dyn CommandChannel) {
        self.actors = self.level.actors();
        self.instructions.clear();
        channel.clear_commands();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::grid::Cell;

    /// A player that types its script instantly: switching the channel
    /// to input mode fills the buffer and requests the replay.
    struct ScriptedChannel {
        script: Vec<Command>,
        mode: InputMode,
        commands: Vec<Command>,
        executed: Vec<usize>,
        messages: Vec<(String, String)>,
        visible: bool,
    }

    impl ScriptedChannel {
        fn new(script: Vec<Command>) -> ScriptedChannel {
            ScriptedChannel {
                script,
                mode: InputMode::Locked,
                commands: Vec::new(),
                executed: Vec::new(),
                messages: Vec::new(),
                visible: false,
            }
        }
    }

    impl CommandChannel for ScriptedChannel {
        fn mode(&self) -> InputMode {
            self.mode
        }
        fn set_mode(&mut self, mode: InputMode) {
            if mode == InputMode::Inputting {
                self.commands = self.script.clone();
                self.mode = InputMode::Replaying;
            } else {
                self.mode = mode;
            }
        }
        fn commands(&self) -> &[Command] {
            &self.commands
        }
        fn append_command(&mut self, command: Command) {
            if self.commands.len() < MAX_COMMANDS {
                self.commands.push(command);
            }
        }
        fn delete_last_command(&mut self) {
            self.commands.pop();
        }
        fn clear_commands(&mut self) {
            self.commands.clear();
        }
        fn mark_executed(&mut self, index: usize) {
            self.executed.push(index);
        }
        fn show_message(&mut self, title: &str, body: &str) {
            self.messages.push((title.to_string(), body.to_string()));
            self.visible = true;
        }
        fn hide_message(&mut self) {
            self.visible = false;
        }
    }

    fn level(text: &str) -> LevelDef {
        LevelDef::parse(text).unwrap()
    }

    fn session(text: &str) -> LevelSimulation {
        LevelSimulation::new(level(text), Timings::default())
    }

    /// Tick until the outcome fires or `phase` is reached.
    fn run_until(
        sim: &mut LevelSimulation,
        channel: &mut ScriptedChannel,
        phase: Option<Phase>,
    ) -> Option<Outcome> {
        for _ in 0..100_000 {
            if let Some(outcome) = sim.tick(0.05, channel) {
                return Some(outcome);
            }
            if phase == Some(sim.phase()) {
                return None;
            }
        }
        panic!("simulation never reached {phase:?}");
    }

    #[test]
    fn win_is_recognized_without_a_useful_command() {
        // The actor starts on the Goal tile; one illegal command later
        // the win predicate fires anyway.
        let mut sim = session(
            r#"{
                "name": "Already Home", "startText": "s", "completeText": "done",
                "tiles": "111\n020",
                "characters": [{ "type": "prophet", "position": [1, 1] }]
            }"#,
        );
        let mut ch = ScriptedChannel::new(vec![Command::MoveDown]);
        let outcome = run_until(&mut sim, &mut ch, None).unwrap();
        assert_eq!(outcome, Outcome::Complete { next_level: None });
        assert!(!ch.visible, "banner should be hidden after the outcome");
        // Intro banner first, success banner last.
        assert_eq!(ch.messages.first().unwrap().0, "Already Home");
        let (title, body) = ch.messages.last().unwrap();
        assert_eq!(title, "Success");
        assert_eq!(body, "done");
    }

    #[test]
    fn exhausted_commands_fail_and_retry_resets_the_level() {
        let mut sim = session(
            r#"{
                "name": "No Exit", "startText": "s", "completeText": "c",
                "tiles": "000\n000\n111",
                "characters": [{ "type": "prophet", "position": [0, 1] }]
            }"#,
        );
        let mut ch = ScriptedChannel::new(vec![Command::MoveRight]);

        assert!(run_until(&mut sim, &mut ch, Some(Phase::Failure)).is_none());
        // The command did run before the sequence dried up.
        assert_eq!(sim.actors()[0].position, Cell::new(1, 1));

        // Banner plays out, then a fresh attempt from the load state.
        assert!(run_until(&mut sim, &mut ch, Some(Phase::Introduction)).is_none());
        assert_eq!(sim.actors()[0].position, Cell::new(0, 1));
        assert!(ch
            .messages
            .iter()
            .any(|(t, b)| t == "Failure" && b.contains("ran out of commandments")));
    }

    #[test]
    fn deadly_tile_reports_the_drowning() {
        // Water sits in a pit one step to the right.
        let mut sim = session(
            r#"{
                "name": "The Pit", "startText": "s", "completeText": "c",
                "tiles": "000\n000\n140",
                "characters": [{ "type": "prophet", "position": [0, 1] }]
            }"#,
        );
        let mut ch = ScriptedChannel::new(vec![Command::MoveRight]);
        assert!(run_until(&mut sim, &mut ch, Some(Phase::Failure)).is_none());
        assert!(run_until(&mut sim, &mut ch, Some(Phase::Introduction)).is_none());
        assert!(ch
            .messages
            .iter()
            .any(|(t, b)| t == "Failure" && b == "Prophet drowned in the water."));
    }

    #[test]
    fn walkthrough_reaches_the_goal_and_advances() {
        let mut sim = session(
            r#"{
                "name": "Walk", "nextLevel": "level2",
                "startText": "s", "completeText": "c",
                "tiles": "00000\n00002\n11111",
                "characters": [{ "type": "prophet", "position": [0, 1] }]
            }"#,
        );
        let mut ch = ScriptedChannel::new(vec![
            Command::MoveRight,
            Command::MoveRight,
            Command::MoveRight,
            Command::MoveRight,
        ]);
        let outcome = run_until(&mut sim, &mut ch, None).unwrap();
        assert_eq!(
            outcome,
            Outcome::Complete { next_level: Some("level2".to_string()) }
        );
        // Every command echoed its executed glyph, in order.
        assert_eq!(ch.executed, vec![0, 1, 2, 3]);
    }

    #[test]
    fn roster_is_sorted_per_command() {
        // Listed right-to-left: without the per-command sort the
        // trailing actor would be refused its step.
        let mut sim = session(
            r#"{
                "name": "Queue", "startText": "s", "completeText": "c",
                "tiles": "0000\n0000\n1111",
                "characters": [
                    { "type": "prophet", "position": [2, 1], "name": "A" },
                    { "type": "prophet", "position": [1, 1], "name": "B" }
                ]
            }"#,
        );
        let mut ch = ScriptedChannel::new(vec![Command::MoveLeft]);
        assert!(run_until(&mut sim, &mut ch, Some(Phase::Failure)).is_none());
        let find = |name: &str| {
            sim.actors()
                .iter()
                .find(|a| a.name == name)
                .map(|a| a.position)
                .unwrap()
        };
        assert_eq!(find("B"), Cell::new(0, 1));
        assert_eq!(find("A"), Cell::new(1, 1));
    }

    #[test]
    fn captured_sequence_is_capped() {
        let mut sim = session(
            r#"{
                "name": "Cap", "startText": "s", "completeText": "c",
                "tiles": "00\n11",
                "characters": [{ "type": "prophet", "position": [0, 0] }]
            }"#,
        );
        // A channel that ignores the cap: the simulation clamps anyway.
        let mut ch = ScriptedChannel::new(vec![Command::MoveDown; MAX_COMMANDS + 10]);
        assert!(run_until(&mut sim, &mut ch, Some(Phase::Executing)).is_none());
        assert!(sim.instructions.len() <= MAX_COMMANDS);
    }
}
