/// Entry point and game loop.

mod config;
mod domain;
mod sim;
mod ui;

use std::time::{Duration, Instant};

use crossterm::event::KeyCode;

use config::GameConfig;
use domain::command::Command;
use sim::channel::{CommandChannel, InputMode};
use sim::level;
use sim::session::{LevelSimulation, Outcome};
use ui::input::InputState;
use ui::terminal::{Renderer, TabletChannel};

const FRAME_SLEEP: Duration = Duration::from_millis(5);

/// Largest time step fed to the simulation: a stalled terminal must
/// not turn into one giant catch-up jump.
const MAX_DT: f32 = 0.25;

fn main() {
    let config = GameConfig::load();
    let start = std::env::args()
        .nth(1)
        .unwrap_or_else(|| level::FIRST_LEVEL.to_string());

    let mut renderer = Renderer::new();
    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let result = run(&config, start, &mut renderer);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    match result {
        Ok(true) => {
            println!();
            println!("The tablets are complete. Thanks for playing!");
        }
        Ok(false) => {}
        Err(e) => eprintln!("Game error: {e}"),
    }
}

/// Run levels until the chain ends (Ok(true)), the player quits
/// (Ok(false)), or something breaks.
fn run(
    config: &GameConfig,
    start: String,
    renderer: &mut Renderer,
) -> Result<bool, Box<dyn std::error::Error>> {
    let mut input = InputState::new();
    let mut next = Some(start);

    while let Some(id) = next.take() {
        let def = level::load(&id, &config.levels_dir)?;
        let mut session = LevelSimulation::new(def, config.timings.clone());
        let mut channel = TabletChannel::new();
        let mut last = Instant::now();

        loop {
            input.drain_events();
            if input.quit_requested() || input.presses().contains(&KeyCode::Esc) {
                return Ok(false);
            }
            feed_channel(&input, &mut channel);

            let now = Instant::now();
            let dt = now.duration_since(last).as_secs_f32().min(MAX_DT);
            last = now;

            if let Some(Outcome::Complete { next_level }) = session.tick(dt, &mut channel) {
                next = next_level;
                break;
            }

            renderer.render(&session, &channel)?;
            std::thread::sleep(FRAME_SLEEP);
        }
    }

    Ok(true)
}

// ── Key Constants ──

const KEYS_LEFT: &[KeyCode] = &[KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')];
const KEYS_RIGHT: &[KeyCode] = &[KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')];
const KEYS_UP: &[KeyCode] = &[KeyCode::Up, KeyCode::Char('w'), KeyCode::Char('W')];
const KEYS_DOWN: &[KeyCode] = &[KeyCode::Down, KeyCode::Char('s'), KeyCode::Char('S')];
const KEYS_REPLAY: &[KeyCode] = &[KeyCode::Enter, KeyCode::Char(' ')];

/// Translate this frame's presses into channel operations. The channel
/// itself refuses input outside `Inputting` mode.
fn feed_channel(input: &InputState, channel: &mut TabletChannel) {
    for key in input.presses() {
        if let Some(command) = map_command(*key) {
            channel.append_command(command);
        } else if *key == KeyCode::Backspace {
            channel.delete_last_command();
        } else if KEYS_REPLAY.contains(key) && channel.mode() == InputMode::Inputting {
            channel.set_mode(InputMode::Replaying);
        }
    }
}

fn map_command(key: KeyCode) -> Option<Command> {
    if KEYS_LEFT.contains(&key) {
        Some(Command::MoveLeft)
    } else if KEYS_RIGHT.contains(&key) {
        Some(Command::MoveRight)
    } else if KEYS_UP.contains(&key) {
        Some(Command::MoveUp)
    } else if KEYS_DOWN.contains(&key) {
        Some(Command::MoveDown)
    } else {
        None
    }
}
