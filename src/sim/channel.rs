/// The command channel: the simulation's only view of input capture
/// and display feedback. Mode state lives on the channel instance,
/// not in any global — the simulation flips it, the front-end obeys it.

use crate::domain::command::Command;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum InputMode {
    /// Input ignored (intro, execution, banners).
    Locked,
    /// The player is typing commandments.
    Inputting,
    /// The player has asked for the sequence to be replayed.
    Replaying,
}

pub trait CommandChannel {
    fn mode(&self) -> InputMode;
    fn set_mode(&mut self, mode: InputMode);

    fn commands(&self) -> &[Command];
    fn append_command(&mut self, command: Command);
    fn delete_last_command(&mut self);
    fn clear_commands(&mut self);

    /// Echo feedback: swap the glyph at `index` for its executed form.
    fn mark_executed(&mut self, index: usize);

    fn show_message(&mut self, title: &str, body: &str);
    fn hide_message(&mut self);
}
