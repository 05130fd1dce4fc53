//! Key bindings for the interactive front end.
//!
//! Raw winit keyboard events are folded into an [`InputState`] holding the
//! three toggles the frame loop reads.
//!
//! | Key          | Effect                                  |
//! |--------------|-----------------------------------------|
//! | `Q`, `Esc`   | quit                                    |
//! | `C`          | toggle clearing the surface every frame |
//! | `F`          | toggle freezing the field               |

use std::collections::HashSet;

use winit::event::{ElementState, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

/// What a bound key does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    ToggleClear,
    ToggleFreeze,
}

impl Action {
    pub fn from_key(key: KeyCode) -> Option<Self> {
        match key {
            KeyCode::KeyQ | KeyCode::Escape => Some(Action::Quit),
            KeyCode::KeyC => Some(Action::ToggleClear),
            KeyCode::KeyF => Some(Action::ToggleFreeze),
            _ => None,
        }
    }
}

/// Toggles driven by the keyboard. All start off.
#[derive(Debug, Default)]
pub struct InputState {
    pub should_quit: bool,
    /// Clear the accumulation surface before every draw.
    pub clear_every_frame: bool,
    /// Skip the simulation tick; frames keep drawing the frozen buffer.
    pub frozen: bool,
    keys_held: HashSet<KeyCode>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a key transition. Held keys don't repeat their toggle.
    pub fn handle_key(&mut self, key: KeyCode, state: ElementState) {
        match state {
            ElementState::Pressed => {
                if !self.keys_held.insert(key) {
                    return;
                }
                match Action::from_key(key) {
                    Some(Action::Quit) => self.should_quit = true,
                    Some(Action::ToggleClear) => self.clear_every_frame ^= true,
                    Some(Action::ToggleFreeze) => self.frozen ^= true,
                    None => {}
                }
            }
            ElementState::Released => {
                self.keys_held.remove(&key);
            }
        }
    }

    /// Process a winit window event.
    pub fn handle_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(key) = event.physical_key {
                    self.handle_key(key, event.state);
                }
            }
            WindowEvent::CloseRequested => self.should_quit = true,
            // Focus loss swallows release events
            WindowEvent::Focused(false) => self.keys_held.clear(),
            _ => {}
        }
    }
}
