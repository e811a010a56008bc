/// Fixed input handling: winit key codes map to a closed set of actions, and
/// the frame loop reads a per-frame snapshot of which actions are held.
use winit::keyboard::KeyCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Forward,
    Back,
    Left,
    Right,
    Down,
    Up,
    RotateLeft,
    RotateRight,
    RotateUp,
    RotateDown,
    ToggleWireframe,
    ToggleOverlay,
    Quit,
}

impl Action {
    pub const ALL: [Action; 13] = [
        Action::Forward,
        Action::Back,
        Action::Left,
        Action::Right,
        Action::Down,
        Action::Up,
        Action::RotateLeft,
        Action::RotateRight,
        Action::RotateUp,
        Action::RotateDown,
        Action::ToggleWireframe,
        Action::ToggleOverlay,
        Action::Quit,
    ];

    pub const COUNT: usize = Self::ALL.len();

    fn index(self) -> usize {
        self as usize
    }

    /// Toggles fire once per press instead of acting while held.
    pub fn is_toggle(self) -> bool {
        matches!(self, Action::ToggleWireframe | Action::ToggleOverlay)
    }
}

/// Which actions are held this frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeySnapshot {
    held: [bool; Action::COUNT],
}

impl KeySnapshot {
    pub fn with(mut self, action: Action) -> Self {
        self.set(action, true);
        self
    }

    pub fn set(&mut self, action: Action, held: bool) {
        self.held[action.index()] = held;
    }

    pub fn is_held(&self, action: Action) -> bool {
        self.held[action.index()]
    }

    pub fn any_held(&self) -> bool {
        self.held.iter().any(|&h| h)
    }
}

/// Key mapping configuration
#[derive(Debug, Clone)]
pub struct KeyBindings {
    pub forward: KeyCode,
    pub back: KeyCode,
    pub left: KeyCode,
    pub right: KeyCode,
    pub down: KeyCode,
    pub up: KeyCode,
    pub rotate_left: KeyCode,
    pub rotate_right: KeyCode,
    pub rotate_up: KeyCode,
    pub rotate_down: KeyCode,
    pub toggle_wireframe: KeyCode,
    pub toggle_overlay: KeyCode,
    pub quit: KeyCode,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            forward: KeyCode::KeyW,
            back: KeyCode::KeyS,
            left: KeyCode::KeyA,
            right: KeyCode::KeyD,
            down: KeyCode::KeyQ,
            up: KeyCode::KeyE,
            rotate_left: KeyCode::ArrowLeft,
            rotate_right: KeyCode::ArrowRight,
            rotate_up: KeyCode::ArrowUp,
            rotate_down: KeyCode::ArrowDown,
            toggle_wireframe: KeyCode::KeyF,
            toggle_overlay: KeyCode::F1,
            quit: KeyCode::Escape,
        }
    }
}

impl KeyBindings {
    pub fn action_for(&self, code: KeyCode) -> Option<Action> {
        if code == self.forward {
            Some(Action::Forward)
        } else if code == self.back {
            Some(Action::Back)
        } else if code == self.left {
            Some(Action::Left)
        } else if code == self.right {
            Some(Action::Right)
        } else if code == self.down {
            Some(Action::Down)
        } else if code == self.up {
            Some(Action::Up)
        } else if code == self.rotate_left {
            Some(Action::RotateLeft)
        } else if code == self.rotate_right {
            Some(Action::RotateRight)
        } else if code == self.rotate_up {
            Some(Action::RotateUp)
        } else if code == self.rotate_down {
            Some(Action::RotateDown)
        } else if code == self.toggle_wireframe {
            Some(Action::ToggleWireframe)
        } else if code == self.toggle_overlay {
            Some(Action::ToggleOverlay)
        } else if code == self.quit {
            Some(Action::Quit)
        } else {
            None
        }
    }
}

/// Platform-independent input events
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    KeyDown(Action),
    KeyUp(Action),
    /// Absolute pointer position
    PointerMoved { x: f64, y: f64 },
    FocusLost,
}

/// Accumulates events between frames.
#[derive(Debug, Clone, Default)]
pub struct InputState {
    held: KeySnapshot,
    pending_toggles: Vec<Action>,
    pending_pointer: Vec<(f64, f64)>,
    pointer_reset: bool,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn process_event(&mut self, event: InputEvent) {
        match event {
            InputEvent::KeyDown(action) => {
                if action.is_toggle() && !self.held.is_held(action) {
                    self.pending_toggles.push(action);
                }
                self.held.set(action, true);
            }
            InputEvent::KeyUp(action) => self.held.set(action, false),
            InputEvent::PointerMoved { x, y } => self.pending_pointer.push((x, y)),
            InputEvent::FocusLost => {
                self.held = KeySnapshot::default();
                self.pending_pointer.clear();
                self.pointer_reset = true;
            }
        }
    }

    pub fn snapshot(&self) -> KeySnapshot {
        self.held
    }

    pub fn take_toggles(&mut self) -> Vec<Action> {
        std::mem::take(&mut self.pending_toggles)
    }

    pub fn take_pointer_samples(&mut self) -> Vec<(f64, f64)> {
        std::mem::take(&mut self.pending_pointer)
    }

    /// True once after focus was lost; the pointer tracker must re-seed.
    pub fn take_pointer_reset(&mut self) -> bool {
        std::mem::take(&mut self.pointer_reset)
    }
}
