// CONTROLLER: input, camera control and the frame loop
pub mod input;
pub mod camera_controller;
pub mod frame_loop;

pub use input::{Action, InputEvent, InputState, KeyBindings, KeySnapshot};
pub use camera_controller::{CameraController, ControlSignal};
pub use frame_loop::{FrameClock, FrameLoop, LoopState, Projection};
