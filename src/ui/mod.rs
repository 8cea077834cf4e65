pub mod gamepad;
pub mod input;
pub mod pointer;
pub mod renderer;
pub mod sprites;
