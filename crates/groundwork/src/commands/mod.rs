pub mod down;
pub mod synth;
pub mod up;
pub mod validate;
