mod component;
mod debounce;
mod options;
mod render;
pub mod scale;
mod state;
mod types;

pub use component::ForceGraphCanvas;
