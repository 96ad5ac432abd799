//! Chladni library - Live microphone input rendered as a vibrating circular plate

pub mod audio;
pub mod cli;
pub mod error;
pub mod params;
pub mod plate;
pub mod rendering;
