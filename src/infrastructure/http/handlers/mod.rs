//! HTTP Handlers

mod generate;
mod ping;
mod player;
mod song;
mod style;
mod websocket;

pub use generate::*;
pub use ping::*;
pub use player::*;
pub use song::*;
pub use style::*;
pub use websocket::*;
