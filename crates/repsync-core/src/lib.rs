pub mod game;
pub mod net;
pub mod player;
pub mod room;
pub mod time;
