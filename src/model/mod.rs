pub mod espn;
pub mod game;
pub mod sync_log;
