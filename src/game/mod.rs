// Game-side logic built on the engine

pub mod control;
