// Engine modules: simulation clock, input, networking

pub mod clock;
pub mod input;
pub mod net;
