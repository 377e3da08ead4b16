pub mod board;
pub mod game;
pub mod geometry;
pub mod player;
pub mod rules;
pub mod simulator;
