pub mod engine;
pub mod logic;
pub mod tournament;
pub mod worker;
