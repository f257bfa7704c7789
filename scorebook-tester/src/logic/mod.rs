pub mod book;
pub mod game_log;
pub mod recorder;
pub mod reports;
pub mod seeds;
pub mod simulation;
pub mod synthetic;
pub mod tester;

pub use book::{SeasonBook, season_book};
pub use game_log::GameLog;
pub use seeds::resolve_seed_inputs;
pub use simulation::{SimulationPlan, SimulationSummary};
pub use tester::*;
