/// API route handlers
///
/// Handlers are organized by resource:
///
/// - `health`: Service info and health check
/// - `users`: Registration, phone login, user lookup
/// - `stats`: Tap statistics
/// - `meditation`: Session logging and history
/// - `achievements`: Achievement catalog and unlocks
/// - `leaderboard`: Rankings per period
/// - `share`: Share tasks and completions

pub mod achievements;
pub mod health;
pub mod leaderboard;
pub mod meditation;
pub mod share;
pub mod stats;
pub mod users;
