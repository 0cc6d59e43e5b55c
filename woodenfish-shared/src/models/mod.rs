/// Database models for WoodenFish
///
/// Each model owns its SQL. Methods take any `PgExecutor`, so they run
/// against the pool or inside a caller's transaction alike; the few that
/// issue several statements take `&mut PgConnection` instead.
///
/// # Models
///
/// - `user`: accounts (username/email/password or phone)
/// - `user_stat`: per-user tap totals and daily streak
/// - `meditation_session`: append-only session log
/// - `achievement`: achievement catalog and unlocks
/// - `leaderboard`: precomputed rankings per period
/// - `share_task`: share task catalog and completions
/// - `verification_code`: one-time phone login codes
///
/// # Example
///
/// ```no_run
/// use woodenfish_shared::db::pool::{create_pool, PoolConfig};
/// use woodenfish_shared::models::user::{CreateUser, User};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(PoolConfig::default()).await?;
///
/// let user = User::create(
///     &pool,
///     CreateUser {
///         username: "观心".to_string(),
///         email: Some("guanxin@example.com".to_string()),
///         ..Default::default()
///     },
/// )
/// .await?;
/// # Ok(())
/// # }
/// ```

pub mod achievement;
pub mod leaderboard;
pub mod meditation_session;
pub mod share_task;
pub mod user;
pub mod user_stat;
pub mod verification_code;
