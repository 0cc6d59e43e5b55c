/// Authentication primitives
///
/// # Modules
///
/// - [`password`]: Argon2id hashing for username/email accounts
/// - [`verification`]: phone format checks and verification-code generation
///
/// # Example
///
/// ```
/// use woodenfish_shared::auth::{password, verification};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = password::hash_password("user_password")?;
/// assert!(password::verify_password("user_password", &hash)?);
///
/// assert!(verification::is_valid_phone("13800138000"));
/// let code = verification::generate_code();
/// assert_eq!(code.len(), verification::CODE_LENGTH);
/// # Ok(())
/// # }
/// ```

pub mod password;
pub mod verification;
