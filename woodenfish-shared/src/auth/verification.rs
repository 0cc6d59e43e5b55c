/// Phone login helpers
///
/// Format checks and random generation for the SMS verification-code flow.
/// Persistence of issued codes lives in [`crate::models::verification_code`].
///
/// - **Phone**: 11 ASCII digits, leading `1` (mainland China mobile numbers)
/// - **Code**: 6 decimal digits, uniformly random, zero-padded
/// - **Auto username**: `用户` + last four digits of the phone

use rand::Rng;

/// Number of digits in a verification code
pub const CODE_LENGTH: usize = 6;

/// Number of digits in a phone number
pub const PHONE_LENGTH: usize = 11;

/// Prefix of usernames generated for phone-only accounts
pub const AUTO_USERNAME_PREFIX: &str = "用户";

/// Checks that `phone` is an 11-digit number starting with `1`.
///
/// # Example
///
/// ```
/// use woodenfish_shared::auth::verification::is_valid_phone;
///
/// assert!(is_valid_phone("13800138000"));
/// assert!(!is_valid_phone("12345"));
/// assert!(!is_valid_phone("23800138000"));
/// ```
pub fn is_valid_phone(phone: &str) -> bool {
    phone.len() == PHONE_LENGTH
        && phone.starts_with('1')
        && phone.bytes().all(|b| b.is_ascii_digit())
}

/// Checks that `code` has the shape of an issued verification code.
pub fn is_valid_code_format(code: &str) -> bool {
    code.len() == CODE_LENGTH && code.bytes().all(|b| b.is_ascii_digit())
}

/// Generates a fresh 6-digit verification code.
pub fn generate_code() -> String {
    let value: u32 = rand::thread_rng().gen_range(0..1_000_000);
    format!("{:0width$}", value, width = CODE_LENGTH)
}

/// Username given to an account created by phone login, e.g. `用户8000`.
///
/// Callers must pass a phone that satisfied [`is_valid_phone`].
pub fn default_username(phone: &str) -> String {
    let tail = &phone[phone.len().saturating_sub(4)..];
    format!("{}{}", AUTO_USERNAME_PREFIX, tail)
}

/// Fallback username when [`default_username`] is already taken, e.g. `用户8000_0427`.
pub fn username_with_random_suffix(phone: &str) -> String {
    let suffix: u32 = rand::thread_rng().gen_range(0..10_000);
    format!("{}_{:04}", default_username(phone), suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid_phone() {
        assert!(is_valid_phone("13800138000"));
        assert!(is_valid_phone("19912345678"));

        assert!(!is_valid_phone("12345"));
        assert!(!is_valid_phone(""));
        assert!(!is_valid_phone("138001380000"));
        assert!(!is_valid_phone("03800138000"));
        assert!(!is_valid_phone("1380013800a"));
        assert!(!is_valid_phone("+8613800138"));
        // full-width digits are not ASCII digits
        assert!(!is_valid_phone("１３８００１３８０００"));
    }

    #[test]
    fn test_generate_code_shape() {
        for _ in 0..200 {
            let code = generate_code();
            assert_eq!(code.len(), CODE_LENGTH);
            assert!(is_valid_code_format(&code));
        }
    }

    #[test]
    fn test_generate_code_varies() {
        let codes: std::collections::HashSet<String> = (0..50).map(|_| generate_code()).collect();
        assert!(codes.len() > 1);
    }

    #[test]
    fn test_is_valid_code_format() {
        assert!(is_valid_code_format("000000"));
        assert!(is_valid_code_format("123456"));
        assert!(!is_valid_code_format("12345"));
        assert!(!is_valid_code_format("1234567"));
        assert!(!is_valid_code_format("12a456"));
    }

    #[test]
    fn test_default_username() {
        assert_eq!(default_username("13800138000"), "用户8000");
        assert_eq!(default_username("13900139123"), "用户9123");
    }

    #[test]
    fn test_username_with_random_suffix() {
        let name = username_with_random_suffix("13800138000");
        assert!(name.starts_with("用户8000_"));

        let suffix = name.trim_start_matches("用户8000_");
        assert_eq!(suffix.len(), 4);
        assert!(suffix.bytes().all(|b| b.is_ascii_digit()));
    }
}
