//! Input validation for account and team forms

use once_cell::sync::Lazy;
use regex::Regex;
use uuid::Uuid;

pub const MIN_PASSWORD_LEN: usize = 6;

static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_.-]{3,32}$").expect("valid username regex"));

/// Returns a message describing the problem, if any
pub fn check_username(username: &str) -> Result<(), String> {
    if USERNAME_RE.is_match(username) {
        Ok(())
    } else {
        Err(format!(
            "Invalid username \"{}\": use 3 to 32 letters, digits, '.', '_' or '-'",
            username
        ))
    }
}

pub fn check_password(password: &str) -> Result<(), String> {
    if password.chars().count() >= MIN_PASSWORD_LEN {
        Ok(())
    } else {
        Err(format!("The password must have at least {} characters", MIN_PASSWORD_LEN))
    }
}

/// Trimmed, non-empty name for a team or project title
pub fn check_name(kind: &str, value: &str) -> Result<String, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(format!("The {} cannot be empty", kind))
    } else {
        Ok(trimmed.to_string())
    }
}

/// Random six-digit team join code
pub fn generate_team_code() -> String {
    let n = Uuid::new_v4().as_u128() % 1_000_000;
    format!("{:06}", n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usernames() {
        assert!(check_username("ann").is_ok());
        assert!(check_username("ann.smith-2_b").is_ok());
        assert!(check_username("an").is_err());
        assert!(check_username("ann smith").is_err());
        assert!(check_username(&"a".repeat(33)).is_err());
    }

    #[test]
    fn test_passwords() {
        assert!(check_password("secret").is_ok());
        assert!(check_password("short").is_err());
    }

    #[test]
    fn test_names_are_trimmed() {
        assert_eq!(check_name("title", "  Logo ").unwrap(), "Logo");
        assert!(check_name("title", "   ").is_err());
    }

    #[test]
    fn test_team_code_shape() {
        for _ in 0..50 {
            let code = generate_team_code();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }
}
