//! User registration checks
//!
//! Field shape validation for new users. Uniqueness against existing users
//! is checked by the ledger.

use esop_types::account::UserProfile;
use esop_types::errors::{ExchangeError, Rejection};
use serde::{Deserialize, Serialize};

/// Characters that would need escaping in a URL path segment (the space
/// is the only whitespace refused)
const USERNAME_FORBIDDEN: &str = "$&+,/:;=?@ <>#%{}|^~[]`";

const EMAIL_LOCAL_SPECIALS: &str = "!#$%&'*+-/=?^_`{|}~";

/// Raw registration details
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserRegistration {
    pub first_name: String,
    pub last_name: String,
    #[serde(alias = "userName")]
    pub username: String,
    pub email: String,
    pub phone_number: String,
}

impl UserRegistration {
    /// Check every field, returning the profile to register
    pub fn validate(&self) -> Result<UserProfile, Rejection> {
        let mut errors = Vec::new();

        if self.first_name.trim().is_empty() {
            errors.push(ExchangeError::invalid_field("firstName", "field is blank"));
        }
        errors.extend(username_problems(&self.username));
        if self.phone_number.trim().is_empty() {
            errors.push(ExchangeError::invalid_field("phoneNumber", "field is blank"));
        } else if !is_valid_phone(&self.phone_number) {
            errors.push(ExchangeError::invalid_field("phoneNumber", "not a valid phoneNumber"));
        }
        if self.email.trim().is_empty() {
            errors.push(ExchangeError::invalid_field("email", "field is blank"));
        } else if !is_valid_email(&self.email) {
            errors.push(ExchangeError::invalid_field("email", "email must be valid"));
        }

        Rejection::check(errors)?;
        Ok(UserProfile {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            username: self.username.clone(),
            email: self.email.clone(),
            phone_number: self.phone_number.clone(),
        })
    }
}

fn username_problems(username: &str) -> Vec<ExchangeError> {
    let field = "userName";
    if username.trim().is_empty() {
        return vec![ExchangeError::invalid_field(field, "field is blank")];
    }

    let mut problems = Vec::new();
    if !username.chars().any(|c| c.is_ascii_alphanumeric()) {
        problems.push(ExchangeError::invalid_field(field, "userName must contain one alphanumeric character"));
    }
    if username
        .chars()
        .any(|c| USERNAME_FORBIDDEN.contains(c))
    {
        problems.push(ExchangeError::invalid_field(
            field,
            format!("userName cannot contain special characters {USERNAME_FORBIDDEN}"),
        ));
    }
    let length = username.chars().count();
    if !(2..=100).contains(&length) {
        problems.push(ExchangeError::invalid_field(field, "userName should have 2 to 100 characters"));
    }
    problems
}

/// Ten digits not starting with 0, optionally preceded by `+` and a 1-3
/// digit country code
pub fn is_valid_phone(phone: &str) -> bool {
    let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    let local_ok = |s: &str| s.len() == 10 && all_digits(s) && !s.starts_with('0');

    match phone.strip_prefix('+') {
        Some(rest) => {
            if rest.len() < 11 || rest.len() > 13 || !all_digits(rest) {
                return false;
            }
            local_ok(&rest[rest.len() - 10..])
        }
        None => local_ok(phone),
    }
}

/// Conservative `local@domain.tld` check
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.rsplit_once('@') else {
        return false;
    };

    let local_char = |c: char| c.is_ascii_alphanumeric() || EMAIL_LOCAL_SPECIALS.contains(c);
    let local_ok = !local.is_empty()
        && !local.starts_with('.')
        && !local.ends_with('.')
        && local.chars().all(|c| local_char(c) || c == '.');
    if !local_ok {
        return false;
    }

    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 {
        return false;
    }
    let (tld, hosts) = match labels.split_last() {
        Some(parts) => parts,
        None => return false,
    };
    let tld_ok = (2..=6).contains(&tld.len()) && tld.chars().all(|c| c.is_ascii_alphabetic());
    let hosts_ok = hosts.iter().all(|label| {
        !label.is_empty()
            && !label.starts_with('-')
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    });
    tld_ok && hosts_ok
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registration() -> UserRegistration {
        UserRegistration {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            username: "ada_l".to_string(),
            email: "ada@example.com".to_string(),
            phone_number: "+919876543210".to_string(),
        }
    }

    #[test]
    fn test_valid_registration() {
        let profile = registration().validate().unwrap();
        assert_eq!(profile.username, "ada_l");
    }

    #[test]
    fn test_last_name_is_optional() {
        let mut reg = registration();
        reg.last_name.clear();
        assert!(reg.validate().is_ok());
    }

    #[test]
    fn test_collects_every_problem() {
        let reg = UserRegistration {
            first_name: " ".to_string(),
            last_name: String::new(),
            username: "a".to_string(),
            email: "not-an-email".to_string(),
            phone_number: "0123456789".to_string(),
        };
        let err = reg.validate().unwrap_err();
        assert_eq!(err.errors.len(), 4, "{:?}", err.reasons());
    }

    #[test]
    fn test_username_rules() {
        assert!(username_problems("ab").is_empty());
        assert!(username_problems("a-b.c_d").is_empty());
        assert_eq!(username_problems("__").len(), 1);
        assert_eq!(username_problems("ab cd").len(), 1);
        assert_eq!(username_problems("a?b").len(), 1);
        assert_eq!(username_problems("a`b").len(), 1);
        // only the space is refused among whitespace
        assert!(username_problems("ab\tcd").is_empty());
        assert!(username_problems("a\"b\\c").is_empty());
        assert_eq!(username_problems(&"x".repeat(101)).len(), 1);
        assert_eq!(username_problems("").len(), 1);
    }

    #[test]
    fn test_phone_rules() {
        assert!(is_valid_phone("9876543210"));
        assert!(is_valid_phone("+19876543210"));
        assert!(is_valid_phone("+1239876543210"));
        assert!(!is_valid_phone("0876543210"));
        assert!(!is_valid_phone("987654321"));
        assert!(!is_valid_phone("+12349876543210"));
        assert!(!is_valid_phone("+9876543210"));
        assert!(!is_valid_phone("98765x3210"));
    }

    #[test]
    fn test_email_rules() {
        assert!(is_valid_email("ada@example.com"));
        assert!(is_valid_email("first.last+tag@mail.example.co"));
        assert!(!is_valid_email("ada.example.com"));
        assert!(!is_valid_email("ada@example"));
        assert!(!is_valid_email("ada@example.c0m"));
        assert!(!is_valid_email(".ada@example.com"));
        assert!(!is_valid_email("ada@@example.com"));
    }

    #[test]
    fn test_deserialize_camel_case() {
        let reg: UserRegistration = serde_json::from_str(
            r#"{"firstName":"Ada","userName":"ada","email":"ada@example.com","phoneNumber":"9876543210"}"#,
        )
        .unwrap();
        assert_eq!(reg.username, "ada");
        assert_eq!(reg.last_name, "");
    }
}
