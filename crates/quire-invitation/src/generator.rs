//! Generated user names, passwords and tickets

use rand::distributions::Alphanumeric;
use rand::Rng;
use std::fmt;

/// Produces candidate user names for provisioned invitees
pub trait UserNameGenerator: Send + Sync + fmt::Debug {
    /// Candidate for the given attempt, starting at zero
    fn generate(&self, first_name: &str, last_name: &str, email: &str, attempt: usize) -> String;
}

/// Produces passwords for provisioned accounts
pub trait PasswordGenerator: Send + Sync + fmt::Debug {
    /// A fresh password
    fn generate(&self) -> String;
}

/// `first_last`, then `first_last` plus four random digits
#[derive(Debug, Clone, Copy, Default)]
pub struct NameBasedUserNameGenerator;

fn slug(value: &str) -> String {
    value
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

impl NameBasedUserNameGenerator {
    fn base(first_name: &str, last_name: &str, email: &str) -> String {
        let parts: Vec<String> = [first_name, last_name]
            .iter()
            .map(|part| slug(part))
            .filter(|part| !part.is_empty())
            .collect();
        if !parts.is_empty() {
            return parts.join("_");
        }
        let local = slug(email.split('@').next().unwrap_or_default());
        if local.is_empty() {
            "invitee".to_string()
        } else {
            local
        }
    }
}

impl UserNameGenerator for NameBasedUserNameGenerator {
    fn generate(&self, first_name: &str, last_name: &str, email: &str, attempt: usize) -> String {
        let base = Self::base(first_name, last_name, email);
        if attempt == 0 {
            base
        } else {
            let suffix: u16 = rand::thread_rng().gen_range(0..10_000);
            format!("{base}{suffix:04}")
        }
    }
}

/// Random alphanumeric passwords
#[derive(Debug, Clone, Copy)]
pub struct RandomPasswordGenerator {
    length: usize,
}

impl RandomPasswordGenerator {
    /// Generator producing passwords of the given length
    pub fn new(length: usize) -> Self {
        Self { length }
    }
}

impl Default for RandomPasswordGenerator {
    fn default() -> Self {
        Self::new(8)
    }
}

impl PasswordGenerator for RandomPasswordGenerator {
    fn generate(&self) -> String {
        rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(self.length)
            .map(char::from)
            .collect()
    }
}

/// Fresh invitation ticket
pub fn generate_ticket() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_name_base() {
        let generator = NameBasedUserNameGenerator;
        assert_eq!(generator.generate("Ann", "O'Neil", "x@y.com", 0), "ann_oneil");
        assert_eq!(generator.generate("", "", "First.Last@y.com", 0), "firstlast");
        assert_eq!(generator.generate("", "", "@y.com", 0), "invitee");
    }

    #[test]
    fn test_retries_add_digits() {
        let name = NameBasedUserNameGenerator.generate("Ann", "Lee", "x@y.com", 3);
        assert!(name.starts_with("ann_lee"));
        assert_eq!(name.len(), "ann_lee".len() + 4);
        assert!(name["ann_lee".len()..].chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_passwords_and_tickets() {
        let password = RandomPasswordGenerator::default().generate();
        assert_eq!(password.len(), 8);
        assert!(password.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(generate_ticket(), generate_ticket());
    }
}
