use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::DomainError;

/// User entity - a shopper or an administrator.
///
/// Deliberately not `Serialize`: responses go through a DTO so the
/// password hash can never leak.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Profile fields a user may change about themselves.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub name: Option<String>,
    pub email: Option<String>,
}

impl User {
    /// Create a new regular user with generated ID and timestamps.
    pub fn new(name: String, email: String, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name,
            email: normalize_email(&email),
            password_hash,
            is_admin: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Create an administrator account.
    pub fn new_admin(name: String, email: String, password_hash: String) -> Self {
        Self {
            is_admin: true,
            ..Self::new(name, email, password_hash)
        }
    }

    pub fn apply(&mut self, changes: UserChanges) -> Result<(), DomainError> {
        if let Some(name) = changes.name {
            self.name = name.trim().to_string();
        }
        if let Some(email) = changes.email {
            if !is_plausible_email(&email) {
                return Err(DomainError::Validation("Invalid email address".to_string()));
            }
            self.email = normalize_email(&email);
        }
        self.updated_at = Utc::now();
        Ok(())
    }
}

/// Emails are stored trimmed and lowercased so lookups are exact matches.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn is_plausible_email(email: &str) -> bool {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.ends_with('.'),
        None => false,
    }
}

/// Mask an email for logging: `jane@example.com` becomes `j***@example.com`.
pub fn mask_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) => {
            let first = local.chars().next();
            match first {
                Some(c) if local.chars().count() > 1 => format!("{c}***@{domain}"),
                _ => format!("***@{domain}"),
            }
        }
        None => "***".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_user_is_not_admin_and_email_is_normalized() {
        let user = User::new("Jane".into(), "  Jane@Example.COM ".into(), "hash".into());
        assert!(!user.is_admin);
        assert_eq!(user.email, "jane@example.com");

        let admin = User::new_admin("Root".into(), "root@example.com".into(), "hash".into());
        assert!(admin.is_admin);
    }

    #[test]
    fn test_apply_rejects_bad_email() {
        let mut user = User::new("Jane".into(), "jane@example.com".into(), "hash".into());
        let result = user.apply(UserChanges {
            name: None,
            email: Some("not-an-email".into()),
        });
        assert!(matches!(result, Err(DomainError::Validation(_))));
        assert_eq!(user.email, "jane@example.com");
    }

    #[test]
    fn test_mask_email() {
        assert_eq!(mask_email("jane@example.com"), "j***@example.com");
        assert_eq!(mask_email("j@example.com"), "***@example.com");
        assert_eq!(mask_email("garbage"), "***");
    }

    #[test]
    fn test_is_plausible_email() {
        assert!(is_plausible_email("a@b.co"));
        assert!(!is_plausible_email("@b.co"));
        assert!(!is_plausible_email("a@localhost"));
        assert!(!is_plausible_email("a@b."));
    }
}
