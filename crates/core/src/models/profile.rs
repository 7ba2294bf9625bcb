//! Profile and role models

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Error;

/// Platform roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    /// Platform operator
    Admin,
    /// Submits recipes and runs productions
    Brewer,
    /// Buys shares, votes and funds productions
    #[default]
    Investor,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Brewer => "BREWER",
            Role::Investor => "INVESTOR",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Role::Admin => "Administrator",
            Role::Brewer => "Brewer",
            Role::Investor => "Investor",
        }
    }

    pub fn all() -> &'static [Role] {
        &[Role::Admin, Role::Brewer, Role::Investor]
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ADMIN" => Ok(Role::Admin),
            "BREWER" => Ok(Role::Brewer),
            "INVESTOR" => Ok(Role::Investor),
            other => Err(Error::Validation(format!("unknown role '{}'", other))),
        }
    }
}

/// A registered platform member
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub email: String,
    pub full_name: Option<String>,
    pub role: Role,
    pub active: bool,
    pub investment_limit: Option<Decimal>,
    pub created_at: DateTime<Utc>,
}

impl Profile {
    pub fn new(email: impl Into<String>, role: Role) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: email.into(),
            full_name: None,
            role,
            active: true,
            investment_limit: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_full_name(mut self, name: impl Into<String>) -> Self {
        self.full_name = Some(name.into());
        self
    }

    /// Name shown in listings, falling back to the email
    pub fn display_name(&self) -> &str {
        self.full_name.as_deref().unwrap_or(&self.email)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("BREWER".parse::<Role>().unwrap(), Role::Brewer);
        assert!("owner".parse::<Role>().is_err());
    }

    #[test]
    fn test_default_role_is_investor() {
        assert_eq!(Role::default(), Role::Investor);
    }

    #[test]
    fn test_display_name_fallback() {
        let profile = Profile::new("ana@example.com", Role::Investor);
        assert_eq!(profile.display_name(), "ana@example.com");
        let profile = profile.with_full_name("Ana");
        assert_eq!(profile.display_name(), "Ana");
    }
}
