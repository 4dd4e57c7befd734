//! Administrator accounts and roles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ids::{CompanyId, UserId};

/// Administrative role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    SuperAdmin,
    SiteAdmin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "super_admin",
            Role::SiteAdmin => "site_admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    /// Accepts stored spellings such as `"Super Admin"` or `"SITE_ADMIN"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().replace(char::is_whitespace, "_").to_lowercase();
        match normalized.as_str() {
            "super_admin" => Ok(Role::SuperAdmin),
            "site_admin" => Ok(Role::SiteAdmin),
            _ => Err(format!("Unknown role: {}", s)),
        }
    }
}

/// A stored administrator account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub name: Option<String>,
    #[serde(skip_serializing, default)]
    pub password_hash: Option<String>,
    pub role: Role,
    pub company_id: Option<CompanyId>,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

/// Values for a new account. The password is already hashed.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub email: String,
    pub name: Option<String>,
    pub password_hash: String,
    pub role: Role,
    pub company_id: Option<CompanyId>,
}

/// Partial update of an account's access settings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserUpdate {
    pub role: Option<Role>,
    /// `Some(None)` clears the company.
    pub company_id: Option<Option<CompanyId>>,
}

/// User listing row with the owning company's name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserWithCompany {
    #[serde(flatten)]
    pub user: User,
    pub company_name: Option<String>,
}

/// The authenticated administrator performing an operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: UserId,
    pub email: String,
    pub role: Role,
    pub company_id: Option<CompanyId>,
}

impl Actor {
    pub fn is_super_admin(&self) -> bool {
        self.role == Role::SuperAdmin
    }

    /// Which companies' records this actor may read.
    pub fn scope(&self) -> Scope {
        match (self.role, self.company_id) {
            (Role::SuperAdmin, _) => Scope::All,
            (Role::SiteAdmin, Some(company)) => Scope::Company(company),
            (Role::SiteAdmin, None) => Scope::Nothing,
        }
    }

    /// Whether records owned by `company` are visible to this actor.
    pub fn can_see(&self, company: Option<CompanyId>) -> bool {
        self.is_super_admin() || (company.is_some() && company == self.company_id)
    }
}

/// Visibility of company-owned records for one actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    All,
    Company(CompanyId),
    /// A site admin not yet assigned to a company.
    Nothing,
}

impl From<&User> for Actor {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id,
            email: user.email.clone(),
            role: user.role,
            company_id: user.company_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parses_loose_spellings() {
        assert_eq!("Super Admin".parse::<Role>().unwrap(), Role::SuperAdmin);
        assert_eq!("site_admin".parse::<Role>().unwrap(), Role::SiteAdmin);
        assert_eq!(" SITE ADMIN ".parse::<Role>().unwrap(), Role::SiteAdmin);
        assert!("owner".parse::<Role>().is_err());
    }

    #[test]
    fn test_site_admin_without_company_sees_nothing() {
        let actor = Actor {
            user_id: UserId::random(),
            email: "a@b.c".into(),
            role: Role::SiteAdmin,
            company_id: None,
        };
        assert_eq!(actor.scope(), Scope::Nothing);
        assert!(!actor.can_see(None));
        assert!(!actor.can_see(Some(CompanyId::random())));
    }
}
