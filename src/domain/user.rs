use std::str::FromStr;

use uuid::Uuid;

use super::errors::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Customer,
    Cashier,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Cashier => "cashier",
            Role::Admin => "admin",
        }
    }

    pub fn is_staff(self) -> bool {
        matches!(self, Role::Cashier | Role::Admin)
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "customer" => Ok(Role::Customer),
            "cashier" => Ok(Role::Cashier),
            "admin" => Ok(Role::Admin),
            other => Err(DomainError::Internal(format!("unknown role '{}'", other))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub loyalty_points: i32,
    pub role: Role,
}

impl User {
    pub fn require_staff(&self) -> Result<(), DomainError> {
        if self.role.is_staff() {
            Ok(())
        } else {
            Err(DomainError::Forbidden("cashier or admin role required"))
        }
    }

    pub fn require_admin(&self) -> Result<(), DomainError> {
        if self.role == Role::Admin {
            Ok(())
        } else {
            Err(DomainError::Forbidden("admin role required"))
        }
    }

    /// Cashiers may not act on their own payments; admins may.
    pub fn may_review_payment_of(&self, payer: Uuid) -> bool {
        match self.role {
            Role::Admin => true,
            Role::Cashier => self.id != payer,
            Role::Customer => false,
        }
    }
}
