pub mod cart_service;
pub mod catalog_service;
pub mod loyalty_service;
pub mod order_service;

use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::ports::UserRepository;
use crate::domain::user::User;

fn load_user<U: UserRepository>(users: &U, id: Uuid) -> Result<User, DomainError> {
    users.find_user(id)?.ok_or(DomainError::NotFound("User"))
}
