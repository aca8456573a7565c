pub mod character;
pub mod user;

pub use character::Entity as Character;
pub use user::Entity as User;
