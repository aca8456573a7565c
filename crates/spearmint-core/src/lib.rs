//! Core of the Spearmint corp membership portal: the account lifecycle state
//! machine (verify, register, activate, recover) plus its collaborator
//! contracts. HTML rendering, HTTP routing and the static game database live
//! in the presentation layer on top of this crate.

pub mod config;
pub mod crypto;
pub mod db;
pub mod error;
pub mod lifecycle;
pub mod mail;
pub mod session;
pub mod store;
pub mod util;
pub mod verifier;

pub use config::{Config, MailConfig};
pub use error::{LifecycleError, Rejection};
pub use lifecycle::{Lifecycle, LifecycleOptions, ACTIVATION_CODE_CONSUMED};
pub use session::{PendingRegistration, PendingRegistrations};
pub use store::{AccountStore, NewAccount, OrmStore};
pub use verifier::{OwnedCharacter, Verifier, XmlApiVerifier};
