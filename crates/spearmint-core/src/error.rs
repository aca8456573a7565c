use thiserror::Error;

/// User-facing rejection of a lifecycle operation. Always recoverable; the
/// presentation layer renders the message and may branch on `reason_code`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("It doesn't seem like you correctly entered your API credential")]
    InvalidApiCredential,

    #[error("We could not reach the character verification service")]
    VerifierUnreachable,

    #[error("None of your characters are in the corporation")]
    NotInCorp,

    #[error("You have already registered")]
    AlreadyRegistered,

    #[error("One of your characters is already registered to another account")]
    CharacterAlreadyClaimed,

    #[error("No account with that email address")]
    AccountNotFound,

    #[error("That code is not valid")]
    InvalidCode,

    #[error("That code has expired")]
    ExpiredCode,

    #[error("Incorrect email/password combination")]
    BadCredential,

    #[error("Password must not be empty")]
    EmptyPassword,

    #[error("Passwords do not match")]
    PasswordMismatch,
}

impl Rejection {
    pub fn reason_code(&self) -> &'static str {
        match self {
            Rejection::InvalidApiCredential => "invalid_api_credential",
            Rejection::VerifierUnreachable => "verifier_unreachable",
            Rejection::NotInCorp => "not_in_corp",
            Rejection::AlreadyRegistered => "already_registered",
            Rejection::CharacterAlreadyClaimed => "character_already_claimed",
            Rejection::AccountNotFound => "account_not_found",
            Rejection::InvalidCode => "invalid_code",
            Rejection::ExpiredCode => "expired_code",
            Rejection::BadCredential => "bad_credential",
            Rejection::EmptyPassword => "empty_password",
            Rejection::PasswordMismatch => "password_mismatch",
        }
    }
}

/// Account store failure. Unique-constraint violations are classified so the
/// controller can fold a registration race into `AlreadyRegistered`.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unique constraint violated")]
    Conflict,

    #[error(transparent)]
    Db(#[from] sea_orm::DbErr),
}

/// Identity verifier failure, split so rejections map to distinct
/// user-facing reasons.
#[derive(Debug, Error)]
pub enum VerifierError {
    #[error("credential was not accepted by the upstream API")]
    BadCredential,

    #[error("upstream API unreachable: {0}")]
    Unreachable(String),

    #[error("upstream API rejected the request: {0}")]
    Rejected(String),
}

#[derive(Debug, Error)]
pub enum SendError {
    #[error("mail transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("mail API returned status {status}: {body}")]
    Upstream { status: u16, body: String },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("{key} has invalid value {value:?}")]
    Invalid { key: &'static str, value: String },
}

/// Outcome type of every lifecycle operation. `Rejected` is the normal
/// user-facing branch; `Store` is infrastructure failure and the only variant
/// an operator should ever see in logs at error level.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error(transparent)]
    Rejected(#[from] Rejection),

    #[error("account store failure: {0}")]
    Store(sea_orm::DbErr),
}

impl From<StoreError> for LifecycleError {
    fn from(err: StoreError) -> Self {
        match err {
            // The store's uniqueness constraint is the authority on duplicate
            // registration; a conflict under race is the same user outcome as
            // a duplicate caught up front.
            StoreError::Conflict => LifecycleError::Rejected(Rejection::AlreadyRegistered),
            StoreError::Db(e) => LifecycleError::Store(e),
        }
    }
}

impl LifecycleError {
    /// Machine-checkable reason for the rejection branch, if this is one.
    pub fn rejection(&self) -> Option<Rejection> {
        match self {
            LifecycleError::Rejected(r) => Some(*r),
            LifecycleError::Store(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_folds_into_already_registered() {
        let err = LifecycleError::from(StoreError::Conflict);
        assert_eq!(err.rejection(), Some(Rejection::AlreadyRegistered));
    }

    #[test]
    fn db_error_is_not_a_rejection() {
        let err = LifecycleError::from(StoreError::Db(sea_orm::DbErr::Custom("boom".into())));
        assert_eq!(err.rejection(), None);
    }
}
