use entity::user;
use tracing::{info, warn};

use crate::config::Config;
use crate::crypto;
use crate::error::{LifecycleError, Rejection, StoreError, VerifierError};
use crate::mail::{self, Message, Sender};
use crate::session::PendingRegistration;
use crate::store::{AccountStore, NewAccount};
use crate::util;
use crate::verifier::{OwnedCharacter, Verifier};

/// Sentinel written over the activation code when it is consumed. It can
/// never equal a generated token, so a replayed activation link is rejected
/// like any other mismatch, and an account can never activate twice.
pub const ACTIVATION_CODE_CONSUMED: &str = "consumed";

#[derive(Debug, Clone)]
pub struct LifecycleOptions {
    pub corp_id: i64,
    pub public_url: String,
    pub recovery_ttl_secs: i64,
}

impl From<&Config> for LifecycleOptions {
    fn from(config: &Config) -> Self {
        Self {
            corp_id: config.corp_id,
            public_url: config.public_url.clone(),
            recovery_ttl_secs: config.recovery_ttl_secs,
        }
    }
}

/// Account lifecycle controller: the sole mutation surface over account
/// state. Constructed once at startup with its collaborators; holds no
/// ambient state of its own.
pub struct Lifecycle<S, V, M> {
    store: S,
    verifier: V,
    sender: M,
    options: LifecycleOptions,
}

impl<S, V, M> Lifecycle<S, V, M>
where
    S: AccountStore,
    V: Verifier,
    M: Sender,
{
    pub fn new(store: S, verifier: V, sender: M, options: LifecycleOptions) -> Self {
        Self {
            store,
            verifier,
            sender,
            options,
        }
    }

    /// Verify a claimed credential pair and narrow its characters to corp
    /// members. Nothing durable happens here; the returned pending
    /// registration is the caller's to park in session state.
    pub async fn start_registration(
        &self,
        key_id: &str,
        code: &str,
    ) -> Result<PendingRegistration, LifecycleError> {
        let characters = match self.verifier.characters(key_id, code).await {
            Ok(characters) => characters,
            Err(VerifierError::Unreachable(detail)) => {
                warn!(%detail, "character verification unreachable");
                return Err(Rejection::VerifierUnreachable.into());
            }
            Err(err) => {
                info!(error = %err, "API credential rejected by verifier");
                return Err(Rejection::InvalidApiCredential.into());
            }
        };

        let total = characters.len();
        let members: Vec<OwnedCharacter> = characters
            .into_iter()
            .filter(|c| c.corp_id == self.options.corp_id)
            .collect();

        info!(
            total,
            members = members.len(),
            corp_id = self.options.corp_id,
            "filtered characters by corp membership"
        );

        if members.is_empty() {
            return Err(Rejection::NotInCorp.into());
        }

        Ok(PendingRegistration {
            api_key_id: key_id.trim().to_string(),
            api_code: code.trim().to_string(),
            characters: members,
        })
    }

    /// Turn a pending registration into a durable inactive account and send
    /// the activation notification. Send failure never undoes the account;
    /// an operator can re-send or activate manually.
    pub async fn confirm_registration(
        &self,
        pending: PendingRegistration,
        email: &str,
        password: &str,
    ) -> Result<user::Model, LifecycleError> {
        if pending.characters.is_empty() {
            return Err(Rejection::NotInCorp.into());
        }

        if self.store.find_by_email(email).await?.is_some() {
            info!(email, "registration attempt for existing account");
            return Err(Rejection::AlreadyRegistered.into());
        }

        let salt = crypto::fresh_salt();
        let password_hash =
            crypto::hash_password(password.as_bytes(), &salt, crypto::SERVER_ITERATIONS as u32);
        let activation_code = util::generate_code();

        // Two confirms racing on the same email both reach this insert; the
        // store's unique index picks the winner and the conflict maps to
        // AlreadyRegistered.
        let account = self
            .store
            .insert(NewAccount {
                email: email.to_string(),
                password_hash,
                salt,
                password_iterations: crypto::SERVER_ITERATIONS,
                api_key_id: pending.api_key_id,
                api_code: pending.api_code,
                activation_code: activation_code.clone(),
            })
            .await?;

        for character in &pending.characters {
            if let Err(err) = self
                .store
                .add_character(&account.id, character.character_id)
                .await
            {
                // A conflict here means the character already belongs to
                // another account (same API key confirmed under a second
                // email). The rejected attempt must not keep the account it
                // just inserted, or the email would be squatted by an
                // inactive row whose activation code was never mailed.
                if let Err(cleanup) = self.store.remove(&account.id).await {
                    warn!(
                        email,
                        user_id = %account.id,
                        error = %cleanup,
                        "failed to back out account after character conflict"
                    );
                }
                return Err(match err {
                    StoreError::Conflict => {
                        info!(
                            email,
                            character_id = character.character_id,
                            "character already claimed by another account"
                        );
                        Rejection::CharacterAlreadyClaimed.into()
                    }
                    StoreError::Db(e) => LifecycleError::Store(e),
                });
            }
        }

        info!(
            email,
            characters = pending.characters.len(),
            "created inactive account"
        );

        let message = mail::activation_message(&self.options.public_url, email, &activation_code);
        self.dispatch(email, &message, "activation").await;

        Ok(account)
    }

    /// Consume an activation token. Succeeds at most once per account: the
    /// code is overwritten with the consumed sentinel, which no submitted
    /// token can match.
    pub async fn activate(&self, email: &str, code: &str) -> Result<user::Model, LifecycleError> {
        let Some(mut account) = self.store.find_by_email(email).await? else {
            return Err(Rejection::AccountNotFound.into());
        };

        if account.activation_code == ACTIVATION_CODE_CONSUMED || account.activation_code != code {
            info!(email, "activation code mismatch");
            return Err(Rejection::InvalidCode.into());
        }

        account.active = true;
        account.activation_code = ACTIVATION_CODE_CONSUMED.to_string();
        account.activated_at = Some(util::now_ts());
        let account = self.store.update(account).await?;

        info!(email, "account activated");
        Ok(account)
    }

    pub async fn authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> Result<user::Model, LifecycleError> {
        let Some(account) = self.store.find_by_email(email).await? else {
            info!(email, "authentication attempt for unknown email");
            return Err(Rejection::AccountNotFound.into());
        };

        if !crypto::verify_password_hash(
            password.as_bytes(),
            &account.salt,
            &account.password_hash,
            account.password_iterations as u32,
        ) {
            info!(email, "incorrect password");
            return Err(Rejection::BadCredential.into());
        }

        info!(email, "authenticated");
        Ok(account)
    }

    /// Issue a recovery code and mail it. Any outstanding code is
    /// superseded: only the latest issuance can be consumed.
    pub async fn request_recovery(&self, email: &str) -> Result<(), LifecycleError> {
        let Some(mut account) = self.store.find_by_email(email).await? else {
            info!(email, "recovery requested for unknown email");
            return Err(Rejection::AccountNotFound.into());
        };

        let code = util::generate_code();
        account.recovery_code = Some(code.clone());
        account.recovery_sent_at = Some(util::now_ts());
        self.store.update(account).await?;

        info!(email, "issued recovery code");

        let message = mail::recovery_message(&self.options.public_url, email, &code);
        self.dispatch(email, &message, "recovery").await;

        Ok(())
    }

    /// Authenticate via an outstanding recovery code. The code is single-use
    /// and expires `recovery_ttl_secs` after issuance.
    pub async fn consume_recovery(
        &self,
        email: &str,
        code: &str,
    ) -> Result<user::Model, LifecycleError> {
        let Some(mut account) = self.store.find_by_email(email).await? else {
            return Err(Rejection::AccountNotFound.into());
        };

        match account.recovery_code.as_deref() {
            Some(current) if current == code => {}
            _ => {
                info!(email, "recovery code mismatch");
                return Err(Rejection::InvalidCode.into());
            }
        }

        let sent_at = account.recovery_sent_at.unwrap_or(0);
        if util::now_ts() - sent_at > self.options.recovery_ttl_secs {
            info!(email, "recovery code expired");
            return Err(Rejection::ExpiredCode.into());
        }

        account.recovery_code = None;
        account.recovery_sent_at = None;
        let account = self.store.update(account).await?;

        info!(email, "recovery code consumed");
        Ok(account)
    }

    /// Overwrite the stored hash with a fresh salt and derivation. The
    /// caller is expected to hold an authenticated account; no old-password
    /// check is made here.
    pub async fn change_password(
        &self,
        mut account: user::Model,
        new_password: &str,
        confirm_password: &str,
    ) -> Result<user::Model, LifecycleError> {
        if new_password.is_empty() || confirm_password.is_empty() {
            return Err(Rejection::EmptyPassword.into());
        }
        if new_password != confirm_password {
            return Err(Rejection::PasswordMismatch.into());
        }

        let salt = crypto::fresh_salt();
        account.password_hash =
            crypto::hash_password(new_password.as_bytes(), &salt, crypto::SERVER_ITERATIONS as u32);
        account.salt = salt;
        account.password_iterations = crypto::SERVER_ITERATIONS;
        let account = self.store.update(account).await?;

        info!(email = %account.email, "password changed");
        Ok(account)
    }

    async fn dispatch(&self, to: &str, message: &Message, kind: &str) {
        if let Err(err) = self.sender.send(to, message).await {
            // The state change is already committed; delivery problems are an
            // operator follow-up, not a user-facing failure.
            warn!(to, kind, error = %err, "notification dispatch failed");
        }
    }
}
