use async_trait::async_trait;
use chrono::{DateTime, Utc};
use franchise_core::{
    Account, AccountId, BranchId, Error, FailedLogin, InvitationCodeId, NewAccount, Role,
    error::{
        AuthError,
        utilities::{DatabaseResultExt, database_error},
    },
    repositories::AccountRepository,
};
use sqlx::SqlitePool;

use crate::{from_optional_timestamp, from_timestamp, is_unique_violation};

pub struct SqliteAccountRepository {
    pool: SqlitePool,
}

impl SqliteAccountRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct AccountRow {
    id: String,
    email: String,
    full_name: String,
    password_hash: String,
    role: String,
    branch_id: Option<String>,
    invitation_code_id: Option<String>,
    is_active: bool,
    is_email_verified: bool,
    email_verification_token: Option<String>,
    email_verification_expires: Option<i64>,
    password_reset_token: Option<String>,
    password_reset_expires: Option<i64>,
    last_login: Option<i64>,
    login_attempts: i64,
    locked_until: Option<i64>,
    created_at: i64,
    updated_at: i64,
}

impl TryFrom<AccountRow> for Account {
    type Error = Error;

    fn try_from(row: AccountRow) -> Result<Self, Self::Error> {
        Ok(Account {
            id: AccountId::new(&row.id),
            email: row.email,
            full_name: row.full_name,
            password_hash: row.password_hash,
            role: row.role.parse::<Role>()?,
            branch_id: row.branch_id.map(BranchId::from),
            invitation_code_id: row.invitation_code_id.map(InvitationCodeId::from),
            is_active: row.is_active,
            is_email_verified: row.is_email_verified,
            email_verification_token: row.email_verification_token,
            email_verification_expires: from_optional_timestamp(row.email_verification_expires)?,
            password_reset_token: row.password_reset_token,
            password_reset_expires: from_optional_timestamp(row.password_reset_expires)?,
            last_login: from_optional_timestamp(row.last_login)?,
            login_attempts: u32::try_from(row.login_attempts).unwrap_or(0),
            locked_until: from_optional_timestamp(row.locked_until)?,
            created_at: from_timestamp(row.created_at)?,
            updated_at: from_timestamp(row.updated_at)?,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct FailedLoginRow {
    login_attempts: i64,
    locked_until: Option<i64>,
}

#[async_trait]
impl AccountRepository for SqliteAccountRepository {
    async fn create(&self, account: NewAccount) -> Result<Account, Error> {
        let now = Utc::now().timestamp();

        let row = sqlx::query_as::<_, AccountRow>(
            r#"
            INSERT INTO users (
                id, email, full_name, password_hash, role, invitation_code_id,
                is_active, is_email_verified, email_verification_token,
                email_verification_expires, login_attempts, created_at, updated_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 0, ?8, ?9, 0, ?10, ?10)
            RETURNING *
            "#,
        )
        .bind(account.id.as_str())
        .bind(account.email.to_lowercase())
        .bind(&account.full_name)
        .bind(&account.password_hash)
        .bind(account.role.as_str())
        .bind(account.invitation_code_id.as_ref().map(|id| id.as_str()))
        .bind(account.is_active)
        .bind(&account.email_verification_token)
        .bind(account.email_verification_expires.map(|at| at.timestamp()))
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                Error::Auth(AuthError::EmailAlreadyExists)
            } else {
                database_error("Failed to create account", e)
            }
        })?;

        row.try_into()
    }

    async fn find_by_id(&self, id: &AccountId) -> Result<Option<Account>, Error> {
        let row = sqlx::query_as::<_, AccountRow>("SELECT * FROM users WHERE id = ?1")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_db_err_with_context("Failed to find account by id")?;

        row.map(Account::try_from).transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, Error> {
        let row = sqlx::query_as::<_, AccountRow>("SELECT * FROM users WHERE email = ?1")
            .bind(email.to_lowercase())
            .fetch_optional(&self.pool)
            .await
            .map_db_err_with_context("Failed to find account by email")?;

        row.map(Account::try_from).transpose()
    }

    async fn record_failed_login(
        &self,
        id: &AccountId,
        max_attempts: u32,
        lock_until: DateTime<Utc>,
    ) -> Result<FailedLogin, Error> {
        // Column references in SET see the pre-update row.
        let row = sqlx::query_as::<_, FailedLoginRow>(
            r#"
            UPDATE users
            SET login_attempts = CASE WHEN login_attempts + 1 >= ?2 THEN 0 ELSE login_attempts + 1 END,
                locked_until = CASE WHEN login_attempts + 1 >= ?2 THEN ?3 ELSE locked_until END,
                updated_at = ?4
            WHERE id = ?1
            RETURNING login_attempts, locked_until
            "#,
        )
        .bind(id.as_str())
        .bind(i64::from(max_attempts))
        .bind(lock_until.timestamp())
        .bind(Utc::now().timestamp())
        .fetch_optional(&self.pool)
        .await
        .map_db_err_with_context("Failed to record failed login")?
        .ok_or(AuthError::AccountNotFound)?;

        if row.login_attempts == 0 {
            Ok(FailedLogin {
                attempts: max_attempts,
                locked_until: from_optional_timestamp(row.locked_until)?,
            })
        } else {
            Ok(FailedLogin {
                attempts: u32::try_from(row.login_attempts).unwrap_or(u32::MAX),
                locked_until: None,
            })
        }
    }

    async fn record_successful_login(
        &self,
        id: &AccountId,
        at: DateTime<Utc>,
    ) -> Result<Account, Error> {
        let row = sqlx::query_as::<_, AccountRow>(
            r#"
            UPDATE users
            SET login_attempts = 0, locked_until = NULL, last_login = ?2, updated_at = ?2
            WHERE id = ?1
            RETURNING *
            "#,
        )
        .bind(id.as_str())
        .bind(at.timestamp())
        .fetch_optional(&self.pool)
        .await
        .map_db_err_with_context("Failed to record successful login")?
        .ok_or(AuthError::AccountNotFound)?;

        row.try_into()
    }

    async fn update(&self, account: &Account) -> Result<Account, Error> {
        let row = sqlx::query_as::<_, AccountRow>(
            r#"
            UPDATE users
            SET email = ?2, full_name = ?3, password_hash = ?4, role = ?5, branch_id = ?6,
                is_active = ?7, is_email_verified = ?8, email_verification_token = ?9,
                email_verification_expires = ?10, password_reset_token = ?11,
                password_reset_expires = ?12, updated_at = ?13
            WHERE id = ?1
            RETURNING *
            "#,
        )
        .bind(account.id.as_str())
        .bind(account.email.to_lowercase())
        .bind(&account.full_name)
        .bind(&account.password_hash)
        .bind(account.role.as_str())
        .bind(account.branch_id.as_ref().map(|id| id.as_str()))
        .bind(account.is_active)
        .bind(account.is_email_verified)
        .bind(&account.email_verification_token)
        .bind(account.email_verification_expires.map(|at| at.timestamp()))
        .bind(&account.password_reset_token)
        .bind(account.password_reset_expires.map(|at| at.timestamp()))
        .bind(Utc::now().timestamp())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                Error::Auth(AuthError::EmailAlreadyExists)
            } else {
                database_error("Failed to update account", e)
            }
        })?
        .ok_or(AuthError::AccountNotFound)?;

        row.try_into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::tests::migrated_provider;
    use chrono::Duration;
    use franchise_core::{
        NewBranch,
        repositories::{AccountRepositoryProvider, BranchRepository, BranchRepositoryProvider},
    };

    fn new_account(email: &str) -> NewAccount {
        NewAccount::builder()
            .email(email)
            .full_name("Maria Santos")
            .password_hash("$2b$04$notarealhashbutlongenough")
            .role(Role::Franchisee)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let provider = migrated_provider().await;
        let repo = provider.account();

        let created = repo.create(new_account("Owner@Example.com")).await.unwrap();
        assert_eq!(created.email, "owner@example.com");
        assert_eq!(created.role, Role::Franchisee);
        assert!(created.is_active);
        assert!(!created.is_email_verified);
        assert_eq!(created.login_attempts, 0);

        let by_id = repo.find_by_id(&created.id).await.unwrap().unwrap();
        assert_eq!(by_id.id, created.id);

        let by_email = repo.find_by_email("OWNER@example.COM").await.unwrap().unwrap();
        assert_eq!(by_email.id, created.id);

        assert!(repo.find_by_email("nobody@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_is_rejected() {
        let provider = migrated_provider().await;
        let repo = provider.account();

        repo.create(new_account("dup@example.com")).await.unwrap();
        let err = repo.create(new_account("DUP@example.com")).await.unwrap_err();
        assert!(matches!(err, Error::Auth(AuthError::EmailAlreadyExists)));
    }

    #[tokio::test]
    async fn test_failed_logins_lock_at_threshold() {
        let provider = migrated_provider().await;
        let repo = provider.account();
        let account = repo.create(new_account("lock@example.com")).await.unwrap();
        let lock_until = Utc::now() + Duration::minutes(15);

        for expected in 1..5 {
            let failed = repo
                .record_failed_login(&account.id, 5, lock_until)
                .await
                .unwrap();
            assert_eq!(failed.attempts, expected);
            assert!(!failed.locked());
        }

        let failed = repo
            .record_failed_login(&account.id, 5, lock_until)
            .await
            .unwrap();
        assert!(failed.locked());
        assert_eq!(failed.attempts, 5);
        assert_eq!(
            failed.locked_until.unwrap().timestamp(),
            lock_until.timestamp()
        );

        let stored = repo.find_by_id(&account.id).await.unwrap().unwrap();
        assert_eq!(stored.login_attempts, 0);
        assert!(stored.is_locked());
    }

    #[tokio::test]
    async fn test_successful_login_resets_counters() {
        let provider = migrated_provider().await;
        let repo = provider.account();
        let account = repo.create(new_account("reset@example.com")).await.unwrap();

        repo.record_failed_login(&account.id, 5, Utc::now())
            .await
            .unwrap();
        let now = Utc::now();
        let updated = repo.record_successful_login(&account.id, now).await.unwrap();

        assert_eq!(updated.login_attempts, 0);
        assert!(updated.locked_until.is_none());
        assert_eq!(updated.last_login.unwrap().timestamp(), now.timestamp());
    }

    #[tokio::test]
    async fn test_unknown_account_operations() {
        let provider = migrated_provider().await;
        let repo = provider.account();
        let missing = AccountId::new_random();

        let err = repo
            .record_failed_login(&missing, 5, Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Auth(AuthError::AccountNotFound)));

        let err = repo
            .record_successful_login(&missing, Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Auth(AuthError::AccountNotFound)));
    }

    #[tokio::test]
    async fn test_update_account() {
        let provider = migrated_provider().await;
        let repo = provider.account();
        let mut account = repo.create(new_account("update@example.com")).await.unwrap();
        let branch = provider
            .branch()
            .create(NewBranch::new("Quezon City", "Tomas Morato", "Maria Santos"))
            .await
            .unwrap();

        account.is_active = false;
        account.branch_id = Some(branch.id.clone());
        account.is_email_verified = true;

        let updated = repo.update(&account).await.unwrap();
        assert!(!updated.is_active);
        assert!(updated.is_email_verified);
        assert_eq!(updated.branch_id, Some(branch.id));
    }

    #[tokio::test]
    async fn test_update_to_unknown_branch_fails() {
        let provider = migrated_provider().await;
        let repo = provider.account();
        let mut account = repo.create(new_account("orphan@example.com")).await.unwrap();

        account.branch_id = Some(BranchId::new_random());
        let err = repo.update(&account).await.unwrap_err();
        assert!(err.is_storage_error());
    }
}
