use api_types::User;
use chrono::Utc;
use sha2::{Digest, Sha256};
use sqlx::{Executor, Sqlite};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum UserError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub struct UserRepository;

impl UserRepository {
    pub async fn create<'e, E>(
        executor: E,
        email: &str,
        nickname: &str,
        admin: bool,
    ) -> Result<User, UserError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let record = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, email, nickname, admin)
            VALUES ($1, $2, $3, $4)
            RETURNING id, email, nickname, admin
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(nickname)
        .bind(admin)
        .fetch_one(executor)
        .await?;

        Ok(record)
    }

    pub async fn find_by_token_hash<'e, E>(
        executor: E,
        token_hash: &str,
    ) -> Result<Option<User>, UserError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let record = sqlx::query_as::<_, User>(
            r#"
            SELECT u.id, u.email, u.nickname, u.admin
            FROM api_tokens t
            INNER JOIN users u ON u.id = t.user_id
            WHERE t.token_hash = $1
            "#,
        )
        .bind(token_hash)
        .fetch_optional(executor)
        .await?;

        Ok(record)
    }
}

pub struct TokenRepository;

impl TokenRepository {
    /// Issues a new API token for the user. Only the digest is stored; the
    /// returned plaintext cannot be recovered later.
    pub async fn issue<'e, E>(executor: E, user_id: Uuid) -> Result<String, UserError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let token = hex::encode(rand::random::<[u8; 32]>());

        sqlx::query("INSERT INTO api_tokens (token_hash, user_id, created) VALUES ($1, $2, $3)")
            .bind(Self::hash(&token))
            .bind(user_id)
            .bind(Utc::now())
            .execute(executor)
            .await?;

        Ok(token)
    }

    pub fn hash(token: &str) -> String {
        hex::encode(Sha256::digest(token.as_bytes()))
    }
}
