// src/services/auth.rs

use bcrypt::{hash, verify};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};

use crate::{
    common::error::AppError,
    config::Settings,
    db::UserRepository,
    models::auth::{Claims, Role, TokenKind, TokenPair, User},
};

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    jwt_secret: String,
    access_ttl: chrono::Duration,
    refresh_ttl: chrono::Duration,
}

impl AuthService {
    pub fn new(user_repo: UserRepository, settings: &Settings) -> Self {
        Self {
            user_repo,
            jwt_secret: settings.jwt_secret.clone(),
            access_ttl: chrono::Duration::minutes(settings.access_token_minutes),
            refresh_ttl: chrono::Duration::days(settings.refresh_token_days),
        }
    }

    /// Hash bcrypt fora do runtime assíncrono.
    pub async fn hash_password(&self, password: &str) -> Result<String, AppError> {
        let password_clone = password.to_owned();
        let hashed = tokio::task::spawn_blocking(move || hash(&password_clone, bcrypt::DEFAULT_COST))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;
        Ok(hashed)
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<TokenPair, AppError> {
        let user = self
            .user_repo
            .find_by_username(username.trim())
            .await?
            .filter(|u| u.is_active)
            .ok_or(AppError::InvalidCredentials)?;

        let password_clone = password.to_owned();
        let password_hash_clone = user.password_hash.clone();

        // Executa a verificação em um thread separado
        let is_password_valid =
            tokio::task::spawn_blocking(move || verify(&password_clone, &password_hash_clone))
                .await
                .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;

        if !is_password_valid {
            return Err(AppError::InvalidCredentials);
        }

        self.user_repo.touch_last_login(user.id).await?;
        tracing::info!("🔑 Login de {}", user.username);

        Ok(TokenPair {
            access: self.create_token(user.id, TokenKind::Access)?,
            refresh: self.create_token(user.id, TokenKind::Refresh)?,
        })
    }

    /// Troca um refresh token válido por um novo access token.
    pub async fn refresh(&self, refresh_token: &str) -> Result<String, AppError> {
        let claims = self.decode_claims(refresh_token)?;
        if claims.token_type != TokenKind::Refresh {
            return Err(AppError::InvalidToken);
        }
        let user = self.user_for_claims(&claims).await?;
        self.create_token(user.id, TokenKind::Access)
    }

    pub async fn validate_token(&self, token: &str) -> Result<User, AppError> {
        let claims = self.decode_claims(token)?;
        if claims.token_type != TokenKind::Access {
            return Err(AppError::InvalidToken);
        }
        self.user_for_claims(&claims).await
    }

    /// Cria o administrador inicial quando o banco ainda não tem usuários.
    pub async fn bootstrap_admin(&self, username: &str, password: &str) -> Result<bool, AppError> {
        if self.user_repo.count().await? > 0 {
            return Ok(false);
        }
        let password_hash = self.hash_password(password).await?;
        self.user_repo
            .create_user(
                self.user_repo.pool(),
                username,
                "",
                "",
                "",
                &password_hash,
                Role::Admin,
            )
            .await?;
        tracing::info!("👤 Administrador inicial '{}' criado", username);
        Ok(true)
    }

    async fn user_for_claims(&self, claims: &Claims) -> Result<User, AppError> {
        let user_id: i64 = claims.sub.parse().map_err(|_| AppError::InvalidToken)?;
        self.user_repo
            .find_by_id(user_id)
            .await?
            .filter(|u| u.is_active)
            .ok_or(AppError::InvalidToken)
    }

    fn decode_claims(&self, token: &str) -> Result<Claims, AppError> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &Validation::default(),
        )
        .map_err(|_| AppError::InvalidToken)?;
        Ok(token_data.claims)
    }

    fn create_token(&self, user_id: i64, kind: TokenKind) -> Result<String, AppError> {
        let now = Utc::now();
        let ttl = match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        };

        let claims = Claims {
            sub: user_id.to_string(),
            exp: (now + ttl).timestamp() as usize,
            iat: now.timestamp() as usize,
            token_type: kind,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::PgPoolOptions;

    fn service() -> AuthService {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/obrigacoes_test")
            .unwrap();
        let settings = Settings {
            database_url: String::new(),
            jwt_secret: "segredo-de-teste".into(),
            bind_addr: String::new(),
            media_root: "./media".into(),
            access_token_minutes: 60,
            refresh_token_days: 7,
            planning_interval: None,
            admin_username: None,
            admin_password: None,
        };
        AuthService::new(UserRepository::new(pool), &settings)
    }

    #[tokio::test]
    async fn tokens_carry_their_kind() {
        let service = service();
        let access = service.create_token(42, TokenKind::Access).unwrap();
        let refresh = service.create_token(42, TokenKind::Refresh).unwrap();

        let claims = service.decode_claims(&access).unwrap();
        assert_eq!(claims.sub, "42");
        assert_eq!(claims.token_type, TokenKind::Access);
        assert_eq!(service.decode_claims(&refresh).unwrap().token_type, TokenKind::Refresh);
    }

    #[tokio::test]
    async fn access_token_cannot_refresh() {
        let service = service();
        let access = service.create_token(1, TokenKind::Access).unwrap();
        assert!(matches!(service.refresh(&access).await, Err(AppError::InvalidToken)));
    }

    #[tokio::test]
    async fn garbage_token_is_rejected() {
        let service = service();
        assert!(matches!(service.validate_token("abc.def.ghi").await, Err(AppError::InvalidToken)));
    }
}
