// src/config.rs

use std::{env, path::PathBuf, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    common::storage::MediaStorage,
    db::{
        AuditRepository, DispatchRepository, NotificationRepository, ObligationRepository,
        ReferenceRepository, ReportRepository, SubmissionRepository, UserRepository,
    },
    services::{
        approval_service::ApprovalService, auth::AuthService, company_service::CompanyService,
        dispatch_service::DispatchService, import_service::ImportService,
        mailer::{LogMailer, Mailer}, notification_service::NotificationService,
        obligation_service::ObligationService, planning_service::PlanningService,
        recurrence_service::RecurrenceService, report_service::ReportService,
        submission_service::SubmissionService, user_admin_service::UserAdminService,
    },
};

// Configurações lidas do ambiente (.env)
#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub jwt_secret: String,
    pub bind_addr: String,
    pub media_root: PathBuf,
    pub access_token_minutes: i64,
    pub refresh_token_days: i64,
    /// `None` desativa o job de alertas em segundo plano
    pub planning_interval: Option<Duration>,
    pub admin_username: Option<String>,
    pub admin_password: Option<String>,
}

fn var_or<T: std::str::FromStr>(name: &str, default: T) -> anyhow::Result<T> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => value
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("{name} possui um valor inválido: {value}")),
        _ => Ok(default),
    }
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").context("DATABASE_URL deve ser definida")?;
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET deve ser definido")?;
        let interval_minutes: u64 = var_or("PLANNING_INTERVAL_MINUTES", 0)?;

        Ok(Self {
            database_url,
            jwt_secret,
            bind_addr: var_or("BIND_ADDR", "0.0.0.0:8000".to_string())?,
            media_root: PathBuf::from(var_or("MEDIA_ROOT", "./media".to_string())?),
            access_token_minutes: var_or("ACCESS_TOKEN_MINUTES", 60)?,
            refresh_token_days: var_or("REFRESH_TOKEN_DAYS", 7)?,
            planning_interval: (interval_minutes > 0)
                .then(|| Duration::from_secs(interval_minutes * 60)),
            admin_username: env::var("ADMIN_USERNAME").ok().filter(|v| !v.is_empty()),
            admin_password: env::var("ADMIN_PASSWORD").ok().filter(|v| !v.is_empty()),
        })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub settings: Settings,
    pub storage: MediaStorage,

    pub auth_service: AuthService,
    pub company_service: CompanyService,
    pub obligation_service: ObligationService,
    pub recurrence_service: RecurrenceService,
    pub submission_service: SubmissionService,
    pub approval_service: ApprovalService,
    pub notification_service: NotificationService,
    pub planning_service: PlanningService,
    pub report_service: ReportService,
    pub user_admin_service: UserAdminService,
    pub import_service: ImportService,
    pub dispatch_service: DispatchService,
}

impl AppState {
    pub async fn new(settings: Settings) -> anyhow::Result<Self> {
        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&settings.database_url)
            .await?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        Ok(Self::from_pool(db_pool, settings, Arc::new(LogMailer)))
    }

    /// Monta o gráfico de dependências sobre um pool já criado.
    pub fn from_pool(db_pool: PgPool, settings: Settings, mailer: Arc<dyn Mailer>) -> Self {
        let storage = MediaStorage::new(settings.media_root.clone());

        let user_repo = UserRepository::new(db_pool.clone());
        let reference_repo = ReferenceRepository::new(db_pool.clone());
        let obligation_repo = ObligationRepository::new(db_pool.clone());
        let submission_repo = SubmissionRepository::new(db_pool.clone());
        let audit_repo = AuditRepository::new(db_pool.clone());
        let notification_repo = NotificationRepository::new(db_pool.clone());
        let report_repo = ReportRepository::new(db_pool.clone());
        let dispatch_repo = DispatchRepository::new(db_pool.clone());

        let auth_service = AuthService::new(user_repo.clone(), &settings);
        let notification_service =
            NotificationService::new(notification_repo.clone(), user_repo.clone());

        Self {
            company_service: CompanyService::new(reference_repo.clone(), user_repo.clone()),
            obligation_service: ObligationService::new(obligation_repo.clone()),
            recurrence_service: RecurrenceService::new(
                db_pool.clone(),
                obligation_repo.clone(),
                reference_repo.clone(),
            ),
            submission_service: SubmissionService::new(
                db_pool.clone(),
                submission_repo.clone(),
                obligation_repo.clone(),
                reference_repo.clone(),
                audit_repo.clone(),
                storage.clone(),
            ),
            approval_service: ApprovalService::new(
                db_pool.clone(),
                submission_repo,
                audit_repo.clone(),
                notification_repo.clone(),
                storage.clone(),
            ),
            planning_service: PlanningService::new(
                obligation_repo.clone(),
                reference_repo.clone(),
                notification_service.clone(),
                notification_repo.clone(),
                mailer,
            ),
            report_service: ReportService::new(report_repo, user_repo.clone()),
            user_admin_service: UserAdminService::new(
                db_pool.clone(),
                user_repo.clone(),
                audit_repo,
                auth_service.clone(),
            ),
            import_service: ImportService::new(reference_repo.clone(), obligation_repo),
            dispatch_service: DispatchService::new(
                db_pool.clone(),
                dispatch_repo,
                notification_service.clone(),
            ),
            auth_service,
            notification_service,
            db_pool,
            settings,
            storage,
        }
    }
}
