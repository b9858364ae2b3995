//src/main.rs

use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use obrigacoes::config::{AppState, Settings};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Inicializa o logger; RUST_LOG controla o nível (padrão: info)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    // Se a configuração falhar, a aplicação não deve iniciar.
    let settings = Settings::from_env()?;
    let app_state = AppState::new(settings).await?;

    // Faz o app rodar as migrações do SQLx na inicialização
    sqlx::migrate!().run(&app_state.db_pool).await?;
    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    if let (Some(username), Some(password)) =
        (&app_state.settings.admin_username, &app_state.settings.admin_password)
    {
        app_state.auth_service.bootstrap_admin(username, password).await?;
    }

    if let Some(every) = app_state.settings.planning_interval {
        tracing::info!("⏰ Verificação de prazos a cada {} min", every.as_secs() / 60);
        app_state.planning_service.clone().spawn_background(every);
    }

    // Inicia o servidor
    let listener = TcpListener::bind(&app_state.settings.bind_addr).await?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);
    axum::serve(listener, obrigacoes::app(app_state)).await?;
    Ok(())
}
