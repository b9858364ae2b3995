// src/client/feed.rs

//! Acompanhamento periódico das notificações do usuário logado.
//!
//! Uma tarefa em segundo plano busca lista e contadores a cada
//! `ClientConfig::notification_poll` e publica o resultado num canal `watch`.
//! Marcar como lida sempre refaz a busca, então os contadores exibidos
//! vêm do servidor e nunca de um ajuste local.

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use tokio::{
    sync::{watch, Notify},
    task::JoinHandle,
    time::{interval, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

use crate::{
    client::{error::ClientResult, ApiClient},
    models::notification::{Notification, NotificationStats},
};

#[derive(Debug, Clone, Default)]
pub struct FeedSnapshot {
    pub notifications: Vec<Notification>,
    pub stats: NotificationStats,
    /// Mensagem da última busca que falhou; limpa no próximo sucesso.
    pub last_error: Option<String>,
}

impl FeedSnapshot {
    pub fn unread(&self) -> i64 {
        self.stats.unread
    }
}

pub struct NotificationFeed {
    client: ApiClient,
    state: Arc<watch::Sender<FeedSnapshot>>,
    generation: Arc<AtomicU64>,
    refresh: Arc<Notify>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

/// Busca lista e contadores juntos. Em falha mantém os dados anteriores.
///
/// `generation` avança a cada mutação concluída; uma busca iniciada antes
/// dela é descartada para não sobrescrever o estado mais novo.
async fn poll_once(client: &ApiClient, state: &watch::Sender<FeedSnapshot>, generation: &AtomicU64) {
    let started = generation.load(Ordering::SeqCst);
    let (notifications, stats) = tokio::join!(client.notifications(), client.notification_stats());
    state.send_if_modified(|snapshot| {
        if generation.load(Ordering::SeqCst) != started {
            tracing::debug!("Busca de notificações descartada (dados anteriores à última mutação)");
            return false;
        }
        match (notifications, stats) {
            (Ok(notifications), Ok(stats)) => {
                *snapshot = FeedSnapshot { notifications, stats, last_error: None };
            }
            (Err(e), _) | (_, Err(e)) => {
                tracing::warn!("Falha ao atualizar notificações: {}", e);
                snapshot.last_error = Some(e.to_string());
            }
        }
        true
    });
}

impl NotificationFeed {
    /// Inicia a tarefa de polling. A primeira busca é imediata.
    pub fn start(client: ApiClient) -> Self {
        let state = Arc::new(watch::Sender::new(FeedSnapshot::default()));
        let generation = Arc::new(AtomicU64::new(0));
        let refresh = Arc::new(Notify::new());
        let cancel = CancellationToken::new();

        let task = tokio::spawn({
            let client = client.clone();
            let state = state.clone();
            let generation = generation.clone();
            let refresh = refresh.clone();
            let cancel = cancel.clone();
            async move {
                let mut ticker = interval(client.config().notification_poll);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                loop {
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = ticker.tick() => {}
                        _ = refresh.notified() => {}
                    }
                    poll_once(&client, &state, &generation).await;
                }
                tracing::debug!("Polling de notificações encerrado");
            }
        });

        Self { client, state, generation, refresh, cancel, task: Some(task) }
    }

    pub fn subscribe(&self) -> watch::Receiver<FeedSnapshot> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> FeedSnapshot {
        self.state.borrow().clone()
    }

    /// Pede uma busca fora do intervalo, sem esperar por ela.
    pub fn request_refresh(&self) {
        self.refresh.notify_one();
    }

    pub async fn mark_read(&self, id: i64) -> ClientResult<()> {
        self.client.mark_notification_read(id).await?;
        self.refetch_after_mutation().await;
        Ok(())
    }

    pub async fn mark_all_read(&self) -> ClientResult<()> {
        self.client.mark_all_notifications_read().await?;
        self.refetch_after_mutation().await;
        Ok(())
    }

    async fn refetch_after_mutation(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        poll_once(&self.client, &self.state, &self.generation).await;
    }

    /// Cancela o polling e espera a tarefa terminar.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!("Tarefa de notificações terminou com erro: {}", e);
            }
        }
    }
}

impl Drop for NotificationFeed {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
