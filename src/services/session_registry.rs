// src/services/session_registry.rs

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use dashmap::DashMap;
use tokio::{sync::Mutex, task::JoinHandle};
use uuid::Uuid;

use crate::{models::booking::BookingStep, services::booking_funnel::BookingFunnel};

pub type SharedFunnel = Arc<Mutex<BookingFunnel>>;

struct SessionEntry {
    funnel: SharedFunnel,
    last_access: Instant,
}

/// Sessões abertas do funil público. Cada sessão tem o seu próprio mutex:
/// requisições da mesma sessão se enfileiram, sessões diferentes não se
/// bloqueiam.
pub struct SessionRegistry {
    sessions: DashMap<Uuid, SessionEntry>,
    ttl: Duration,
}

impl SessionRegistry {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            ttl,
        }
    }

    pub fn insert(&self, funnel: BookingFunnel) -> (Uuid, SharedFunnel) {
        let id = funnel.id();
        let shared = Arc::new(Mutex::new(funnel));
        self.sessions.insert(
            id,
            SessionEntry {
                funnel: shared.clone(),
                last_access: Instant::now(),
            },
        );
        (id, shared)
    }

    /// Clona o handle da sessão e solta a trava do DashMap antes de qualquer await.
    pub fn get(&self, id: Uuid) -> Option<SharedFunnel> {
        let mut entry = self.sessions.get_mut(&id)?;
        entry.last_access = Instant::now();
        Some(entry.funnel.clone())
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Remove sessões paradas há mais que o TTL e as que já chegaram em `success`.
    /// Sessões em uso (mutex travado) ficam para a próxima varredura.
    pub fn sweep(&self) -> usize {
        let before = self.sessions.len();
        let ttl = self.ttl;
        self.sessions.retain(|_, entry| {
            if entry.last_access.elapsed() >= ttl {
                return false;
            }
            match entry.funnel.try_lock() {
                Ok(funnel) => funnel.step() != BookingStep::Success,
                Err(_) => true,
            }
        });
        before - self.sessions.len()
    }

    pub fn spawn_sweeper(self: Arc<Self>, every: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            loop {
                interval.tick().await;
                let removed = self.sweep();
                if removed > 0 {
                    tracing::info!("🧹 {} sessões de agendamento descartadas", removed);
                }
            }
        })
    }
}
