//! In-memory doubles for the core ports, shared by the service tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::Utc;

use botgate_types::bot::{AvatarRef, AvatarSource, Bot, BotId, BotOwner, TenantId};
use botgate_types::credential::{Redacted, StoredCredential};
use botgate_types::error::{AssetError, CredentialError, JobError, RepositoryError};
use botgate_types::job::Job;

use crate::repository::SortOrder;
use crate::repository::bot::{BotFilter, BotRepository, BotScope};
use crate::repository::credential::CredentialRepository;
use crate::service::asset::AssetPipeline;
use crate::service::hash::TokenHasher;
use crate::service::job::JobQueue;
use crate::service::token::TokenVault;

pub fn tenant_bot(tenant: &TenantId, name: &str) -> Bot {
    bot_with_owner(BotOwner::Tenant(tenant.clone()), name)
}

pub fn global_bot(name: &str) -> Bot {
    bot_with_owner(BotOwner::Global, name)
}

fn bot_with_owner(owner: BotOwner, name: &str) -> Bot {
    let now = Utc::now();
    Bot {
        id: BotId::new(),
        owner,
        name: name.to_string(),
        description: None,
        outgoing_url: None,
        avatar: None,
        created_at: now,
        updated_at: now,
    }
}

#[derive(Default)]
struct StoreState {
    // Insertion order doubles as creation order.
    bots: Vec<Bot>,
    credentials: HashMap<BotId, StoredCredential>,
}

/// Bots and credentials behind one lock, so deleting a bot cascades.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<StoreState>>,
}

impl MemoryStore {
    pub fn insert_bot(&self, bot: Bot) -> Bot {
        self.state.lock().unwrap().bots.push(bot.clone());
        bot
    }

    /// Store a credential directly, as `BotRepository::create` would.
    pub fn insert_credential(&self, credential: StoredCredential) {
        self.state
            .lock()
            .unwrap()
            .credentials
            .insert(credential.bot_id.clone(), credential);
    }

    pub fn remove_bot(&self, id: &BotId) {
        let mut state = self.state.lock().unwrap();
        state.bots.retain(|b| &b.id != id);
        state.credentials.remove(id);
    }

    pub fn bot(&self, id: &BotId) -> Option<Bot> {
        let state = self.state.lock().unwrap();
        state.bots.iter().find(|b| &b.id == id).cloned()
    }

    pub fn bot_count(&self) -> usize {
        self.state.lock().unwrap().bots.len()
    }

    pub fn credential(&self, id: &BotId) -> Option<StoredCredential> {
        self.state.lock().unwrap().credentials.get(id).cloned()
    }
}

fn in_scope(bot: &Bot, scope: &BotScope) -> bool {
    match scope {
        BotScope::Global => bot.is_global(),
        BotScope::VisibleTo(tenant) => bot.owner.is_visible_to(tenant),
    }
}

impl BotRepository for MemoryStore {
    async fn create(&self, bot: &Bot, credential: &StoredCredential) -> Result<Bot, RepositoryError> {
        let mut state = self.state.lock().unwrap();
        if state.bots.iter().any(|b| b.id == bot.id) {
            return Err(RepositoryError::Conflict(format!("bot {} exists", bot.id)));
        }
        state.bots.push(bot.clone());
        state
            .credentials
            .insert(bot.id.clone(), credential.clone());
        Ok(bot.clone())
    }

    async fn get_by_id(&self, id: &BotId) -> Result<Option<Bot>, RepositoryError> {
        Ok(self.bot(id))
    }

    async fn list(&self, filter: &BotFilter) -> Result<Vec<Bot>, RepositoryError> {
        let state = self.state.lock().unwrap();
        let mut bots: Vec<Bot> = state
            .bots
            .iter()
            .filter(|b| in_scope(b, &filter.scope))
            .cloned()
            .collect();
        if filter.sort_order == Some(SortOrder::Desc) {
            bots.reverse();
        }
        Ok(bots)
    }

    async fn update(&self, bot: &Bot) -> Result<Bot, RepositoryError> {
        let mut state = self.state.lock().unwrap();
        let slot = state
            .bots
            .iter_mut()
            .find(|b| b.id == bot.id)
            .ok_or(RepositoryError::NotFound)?;
        *slot = bot.clone();
        Ok(bot.clone())
    }

    async fn delete(&self, id: &BotId) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().unwrap();
        let before = state.bots.len();
        state.bots.retain(|b| &b.id != id);
        if state.bots.len() == before {
            return Err(RepositoryError::NotFound);
        }
        state.credentials.remove(id);
        Ok(())
    }
}

impl CredentialRepository for MemoryStore {
    async fn get(&self, bot_id: &BotId) -> Result<Option<StoredCredential>, RepositoryError> {
        Ok(self.credential(bot_id))
    }

    async fn get_by_hash(&self, token_hash: &str) -> Result<Option<StoredCredential>, RepositoryError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .credentials
            .values()
            .find(|c| c.token_hash == token_hash)
            .cloned())
    }

    async fn replace(&self, credential: &StoredCredential) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().unwrap();
        let slot = state
            .credentials
            .get_mut(&credential.bot_id)
            .ok_or(RepositoryError::NotFound)?;
        *slot = credential.clone();
        Ok(())
    }

    async fn delete(&self, bot_id: &BotId) -> Result<bool, RepositoryError> {
        Ok(self.state.lock().unwrap().credentials.remove(bot_id).is_some())
    }
}

/// Sequential tokens; sealing reverses the bytes.
#[derive(Default)]
pub struct FakeVault {
    counter: AtomicU64,
}

impl TokenVault for FakeVault {
    fn generate(&self) -> Redacted {
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        Redacted::new(format!("bgt_test{n:04}"))
    }

    fn seal(&self, token: &Redacted) -> Result<Vec<u8>, CredentialError> {
        Ok(token.expose().bytes().rev().collect())
    }

    fn open(&self, sealed: &[u8]) -> Result<Redacted, CredentialError> {
        let bytes: Vec<u8> = sealed.iter().rev().copied().collect();
        String::from_utf8(bytes)
            .map(Redacted::new)
            .map_err(|_| CredentialError::Sealing)
    }
}

pub struct FakeHasher;

impl TokenHasher for FakeHasher {
    fn hash_token(&self, content: &str) -> String {
        format!("digest:{}", content.chars().rev().collect::<String>())
    }
}

/// Asset pipeline double. `strict` makes detach of an absent avatar fail
/// with `AssetError::NotFound`.
#[derive(Clone, Default)]
pub struct FakeAssets {
    attached: Arc<Mutex<HashSet<BotId>>>,
    strict: bool,
}

impl FakeAssets {
    pub fn strict() -> Self {
        Self {
            strict: true,
            ..Default::default()
        }
    }

    pub fn has(&self, bot_id: &BotId) -> bool {
        self.attached.lock().unwrap().contains(bot_id)
    }

    /// Store an avatar the way a background fetch would, outside the service.
    pub fn fetched(&self, bot_id: &BotId) {
        self.attached.lock().unwrap().insert(bot_id.clone());
    }
}

impl AssetPipeline for FakeAssets {
    async fn attach(&self, bot_id: &BotId, source: &AvatarSource) -> Result<AvatarRef, AssetError> {
        match source {
            AvatarSource::Bytes(_) => {
                self.attached.lock().unwrap().insert(bot_id.clone());
                Ok(AvatarRef {
                    thumbnail: format!("thumbs/{bot_id}.png"),
                })
            }
            AvatarSource::Url(_) => Err(AssetError::Unsupported("url".to_string())),
        }
    }

    async fn detach(&self, bot_id: &BotId) -> Result<(), AssetError> {
        let removed = self.attached.lock().unwrap().remove(bot_id);
        if !removed && self.strict {
            return Err(AssetError::NotFound);
        }
        Ok(())
    }

    async fn attached(&self, bot_id: &BotId) -> Result<Option<AvatarRef>, AssetError> {
        Ok(self.has(bot_id).then(|| AvatarRef {
            thumbnail: format!("thumbs/{bot_id}.png"),
        }))
    }
}

/// Records every accepted job. Cancelled jobs are dropped from the record.
#[derive(Clone, Default)]
pub struct RecordingJobs {
    jobs: Arc<Mutex<Vec<Job>>>,
}

impl RecordingJobs {
    pub fn jobs(&self) -> Vec<Job> {
        self.jobs.lock().unwrap().clone()
    }
}

impl JobQueue for RecordingJobs {
    async fn enqueue(&self, job: &Job) -> Result<(), JobError> {
        self.jobs.lock().unwrap().push(job.clone());
        Ok(())
    }

    async fn cancel_for_bot(&self, bot_id: &BotId) -> Result<u64, JobError> {
        let mut jobs = self.jobs.lock().unwrap();
        let before = jobs.len();
        jobs.retain(|job| job.bot_id() != bot_id);
        Ok((before - jobs.len()) as u64)
    }
}
