use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use parking_lot::Mutex;
use tempfile::TempDir;

use crate::agents::{Agents, ChatClient};
use crate::error::{Result, SbError};
use crate::model::{Deal, DealStatus, NewDeal};
use crate::seed::{self, SeedReport};
use crate::sprint;
use crate::storage::Database;

/// A migrated database file inside a private temp directory.
pub struct TestDb {
    pub temp_dir: TempDir,
    pub path: PathBuf,
    pub db: Database,
}

impl TestDb {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("sprintboard.db");
        let db = Database::open(&path).expect("Failed to open test database");
        Self { temp_dir, path, db }
    }

    /// Fresh database loaded with the demo dataset for `seed`.
    pub fn seeded(seed: u64) -> (Self, SeedReport) {
        let fixture = Self::new();
        let report =
            seed::seed_demo(&fixture.db, seed, Utc::now()).expect("Failed to seed test database");
        (fixture, report)
    }

    /// Insert a deal with only a title and status.
    pub fn deal(&self, title: &str, status: DealStatus) -> Deal {
        sprint::create_deal(
            &self.db,
            &NewDeal {
                title: title.to_string(),
                status,
                ..NewDeal::default()
            },
            Utc::now(),
        )
        .expect("Failed to create deal")
    }
}

impl Default for TestDb {
    fn default() -> Self {
        Self::new()
    }
}

/// Chat client that replays canned replies in order and records prompts.
///
/// Once the script runs out every call fails with [`SbError::Llm`].
pub struct ScriptedChatClient {
    replies: Mutex<VecDeque<Result<String>>>,
    prompts: Mutex<Vec<String>>,
    delay: Duration,
}

impl ScriptedChatClient {
    pub fn new(replies: impl IntoIterator<Item = Result<String>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into_iter().collect()),
            prompts: Mutex::new(Vec::new()),
            delay: Duration::ZERO,
        })
    }

    /// Like [`Self::new`], but every call sleeps for `delay` first.
    pub fn delayed(replies: impl IntoIterator<Item = Result<String>>, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into_iter().collect()),
            prompts: Mutex::new(Vec::new()),
            delay,
        })
    }

    /// Every call answers with `reply`'s JSON text.
    pub fn replying(reply: &serde_json::Value, times: usize) -> Arc<Self> {
        Self::new((0..times).map(|_| Ok(reply.to_string())))
    }

    /// User prompts received so far.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }

    /// Runner backed by this client, with or without rule fallbacks.
    pub fn agents(self: &Arc<Self>, fallback_enabled: bool) -> Agents {
        let client: Arc<dyn ChatClient> = self.clone();
        Agents::new(Some(client), fallback_enabled)
    }
}

impl ChatClient for ScriptedChatClient {
    fn complete(&self, _system: &str, user: &str, _temperature: f32, _max_tokens: u32) -> Result<String> {
        self.prompts.lock().push(user.to_string());
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        self.replies
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(SbError::Llm("script exhausted".to_string())))
    }
}
