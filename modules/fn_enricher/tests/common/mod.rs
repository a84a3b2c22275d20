//! In-memory adapters shared by the integration tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;

use fn_enricher::contract::model::{NewUser, SortField, User, UserPatch, UserQuery};
use fn_enricher::domain::error::LookupError;
use fn_enricher::domain::ports::{AttributeLookup, Lookups, RejectionPublisher, UserCache};
use fn_enricher::domain::repo::UsersRepository;

// ---------- storage ----------

#[derive(Default)]
pub struct MemoryRepo {
    rows: Mutex<Vec<User>>,
    pub fail: AtomicBool,
}

impl MemoryRepo {
    pub fn rows(&self) -> Vec<User> {
        self.rows.lock().clone()
    }

    fn check(&self) -> anyhow::Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            Err(anyhow!("connection refused"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl UsersRepository for MemoryRepo {
    async fn create_user(&self, new_user: NewUser) -> anyhow::Result<User> {
        self.check()?;
        let mut rows = self.rows.lock();
        let now = Utc::now();
        let user = User {
            id: rows.len() as i32 + 1,
            name: new_user.name,
            surname: new_user.surname,
            patronymic: new_user.patronymic,
            age: new_user.age,
            gender: new_user.gender,
            nationality: new_user.nationality,
            is_deleted: false,
            created_at: now,
            updated_at: now,
        };
        rows.push(user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: i32) -> anyhow::Result<Option<User>> {
        self.check()?;
        Ok(self
            .rows
            .lock()
            .iter()
            .find(|u| u.id == id && !u.is_deleted)
            .cloned())
    }

    async fn list_users(&self, query: &UserQuery) -> anyhow::Result<Vec<User>> {
        self.check()?;
        let mut rows: Vec<User> = self
            .rows
            .lock()
            .iter()
            .filter(|u| !u.is_deleted)
            .filter(|u| match query.text.as_deref() {
                Some(t) => u.name.contains(t) || u.surname.contains(t) || u.patronymic.contains(t),
                None => true,
            })
            .cloned()
            .collect();
        if query.sort == SortField::Age {
            rows.sort_by_key(|u| u.age);
        }
        if query.descending {
            rows.reverse();
        }
        Ok(rows
            .into_iter()
            .skip(query.offset as usize)
            .take(query.limit as usize)
            .collect())
    }

    async fn update_user(&self, id: i32, patch: UserPatch) -> anyhow::Result<Option<User>> {
        self.check()?;
        let mut rows = self.rows.lock();
        let Some(user) = rows.iter_mut().find(|u| u.id == id && !u.is_deleted) else {
            return Ok(None);
        };
        if let Some(v) = patch.name {
            user.name = v;
        }
        if let Some(v) = patch.surname {
            user.surname = v;
        }
        if let Some(v) = patch.patronymic {
            user.patronymic = v;
        }
        if let Some(v) = patch.age {
            user.age = v;
        }
        if let Some(v) = patch.gender {
            user.gender = v;
        }
        if let Some(v) = patch.nationality {
            user.nationality = v;
        }
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }

    async fn delete_user(&self, id: i32) -> anyhow::Result<bool> {
        self.check()?;
        let mut rows = self.rows.lock();
        match rows.iter_mut().find(|u| u.id == id && !u.is_deleted) {
            Some(user) => {
                user.is_deleted = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

// ---------- cache ----------

#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<i32, User>>,
    pub fail: AtomicBool,
    pub gets: AtomicUsize,
    pub sets: AtomicUsize,
}

impl MemoryCache {
    pub fn entry(&self, id: i32) -> Option<User> {
        self.entries.lock().get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn sets(&self) -> usize {
        self.sets.load(Ordering::SeqCst)
    }

    pub fn insert(&self, user: User) {
        self.entries.lock().insert(user.id, user);
    }

    fn check(&self) -> anyhow::Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            Err(anyhow!("redis unavailable"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl UserCache for MemoryCache {
    async fn get(&self, id: i32) -> anyhow::Result<Option<User>> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self.entry(id))
    }

    async fn set(&self, user: &User) -> anyhow::Result<()> {
        self.sets.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        self.insert(user.clone());
        Ok(())
    }

    async fn update(&self, user: &User) -> anyhow::Result<()> {
        self.set(user).await
    }

    async fn delete(&self, id: i32) -> anyhow::Result<()> {
        self.check()?;
        self.entries.lock().remove(&id);
        Ok(())
    }
}

// ---------- rejection stream ----------

#[derive(Default)]
pub struct RecordingPublisher {
    published: Mutex<Vec<Vec<u8>>>,
    pub fail: AtomicBool,
}

impl RecordingPublisher {
    pub fn published(&self) -> Vec<serde_json::Value> {
        self.published
            .lock()
            .iter()
            .map(|p| serde_json::from_slice(p).unwrap())
            .collect()
    }
}

#[async_trait]
impl RejectionPublisher for RecordingPublisher {
    async fn publish(&self, payload: &[u8]) -> anyhow::Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(anyhow!("broker not available"));
        }
        self.published.lock().push(payload.to_vec());
        Ok(())
    }
}

// ---------- lookups ----------

/// Returns a canned answer after an optional delay and counts calls.
pub struct StubLookup<T> {
    answer: Result<T, LookupError>,
    delay: Duration,
    pub calls: AtomicUsize,
    pub completed: AtomicUsize,
}

impl<T> StubLookup<T> {
    pub fn ok(value: T) -> Arc<Self> {
        Self::new(Ok(value), Duration::ZERO)
    }

    pub fn err(err: LookupError) -> Arc<Self> {
        Self::new(Err(err), Duration::ZERO)
    }

    pub fn new(answer: Result<T, LookupError>, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            answer,
            delay,
            calls: AtomicUsize::new(0),
            completed: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<T: Clone + Send + Sync> AttributeLookup<T> for StubLookup<T> {
    async fn resolve(&self, _name: &str) -> Result<T, LookupError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.completed.fetch_add(1, Ordering::SeqCst);
        self.answer.clone()
    }
}

pub struct StubLookups {
    pub age: Arc<StubLookup<i32>>,
    pub gender: Arc<StubLookup<String>>,
    pub nationality: Arc<StubLookup<String>>,
}

impl StubLookups {
    /// Lookups answering 67 / female / IL.
    pub fn rivka() -> Self {
        Self {
            age: StubLookup::ok(67),
            gender: StubLookup::ok("female".to_string()),
            nationality: StubLookup::ok("IL".to_string()),
        }
    }

    pub fn ports(&self) -> Lookups {
        Lookups {
            age: self.age.clone(),
            gender: self.gender.clone(),
            nationality: self.nationality.clone(),
        }
    }

    pub fn total_calls(&self) -> usize {
        self.age.calls() + self.gender.calls() + self.nationality.calls()
    }
}
