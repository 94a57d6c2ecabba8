//! The user's favorites list, kept in one durable slot.
//!
//! Every mutation re-reads the slot, applies the change and rewrites the whole
//! document before the in-memory list is replaced. The re-read is the only
//! guard against another process writing the same slot; concurrent writers
//! across processes are last-write-wins.
use crate::models::Movie;
use crate::storage::Storage;
use anyhow::{Context, Result};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

pub const FAVORITES_SLOT: &str = "movie_explorer_favorites";

type Callback = Arc<dyn Fn(&[Movie]) + Send + Sync>;

/// Handle returned by [`FavoritesStore::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription(u64);

pub struct FavoritesStore {
    storage: Arc<dyn Storage>,
    slot: String,
    favorites: Mutex<Vec<Movie>>,
    subscribers: Mutex<Vec<(Subscription, Callback)>>,
    next_subscription: AtomicU64,
}

impl FavoritesStore {
    pub fn load(storage: Arc<dyn Storage>) -> Self {
        Self::load_slot(storage, FAVORITES_SLOT)
    }

    /// Hydrates from `slot`. Missing or unreadable data yields an empty list.
    pub fn load_slot(storage: Arc<dyn Storage>, slot: &str) -> Self {
        let favorites = read_slot(storage.as_ref(), slot);
        info!("Loaded {} favorites from '{}'", favorites.len(), slot);
        Self {
            storage,
            slot: slot.to_string(),
            favorites: Mutex::new(favorites),
            subscribers: Mutex::new(Vec::new()),
            next_subscription: AtomicU64::new(1),
        }
    }

    pub fn list(&self) -> Vec<Movie> {
        self.lock_favorites().clone()
    }

    pub fn len(&self) -> usize {
        self.lock_favorites().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock_favorites().is_empty()
    }

    pub fn is_favorite(&self, movie_id: i32) -> bool {
        self.lock_favorites().iter().any(|m| m.id == movie_id)
    }

    /// Appends `movie` unless its id is already stored.
    pub fn add(&self, movie: Movie) -> Result<()> {
        self.mutate(|current, _| insert(current, movie))
    }

    pub fn remove(&self, movie_id: i32) -> Result<()> {
        self.mutate(|current, _| {
            current.retain(|m| m.id != movie_id);
            true
        })
    }

    /// Removes `movie` if it is a favorite, adds it otherwise. Returns the new
    /// favorite state.
    pub fn toggle(&self, movie: Movie) -> Result<bool> {
        let id = movie.id;
        let mut now_favorite = false;
        self.mutate(|current, previous| {
            if previous.iter().any(|m| m.id == id) {
                current.retain(|m| m.id != id);
                true
            } else {
                now_favorite = true;
                insert(current, movie)
            }
        })?;
        debug!(movie_id = id, now_favorite, "Toggled favorite");
        Ok(now_favorite)
    }

    /// Registers `callback` to run with the new list after every mutation.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&[Movie]) + Send + Sync + 'static,
    {
        let handle = Subscription(self.next_subscription.fetch_add(1, Ordering::Relaxed));
        self.lock_subscribers().push((handle, Arc::new(callback)));
        handle
    }

    pub fn unsubscribe(&self, handle: Subscription) {
        self.lock_subscribers().retain(|(h, _)| *h != handle);
    }

    /// `apply` receives the freshly re-read list and the in-memory list as it
    /// was before this call; it returns whether the slot must be rewritten.
    fn mutate<F>(&self, apply: F) -> Result<()>
    where
        F: FnOnce(&mut Vec<Movie>, &[Movie]) -> bool,
    {
        let snapshot = {
            let mut guard = self.lock_favorites();
            let mut next = read_slot(self.storage.as_ref(), &self.slot);
            if apply(&mut next, &guard) {
                let doc = serde_json::to_string(&next).context("Failed to serialize favorites")?;
                self.storage
                    .write(&self.slot, &doc)
                    .with_context(|| format!("Failed to persist favorites to '{}'", self.slot))?;
            }
            *guard = next;
            guard.clone()
        };
        self.notify(&snapshot);
        Ok(())
    }

    fn notify(&self, favorites: &[Movie]) {
        let callbacks: Vec<Callback> = self
            .lock_subscribers()
            .iter()
            .map(|(_, cb)| cb.clone())
            .collect();
        for cb in callbacks {
            cb(favorites);
        }
    }

    fn lock_favorites(&self) -> MutexGuard<'_, Vec<Movie>> {
        self.favorites.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_subscribers(&self) -> MutexGuard<'_, Vec<(Subscription, Callback)>> {
        self.subscribers.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn insert(current: &mut Vec<Movie>, movie: Movie) -> bool {
    if current.iter().any(|m| m.id == movie.id) {
        return false;
    }
    current.push(movie);
    true
}

fn read_slot(storage: &dyn Storage, slot: &str) -> Vec<Movie> {
    let raw = match storage.read(slot) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Vec::new(),
        Err(e) => {
            warn!("Error loading favorites from '{}': {:#}", slot, e);
            return Vec::new();
        }
    };
    match serde_json::from_str::<Vec<Movie>>(&raw) {
        Ok(movies) => dedupe(movies),
        Err(e) => {
            warn!("Error loading favorites from '{}', resetting: {}", slot, e);
            Vec::new()
        }
    }
}

fn dedupe(movies: Vec<Movie>) -> Vec<Movie> {
    let mut seen = HashSet::new();
    movies.into_iter().filter(|m| seen.insert(m.id)).collect()
}
