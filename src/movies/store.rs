//! Movie storage.
//!
//! # Design Decisions
//! - Reads and writes go straight to a concurrent map
//! - Identifier allocation is serialized behind a mutex
//! - `create` never overwrites an existing record

use std::sync::Mutex;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use thiserror::Error;

use crate::movies::model::Movie;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    /// The operation has no defined behaviour for this store.
    #[error("{0} is not supported")]
    Unsupported(&'static str),

    /// The id picked for a new movie was already taken.
    #[error("movie {0} already exists")]
    Conflict(u64),
}

pub type StoreResult<T> = Result<T, StoreError>;

pub trait MovieStore: Send + Sync {
    fn delete(&self, id: u64) -> StoreResult<()>;

    /// Look up a movie by id.
    fn load(&self, id: u64) -> StoreResult<Option<Movie>>;

    /// Return the stored movie if present, otherwise store `movie`.
    /// The flag is true when an existing movie was returned.
    fn load_or_store(&self, id: u64, movie: Movie) -> StoreResult<(Movie, bool)>;

    /// Visit every movie until `f` returns false. Order is unspecified.
    fn range(&self, f: &mut dyn FnMut(u64, &Movie) -> bool) -> StoreResult<()>;

    fn store(&self, id: u64, movie: Movie) -> StoreResult<()>;

    /// Store a copy of `movie` under the next free id and return it.
    fn create(&self, movie: Movie) -> StoreResult<Movie>;
}

/// In-memory store.
#[derive(Default)]
pub struct MemMovieStore {
    next_id: Mutex<u64>,
    movies: DashMap<u64, Movie>,
}

impl MemMovieStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.movies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movies.is_empty()
    }
}

impl MovieStore for MemMovieStore {
    // TODO: define delete semantics (missing id, id reuse) before enabling a DELETE route.
    fn delete(&self, _id: u64) -> StoreResult<()> {
        Err(StoreError::Unsupported("delete"))
    }

    fn load(&self, id: u64) -> StoreResult<Option<Movie>> {
        Ok(self.movies.get(&id).map(|m| m.value().clone()))
    }

    fn load_or_store(&self, id: u64, movie: Movie) -> StoreResult<(Movie, bool)> {
        match self.movies.entry(id) {
            Entry::Occupied(e) => Ok((e.get().clone(), true)),
            Entry::Vacant(e) => {
                e.insert(movie.clone());
                Ok((movie, false))
            }
        }
    }

    fn range(&self, f: &mut dyn FnMut(u64, &Movie) -> bool) -> StoreResult<()> {
        for entry in self.movies.iter() {
            if !f(*entry.key(), entry.value()) {
                break;
            }
        }
        Ok(())
    }

    fn store(&self, _id: u64, _movie: Movie) -> StoreResult<()> {
        Err(StoreError::Unsupported("store"))
    }

    fn create(&self, movie: Movie) -> StoreResult<Movie> {
        let mut next_id = self.next_id.lock().expect("movie id mutex poisoned");
        let id = *next_id;
        let to_store = Movie { id, ..movie };

        let (_, loaded) = self.load_or_store(id, to_store.clone())?;
        if loaded {
            return Err(StoreError::Conflict(id));
        }

        *next_id += 1;
        Ok(to_store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_create_assigns_sequential_ids() {
        let store = MemMovieStore::new();
        let a = store.create(Movie::new("Alien").with_year(1979)).unwrap();
        let b = store.create(Movie { id: 99, ..Movie::new("Brazil") }).unwrap();
        assert_eq!(a.id, 0);
        assert_eq!(b.id, 1);
        assert_eq!(store.load(1).unwrap().unwrap().title, "Brazil");
        assert_eq!(store.load(2).unwrap(), None);
    }

    #[test]
    fn test_create_refuses_taken_id() {
        let store = MemMovieStore::new();
        store.load_or_store(0, Movie::new("Squatter")).unwrap();
        assert_eq!(store.create(Movie::new("New")), Err(StoreError::Conflict(0)));
        assert_eq!(store.load(0).unwrap().unwrap().title, "Squatter");
        // The id is not consumed by a failed create.
        assert_eq!(store.create(Movie::new("New")), Err(StoreError::Conflict(0)));
    }

    #[test]
    fn test_load_or_store() {
        let store = MemMovieStore::new();
        let (m, loaded) = store.load_or_store(5, Movie::new("First")).unwrap();
        assert!(!loaded);
        assert_eq!(m.title, "First");
        let (m, loaded) = store.load_or_store(5, Movie::new("Second")).unwrap();
        assert!(loaded);
        assert_eq!(m.title, "First");
    }

    #[test]
    fn test_range_stops_early() {
        let store = MemMovieStore::new();
        for title in ["a", "b", "c"] {
            store.create(Movie::new(title)).unwrap();
        }
        let mut seen = 0;
        store
            .range(&mut |_, _| {
                seen += 1;
                seen < 2
            })
            .unwrap();
        assert_eq!(seen, 2);
    }

    #[test]
    fn test_unsupported_operations() {
        let store = MemMovieStore::new();
        assert_eq!(store.delete(0), Err(StoreError::Unsupported("delete")));
        assert_eq!(
            store.store(0, Movie::new("x")),
            Err(StoreError::Unsupported("store"))
        );
    }

    #[test]
    fn test_concurrent_create() {
        let store = Arc::new(MemMovieStore::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for j in 0..25 {
                        store.create(Movie::new(format!("{i}-{j}"))).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(store.len(), 200);
        for id in 0..200 {
            assert!(store.load(id).unwrap().is_some());
        }
    }
}
