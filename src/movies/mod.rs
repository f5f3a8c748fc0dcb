//! Demo movie service built from route producers.
//!
//! # Data Flow
//! ```text
//! routes.rs (Root → Movies → MovieRoutes producers)
//!     → resolved and applied onto the engine at startup
//!     → handlers read/write through store.rs (MovieStore)
//!     → model.rs (Movie, JSON on the wire)
//! ```

pub mod model;
pub mod routes;
pub mod store;

pub use model::Movie;
pub use routes::{MovieRoutes, Movies, Root};
pub use store::{MemMovieStore, MovieStore, StoreError};
