//! Routing tree of the movie service.
//!
//! ```text
//! ""                      request logger
//! └── /movies             GET (list), POST (create)
//!     └── /{movie_id}     GET
//! ```

use std::sync::Arc;

use axum::http::StatusCode;

use crate::http::{Context, Handler, HttpRoute, HttpRouter};
use crate::movies::model::Movie;
use crate::movies::store::MovieStore;
use crate::routing::{Route, RouteParts, Router, RouterParts};

const PARAM_MOVIE_ID: &str = "movie_id";

/// Top of the tree; mounts `/movies`.
#[derive(Clone, Default)]
pub struct Root {
    pub store: Option<Arc<dyn MovieStore>>,
}

impl Root {
    pub fn new(store: Arc<dyn MovieStore>) -> Self {
        Self { store: Some(store) }
    }

    pub fn router(&self) -> HttpRouter {
        let movies = Movies {
            store: self.store.clone(),
        };
        Router::new(move || {
            RouterParts::new("")
                .handler(request_logger())
                .router(movies.router())
        })
    }
}

/// Logs every request that reaches a route.
fn request_logger() -> Handler {
    Handler::new(|ctx: &mut Context| {
        let request_id = ctx
            .request_headers()
            .get(crate::http::X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown");
        tracing::debug!(
            request_id = %request_id,
            method = %ctx.method(),
            path = %ctx.path(),
            "Handling request"
        );
    })
}

/// The `/movies` collection.
#[derive(Clone, Default)]
pub struct Movies {
    pub store: Option<Arc<dyn MovieStore>>,
}

impl Movies {
    pub fn router(&self) -> HttpRouter {
        let this = self.clone();
        Router::new(move || {
            let movie = MovieRoutes {
                store: this.store.clone(),
            };
            RouterParts::new("/movies")
                .route(this.get())
                .route(this.post())
                .router(movie.router())
        })
    }

    pub fn get(&self) -> HttpRoute {
        let store = self.store.clone();
        Route::new(move || {
            let Some(store) = store.clone() else {
                return RouteParts::new("GET", "").fail("movie store must be set");
            };
            RouteParts::new("GET", "").handler(Handler::new(move |ctx: &mut Context| {
                let mut movies = Vec::new();
                let listed = store.range(&mut |_, movie| {
                    movies.push(movie.clone());
                    true
                });
                if let Err(e) = listed {
                    ctx.error_json(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "failed to get movies",
                        e,
                    );
                    return;
                }
                movies.sort_by_key(|m| m.id);
                ctx.json(StatusCode::OK, &movies);
            }))
        })
    }

    pub fn post(&self) -> HttpRoute {
        let store = self.store.clone();
        Route::new(move || {
            let Some(store) = store.clone() else {
                return RouteParts::new("POST", "").fail("movie store must be set");
            };
            RouteParts::new("POST", "").handler(Handler::new(move |ctx: &mut Context| {
                let movie: Movie = match ctx.bind_json() {
                    Ok(movie) => movie,
                    Err(e) => {
                        ctx.error_json(StatusCode::BAD_REQUEST, "failed to parse request", e);
                        return;
                    }
                };
                match store.create(movie) {
                    Ok(stored) => {
                        tracing::info!(id = stored.id, title = %stored.title, "Movie created");
                        ctx.json(StatusCode::OK, &stored);
                    }
                    Err(e) => {
                        ctx.error_json(
                            StatusCode::INTERNAL_SERVER_ERROR,
                            "failed to store movie",
                            e,
                        );
                    }
                }
            }))
        })
    }
}

/// A single movie, `/movies/{movie_id}`.
#[derive(Clone, Default)]
pub struct MovieRoutes {
    pub store: Option<Arc<dyn MovieStore>>,
}

impl MovieRoutes {
    pub fn router(&self) -> HttpRouter {
        let this = self.clone();
        Router::new(move || {
            RouterParts::new(format!("/{{{PARAM_MOVIE_ID}}}")).route(this.get())
        })
    }

    pub fn get(&self) -> HttpRoute {
        let store = self.store.clone();
        Route::new(move || {
            let Some(store) = store.clone() else {
                return RouteParts::new("GET", "").fail("movie store must be set");
            };
            RouteParts::new("GET", "").handler(Handler::new(move |ctx: &mut Context| {
                let Some(raw) = ctx.param(PARAM_MOVIE_ID) else {
                    ctx.error_json(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "missing movie id",
                        "route has no movie id parameter",
                    );
                    return;
                };
                let id = match raw.parse::<u64>() {
                    Ok(id) => id,
                    Err(e) => {
                        ctx.error_json(StatusCode::BAD_REQUEST, "movie id must be an int", e);
                        return;
                    }
                };
                match store.load(id) {
                    Ok(Some(movie)) => ctx.json(StatusCode::OK, &movie),
                    Ok(None) => ctx.error_json(
                        StatusCode::NOT_FOUND,
                        "movie not found",
                        "movie does not exist",
                    ),
                    Err(e) => ctx.error_json(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "failed to get movie",
                        e,
                    ),
                }
            }))
        })
    }
}
