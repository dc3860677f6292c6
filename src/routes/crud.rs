//! Route registration for generated model CRUD under a path prefix.

use crate::handlers::crud::{create, delete, list, read, replace};
use crate::model::Model;
use crate::state::AppState;
use axum::routing::{get, post, put, MethodRouter};
use axum::Router;

/// Routes grouped under one path prefix, sharing one [`AppState`].
///
/// Generated and hand-written routes can be mixed on the same scope; [`Scope::mount`] nests the
/// whole group into a parent router.
pub struct Scope {
    prefix: String,
    /// Handlers for the collection path itself, bound at both `prefix` and `prefix/`.
    root: Option<MethodRouter<AppState>>,
    router: Router<AppState>,
    state: AppState,
}

impl Scope {
    pub fn new(prefix: impl Into<String>, state: AppState) -> Self {
        Scope {
            prefix: prefix.into(),
            root: None,
            router: Router::new(),
            state,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// All five CRUD routes for `M`.
    pub fn crud<M: Model>(self) -> Self {
        self.read_routes::<M>()
            .create_route::<M>()
            .replace_route::<M>()
            .delete_route::<M>()
    }

    /// GET / and GET /:id
    pub fn read_routes<M: Model>(self) -> Self {
        self.route("/", get(list::<M>)).route("/:id", get(read::<M>))
    }

    /// POST /
    pub fn create_route<M: Model>(self) -> Self {
        self.route("/", post(create::<M>))
    }

    /// PUT /:id
    pub fn replace_route<M: Model>(self) -> Self {
        self.route("/:id", put(replace::<M>))
    }

    /// DELETE /:id
    pub fn delete_route<M: Model>(self) -> Self {
        self.route("/:id", axum::routing::delete(delete::<M>))
    }

    /// Bind a hand-written handler. Methods bound to the same path on this scope are merged.
    pub fn route(mut self, path: &str, method_router: MethodRouter<AppState>) -> Self {
        if path.is_empty() || path == "/" {
            self.root = Some(match self.root.take() {
                Some(existing) => existing.merge(method_router),
                None => method_router,
            });
        } else {
            self.router = self.router.route(path, method_router);
        }
        self
    }

    /// Router for this scope alone, with its paths relative to the prefix.
    pub fn into_router(self) -> Router {
        let mut router = self.router;
        if let Some(root) = self.root {
            router = router.route("/", root);
        }
        router.with_state(self.state)
    }

    /// Nest this scope under its prefix in `parent`. An empty or "/" prefix merges instead.
    pub fn mount(self, parent: Router) -> Router {
        let prefix = self.prefix.trim_end_matches('/').to_string();
        tracing::debug!(prefix = %prefix, "mounting routes");
        if prefix.is_empty() {
            return parent.merge(self.into_router());
        }
        let mut parent = parent;
        if let Some(root) = self.root {
            parent = parent
                .route(&prefix, root.clone().with_state(self.state.clone()))
                .route(&format!("{}/", prefix), root.with_state(self.state.clone()));
        }
        parent.nest(&prefix, self.router.with_state(self.state))
    }
}

/// Create a scope at `prefix` with every CRUD route for `M` bound. Returned so callers can
/// attach more routes before mounting it.
pub fn register_crud_routes<M: Model>(prefix: impl Into<String>, state: AppState) -> Scope {
    Scope::new(prefix, state).crud::<M>()
}
