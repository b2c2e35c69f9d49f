//! Route registration with documentation metadata.
//!
//! `ServiceDefinition` builds the axum router for a resource and, alongside
//! it, a list of [`RouteDoc`] records describing each operation: the request
//! and response types (by their TypeScript names) and the status codes the
//! operation is documented to return. The records are informational only and
//! are dumped by the `issue-server-generate-types` binary.
//!
//! ```ignore
//! ServiceDefinition::<TargetIssue>::new("/api/v1/issues", "issueId")
//!     .list::<TargetIssueList, _, _>(list_issues)
//!     .create(create_issue)
//!     .get(get_issue)
//! ```

use std::marker::PhantomData;

use axum::{Router, handler::Handler, routing::MethodRouter};
use serde::Serialize;
use ts_rs::TS;

use super::error::JsonBody;
use crate::AppState;

/// Implemented for handler extractor tuples whose last element is
/// `JsonBody<T>`, tying a builder's declared payload type to the handler.
pub trait HasJsonPayload<T> {}

impl<T> HasJsonPayload<T> for (JsonBody<T>,) {}
impl<A, T> HasJsonPayload<T> for (A, JsonBody<T>) {}
impl<A, B, T> HasJsonPayload<T> for (A, B, JsonBody<T>) {}
impl<A, B, C, T> HasJsonPayload<T> for (A, B, C, JsonBody<T>) {}
impl<A, B, C, D, T> HasJsonPayload<T> for (A, B, C, D, JsonBody<T>) {}
impl<A, B, C, D, E0, T> HasJsonPayload<T> for (A, B, C, D, E0, JsonBody<T>) {}
impl<A, B, C, D, E0, F, T> HasJsonPayload<T> for (A, B, C, D, E0, F, JsonBody<T>) {}

/// Status codes every route can produce regardless of its own annotations.
const COMMON_STATUSES: [u16; 3] = [401, 403, 500];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteDoc {
    pub method: &'static str,
    pub path: String,
    pub operation: &'static str,
    /// Request body type, if any.
    pub reads: Option<String>,
    /// Response body type, if any.
    pub writes: Option<String>,
    pub returns: Vec<u16>,
}

impl RouteDoc {
    fn new(
        method: &'static str,
        path: String,
        operation: &'static str,
        reads: Option<String>,
        writes: Option<String>,
        statuses: &[u16],
    ) -> Self {
        let mut returns: Vec<u16> = statuses.iter().chain(&COMMON_STATUSES).copied().collect();
        returns.sort_unstable();
        returns.dedup();

        Self {
            method,
            path,
            operation,
            reads,
            writes,
            returns,
        }
    }
}

/// Marker for services without a create endpoint.
pub struct NoCreate;

/// Marker for services without an update endpoint.
pub struct NoUpdate;

/// Builder for a resource's routes and their documentation.
///
/// `E` is the resource type, `C`/`U` the create and update payloads (or the
/// `NoCreate`/`NoUpdate` markers until registered).
pub struct ServiceDefinition<E, C = NoCreate, U = NoUpdate> {
    base_path: &'static str,
    id_param: &'static str,
    base_route: MethodRouter<AppState>,
    id_route: MethodRouter<AppState>,
    sub_routes: Vec<(&'static str, MethodRouter<AppState>)>,
    docs: Vec<RouteDoc>,
    _phantom: PhantomData<fn() -> (E, C, U)>,
}

impl<E: TS> ServiceDefinition<E, NoCreate, NoUpdate> {
    pub fn new(base_path: &'static str, id_param: &'static str) -> Self {
        Self {
            base_path,
            id_param,
            base_route: MethodRouter::new(),
            id_route: MethodRouter::new(),
            sub_routes: Vec::new(),
            docs: Vec::new(),
            _phantom: PhantomData,
        }
    }
}

impl<E: TS, C, U> ServiceDefinition<E, C, U> {
    fn id_path(&self) -> String {
        format!("{}/{{{}}}", self.base_path, self.id_param)
    }

    fn sub_path(&self, segment: &str) -> String {
        format!("{}/{segment}", self.id_path())
    }

    /// GET on the collection. `R` is the list envelope type.
    pub fn list<R, H, T>(mut self, handler: H) -> Self
    where
        R: TS,
        H: Handler<T, AppState> + Clone + Send + Sync + 'static,
        T: 'static,
    {
        self.docs.push(RouteDoc::new(
            "GET",
            self.base_path.to_string(),
            "list",
            None,
            Some(R::name()),
            &[200, 400],
        ));
        self.base_route = self.base_route.get(handler);
        self
    }

    pub fn get<H, T>(mut self, handler: H) -> Self
    where
        H: Handler<T, AppState> + Clone + Send + Sync + 'static,
        T: 'static,
    {
        self.docs.push(RouteDoc::new(
            "GET",
            self.id_path(),
            "get",
            None,
            Some(E::name()),
            &[200, 400, 404],
        ));
        self.id_route = self.id_route.get(handler);
        self
    }

    pub fn delete<H, T>(mut self, handler: H) -> Self
    where
        H: Handler<T, AppState> + Clone + Send + Sync + 'static,
        T: 'static,
    {
        self.docs.push(RouteDoc::new(
            "DELETE",
            self.id_path(),
            "delete",
            None,
            None,
            &[204, 400, 404],
        ));
        self.id_route = self.id_route.delete(handler);
        self
    }

    /// GET on a nested collection under a single resource.
    pub fn sub_list<R, H, T>(
        mut self,
        segment: &'static str,
        operation: &'static str,
        handler: H,
    ) -> Self
    where
        R: TS,
        H: Handler<T, AppState> + Clone + Send + Sync + 'static,
        T: 'static,
    {
        self.docs.push(RouteDoc::new(
            "GET",
            self.sub_path(segment),
            operation,
            None,
            Some(R::name()),
            &[200, 404],
        ));
        let route = self.take_sub_route(segment).get(handler);
        self.sub_routes.push((segment, route));
        self
    }

    /// POST on a nested collection. The handler must accept `JsonBody<B>`
    /// and respond with `R`.
    pub fn sub_create<B, R, H, T>(
        mut self,
        segment: &'static str,
        operation: &'static str,
        handler: H,
    ) -> Self
    where
        B: TS,
        R: TS,
        H: Handler<T, AppState> + Clone + Send + Sync + 'static,
        T: HasJsonPayload<B> + 'static,
    {
        self.docs.push(RouteDoc::new(
            "POST",
            self.sub_path(segment),
            operation,
            Some(B::name()),
            Some(R::name()),
            &[201, 400, 404],
        ));
        let route = self.take_sub_route(segment).post(handler);
        self.sub_routes.push((segment, route));
        self
    }

    fn take_sub_route(&mut self, segment: &str) -> MethodRouter<AppState> {
        match self.sub_routes.iter().position(|(s, _)| *s == segment) {
            Some(index) => self.sub_routes.remove(index).1,
            None => MethodRouter::new(),
        }
    }

    pub fn docs(&self) -> &[RouteDoc] {
        &self.docs
    }

    pub fn router(self) -> Router<AppState> {
        let id_path = self.id_path();
        let mut router = Router::new()
            .route(self.base_path, self.base_route)
            .route(&id_path, self.id_route);

        for (segment, route) in self.sub_routes {
            router = router.route(&format!("{id_path}/{segment}"), route);
        }
        router
    }
}

impl<E: TS, U> ServiceDefinition<E, NoCreate, U> {
    /// POST on the collection. The handler's extractors must include
    /// `JsonBody<C>`.
    pub fn create<C, H, T>(mut self, handler: H) -> ServiceDefinition<E, C, U>
    where
        C: TS,
        H: Handler<T, AppState> + Clone + Send + Sync + 'static,
        T: HasJsonPayload<C> + 'static,
    {
        self.docs.push(RouteDoc::new(
            "POST",
            self.base_path.to_string(),
            "create",
            Some(C::name()),
            Some(E::name()),
            &[201, 400, 409],
        ));

        ServiceDefinition {
            base_path: self.base_path,
            id_param: self.id_param,
            base_route: self.base_route.post(handler),
            id_route: self.id_route,
            sub_routes: self.sub_routes,
            docs: self.docs,
            _phantom: PhantomData,
        }
    }
}

impl<E: TS, C> ServiceDefinition<E, C, NoUpdate> {
    /// PUT on a single resource. The handler's extractors must include
    /// `JsonBody<U>`.
    pub fn update<U, H, T>(mut self, handler: H) -> ServiceDefinition<E, C, U>
    where
        U: TS,
        H: Handler<T, AppState> + Clone + Send + Sync + 'static,
        T: HasJsonPayload<U> + 'static,
    {
        self.docs.push(RouteDoc::new(
            "PUT",
            self.id_path(),
            "update",
            Some(U::name()),
            Some(E::name()),
            &[200, 400, 404, 409],
        ));

        ServiceDefinition {
            base_path: self.base_path,
            id_param: self.id_param,
            base_route: self.base_route,
            id_route: self.id_route.put(handler),
            sub_routes: self.sub_routes,
            docs: self.docs,
            _phantom: PhantomData,
        }
    }
}
