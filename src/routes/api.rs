//! Resource routes: one nested router per resource, tagged with its `ResourceKind`.

use crate::handlers::{create, delete, generate_routine, list_or_read, read_by_key, routine_lookup, update};
use crate::schema::ResourceKind;
use crate::state::AppState;
use axum::{routing::get, routing::post, Extension, Router};

fn resource_routes(kind: ResourceKind) -> Router<AppState> {
    let mut router = Router::new().route(
        "/",
        get(list_or_read).post(create).put(update).delete(delete),
    );
    if kind == ResourceKind::Routine {
        router = router.route("/lookup", get(routine_lookup));
    }
    router
        .route("/:key", get(read_by_key))
        .layer(Extension(kind))
}

pub fn api_routes(state: AppState) -> Router {
    let mut router = Router::new().route("/routine-generation", post(generate_routine));
    for kind in ResourceKind::ALL {
        router = router.nest(&format!("/{}", kind.schema().path), resource_routes(kind));
    }
    router.with_state(state)
}
