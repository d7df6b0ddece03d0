//! Application router configuration with the web UI, JSON API and public routes.

use axum::{
    Router, middleware,
    routing::{get, post, put},
};
use tower_http::services::ServeDir;

use crate::{
    AppState,
    auth::{basic_auth_guard, bearer_auth_guard, require_admin},
    endpoints,
    entry::{
        create_entry_api, create_entry_endpoint, delete_entry_api, delete_entry_endpoint,
        export_entries, export_entries_api, get_edit_entry_page, get_entries_page, get_entry_api,
        get_import_page, get_new_entry_page, get_search_entry_page, import_entries,
        import_entries_api, list_entries_api, update_entry_api, update_entry_endpoint,
    },
    error_pages::{get_404_not_found, get_internal_server_error_page},
    home::get_home_page,
};

/// Return a router with all the app's routes.
///
/// Web UI routes use HTTP Basic auth, API routes under `/api` use bearer
/// tokens. Everything except the home page and the exports needs the admin role.
pub fn build_router(state: AppState) -> Router {
    let admin_ui_routes = Router::new()
        .route(
            endpoints::ENTRIES_VIEW,
            get(get_entries_page).post(create_entry_endpoint),
        )
        .route(endpoints::NEW_ENTRY_VIEW, get(get_new_entry_page))
        .route(endpoints::SEARCH_ENTRY_VIEW, get(get_search_entry_page))
        .route(endpoints::EDIT_ENTRY_VIEW, get(get_edit_entry_page))
        .route(
            endpoints::PUT_ENTRY,
            put(update_entry_endpoint).delete(delete_entry_endpoint),
        )
        .route(
            endpoints::IMPORT_VIEW,
            get(get_import_page).post(import_entries),
        )
        .layer(middleware::from_fn(require_admin));

    let ui_routes = Router::new()
        .route(endpoints::ROOT, get(get_home_page))
        .route(endpoints::EXPORT, get(export_entries))
        .merge(admin_ui_routes)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            basic_auth_guard,
        ));

    let admin_api_routes = Router::new()
        .route(
            endpoints::API_ENTRIES,
            get(list_entries_api).post(create_entry_api),
        )
        .route(
            endpoints::API_ENTRY,
            get(get_entry_api)
                .put(update_entry_api)
                .delete(delete_entry_api),
        )
        .route(endpoints::API_IMPORT, post(import_entries_api))
        .layer(middleware::from_fn(require_admin));

    let api_routes = Router::new()
        .route(endpoints::API_EXPORT, get(export_entries_api))
        .merge(admin_api_routes)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            bearer_auth_guard,
        ));

    ui_routes
        .merge(api_routes)
        .route(
            endpoints::INTERNAL_ERROR_VIEW,
            get(get_internal_server_error_page),
        )
        .nest_service(endpoints::STATIC, ServeDir::new("static/"))
        .fallback(get_404_not_found)
        .with_state(state)
}
