//! The home page with links to every action.

use axum::{
    Extension,
    response::{IntoResponse, Response},
};
use maud::{Markup, html};

use crate::{
    auth::Principal,
    endpoints,
    html::{LINK_STYLE, PAGE_CONTAINER_STYLE, base},
    navigation::NavBar,
};

/// Route handler for the home page.
///
/// Users without the admin role only see the export link.
pub async fn get_home_page(Extension(principal): Extension<Principal>) -> Response {
    home_view(&principal).into_response()
}

fn home_view(principal: &Principal) -> Markup {
    let nav_bar = NavBar::new(endpoints::ROOT).into_html();
    let admin_links = [
        (endpoints::ENTRIES_VIEW, "View all entries"),
        (endpoints::NEW_ENTRY_VIEW, "Create an entry"),
        (endpoints::SEARCH_ENTRY_VIEW, "Find an entry by ID"),
        (endpoints::IMPORT_VIEW, "Import entries from CSV"),
    ];

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4 w-full max-w-md"
            {
                h1 class="text-xl font-bold" { "Ledger" }

                p { "Signed in as " strong { (principal.name) } " (" (principal.role) ")" }

                ul class="list-disc list-inside space-y-2"
                {
                    @if principal.is_admin() {
                        @for (url, text) in admin_links {
                            li { a href=(url) class=(LINK_STYLE) { (text) } }
                        }
                    }

                    li
                    {
                        a href=(endpoints::EXPORT) class=(LINK_STYLE) download
                        {
                            "Export entries to CSV"
                        }
                    }
                }
            }
        }
    };

    base("Home", &content)
}
