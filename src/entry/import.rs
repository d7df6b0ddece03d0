//! CSV import page and upload endpoint.

use std::sync::{Arc, Mutex};

use axum::{
    body::Bytes,
    extract::{FromRef, Multipart, State, multipart::Field},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    alert::Alert,
    endpoints,
    entry::{EntryService, ImportSummary},
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, base,
        loading_spinner,
    },
    navigation::NavBar,
};

/// How many skipped rows to list in the import alert.
const MAX_SKIPPED_ROWS_SHOWN: usize = 5;

/// The state needed for importing entries.
#[derive(Debug, Clone)]
pub struct ImportState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ImportState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Route handler for the import CSV page.
pub async fn get_import_page() -> Response {
    import_view().into_response()
}

/// Route handler for importing entries from uploaded CSV files.
///
/// Rows that fail validation are skipped and summarised in the returned alert.
/// If any file cannot be parsed, no entries are imported.
pub async fn import_entries(State(state): State<ImportState>, multipart: Multipart) -> Response {
    let files = match read_csv_files(multipart).await {
        Ok(files) => files,
        Err(error) => return error.into_alert_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let service = EntryService::new(&connection);

    let result = service.import_csv_files(files.iter().map(|file| &file.data[..]));

    match result {
        Ok(summaries) => {
            let summaries: Vec<_> = files
                .into_iter()
                .map(|file| file.name)
                .zip(summaries)
                .collect();

            import_alert(&summaries).into_response()
        }
        Err(error) => {
            tracing::debug!("Failed to import {} CSV files: {error}", files.len());
            error.into_alert_response()
        }
    }
}

/// A CSV file read from a multipart form.
#[derive(Debug)]
pub(super) struct UploadedCsv {
    pub name: String,
    pub data: Bytes,
}

/// Read every file field of `multipart`, rejecting anything that is not a CSV.
pub(super) async fn read_csv_files(mut multipart: Multipart) -> Result<Vec<UploadedCsv>, Error> {
    let mut files = Vec::new();

    loop {
        let field = multipart.next_field().await.map_err(|error| {
            tracing::error!("Could not read multipart form: {error}");
            Error::MultipartError(error.body_text())
        })?;

        match field {
            Some(field) => files.push(read_csv_field(field).await?),
            None => break,
        }
    }

    if files.is_empty() {
        return Err(Error::MultipartError("no file was uploaded".to_owned()));
    }

    Ok(files)
}

async fn read_csv_field(field: Field<'_>) -> Result<UploadedCsv, Error> {
    let name = match field.file_name() {
        Some(file_name) => file_name.to_owned(),
        None => {
            tracing::error!("Could not get file name from multipart form field: {field:#?}");
            return Err(Error::MultipartError(
                "Could not get file name from multipart form field".to_owned(),
            ));
        }
    };

    let is_csv = field.content_type() == Some("text/csv")
        || name.to_ascii_lowercase().ends_with(".csv");

    if !is_csv {
        return Err(Error::NotCSV);
    }

    let data = match field.bytes().await {
        Ok(data) => data,
        Err(error) => {
            tracing::error!("Could not read data from multipart form field: {error}");
            return Err(Error::MultipartError(
                "Could not read data from multipart form field.".to_owned(),
            ));
        }
    };

    tracing::debug!("Received file '{}' that is {} bytes", name, data.len());

    Ok(UploadedCsv { name, data })
}

fn import_alert(summaries: &[(String, ImportSummary)]) -> Alert {
    let imported: usize = summaries.iter().map(|(_, summary)| summary.imported).sum();
    let skipped: Vec<String> = summaries
        .iter()
        .flat_map(|(file_name, summary)| {
            summary.skipped.iter().map(move |row_error| {
                format!("{file_name} row {}: {}", row_error.row, row_error.reason)
            })
        })
        .collect();

    let message = format!("Imported {imported} entries");

    if skipped.is_empty() {
        return Alert::SuccessSimple { message };
    }

    let mut details = format!("Skipped {} invalid rows. ", skipped.len());
    details.push_str(
        &skipped
            .iter()
            .take(MAX_SKIPPED_ROWS_SHOWN)
            .cloned()
            .collect::<Vec<_>>()
            .join("; "),
    );

    if skipped.len() > MAX_SKIPPED_ROWS_SHOWN {
        details.push_str("; ...");
    }

    Alert::Success { message, details }
}

fn import_form_view() -> Markup {
    let spinner = loading_spinner();

    html! {
        form
            hx-post=(endpoints::IMPORT)
            enctype="multipart/form-data"
            hx-disabled-elt="#files, #submit-button"
            hx-indicator="#indicator"
            hx-target="#alert-container"
            hx-target-error="#alert-container"
            class="w-full space-y-4 md:space-y-6"
        {
            div
            {
                label for="files" class=(FORM_LABEL_STYLE) { "Choose CSV file(s) to upload" }

                input
                    id="files"
                    type="file"
                    name="files"
                    accept=".csv,text/csv"
                    multiple
                    required
                    class=(FORM_TEXT_INPUT_STYLE);

                p class="mt-2 text-sm"
                {
                    "The first row must name the columns. "
                    code { "name" } " and " code { "amount" } " are required, "
                    code { "category" } " is optional and other columns are ignored."
                }
            }

            button type="submit" id="submit-button" class=(BUTTON_PRIMARY_STYLE)
            {
                span class="inline htmx-indicator" id="indicator" { (spinner) }
                " Upload Files"
            }
        }
    }
}

fn import_view() -> Markup {
    let nav_bar = NavBar::new(endpoints::IMPORT_VIEW).into_html();

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            h1 class="text-xl font-bold mb-4" { "Import Entries" }
            (import_form_view())
        }
    };

    base("Import Entries", &content)
}

#[cfg(test)]
mod import_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        extract::{FromRequest, Multipart, State},
        http::{Request, StatusCode},
    };
    use rusqlite::Connection;
    use scraper::{ElementRef, Selector};

    use crate::{
        endpoints,
        entry::{create_entry_table, get_all_entries, get_import_page, import_entries},
        test_utils::{
            assert_content_type, assert_form_input, assert_form_submit_button, assert_hx_endpoint,
            assert_valid_html, must_get_form, parse_html_document, parse_html_fragment,
        },
    };

    use super::ImportState;

    fn get_state() -> ImportState {
        let connection =
            Connection::open_in_memory().expect("Could not open in-memory SQLite database");
        create_entry_table(&connection).expect("Could not create entry table");

        ImportState {
            db_connection: Arc::new(Mutex::new(connection)),
        }
    }

    /// Build a multipart body with one file per `(content type, contents)` pair.
    fn multipart_body(files: &[(&str, &[u8])]) -> (String, Vec<u8>) {
        let boundary = "MY_BOUNDARY123456789";
        let mut body = Vec::new();

        for (content_type, contents) in files {
            body.extend_from_slice(
                format!(
                    "--{boundary}\r\n\
                    Content-Disposition: form-data; name=\"files\"; filename=\"entries.csv\"\r\n\
                    Content-Type: {content_type}\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(contents);
            body.extend_from_slice(b"\r\n");
        }

        body.extend_from_slice(format!("--{boundary}--").as_bytes());

        (format!("multipart/form-data; boundary={boundary}"), body)
    }

    async fn must_make_multipart(files: &[(&str, &[u8])]) -> Multipart {
        let (content_type, body) = multipart_body(files);

        let request = Request::builder()
            .method("POST")
            .uri(endpoints::IMPORT)
            .header("Content-Type", content_type)
            .body(body.into())
            .unwrap();

        Multipart::from_request(request, &()).await.unwrap()
    }

    fn alert_paragraphs(alert: ElementRef<'_>) -> Vec<String> {
        alert
            .select(&Selector::parse("p").unwrap())
            .map(|p| p.text().collect::<String>())
            .collect()
    }

    #[tokio::test]
    async fn render_page() {
        let response = get_import_page().await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_content_type(&response, "text/html; charset=utf-8");

        let html = parse_html_document(response).await;
        assert_valid_html(&html);

        let form = must_get_form(&html);
        assert_hx_endpoint(&form, endpoints::IMPORT, "hx-post");
        assert_eq!(form.value().attr("enctype"), Some("multipart/form-data"));
        assert_form_input(&form, "files", "file");
        assert_form_submit_button(&form);
    }

    #[tokio::test]
    async fn imports_valid_rows_and_reports_skipped_rows() {
        let state = get_state();
        let csv = "name,amount,category\nCoffee,4.5,Food\nBad,notanumber,Food\nTea,3.0,\n";

        let response = import_entries(
            State(state.clone()),
            must_make_multipart(&[("text/csv", csv.as_bytes())]).await,
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_fragment(response).await;
        assert_valid_html(&html);
        let alert = html
            .select(&Selector::parse("[role=alert]").unwrap())
            .next()
            .expect("No alert found");
        assert_eq!(alert.value().attr("data-alert-kind"), Some("success"));
        let paragraphs = alert_paragraphs(alert);
        assert_eq!(paragraphs[0], "Imported 2 entries");
        assert!(paragraphs[1].starts_with("Skipped 1 invalid rows."));
        assert!(paragraphs[1].contains("entries.csv row 3"));
        assert_eq!(get_all_entries(&state.db_connection.lock().unwrap()).unwrap().len(), 2);
    }

    #[tokio::test]
    async fn rejects_non_csv_files() {
        let state = get_state();
        let (_, body) = multipart_body(&[("text/plain", b"name,amount\nTea,3\n")]);
        let body = String::from_utf8(body)
            .unwrap()
            .replace("entries.csv", "entries.txt");
        let request = Request::builder()
            .method("POST")
            .uri(endpoints::IMPORT)
            .header(
                "Content-Type",
                "multipart/form-data; boundary=MY_BOUNDARY123456789",
            )
            .body(body.into())
            .unwrap();
        let multipart = Multipart::from_request(request, &()).await.unwrap();

        let response = import_entries(State(state.clone()), multipart).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(get_all_entries(&state.db_connection.lock().unwrap()).unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_required_column_is_bad_request() {
        let state = get_state();

        let response = import_entries(
            State(state.clone()),
            must_make_multipart(&[("text/csv", b"title,price\nTea,3\n")]).await,
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(get_all_entries(&state.db_connection.lock().unwrap()).unwrap().is_empty());
    }

    #[tokio::test]
    async fn non_utf8_file_is_bad_request() {
        let state = get_state();

        let response = import_entries(
            State(state.clone()),
            must_make_multipart(&[("text/csv", b"name,amount,category\nCaf\xe9,4.5,Food\n")])
                .await,
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(get_all_entries(&state.db_connection.lock().unwrap()).unwrap().is_empty());
    }

    #[tokio::test]
    async fn invalid_second_file_imports_nothing() {
        let state = get_state();

        let response = import_entries(
            State(state.clone()),
            must_make_multipart(&[
                ("text/csv", b"name,amount\nTea,3\n"),
                ("text/csv", b"title,price\nX,1\n"),
            ])
            .await,
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(get_all_entries(&state.db_connection.lock().unwrap()).unwrap().is_empty());
    }
}
