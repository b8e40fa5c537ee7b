//! Print the OpenAPI document as JSON on stdout.

use playtrack_pace_back::services::documentation::ApiDoc;
use utoipa::OpenApi;

fn main() {
    println!("{}", ApiDoc::openapi().to_pretty_json().unwrap());
}
