mod responses;

use crate::http::request::RequestRecord;
use crate::http::response::HttpResponse;

pub fn handle_request(record: &RequestRecord) -> HttpResponse {
    responses::diagnostic(record)
}
