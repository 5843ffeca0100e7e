use axum::Json;

use crate::result::{ApiResponse, message_to_api_response};

pub async fn health_check() -> Json<ApiResponse<()>> {
    message_to_api_response("OK")
}
