//! Presigned URLs for staged document files.
//!
//! Failure here is never fatal to the caller: it is logged as a warning
//! and reported as `None`.

use serde_json::Value;

use crate::warehouse::{SqlParam, Warehouse};

pub const EMPTY_PATH: &str = "Pick a path to preview.";

const PRESIGN_SQL: &str = "SELECT GET_PRESIGNED_URL(?, ?, ?) AS URL";

/// Presigned URL for `relative_path` under `@stage`, valid for `seconds`.
pub async fn presigned_url(
    warehouse: &dyn Warehouse,
    stage: &str,
    relative_path: &str,
    seconds: i64,
) -> Option<String> {
    let params = [
        SqlParam::from(format!("@{}", stage)),
        SqlParam::from(relative_path),
        SqlParam::from(seconds),
    ];

    match warehouse.scalar(PRESIGN_SQL, &params).await {
        Ok(Some(Value::String(url))) if !url.is_empty() => Some(url),
        Ok(other) => {
            tracing::warn!(path = relative_path, result = ?other, "no presigned URL returned");
            None
        }
        Err(e) => {
            tracing::warn!(path = relative_path, error = %e, "could not create presigned URL");
            None
        }
    }
}
