use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Package fields needed to derive a booking code prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct PackageRef {
    pub id: i64,
    pub name: String,
    pub city_code: Option<String>,
    pub city_name: Option<String>,
}
