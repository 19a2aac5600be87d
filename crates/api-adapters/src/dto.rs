//! Wire shapes that only exist at the HTTP boundary. Entity inputs and views
//! are the `domains` models themselves.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Body of a `201 Created`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Created {
    pub id: Uuid,
}

/// Body of the reorder endpoints: comma-separated ids in their new order.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderRequest {
    pub idsordered: String,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct BoardsQuery {
    #[serde(default)]
    pub archived: bool,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogsQuery {
    pub board_id: Uuid,
}
