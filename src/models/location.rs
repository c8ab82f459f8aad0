//! Location directory records

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A post office / locality served by a pincode
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Locality {
    pub locality_name: String,
    pub district: String,
    pub state: String,
}
