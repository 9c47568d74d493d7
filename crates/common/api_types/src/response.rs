use serde::{Deserialize, Serialize};

/// Standard `{ "data": ... }` envelope of the beacon REST API. Unknown
/// sibling fields (`version`, `execution_optimistic`, `dependent_root`, ...)
/// are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataResponse<T> {
    pub data: T,
}

impl<T> DataResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}
