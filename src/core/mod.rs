// Domain-layer modules and shared errors/models
pub mod models {
    pub use crate::models::*;
}

pub mod services {
    pub use crate::services::*;
}

pub mod validation {
    pub use crate::validation::*;
}

pub mod remote_key {
    pub use crate::remote_key::*;
}

pub mod errors {
    pub use crate::errors::*;
}
