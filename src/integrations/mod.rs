//! External service integrations.

pub mod mailchimp_client {
    pub use crate::mailchimp_client::*;
}
