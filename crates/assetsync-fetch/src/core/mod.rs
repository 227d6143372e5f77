//! Pure decisions for conditional fetching.
//!
//! Nothing here touches the network or the disk, so every rule about when to
//! ask, what to send and how to read the answer is testable on its own.

mod conditional;
mod staleness;

pub use conditional::{
    IF_MODIFIED_SINCE, IF_NONE_MATCH, ResponseKind, USER_AGENT, check_size, classify_status,
    request_headers,
};
pub use staleness::is_due;
