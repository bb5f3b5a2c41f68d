mod conversions;
mod error;
mod host_call;
mod methods;
mod params;
mod returns;
mod traits;
mod transports;
mod types;

#[cfg(test)]
mod test;

pub use error::*;
pub use host_call::HostCall;
pub use traits::{FromParams, Method, ToPs};
pub use transports::{ResultTransport, Submission, Transport};
pub use types::*;

// Export spec-compliant utilities
pub use conversions::{RemoteHostMethodId, should_send_host_response};
