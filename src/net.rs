//! Network layer: buffered HTTP fetching and the typed analytics transport.

mod fetch;
mod response;
pub mod transport;

pub use fetch::fetch;
pub use response::Response;
pub use transport::{HttpTransport, Transport};
