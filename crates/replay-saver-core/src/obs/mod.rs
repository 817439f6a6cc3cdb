mod connector;
pub(crate) mod protocol;

pub use connector::{ObsConnector, ObsTransport};
