// Adapters layer: carrier sources backed by external systems (disk, companion API).

pub mod file_source;
pub mod http_source;

pub use file_source::FileCarrierSource;
pub use http_source::HttpCarrierSource;
