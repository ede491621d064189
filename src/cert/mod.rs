pub mod bundle;
pub mod cache;
pub mod service;

pub use bundle::CertificateBundle;
pub use cache::CertificateCache;
pub use service::CertificateService;
