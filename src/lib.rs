pub mod acme;
pub mod cert;
pub mod cli;
pub mod utils;
pub mod writer;

// Re-export specific items to avoid conflicts
pub use acme::IssuanceProvider;
pub use cert::{CertificateBundle, CertificateCache, CertificateService};
pub use cli::{args, commands};
pub use utils::{errors, paths};
pub use writer::{ResultWriter, S3Writer, StdoutWriter};
