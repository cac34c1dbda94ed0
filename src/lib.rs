pub mod config;
pub mod error;
pub mod xml;
pub mod transport;
pub mod paths;
pub mod session;
pub mod directory;
pub mod admin;
pub mod permissions;

pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use session::{Credentials, Session};
pub use permissions::{CapabilityMode, DefaultPermissions, GranteeType, ObjectKind, PermissionWriter};
