//! # CMS Integration Module
//!
//! Talks to the CMS REST API on behalf of the planet workflows.
//!
//! ```text
//! Planet workflows
//!        ↓
//! InstanceClient  (/cms/instances/{category}/{type}[/{id}])
//!        ↓
//! AuthClient      (/tenants/{tenant}/oauth2/token, bearer header)
//!        ↓
//! HttpClient      (single attempt or retry with backoff)
//! ```
//!
//! - [`auth`] - client-credentials token fetching backed by a cached token
//! - [`instances`] - list, create, update and bulk delete of instances
//!
//! Both clients are cheap to clone and share the same token cache, which is
//! how bulk delete tasks reuse a single token.

pub mod auth;
pub mod instances;

pub use auth::AuthClient;
pub use instances::InstanceClient;
