//! Auth services used by the page and API routes.
//!
//! ARCHITECTURE
//! ============
//! Service modules own the backend dialect and session semantics so route
//! handlers can stay focused on forms, cookies and redirects.

pub mod backend;
pub mod credentials;
pub mod identity;
pub mod oauth;
pub mod session;

#[cfg(test)]
pub mod test_helpers;
