//! ARM REST implementation of the grantplan authorization backend.
//!
//! [`ArmClient`] drives the `Microsoft.Authorization` role-assignment
//! surface of an ARM-style management endpoint. Authentication is out of
//! scope: the client is handed a bearer token for an already-established
//! session.

pub mod client;
pub mod environment;

pub use client::{ArmClient, POLICY_API_VERSION, ROLE_ASSIGNMENT_API_VERSION};
pub use environment::CloudEnvironment;
