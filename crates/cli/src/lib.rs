//! `stuffcheck` command-line tool and check-in service.

pub mod exit_codes;
pub mod handler;
pub mod render;
pub mod server;

pub use handler::{Handler, Request, Response};
pub use server::CheckInServer;
