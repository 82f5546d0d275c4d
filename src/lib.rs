//! # LDAP Filter Codec
//!
//! A codec for Lightweight Directory Access Protocol search filters in their textual form
//! ([RFC4515]), independent of the LDAP BER wire encoding ([RFC4511]).
//!
//! It is written in pure Rust and makes extensive use of zero-copy: decoded filters borrow from
//! the input wherever no escape sequence forces a copy. A lot of care is taken to ensure security
//! and safety of this crate, including defensive programming around internal panics (see
//! [`ProtocolError::UncaughtException`](error::ProtocolError::UncaughtException)) and tests. It
//! also aims to be panic-free on malformed input: every decode failure is returned as a
//! `Result`, never a panic.
//!
//! ```
//! use ldap_filter::{decode_str, print};
//!
//! let filter = decode_str("(&(cn=Jane Doe)(mail=*))").unwrap();
//! assert_eq!(print(&filter), b"(&(cn=Jane Doe)(mail=*))");
//! ```
//!
//! [RFC4515]: https://datatracker.ietf.org/doc/html/rfc4515
//! [RFC4511]: https://datatracker.ietf.org/doc/html/rfc4511

#![deny(unstable_features, unused_import_braces, unused_qualifications)]
#![warn(missing_debug_implementations, unreachable_pub)]
#![forbid(unsafe_code)]
#![doc(test(
    no_crate_inject,
    attr(deny(warnings, rust_2018_idioms), allow(dead_code, unused_variables))
))]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod decoder;
pub mod error;
mod escape;
pub mod filter;
mod lowering;
mod printer;

pub use decoder::{decode, decode_str};
pub use error::{ProtocolError, Result};
pub use filter::{present_filter, Filter};
pub use lowering::{lower, LoweredFilter, SchemaResolver};
pub use printer::print;
