//! Exchange-agnostic request plumbing.
//!
//! The kernel turns a [`RequestDescriptor`] into a [`SignedRequest`], hands it to a
//! [`Transport`] and classifies whatever comes back. Nothing in here knows about a
//! specific exchange: signing schemes and error tables are data loaded from adapter
//! configuration.
//!
//! ```rust,no_run
//! use exadapt::core::config::Credentials;
//! use exadapt::core::kernel::*;
//! use std::collections::BTreeMap;
//!
//! # fn example() -> Result<(), exadapt::ExchangeError> {
//! let profile = SigningProfile {
//!     prehash: vec![PrehashPart::Timestamp, PrehashPart::Method, PrehashPart::Path],
//!     ..SigningProfile::default()
//! };
//! let urls = BTreeMap::from([("private".to_string(), "https://api.example.com".to_string())]);
//! let signer = RequestSigner::new("example", profile, urls);
//!
//! let creds = Credentials::new("key", "secret");
//! let request = RequestDescriptor::private(HttpMethod::Get, "balance");
//! let signed = signer.sign(&request, Some(&creds), 1_700_000_000_000)?;
//! assert_eq!(signed.url, "https://api.example.com/balance");
//! # Ok(())
//! # }
//! ```
pub mod classifier;
pub mod signer;
pub mod transport;

pub use classifier::{
    default_http_exceptions, BroadScope, ErrorEnvelope, ErrorRules, ErrorTable, ResponseClassifier,
};
pub use signer::{
    hmac_signature, implode_params, urlencode, ContentTypeRule, HashAlgorithm, HttpMethod, Params,
    PayloadFields, PrehashPart, RequestDescriptor, RequestSigner, SignatureDelivery,
    SignatureEncoding, SignedRequest, SigningHeaders, SigningProfile,
};
pub use transport::{RawResponse, ReqwestTransport, Transport, TransportConfig};
