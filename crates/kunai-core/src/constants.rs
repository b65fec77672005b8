/// Product identity used for generated `PRODID` and `X-GENERATOR` values
pub const PRODUCT_NAME: &str = "kunai";
pub const PRODUCT_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const GENERATOR: &str = const_str::concat!(PRODUCT_NAME, " ", PRODUCT_VERSION);
pub const PRODUCT_ID: &str =
    const_str::concat!("-//", PRODUCT_NAME, "//", PRODUCT_NAME, " ", PRODUCT_VERSION, "//EN");

/// xCard namespace (RFC 6351)
pub const XCARD_NAMESPACE: &str = "urn:ietf:params:xml:ns:vcard-4.0";

/// Prefix reserved for private extension properties and parameters
pub const EXTENSION_PREFIX: &str = "X-";

/// Nesting limit for embedded vCards
pub const MAX_NESTING_DEPTH: usize = 30;

/// Fold width in octets for the line-oriented formats
pub const DEFAULT_FOLD_LINE_LENGTH: usize = 75;
