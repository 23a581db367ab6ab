//! Wire-protocol and buffer capacity limits.
//!
//! These caps bound every heap buffer the client fills from the network
//! or hands to the DUT. The length fields on a test case are always
//! authoritative; the caps here are upper bounds only.

/// Maximum accepted HTTP response body, in bytes.
pub const HTTP_BODY_MAX: usize = 1024 * 1024;

/// Maximum length of a fully assembled request URL, query string included.
pub const ATTR_URL_MAX: usize = 4096;

/// Maximum accepted bearer-token length, in characters.
pub const JWT_TOKEN_MAX: usize = 2048;

/// Maximum symmetric key buffer, in bytes.
pub const SYM_KEY_BYTE_MAX: usize = 64;

/// Maximum plaintext buffer for one symmetric test case, in bytes.
pub const SYM_PT_BYTE_MAX: usize = 1024;

/// Maximum ciphertext buffer for one symmetric test case, in bytes.
pub const SYM_CT_BYTE_MAX: usize = 1024;

/// Maximum IV buffer for one symmetric test case, in bytes.
pub const SYM_IV_BYTE_MAX: usize = 16;

/// Triple-DES key length, in bytes (three 8-byte fragments).
pub const TDES_KEY_BYTE_LEN: usize = 24;

/// Triple-DES key length, in bits, as reported by the server.
pub const TDES_KEY_BIT_LEN: usize = 192;

/// Hex characters in one Triple-DES key fragment (`key1`..`key3`).
pub const TDES_KEY_FRAGMENT_HEX_LEN: usize = 16;

/// Monte-Carlo outer rounds for Triple-DES.
pub const TDES_MCT_OUTER: usize = 100;

/// Monte-Carlo inner rounds for Triple-DES.
pub const TDES_MCT_INNER: usize = 1000;

/// Only significant bit of a serialized CFB1 payload byte.
pub const CFB1_BIT_MASK: u8 = 0x80;

/// Per-field caps for the HTTP User-Agent string.
pub const USER_AGENT_STR_MAX: usize = 255;
/// Cap for the OS-name field of the User-Agent string.
pub const USER_AGENT_OSNAME_MAX: usize = 32;
/// Cap for the OS-version field of the User-Agent string.
pub const USER_AGENT_OSVER_MAX: usize = 64;
/// Cap for the architecture field of the User-Agent string.
pub const USER_AGENT_ARCH_MAX: usize = 16;
/// Cap for the processor-model field of the User-Agent string.
pub const USER_AGENT_PROC_MAX: usize = 64;
/// Cap for the compiler field of the User-Agent string.
pub const USER_AGENT_COMP_MAX: usize = 32;
