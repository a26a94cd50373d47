//! Prefixed identifier generation
//!
//! Record identifiers look like `usr_...` or `inv_...`: a short type prefix
//! followed by 96 bits of OS randomness encoded as URL-safe base64.

use base64::{Engine, prelude::BASE64_URL_SAFE_NO_PAD};
use rand::{TryRngCore, rngs::OsRng};

const ID_ENTROPY_BYTES: usize = 12;

/// Generate a prefixed ID with 96 bits of entropy
///
/// # Panics
///
/// Panics if the OS random number generator is unavailable.
pub fn generate_prefixed_id(prefix: &str) -> String {
    let mut bytes = [0u8; ID_ENTROPY_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .expect("OS RNG failure - system entropy source unavailable");

    let encoded = BASE64_URL_SAFE_NO_PAD.encode(bytes);
    format!("{prefix}_{encoded}")
}

/// Check that `id` is `{expected_prefix}_` followed by at least 96 bits of base64 data
pub fn validate_prefixed_id(id: &str, expected_prefix: &str) -> bool {
    let Some(random_part) = id
        .strip_prefix(expected_prefix)
        .and_then(|rest| rest.strip_prefix('_'))
    else {
        return false;
    };

    match BASE64_URL_SAFE_NO_PAD.decode(random_part) {
        Ok(decoded) => decoded.len() >= ID_ENTROPY_BYTES,
        Err(_) => false,
    }
}

/// Define a prefixed id newtype with the usual constructors and conversions.
///
/// `FromStr` checks the prefix; `From<String>` and `new` accept anything, for
/// rows read back from storage.
macro_rules! prefixed_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: &str) -> Self {
                $name(id.to_string())
            }

            pub fn new_random() -> Self {
                $name($crate::id::generate_prefixed_id($prefix))
            }

            pub fn into_inner(self) -> String {
                self.0
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn is_valid(&self) -> bool {
                $crate::id::validate_prefixed_id(&self.0, $prefix)
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new_random()
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let id = $name(s.to_string());
                if id.is_valid() {
                    Ok(id)
                } else {
                    Err($crate::ValidationError::InvalidField(format!(
                        concat!("Invalid ", $label, " ID format: expected '", $prefix, "_' prefix, got '{}'"),
                        s
                    ))
                    .into())
                }
            }
        }
    };
}

pub(crate) use prefixed_id;
