//! Cache keys derived from call arguments
//!
//! Every argument is recorded together with its Rust type name, so values that
//! compare equal across types (`1i32` and `1.0f64`, say) never share a key.
//! Keyword arguments keep the order they were given in. Map-valued arguments
//! are encoded with their keys sorted, so iteration order never leaks in.

use serde::Serialize;

use crate::error::{Error, Result};

/// One encoded argument
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct KeyArg {
    type_name: &'static str,
    value: String,
}

impl KeyArg {
    fn encode<T: Serialize + ?Sized>(value: &T) -> std::result::Result<Self, serde_json::Error> {
        Ok(Self {
            type_name: std::any::type_name::<T>(),
            value: serde_json::to_value(value)?.to_string(),
        })
    }
}

/// Deterministic, type-discriminating key for one call's arguments
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    args: Vec<KeyArg>,
    kwargs: Vec<(String, KeyArg)>,
}

impl CacheKey {
    /// Start building a key
    pub fn builder() -> KeyBuilder {
        KeyBuilder::default()
    }

    /// Key for a single argument value
    pub fn of<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        Self::builder().arg(value).build()
    }

    /// Number of positional plus keyword arguments
    pub fn arity(&self) -> usize {
        self.args.len() + self.kwargs.len()
    }
}

/// Builder for [`CacheKey`]
///
/// Encoding errors are held until `build`.
#[derive(Debug, Default)]
pub struct KeyBuilder {
    args: Vec<KeyArg>,
    kwargs: Vec<(String, KeyArg)>,
    error: Option<Error>,
}

impl KeyBuilder {
    /// Append a positional argument
    pub fn arg<T: Serialize + ?Sized>(mut self, value: &T) -> Self {
        if self.error.is_none() {
            match KeyArg::encode(value) {
                Ok(arg) => self.args.push(arg),
                Err(e) => {
                    self.error = Some(Error::KeyDerivation(format!(
                        "positional argument {} ({}): {}",
                        self.args.len(),
                        std::any::type_name::<T>(),
                        e
                    )))
                }
            }
        }
        self
    }

    /// Append a keyword argument
    pub fn kwarg<T: Serialize + ?Sized>(mut self, name: impl Into<String>, value: &T) -> Self {
        let name = name.into();
        if self.error.is_none() {
            match KeyArg::encode(value) {
                Ok(arg) => self.kwargs.push((name, arg)),
                Err(e) => {
                    self.error = Some(Error::KeyDerivation(format!(
                        "keyword argument '{}' ({}): {}",
                        name,
                        std::any::type_name::<T>(),
                        e
                    )))
                }
            }
        }
        self
    }

    /// Finish the key
    pub fn build(self) -> Result<CacheKey> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(CacheKey {
                args: self.args,
                kwargs: self.kwargs,
            }),
        }
    }
}
