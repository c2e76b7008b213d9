// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Common error types and macros.

use std::error::Error;
use std::{io, result, str};

/// Parquet error enumeration.
///
/// Most read-path failures map to a dedicated variant so that callers can
/// distinguish, for example, a corrupt footer from a wrong decryption key.
#[derive(Debug)]
pub enum ParquetError {
    /// General Parquet error.
    /// Returned when code violates normal workflow of working with Parquet files.
    General(String),
    /// File too short, corrupt magic bytes, or a length field exceeding the file size.
    InvalidFooter(String),
    /// Thrift compact-protocol parse error.
    DeserializeFailed(String),
    /// Authentication tag mismatch or invalid ciphertext framing.
    DecryptFailed(String),
    /// The reader lacks the key for a column whose metadata or data is
    /// encrypted with a column-specific key. Other columns remain readable.
    MissingColumnKey(String),
    /// The reader lacks the footer key for an encrypted-footer file.
    MissingFooterKey,
    /// The file and the decryption properties disagree on the AAD prefix.
    AadPrefixMismatch,
    /// The file was encrypted with an AAD prefix that is not stored in the
    /// file, and none was supplied in the decryption properties.
    MissingAadPrefix,
    /// An AAD prefix was supplied in the decryption properties, but the file
    /// was not encrypted with one.
    UnexpectedAadPrefix,
    /// An AAD prefix verifier is registered, but the file stores no prefix.
    VerifierWithoutPrefix,
    /// The plaintext-footer signature is not exactly nonce + tag (28 bytes).
    InvalidSignatureLen(usize),
    /// Cipher variant not recognized.
    UnsupportedAlgorithm(String),
    /// Decryption properties were configured to reject plaintext files, but a
    /// plaintext file was encountered.
    PlaintextNotAllowed,
    /// A writer or builder was driven out of order, e.g. a row group closed
    /// with unfinished columns or a writer used after close.
    BuilderMisuse(String),
    /// "Not yet implemented" error.
    /// Returned when functionality is not yet available.
    NYI(String),
    /// "End of file" error.
    /// Returned when IO related failures occur, e.g. when there are not enough
    /// bytes to decode.
    EOF(String),
    /// The requested index is larger than the number of items present.
    IndexOutOfBound(usize, usize),
    /// An external error variant.
    External(Box<dyn Error + Send + Sync>),
}

impl std::fmt::Display for ParquetError {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        match &self {
            ParquetError::General(message) => write!(fmt, "Parquet error: {message}"),
            ParquetError::InvalidFooter(message) => {
                write!(fmt, "Invalid Parquet file: {message}")
            }
            ParquetError::DeserializeFailed(message) => {
                write!(fmt, "Couldn't deserialize thrift: {message}")
            }
            ParquetError::DecryptFailed(message) => {
                write!(fmt, "Decryption failed: {message}")
            }
            ParquetError::MissingColumnKey(column) => write!(
                fmt,
                "No decryption key available for encrypted column '{column}'"
            ),
            ParquetError::MissingFooterKey => write!(
                fmt,
                "No footer decryption key available for encrypted footer"
            ),
            ParquetError::AadPrefixMismatch => {
                write!(fmt, "AAD prefix in file and in properties is not the same")
            }
            ParquetError::MissingAadPrefix => write!(
                fmt,
                "AAD prefix used for file encryption, but not stored in file and not \
                 supplied in decryption properties"
            ),
            ParquetError::UnexpectedAadPrefix => write!(
                fmt,
                "AAD prefix set in decryption properties, but was not used for file encryption"
            ),
            ParquetError::VerifierWithoutPrefix => {
                write!(fmt, "AAD prefix verifier is set, but AAD prefix not found in file")
            }
            ParquetError::InvalidSignatureLen(len) => {
                write!(fmt, "Plaintext footer signature length {len} != 28")
            }
            ParquetError::UnsupportedAlgorithm(name) => {
                write!(fmt, "Unsupported encryption algorithm: {name}")
            }
            ParquetError::PlaintextNotAllowed => {
                write!(fmt, "Applying decryption properties on plaintext file")
            }
            ParquetError::BuilderMisuse(message) => {
                write!(fmt, "Builder misuse: {message}")
            }
            ParquetError::NYI(message) => write!(fmt, "NYI: {message}"),
            ParquetError::EOF(message) => write!(fmt, "EOF: {message}"),
            ParquetError::IndexOutOfBound(index, bound) => {
                write!(fmt, "Index {index} out of bound: {bound}")
            }
            ParquetError::External(e) => write!(fmt, "External: {e}"),
        }
    }
}

impl Error for ParquetError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ParquetError::External(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

impl From<io::Error> for ParquetError {
    fn from(e: io::Error) -> ParquetError {
        ParquetError::External(Box::new(e))
    }
}

impl From<snap::Error> for ParquetError {
    fn from(e: snap::Error) -> ParquetError {
        ParquetError::External(Box::new(e))
    }
}

impl From<str::Utf8Error> for ParquetError {
    fn from(e: str::Utf8Error) -> ParquetError {
        ParquetError::External(Box::new(e))
    }
}

impl From<std::string::FromUtf8Error> for ParquetError {
    fn from(e: std::string::FromUtf8Error) -> ParquetError {
        ParquetError::External(Box::new(e))
    }
}

/// A specialized `Result` for Parquet errors.
pub type Result<T, E = ParquetError> = result::Result<T, E>;

impl From<ParquetError> for io::Error {
    fn from(e: ParquetError) -> Self {
        io::Error::new(io::ErrorKind::Other, e)
    }
}

// ----------------------------------------------------------------------
// Convenient macros for different errors

macro_rules! general_err {
    ($fmt:expr) => (ParquetError::General($fmt.to_owned()));
    ($fmt:expr, $($args:expr),*) => (ParquetError::General(format!($fmt, $($args),*)));
}

macro_rules! nyi_err {
    ($fmt:expr) => (ParquetError::NYI($fmt.to_owned()));
    ($fmt:expr, $($args:expr),*) => (ParquetError::NYI(format!($fmt, $($args),*)));
}

macro_rules! eof_err {
    ($fmt:expr) => (ParquetError::EOF($fmt.to_owned()));
    ($fmt:expr, $($args:expr),*) => (ParquetError::EOF(format!($fmt, $($args),*)));
}
