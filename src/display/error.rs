/*
 *  display/error.rs
 *
 *  LyMonS - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Unified error types for display subsystem
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use thiserror::Error;

use crate::display::bus::Address;

/// A failed write on the bus, as reported by the transport
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("bus write to {address} failed: {reason}")]
pub struct TransportError {
    /// Device the write was addressed to
    pub address: Address,

    /// Transport specific description of the failure
    pub reason: String,
}

impl TransportError {
    pub fn new(address: Address, reason: impl Into<String>) -> Self {
        Self { address, reason: reason.into() }
    }
}

/// Unified error type for all display operations
#[derive(Debug, Error)]
pub enum DisplayError {
    /// Geometry or address rejected before any bus traffic
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The controller did not accept the initialization sequence
    #[error("Display initialization failed: {0}")]
    InitializationFailed(#[source] TransportError),

    /// Bus write failure while flushing the framebuffer
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}

impl DisplayError {
    /// True for the construction-time class of errors (bad geometry, bad
    /// address, failed handshake). No driver exists when one of these is
    /// returned.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            DisplayError::InvalidConfiguration(_) | DisplayError::InitializationFailed(_)
        )
    }

    /// The underlying bus failure, if any
    pub fn transport_error(&self) -> Option<&TransportError> {
        match self {
            DisplayError::InitializationFailed(err) | DisplayError::Transport(err) => Some(err),
            DisplayError::InvalidConfiguration(_) => None,
        }
    }
}
