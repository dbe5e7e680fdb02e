// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

pub mod dto;
pub mod errors;
pub mod params;

pub use errors::ApiError;
