// SPDX-License-Identifier: Apache-2.0

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Hyper(#[from] hyper::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] http::Error),

    #[error("inventory query failed: {0}")]
    Inventory(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("tailer already started: {0}")]
    AlreadyStarted(String),
}

pub type Result<T> = std::result::Result<T, Error>;
