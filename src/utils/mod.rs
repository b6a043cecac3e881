// SPDX-License-Identifier: GPL-3.0-only
pub mod folder;
pub mod url_validator;

pub use folder::normalize_folder;
pub use url_validator::validate_url;
