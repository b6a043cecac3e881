// SPDX-License-Identifier: GPL-3.0-only
pub mod traits;
pub mod backend;
pub mod pipeline;

pub use traits::{
    HostedFile, RemoteListing, RemoteLocation, RemotePhoto, UploadCredentials, UploadPipeline,
};
pub use backend::BackendListingService;
pub use pipeline::HttpUploadPipeline;
