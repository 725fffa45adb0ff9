mod cloudinary;
mod container;
mod uploader;

pub use {
    cloudinary::{
        CloudinarySettings, CloudinaryUploader, DEFAULT_API_BASE, object_name, upload_endpoint,
    },
    container::{EncodedUpload, UploadContainer},
    uploader::Uploader,
};
