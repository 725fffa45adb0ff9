mod audio;
mod upload;
