mod cloudinary;
mod container;
