//! Media adapters: Cloudinary hosting, Unsplash search, HTTP download, and
//! the slide compositor.

pub mod cloudinary;
pub mod compositor;
pub mod fetch;
pub mod unsplash;

pub use cloudinary::CloudinaryStore;
pub use compositor::ImageSlideRenderer;
pub use fetch::HttpMediaFetcher;
pub use unsplash::UnsplashClient;
