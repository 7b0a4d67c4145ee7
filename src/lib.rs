pub mod animation;
pub mod carousel;
pub mod config;
pub mod error;
pub mod events;
pub mod gesture;
pub mod home;
pub mod keyboard;
pub mod layout;
pub mod scene;
pub mod slide;
pub mod render {
    pub mod loader;
    pub mod title;
    pub mod viewer;
}

pub use error::{Error, Result};
