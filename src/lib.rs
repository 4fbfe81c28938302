pub mod assets;
pub mod config;
pub mod error;
pub mod events;
pub mod palette;
pub mod processing {
    pub mod blur;
    pub mod layout;
    pub mod noise;
    pub mod resize;
}
pub mod render {
    pub mod background;
    pub mod compositor;
    pub mod dual;
    pub mod frame;
    pub mod generative;
    pub mod shapes;
    pub mod surface;
    pub mod transform;
}
pub mod tasks {
    pub mod session;
}

pub use error::{Error, Result};
pub use settings_model;
