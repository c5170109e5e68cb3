pub mod animation;
pub mod config;
pub mod constants;
pub mod counter;
pub mod error;
pub mod mesh;
pub mod placement;
pub mod reticle;
pub mod scene;
pub mod session;
pub mod spiral;
pub mod store;

pub use animation::*;
pub use config::*;
pub use constants::*;
pub use counter::*;
pub use error::*;
pub use mesh::*;
pub use placement::*;
pub use reticle::*;
pub use scene::*;
pub use session::*;
pub use spiral::*;
pub use store::*;
