pub mod meshes;
pub mod notation;
pub mod plugin;
pub mod reconcile;
pub mod session;
pub mod systems;
pub mod types;

pub use meshes::*;
pub use notation::*;
pub use plugin::*;
pub use reconcile::*;
pub use session::*;
pub use types::*;
