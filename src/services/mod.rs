//! Domain services behind the HTTP routes.
//!
//! ARCHITECTURE
//! ============
//! Service modules own the world mutations and the render pipeline so route
//! handlers stay thin protocol translation. Mutations never hold the world
//! lock across I/O: artwork is resolved through the asset cache first, the
//! write section is a handful of in-memory operations, and the dirty signal
//! fires after the lock is released.

pub mod assets;
pub mod compositor;
pub mod fog;
pub mod map;
pub mod render;
pub mod stroke;
pub mod token;
