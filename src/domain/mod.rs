pub mod entity;
pub mod geom;
pub mod motion;
pub mod tile;
