pub mod body;
pub mod c_api;
pub mod config;
pub mod quadtree;
pub mod simulation;
pub mod utils;

pub use body::Body;
pub use config::{GravityParameters, QuadTreeConfig, SimulationConfig, SpawnConfig};
pub use quadtree::{Node, Quad, Quadrant, Quadtree, Traversal};
pub use simulation::{Simulation, StepReport};
pub use ultraviolet;
