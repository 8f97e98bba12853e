pub mod config;
pub mod derive;
pub mod elastic;
pub mod error;
pub mod kibana;
pub mod lookup;
pub mod model;
pub mod pipeline;
pub mod projector;
pub mod sync;
pub mod trello;
