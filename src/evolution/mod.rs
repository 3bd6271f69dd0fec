pub mod combine;
pub mod controller;
pub mod exchange;
pub mod individual;
pub mod mutation;
pub mod partitioning;
pub mod population;
