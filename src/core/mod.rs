pub mod item;

pub mod job;

pub mod step;

pub mod store;
