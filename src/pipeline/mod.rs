// Pipelines — the fetch scheduler and the end-to-end ranking run built on it.

pub mod fetch;
pub mod rank;
pub mod throttle;
