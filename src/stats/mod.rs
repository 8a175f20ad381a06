// Collection statistics — trait frequency tables and their concurrent builder.

pub mod aggregator;
pub mod tables;
