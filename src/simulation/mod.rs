//! Synthetic activity for exercising the desk.

pub mod workload;
