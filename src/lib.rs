//! This crate computes maximum acyclic agreement forests of two rooted binary phylogenetic trees,
//! and from them the hybridization number, minimum hybridization networks and the rSPR distance.

pub mod acyclic;
pub mod app;
pub mod cluster;
pub mod error;
pub mod forest;
pub mod network;
pub mod newick;
pub mod parallel;
pub mod preprocess;
pub mod problem;
pub mod tree;
