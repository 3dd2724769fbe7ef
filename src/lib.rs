//! parkwatch - Count free parking zones from per-frame vehicle detections

pub mod config;
pub mod domain;
pub mod feed;
pub mod geometry;
pub mod occupancy;
pub mod output;
