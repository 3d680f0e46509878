// Core primitives shared by services and handlers

pub mod pagination;

pub use pagination::{Page, Paginator};
