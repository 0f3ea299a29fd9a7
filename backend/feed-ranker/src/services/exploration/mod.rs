// ============================================
// Exploration Module
// ============================================
//
// Cold-start handling for candidates without engagement history.
//
// 1. Items with zero impressions/views/clicks/purchases are annotated with
//    a fixed prior and an extra freshness weight
// 2. The annotation is inert on its own: UCB1 only reads it when built
//    with `Ucb1Strategy::with_cold_start`
// 3. Once an item records any engagement it no longer qualifies

pub mod cold_start;

pub use cold_start::{ColdStartAnnotation, ColdStartAnnotator};
