//! Flutter bridge surface for the HeightMeasure core.

pub mod api;
