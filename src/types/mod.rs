pub mod columns;
pub mod compass;
pub mod raw_forecast;
pub mod rows;
