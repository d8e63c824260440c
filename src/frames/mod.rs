pub mod daily_frame;
pub mod enriched_frame;
