pub mod stage0_normalize;
pub mod stage1_assemble;
pub mod stage2_metadata;
pub mod stage3_render;
pub mod stage_filter;

pub use stage0_normalize::*;
pub use stage1_assemble::*;
pub use stage2_metadata::*;
pub use stage3_render::*;
pub use stage_filter::*;
