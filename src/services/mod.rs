pub mod conversion;
pub mod diagnostics;
pub mod pipeline;
pub mod process;
pub mod validation;
pub mod workspace;
