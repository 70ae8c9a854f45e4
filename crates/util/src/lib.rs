pub mod http_path_resolution;
pub mod path_processing;
pub mod text_processing;

pub use http_path_resolution::*;
pub use path_processing::*;
pub use text_processing::*;
