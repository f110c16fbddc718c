pub mod engine;
#[cfg(test)]
pub mod recording;
pub mod surface;
pub mod text;
