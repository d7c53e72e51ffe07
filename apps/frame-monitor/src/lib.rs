pub mod error;
pub mod logger;
pub mod monitor;
pub mod paths;

#[cfg(test)]
mod tests;
