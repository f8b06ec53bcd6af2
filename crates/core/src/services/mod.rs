pub mod address;
pub mod cancel;
pub mod download;
pub mod fetch;
pub mod harvest;
pub mod locators;
pub mod normalize;
pub mod resolver;
pub mod tools;
pub mod transport;
