pub mod entsoe;

pub use entsoe::EntsoePriceGateway;
