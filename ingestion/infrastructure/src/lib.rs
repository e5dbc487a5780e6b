pub mod gateways;
pub mod repositories;

pub use gateways::EntsoePriceGateway;
pub use repositories::CsvPriceRepository;
