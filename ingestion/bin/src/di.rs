use crate::config::AppConfig;
use dayahead_application::services::DayAheadServiceImplParameters;
use dayahead_application::DayAheadServiceImpl;
use dayahead_domain::Market;
use dayahead_infrastructure::gateways::entsoe::EntsoePriceGatewayParameters;
use dayahead_infrastructure::repositories::csv::CsvPriceRepositoryParameters;
use dayahead_infrastructure::{CsvPriceRepository, EntsoePriceGateway};
use reqwest::Client;
use shaku::module;

module! {
    pub AppModule {
        components = [
            DayAheadServiceImpl,
            EntsoePriceGateway,
            CsvPriceRepository
        ],
        providers = []
    }
}

pub fn create_app_module(config: &AppConfig) -> Result<AppModule, reqwest::Error> {
    let client = Client::builder().timeout(config.timeout).build()?;

    Ok(AppModule::builder()
        .with_component_parameters::<DayAheadServiceImpl>(DayAheadServiceImplParameters {
            market: Market::FINLAND,
            policy: config.policy,
        })
        .with_component_parameters::<EntsoePriceGateway>(EntsoePriceGatewayParameters {
            client,
            base_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            preferred_resolution_minutes: config.resolution_minutes,
        })
        .with_component_parameters::<CsvPriceRepository>(CsvPriceRepositoryParameters {
            data_dir: config.data_dir.clone(),
        })
        .build())
}
