use anyhow::Result;
use weatherdeck_core::Config;
use weatherdeck_weather::display::{icon_emoji, localized_description};
use weatherdeck_weather::CityWeatherAggregator;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize core
    weatherdeck_core::init()?;

    // Warnings are logged during validation
    let (config, _) = Config::load_validated()?;

    let aggregator = CityWeatherAggregator::from_config(&config)?;
    tracing::info!("WeatherDeck started");

    let report = aggregator.load_from_store().await?;
    tracing::info!(
        "Loaded {} saved cities ({} skipped, {} failed)",
        report.loaded,
        report.skipped,
        report.failed.len()
    );

    println!("WeatherDeck");
    for city in aggregator.cities() {
        let (emoji, description) = city
            .condition()
            .map(|c| (icon_emoji(&c.icon), localized_description(&c.description)))
            .unwrap_or(("🌤️", ""));
        println!(
            "  {} {} {:.0}°  {}",
            emoji, city.name, city.main.temp, description
        );
    }

    if let Some(message) = aggregator.error() {
        eprintln!("{}", message);
    }

    Ok(())
}
