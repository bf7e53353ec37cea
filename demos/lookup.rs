//! Looks up a place: autocomplete a search term, then fetch the details of
//! the first suggestion.
//!
//! Run with: `PLACES_API_KEY=... cargo run --example lookup -- "Eiffel Tower"`

use placefinder::{AppIdentity, Client, Endpoint, Error, PlaceType};
use tokio::sync::oneshot;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter("placefinder=debug,lookup=info")
        .init();

    let api_key = std::env::var("PLACES_API_KEY")
        .map_err(|_| Error::ConfigurationError("PLACES_API_KEY is not set".to_string()))?;
    let term = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "Eiffel Tower".to_string());
    let session_token = "lookup-demo";

    let client = Client::builder()
        .api_key(api_key)
        .app_identity(AppIdentity::new("lookup", env!("CARGO_PKG_VERSION"), "1"))
        .build()?;

    println!("=== Autocomplete ===");
    let suggestions = match client
        .autocomplete(&term, &[], PlaceType::Establishment, session_token)
        .await
    {
        Ok(suggestions) => suggestions,
        Err(e) => {
            eprintln!("{}", client.describe(&e).unwrap_or_else(|| e.to_string()));
            if let Some(reason) = e.failure_reason() {
                eprintln!("Reason: {}", reason);
            }
            return Err(e);
        }
    };

    for prediction in &suggestions.predictions {
        println!("{} ({})", prediction.description, prediction.place_id);
    }
    println!(
        "{} suggestion(s) in {:?} over {} attempt(s)",
        suggestions.predictions.len(),
        suggestions.latency,
        suggestions.attempts
    );

    let Some(first) = suggestions.predictions.first() else {
        println!("Nothing found for {:?}", term);
        return Ok(());
    };

    println!("\n=== Details via completion callback ===");
    let (tx, rx) = oneshot::channel();
    client.call(
        Endpoint::details(first.place_id.as_str(), session_token),
        move |outcome| {
            let _ = tx.send(outcome);
        },
    );

    let outcome = rx
        .await
        .map_err(|e| Error::General(Box::new(e)))?;
    let response = outcome?;
    let details: placefinder::models::PlaceDetailsResponse =
        placefinder::models::decode(&response.raw_body)?;

    if let Some(place) = details.result {
        println!("Address: {}", place.formatted_address);
        println!(
            "Location: {}, {}",
            place.geometry.location.lat, place.geometry.location.lng
        );
    }

    Ok(())
}
