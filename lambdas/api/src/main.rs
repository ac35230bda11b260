use characters_api::router;
use lambda_http::{run, service_fn, Error, Request};
use repository::{CharacterStore, DynamoTable, StoreConfig};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Error> {
    // required to enable CloudWatch error logging by the runtime
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        // disabling time is handy because CloudWatch will add the ingestion time.
        .without_time()
        .init();

    let shared_config = aws_config::load_from_env().await;
    let store_config = StoreConfig::from_env();
    let table = Arc::new(DynamoTable::new(&shared_config, &store_config));
    let store_ref = &CharacterStore::new(table, &store_config);

    run(service_fn(move |event: Request| async move {
        Ok::<_, Error>(router::dispatch(store_ref, event).await)
    }))
    .await?;
    Ok(())
}
