use std::sync::Arc;

use guestcode::transport::http;
use guestcode::{
    CodeService, CodeStore, Config, HttpMailTransport, MailTransport, MemoryCodeStore, Notifier,
    run_periodic_check,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("guestcode=info")),
        )
        .init();

    let config = Config::from_env()?;

    let store: Arc<dyn CodeStore> = Arc::new(MemoryCodeStore::new());
    let transport: Arc<dyn MailTransport> =
        Arc::new(HttpMailTransport::new(config.relay_url.clone()));
    let notifier = Arc::new(Notifier::new(
        transport,
        config.recipient.clone(),
        config.sender.clone(),
    ));
    let service = Arc::new(CodeService::new(store, notifier));

    if let Some(period) = config.check_interval {
        tokio::spawn(run_periodic_check(Arc::clone(&service), period));
    }

    http::serve(config.server, service).await
}
