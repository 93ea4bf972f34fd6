use std::{sync::Arc, time::Duration};

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use log::*;

use feast_engine::{
    events::{EventHandlers, EventHooks, EventProducers},
    OrderFlowApi,
    OrderQueryApi,
    PaymentApi,
    SettlementApi,
    SqliteDatabase,
};

use crate::{
    config::{NotificationConfig, ServerConfig},
    errors::ServerError,
    notifier::{HttpEmailSender, HttpWhatsAppSender, InMemoryLiveBus, Notifier},
    routes::{
        health,
        live_updates,
        OrderByIdRoute,
        OrderTimelineRoute,
        OrdersSearchRoute,
        SellerSettlementCsvRoute,
        SellerSettlementRoute,
        UpdateOrderStatusRoute,
        VerifyPaymentRoute,
    },
    workers::{start_reminder_worker, start_settlement_worker},
};

/// Buffer size of the event hook channels. Producers back-pressure (await) once the notifier falls this far behind.
const EVENT_BUFFER_SIZE: usize = 128;

pub type FeastNotifier = Notifier<Arc<InMemoryLiveBus>, HttpEmailSender, HttpWhatsAppSender>;

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.migrate().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let srv = create_server_instance(config, db).await?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub async fn create_server_instance(config: ServerConfig, db: SqliteDatabase) -> Result<Server, ServerError> {
    let bus = Arc::new(InMemoryLiveBus::new());
    let notifier = Arc::new(build_notifier(&config.notifications, Arc::clone(&bus))?);
    let producers = start_notification_handlers(Arc::clone(&notifier)).await;

    start_reminder_worker(db.clone(), Arc::clone(&bus), config.pending_reminder_after);
    start_settlement_worker(db.clone(), Arc::clone(&bus), config.settlement);

    let payment_config = config.payment.clone();
    let settlement_config = config.settlement;
    let srv = HttpServer::new(move || {
        let order_flow = OrderFlowApi::new(db.clone(), producers.clone());
        let payments = PaymentApi::new(db.clone(), producers.clone(), payment_config.clone());
        let queries = OrderQueryApi::new(db.clone());
        let settlements = SettlementApi::new(db.clone(), settlement_config);
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("feast::access_log"))
            .app_data(web::Data::new(order_flow))
            .app_data(web::Data::new(payments))
            .app_data(web::Data::new(queries))
            .app_data(web::Data::new(settlements))
            .app_data(web::Data::from(Arc::clone(&bus)))
            .service(health)
            .service(live_updates)
            .service(VerifyPaymentRoute::<SqliteDatabase>::new())
            .service(UpdateOrderStatusRoute::<SqliteDatabase>::new())
            .service(OrdersSearchRoute::<SqliteDatabase>::new())
            .service(OrderByIdRoute::<SqliteDatabase>::new())
            .service(OrderTimelineRoute::<SqliteDatabase>::new())
            .service(SellerSettlementRoute::<SqliteDatabase>::new())
            .service(SellerSettlementCsvRoute::<SqliteDatabase>::new())
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}

fn build_notifier(config: &NotificationConfig, bus: Arc<InMemoryLiveBus>) -> Result<FeastNotifier, ServerError> {
    let email = config
        .email_api_url
        .clone()
        .map(|url| HttpEmailSender::new(url, &config.email_api_token, config.email_from.clone()))
        .transpose()
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let whatsapp = config
        .whatsapp_api_url
        .clone()
        .map(|url| HttpWhatsAppSender::new(url, &config.whatsapp_api_token))
        .transpose()
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    Ok(Notifier::new(bus, email, whatsapp, config.channel_timeout, config.event_log_size))
}

/// Wires the notifier into the engine's event hooks and starts the handler tasks. The handlers process events
/// sequentially, which is what keeps per-order notifications in transition order within each channel.
async fn start_notification_handlers(notifier: Arc<FeastNotifier>) -> EventProducers {
    let mut hooks = EventHooks::default();
    let n = Arc::clone(&notifier);
    hooks.on_order_created(move |ev| {
        let n = Arc::clone(&n);
        Box::pin(async move { n.on_order_created(ev).await })
    });
    let n = Arc::clone(&notifier);
    hooks.on_status_changed(move |ev| {
        let n = Arc::clone(&n);
        Box::pin(async move { n.on_status_changed(ev).await })
    });
    let handlers = EventHandlers::new(EVENT_BUFFER_SIZE, hooks);
    let producers = handlers.producers();
    handlers.start_handlers().await;
    info!("📬️ Notification fan-out started");
    producers
}
