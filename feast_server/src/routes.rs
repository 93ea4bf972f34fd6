//! Request handler definitions
//!
//! Define each route and it handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause
//! the current worker to stop processing new requests. Any long, non-cpu-bound operation (I/O, database calls,
//! outbound HTTP) must be expressed as a future so the worker can interleave other requests.

use actix_web::{get, web, HttpResponse, Responder};
use bytes::Bytes;
use futures::stream;
use log::*;
use tokio::sync::broadcast::error::RecvError;

use feast_engine::{
    db_types::OrderId,
    order_objects::OrderQueryFilter,
    traits::{OrderReader, OrderStore},
    OrderFlowApi,
    OrderQueryApi,
    PaymentApi,
    SettlementApi,
};

use crate::{
    data_objects::{OrderSearchParams, PaymentVerificationRequest, SettlementParams, TransitionRequest},
    errors::ServerError,
    notifier::{InMemoryLiveBus, LiveBus},
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------  Payments  ----------------------------------------------------
route!(verify_payment => Post "/payments/verify" impl OrderStore);
/// Route handler for the payment verification endpoint.
///
/// This is the only route that creates orders. Online payments must include the gateway proof; COD orders omit it
/// and get the configured surcharge. A duplicate gateway payment id returns 409 and creates nothing.
pub async fn verify_payment<B: OrderStore>(
    body: web::Json<PaymentVerificationRequest>,
    api: web::Data<PaymentApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let PaymentVerificationRequest { proof, order } = body.into_inner();
    debug!("💻️ POST payment verification for customer [{}]", order.customer_id);
    let order = api.verify_and_create_order(proof.as_ref(), order).await?;
    Ok(HttpResponse::Ok().json(order))
}

//---------------------------------------------  Transitions  --------------------------------------------------
route!(update_order_status => Post "/orders/{order_id}/status" impl OrderStore);
/// Route handler for the order transition endpoint.
///
/// The caller supplies the target status, the acting party and an optional note. Rejections and cancellations
/// require the note (it becomes the recorded reason). Identity is the caller's problem; this server trusts the
/// `actor` field.
pub async fn update_order_status<B: OrderStore>(
    path: web::Path<String>,
    body: web::Json<TransitionRequest>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = OrderId(path.into_inner());
    let TransitionRequest { target_status, actor, note } = body.into_inner();
    debug!("💻️ POST transition [{order_id}] -> {target_status} by {actor}");
    let order = api.transition(&order_id, target_status, actor, note.as_deref()).await?;
    Ok(HttpResponse::Ok().json(order))
}

//----------------------------------------------   Orders  -----------------------------------------------------
route!(order_by_id => Get "/orders/{order_id}" impl OrderReader);
pub async fn order_by_id<B: OrderReader>(
    path: web::Path<String>,
    api: web::Data<OrderQueryApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = OrderId(path.into_inner());
    debug!("💻️ GET order [{order_id}]");
    let order = api
        .fetch_order(&order_id)
        .await
        .map_err(|e| ServerError::BackendError(e.to_string()))?
        .ok_or_else(|| ServerError::NoRecordFound(format!("Order {order_id} not found")))?;
    Ok(HttpResponse::Ok().json(order))
}

route!(order_timeline => Get "/orders/{order_id}/timeline" impl OrderReader);
pub async fn order_timeline<B: OrderReader>(
    path: web::Path<String>,
    api: web::Data<OrderQueryApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = OrderId(path.into_inner());
    debug!("💻️ GET timeline for [{order_id}]");
    let timeline = api.fetch_timeline(&order_id).await.map_err(|e| ServerError::BackendError(e.to_string()))?;
    if timeline.is_empty() {
        return Err(ServerError::NoRecordFound(format!("Order {order_id} not found")));
    }
    Ok(HttpResponse::Ok().json(timeline))
}

route!(orders_search => Get "/orders" impl OrderReader);
pub async fn orders_search<B: OrderReader>(
    params: web::Query<OrderSearchParams>,
    api: web::Data<OrderQueryApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let filter = OrderQueryFilter::from(params.into_inner());
    debug!("💻️ GET orders search");
    let orders = api.search_orders(filter).await.map_err(|e| ServerError::BackendError(e.to_string()))?;
    Ok(HttpResponse::Ok().json(orders))
}

//---------------------------------------------  Settlement  ---------------------------------------------------
route!(seller_settlement => Get "/settlement/{seller_id}" impl OrderReader);
/// Route handler for the settlement report endpoint.
///
/// Returns the aggregate summary, the ISO-week breakdown and the contributing orders for the seller over the
/// requested period. The computation is read-only and repeatable.
pub async fn seller_settlement<B: OrderReader>(
    path: web::Path<String>,
    params: web::Query<SettlementParams>,
    api: web::Data<SettlementApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let seller_id = path.into_inner();
    let SettlementParams { from, to } = params.into_inner();
    debug!("💻️ GET settlement for seller [{seller_id}] {from} - {to}");
    let report = api.settlement_report(&seller_id, from, to).await?;
    Ok(HttpResponse::Ok().json(report))
}

route!(seller_settlement_csv => Get "/settlement/{seller_id}/csv" impl OrderReader);
pub async fn seller_settlement_csv<B: OrderReader>(
    path: web::Path<String>,
    params: web::Query<SettlementParams>,
    api: web::Data<SettlementApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let seller_id = path.into_inner();
    let SettlementParams { from, to } = params.into_inner();
    debug!("💻️ GET settlement csv for seller [{seller_id}] {from} - {to}");
    let report = api.settlement_report(&seller_id, from, to).await?;
    let filename = format!("settlement_{seller_id}_{}_{}.csv", from.format("%Y%m%d"), to.format("%Y%m%d"));
    Ok(HttpResponse::Ok()
        .content_type("text/csv")
        .insert_header(("Content-Disposition", format!("attachment; filename=\"{filename}\"")))
        .body(report.to_csv()))
}

//--------------------------------------------  Live updates  --------------------------------------------------
/// Route handler for the SSE stream.
///
/// `room` is `customer:{id}`, `order:{id}` or `seller:{id}`. The stream replays nothing; clients see events
/// broadcast after they connect. A listener that falls behind the room buffer loses the oldest events.
#[get("/live/{room}")]
pub async fn live_updates(path: web::Path<String>, bus: web::Data<InMemoryLiveBus>) -> impl Responder {
    let room = path.into_inner();
    debug!("💻️📡️ New live stream for {room}");
    let rx = bus.subscribe(&room);
    let stream = stream::unfold(rx, |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(ev) => {
                    let chunk = format!("event: {}\ndata: {}\n\n", ev.event, ev.data);
                    return Some((Ok::<_, actix_web::Error>(Bytes::from(chunk)), rx));
                },
                Err(RecvError::Lagged(n)) => {
                    warn!("📡️ Live stream lagged, skipped {n} event(s)");
                    continue;
                },
                Err(RecvError::Closed) => return None,
            }
        }
    });
    HttpResponse::Ok()
        .content_type("text/event-stream")
        .insert_header(("Cache-Control", "no-cache"))
        .streaming(stream)
}
