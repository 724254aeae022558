use crate::error::Result;
use async_trait::async_trait;
use futures::StreamExt;
use lapin::message::Delivery;
use lapin::options::{
    BasicAckOptions, BasicConsumeOptions, BasicPublishOptions, BasicQosOptions,
    BasicRejectOptions, QueueDeclareOptions,
};
use lapin::types::FieldTable;
use lapin::{BasicProperties, Channel, Connection};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{error, info, warn};

/// A request/reply endpoint bound to one named queue.
#[async_trait]
pub trait RpcEndpoint: Send + Sync {
    const QUEUE: &'static str;
    type Request: DeserializeOwned + Send;
    type Reply: Serialize + Send;

    /// Handles one decoded request.
    ///
    /// `Ok(None)` acknowledges without replying (fire-and-forget queues);
    /// `Err` rejects the message without requeue.
    async fn call(&self, request: Self::Request) -> Result<Option<Self::Reply>>;
}

/// What to do with a consumed message once the endpoint has seen it.
#[derive(Debug, PartialEq)]
pub enum Disposition {
    /// Publish these bytes to the reply destination, then ack.
    Reply(Vec<u8>),
    /// Ack without replying.
    Ack,
    /// Reject without requeue; no reply is ever sent.
    Reject,
}

/// Runs one message body through an endpoint and decides its fate.
///
/// A payload that fails to decode is dropped permanently: it will not become
/// decodable by retrying. An endpoint error also drops the message, so the
/// caller observes a timeout rather than an error reply (at-most-once
/// delivery; callers must bound their wait).
pub async fn dispose<E: RpcEndpoint>(endpoint: &E, body: &[u8]) -> Disposition {
    let request: E::Request = match serde_json::from_slice(body) {
        Ok(request) => request,
        Err(err) => {
            warn!(queue = E::QUEUE, error = %err, "dropping malformed message");
            return Disposition::Reject;
        }
    };

    match endpoint.call(request).await {
        Ok(Some(reply)) => match serde_json::to_vec(&reply) {
            Ok(bytes) => Disposition::Reply(bytes),
            Err(err) => {
                error!(queue = E::QUEUE, error = %err, "reply serialization failed");
                Disposition::Reject
            }
        },
        Ok(None) => Disposition::Ack,
        Err(err) => {
            error!(queue = E::QUEUE, error = %err, "handler failed; dropping message");
            Disposition::Reject
        }
    }
}

/// Consumes a single queue and settles every delivery exactly once.
///
/// Per-message lifecycle: decode, handle, publish the reply to the message's
/// reply-to tagged with its correlation id, then ack; any earlier failure
/// rejects without requeue.
pub struct RpcDispatcher {
    channel: Channel,
}

impl RpcDispatcher {
    /// Opens a dedicated channel with prefetch 1, so at most one message per
    /// queue is in flight at a time.
    pub async fn bind(conn: &Connection) -> Result<Self> {
        let channel = conn.create_channel().await?;
        channel.basic_qos(1, BasicQosOptions::default()).await?;
        Ok(Self { channel })
    }

    /// Declares the queue (create-if-absent) and serves it until the consumer
    /// stream ends.
    pub async fn serve<E: RpcEndpoint>(self, endpoint: E) -> Result<()> {
        self.channel
            .queue_declare(
                E::QUEUE,
                QueueDeclareOptions {
                    durable: true,
                    ..QueueDeclareOptions::default()
                },
                FieldTable::default(),
            )
            .await?;

        let tag = format!("{}-consumer", E::QUEUE);
        let mut consumer = self
            .channel
            .basic_consume(
                E::QUEUE,
                &tag,
                BasicConsumeOptions::default(),
                FieldTable::default(),
            )
            .await?;
        info!(queue = E::QUEUE, "consumer bound");

        while let Some(delivery) = consumer.next().await {
            let delivery = match delivery {
                Ok(delivery) => delivery,
                Err(err) => {
                    error!(queue = E::QUEUE, error = %err, "consume error");
                    continue;
                }
            };
            self.settle(&endpoint, delivery).await;
        }
        Ok(())
    }

    async fn settle<E: RpcEndpoint>(&self, endpoint: &E, delivery: Delivery) {
        match dispose(endpoint, &delivery.data).await {
            Disposition::Reply(body) => {
                let Some(reply_to) = delivery.properties.reply_to().clone() else {
                    warn!(queue = E::QUEUE, "reply-to missing; dropping message");
                    reject(&delivery).await;
                    return;
                };
                let mut properties = BasicProperties::default();
                if let Some(correlation_id) = delivery.properties.correlation_id().clone() {
                    properties = properties.with_correlation_id(correlation_id);
                }

                let published = self
                    .channel
                    .basic_publish(
                        "",
                        reply_to.as_str(),
                        BasicPublishOptions::default(),
                        &body,
                        properties,
                    )
                    .await;
                let confirmed = match published {
                    Ok(confirm) => confirm.await.map(|_| ()),
                    Err(err) => Err(err),
                };
                match confirmed {
                    // The reply is out; only now is the request settled.
                    Ok(()) => ack(&delivery).await,
                    Err(err) => {
                        error!(
                            queue = E::QUEUE,
                            reply_to = reply_to.as_str(),
                            error = %err,
                            "reply publish failed; dropping message"
                        );
                        reject(&delivery).await;
                    }
                }
            }
            Disposition::Ack => ack(&delivery).await,
            Disposition::Reject => reject(&delivery).await,
        }
    }
}

async fn ack(delivery: &Delivery) {
    if let Err(err) = delivery.ack(BasicAckOptions::default()).await {
        error!(error = %err, "ack failed");
    }
}

async fn reject(delivery: &Delivery) {
    if let Err(err) = delivery.reject(BasicRejectOptions { requeue: false }).await {
        error!(error = %err, "reject failed");
    }
}
