//! Outbound delivery channels. Email and WhatsApp are plain JSON POSTs to the configured provider endpoints; both
//! providers authenticate with a bearer token sent as a default header.

use feast_common::Secret;
use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("Could not initialize delivery channel. {0}")]
    Initialization(String),
    #[error("Could not reach the provider. {0}")]
    Transport(String),
    #[error("Provider returned an error. status: {status}, message: {message}")]
    ProviderError { status: u16, message: String },
}

#[allow(async_fn_in_trait)]
pub trait EmailSender: Send + Sync {
    async fn send_email(&self, to: &str, subject: &str, body: &str) -> Result<(), ChannelError>;
}

#[allow(async_fn_in_trait)]
pub trait WhatsAppSender: Send + Sync {
    async fn send_message(&self, phone: &str, body: &str) -> Result<(), ChannelError>;
}

fn bearer_client(token: &Secret<String>) -> Result<Client, ChannelError> {
    let mut headers = HeaderMap::with_capacity(2);
    let val = HeaderValue::from_str(&format!("Bearer {}", token.reveal()))
        .map_err(|e| ChannelError::Initialization(e.to_string()))?;
    headers.insert("Authorization", val);
    headers.insert("Content-Type", HeaderValue::from_static("application/json"));
    Client::builder().default_headers(headers).build().map_err(|e| ChannelError::Initialization(e.to_string()))
}

async fn check_response(response: reqwest::Response) -> Result<(), ChannelError> {
    if response.status().is_success() {
        return Ok(());
    }
    let status = response.status().as_u16();
    let message = response.text().await.map_err(|e| ChannelError::Transport(e.to_string()))?;
    Err(ChannelError::ProviderError { status, message })
}

//--------------------------------------   HttpEmailSender     -------------------------------------------------------
#[derive(Clone)]
pub struct HttpEmailSender {
    client: Client,
    url: String,
    from: String,
}

impl HttpEmailSender {
    pub fn new(url: String, token: &Secret<String>, from: String) -> Result<Self, ChannelError> {
        let client = bearer_client(token)?;
        Ok(Self { client, url, from })
    }
}

impl EmailSender for HttpEmailSender {
    async fn send_email(&self, to: &str, subject: &str, body: &str) -> Result<(), ChannelError> {
        trace!("✉️ Sending email to {to}: {subject}");
        let payload = json!({
            "from": self.from,
            "to": to,
            "subject": subject,
            "text": body,
        });
        let response = self
            .client
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| ChannelError::Transport(e.to_string()))?;
        check_response(response).await
    }
}

//--------------------------------------  HttpWhatsAppSender   -------------------------------------------------------
#[derive(Clone)]
pub struct HttpWhatsAppSender {
    client: Client,
    url: String,
}

impl HttpWhatsAppSender {
    pub fn new(url: String, token: &Secret<String>) -> Result<Self, ChannelError> {
        let client = bearer_client(token)?;
        Ok(Self { client, url })
    }
}

impl WhatsAppSender for HttpWhatsAppSender {
    async fn send_message(&self, phone: &str, body: &str) -> Result<(), ChannelError> {
        trace!("🟢️ Sending WhatsApp message to {phone}");
        let payload = json!({
            "to": phone,
            "type": "text",
            "text": { "body": body },
        });
        let response = self
            .client
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| ChannelError::Transport(e.to_string()))?;
        check_response(response).await
    }
}
