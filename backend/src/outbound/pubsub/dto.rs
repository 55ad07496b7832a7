//! Wire shapes of the Pub/Sub REST v1 API.
//!
//! Message data travels base64-encoded; decoding happens here so the adapter
//! only ever hands raw bytes to the domain.

use std::collections::BTreeMap;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::ports::ReceivedMessage;

#[derive(Debug, Serialize)]
pub(super) struct PublishRequestDto<'a> {
    pub(super) messages: Vec<OutgoingMessageDto<'a>>,
}

#[derive(Debug, Serialize)]
pub(super) struct OutgoingMessageDto<'a> {
    pub(super) data: String,
    pub(super) attributes: BTreeMap<&'a str, &'a str>,
}

impl<'a> OutgoingMessageDto<'a> {
    pub(super) fn new(body: &[u8], attributes: &'a [(String, String)]) -> Self {
        Self {
            data: STANDARD.encode(body),
            attributes: attributes
                .iter()
                .map(|(key, value)| (key.as_str(), value.as_str()))
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct PublishResponseDto {
    #[serde(default)]
    pub(super) message_ids: Vec<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct CreateSubscriptionDto<'a> {
    pub(super) topic: &'a str,
    pub(super) filter: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct PullRequestDto {
    pub(super) max_messages: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct PullResponseDto {
    #[serde(default)]
    pub(super) received_messages: Vec<ReceivedMessageDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ReceivedMessageDto {
    pub(super) ack_id: String,
    pub(super) message: PubsubMessageDto,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct PubsubMessageDto {
    #[serde(default)]
    pub(super) data: String,
    #[serde(default)]
    pub(super) attributes: BTreeMap<String, String>,
    pub(super) message_id: String,
    pub(super) publish_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct AcknowledgeRequestDto<'a> {
    pub(super) ack_ids: [&'a str; 1],
}

impl PullResponseDto {
    pub(super) fn into_messages(self) -> Result<Vec<ReceivedMessage>, String> {
        self.received_messages
            .into_iter()
            .map(ReceivedMessageDto::into_message)
            .collect()
    }
}

impl ReceivedMessageDto {
    fn into_message(self) -> Result<ReceivedMessage, String> {
        let data = STANDARD.decode(self.message.data.as_bytes()).map_err(|err| {
            format!(
                "message {} carries invalid base64 data: {err}",
                self.message.message_id
            )
        })?;
        Ok(ReceivedMessage {
            ack_id: self.ack_id,
            message_id: self.message.message_id,
            data,
            attributes: self.message.attributes,
            publish_time: self.message.publish_time,
        })
    }
}
