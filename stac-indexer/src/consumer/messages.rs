//! Message types for the consumer.
//!
//! Defines the trigger events of the message path and how a message body is
//! classified before it is resolved into a catalog item.

use serde_json::Value;
use stac_indexer_shared::CatalogItem;

use crate::errors::DispatchError;

/// Key of the event flag asking for the collections index to be created.
const CREATE_INDICES_FLAG: &str = "create_indices";

/// One queued message.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundMessage {
    /// Queue message id, when the message came from a queue.
    pub message_id: Option<String>,
    /// The decoded body. A body that was not valid JSON is kept as a string.
    pub body: Value,
}

impl InboundMessage {
    /// A message whose body is already decoded.
    pub fn direct(body: Value) -> Self {
        Self {
            message_id: None,
            body,
        }
    }

    /// A message from a queue record, `{"messageId": ..., "body": "<json>"}`.
    pub fn from_record(record: &Value) -> Self {
        let message_id = record
            .get("messageId")
            .and_then(Value::as_str)
            .map(str::to_string);
        let body = match record.get("body") {
            Some(Value::String(raw)) => {
                serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.clone()))
            }
            Some(other) => other.clone(),
            None => Value::Null,
        };
        Self { message_id, body }
    }

    /// Identity used in logs.
    pub fn label(&self) -> &str {
        self.message_id.as_deref().unwrap_or("<direct>")
    }
}

/// What a message body asks for.
#[derive(Debug, Clone, PartialEq)]
pub enum MessagePayload {
    /// A catalog item to index as is.
    Item(CatalogItem),
    /// The location of a catalog item to fetch.
    Reference(String),
}

impl MessagePayload {
    /// Classify a message body.
    ///
    /// A notification envelope (`{"Type": "Notification", "Message": "<json>"}`)
    /// is unwrapped once; its inner payload must be a reference or an item.
    pub fn classify(body: &Value) -> Result<Self, DispatchError> {
        if body.get("Type").and_then(Value::as_str) == Some("Notification") {
            let message = body
                .get("Message")
                .and_then(Value::as_str)
                .ok_or_else(|| DispatchError::malformed("notification without a Message string"))?;
            let inner: Value = serde_json::from_str(message)
                .map_err(|e| DispatchError::malformed(format!("notification Message: {}", e)))?;
            return Self::classify_payload(&inner);
        }
        Self::classify_payload(body)
    }

    fn classify_payload(body: &Value) -> Result<Self, DispatchError> {
        let object = body
            .as_object()
            .ok_or_else(|| DispatchError::malformed("body is not a JSON object"))?;

        if !object.contains_key("id") {
            if let Some(href) = object.get("href") {
                return href
                    .as_str()
                    .map(|href| Self::Reference(href.to_string()))
                    .ok_or_else(|| DispatchError::malformed("href is not a string"));
            }
        }

        CatalogItem::from_value(body.clone())
            .map(Self::Item)
            .ok_or_else(|| DispatchError::malformed("body has no string id"))
    }
}

/// A trigger event of the message path.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestEvent {
    pub messages: Vec<InboundMessage>,
    /// Ensure the collections index exists before ingesting.
    pub create_indices: bool,
}

impl IngestEvent {
    /// Interpret a trigger payload.
    ///
    /// A payload with a `Records` array is a queue batch; any other object is
    /// a single direct message (the `create_indices` flag is removed from it).
    pub fn from_value(event: Value) -> Result<Self, DispatchError> {
        let create_indices = event
            .get(CREATE_INDICES_FLAG)
            .and_then(Value::as_bool)
            .unwrap_or(false);

        match event {
            Value::Object(mut object) => {
                if let Some(records) = object.get("Records") {
                    let records = records
                        .as_array()
                        .ok_or_else(|| DispatchError::malformed("Records is not an array"))?;
                    return Ok(Self {
                        messages: records.iter().map(InboundMessage::from_record).collect(),
                        create_indices,
                    });
                }

                object.remove(CREATE_INDICES_FLAG);
                Ok(Self {
                    messages: vec![InboundMessage::direct(Value::Object(object))],
                    create_indices,
                })
            }
            _ => Err(DispatchError::malformed("event is not a JSON object")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_classify_item_reference_and_notification() {
        let item = MessagePayload::classify(&json!({"id": "item-1", "href": "ignored"})).unwrap();
        assert!(matches!(item, MessagePayload::Item(ref i) if i.id == "item-1"));

        let reference = MessagePayload::classify(&json!({"href": "s3://bucket/item.json"})).unwrap();
        assert_eq!(reference, MessagePayload::Reference("s3://bucket/item.json".to_string()));

        let notification = json!({
            "Type": "Notification",
            "Message": "{\"href\": \"https://example.com/item.json\"}"
        });
        assert_eq!(
            MessagePayload::classify(&notification).unwrap(),
            MessagePayload::Reference("https://example.com/item.json".to_string())
        );
    }

    #[test]
    fn test_notification_is_unwrapped_once() {
        let inner = json!({"Type": "Notification", "Message": "{\"id\": \"x\"}"}).to_string();
        let outer = json!({"Type": "Notification", "Message": inner});

        assert!(matches!(
            MessagePayload::classify(&outer),
            Err(DispatchError::MalformedMessage(_))
        ));
    }

    #[test]
    fn test_malformed_bodies() {
        for body in [
            json!("not json"),
            json!({"name": "no id"}),
            json!({"id": 7}),
            json!({"href": 7}),
            json!({"Type": "Notification"}),
            json!({"Type": "Notification", "Message": "{"}),
        ] {
            assert!(
                matches!(MessagePayload::classify(&body), Err(DispatchError::MalformedMessage(_))),
                "{} should be malformed",
                body
            );
        }
    }

    #[test]
    fn test_queue_event() {
        let event = json!({
            "create_indices": true,
            "Records": [
                {"messageId": "m1", "body": "{\"id\": \"a\"}"},
                {"messageId": "m2", "body": "garbage"}
            ]
        });

        let event = IngestEvent::from_value(event).unwrap();

        assert!(event.create_indices);
        assert_eq!(event.messages.len(), 2);
        assert_eq!(event.messages[0].label(), "m1");
        assert_eq!(event.messages[0].body["id"], "a");
        assert_eq!(event.messages[1].body, json!("garbage"));
    }

    #[test]
    fn test_direct_event() {
        let event = IngestEvent::from_value(json!({"id": "a", "create_indices": false})).unwrap();

        assert!(!event.create_indices);
        assert_eq!(event.messages, vec![InboundMessage::direct(json!({"id": "a"}))]);
        assert!(IngestEvent::from_value(json!([1, 2])).is_err());
    }
}
