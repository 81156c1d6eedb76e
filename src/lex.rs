//! Amazon Lex V2 code-hook event and response payloads.
//!
//! Only the fields the bot reads are modelled; everything else in the event is
//! ignored by serde.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Input event delivered by Lex V2 to the fulfillment Lambda.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LexEvent {
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub input_transcript: String,
    #[serde(default)]
    pub invocation_source: Option<String>,
    pub session_state: SessionState,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    #[serde(default)]
    pub intent: Option<Intent>,
    #[serde(default)]
    pub session_attributes: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Intent {
    pub name: String,
    #[serde(default)]
    pub slots: Option<HashMap<String, Option<Slot>>>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub confirmation_state: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Slot {
    #[serde(default)]
    pub value: Option<SlotValue>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotValue {
    #[serde(default)]
    pub original_value: Option<String>,
    #[serde(default)]
    pub interpreted_value: Option<String>,
    #[serde(default)]
    pub resolved_values: Vec<String>,
}

impl SlotValue {
    /// What the user typed, falling back to Lex's interpretation and then to
    /// the first resolved value.
    pub fn text(&self) -> Option<&str> {
        [self.original_value.as_deref(), self.interpreted_value.as_deref()]
            .into_iter()
            .flatten()
            .chain(self.resolved_values.iter().map(String::as_str))
            .find(|v| !v.trim().is_empty())
    }
}

impl LexEvent {
    pub fn intent_name(&self) -> Option<&str> {
        self.session_state.intent.as_ref().map(|i| i.name.as_str())
    }

    /// Value of the named slot, if the user has filled it.
    pub fn slot_value(&self, slot: &str) -> Option<&str> {
        self.session_state
            .intent
            .as_ref()?
            .slots
            .as_ref()?
            .get(slot)?
            .as_ref()?
            .value
            .as_ref()?
            .text()
    }

    pub fn session_attributes(&self) -> Option<&HashMap<String, String>> {
        self.session_state.session_attributes.as_ref()
    }
}

/// Response returned to Lex V2.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LexResponse {
    pub session_state: ResponseSessionState,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<Message>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResponseSessionState {
    pub dialog_action: DialogAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_attributes: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DialogAction {
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "contentType")]
pub enum Message {
    PlainText {
        content: String,
    },
    ImageResponseCard {
        #[serde(rename = "imageResponseCard")]
        image_response_card: ImageResponseCard,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImageResponseCard {
    pub title: String,
    pub buttons: Vec<Button>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Button {
    pub text: String,
    pub value: String,
}

impl LexResponse {
    /// Ask Lex to listen for the next intent, carrying the session attributes
    /// forward.
    pub fn elicit_intent(session_attributes: Option<HashMap<String, String>>) -> Self {
        Self {
            session_state: ResponseSessionState {
                dialog_action: DialogAction {
                    kind: "ElicitIntent".to_owned(),
                },
                session_attributes,
            },
            messages: Vec::new(),
        }
    }

    pub fn plain_text(mut self, content: impl Into<String>) -> Self {
        self.messages.push(Message::PlainText {
            content: content.into(),
        });
        self
    }

    pub fn plain_texts<I, S>(self, contents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        contents.into_iter().fold(self, |resp, c| resp.plain_text(c))
    }

    /// Append a card whose buttons each send their own label back as input.
    pub fn response_card(mut self, title: impl Into<String>, buttons: &[&str]) -> Self {
        self.messages.push(Message::ImageResponseCard {
            image_response_card: ImageResponseCard {
                title: title.into(),
                buttons: buttons
                    .iter()
                    .map(|b| Button {
                        text: (*b).to_owned(),
                        value: (*b).to_owned(),
                    })
                    .collect(),
            },
        });
        self
    }

    /// Plain-text message contents, in order.
    pub fn texts(&self) -> Vec<&str> {
        self.messages
            .iter()
            .filter_map(|m| match m {
                Message::PlainText { content } => Some(content.as_str()),
                Message::ImageResponseCard { .. } => None,
            })
            .collect()
    }
}
