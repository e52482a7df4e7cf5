//! Declarative frame responses and frame transaction payloads.
//!
//! A frame response is a pure description of the next card: an image,
//! an optional text input prompt, up to four ordered buttons, and the
//! opaque state echoed back on the next submission. [`FrameResponse`]
//! builds that description and renders it to the meta-tag HTML
//! document frame hosts consume; nothing here performs IO.
//!
//! The TX sub-path of the confirm step returns a
//! [`FrameTransaction`] JSON body instead of HTML: the call(s) the
//! client wallet should execute.

use serde::{Deserialize, Serialize};

/// What tapping a button does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ButtonAction {
    /// Submit the frame to a step URL.
    Post,
    /// Navigate to an external URL.
    Link,
    /// Request call-data and execute a transaction in the wallet.
    Tx,
}

impl ButtonAction {
    fn as_str(&self) -> &'static str {
        match self {
            ButtonAction::Post => "post",
            ButtonAction::Link => "link",
            ButtonAction::Tx => "tx",
        }
    }
}

/// One frame button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameButton {
    pub label: String,
    pub action: ButtonAction,
    /// Target URL; required for `Link` and `Tx`, optional for `Post`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

impl FrameButton {
    pub fn post(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            action: ButtonAction::Post,
            target: None,
        }
    }

    pub fn post_to(label: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            action: ButtonAction::Post,
            target: Some(target.into()),
        }
    }

    pub fn link(label: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            action: ButtonAction::Link,
            target: Some(target.into()),
        }
    }

    pub fn tx(label: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            action: ButtonAction::Tx,
            target: Some(target.into()),
        }
    }
}

/// A declarative next-frame description.
///
/// Build with the chaining setters, render with
/// [`FrameResponse::to_html`]. Referentially transparent: the same
/// response always renders the same document.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FrameResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_input: Option<String>,
    #[serde(default)]
    pub buttons: Vec<FrameButton>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

impl FrameResponse {
    pub fn new() -> Self {
        Self::default()
    }

    /// The fixed inert response rendered for any invalid, malformed,
    /// or unauthorized submission. Carries no buttons and no state.
    pub fn inert() -> Self {
        Self {
            image_url: Some("https://framepay.dev/images/invalid.png".to_string()),
            ..Self::default()
        }
    }

    pub fn image_url(mut self, url: impl Into<String>) -> Self {
        self.image_url = Some(url.into());
        self
    }

    pub fn post_url(mut self, url: impl Into<String>) -> Self {
        self.post_url = Some(url.into());
        self
    }

    pub fn text_input(mut self, prompt: impl Into<String>) -> Self {
        self.text_input = Some(prompt.into());
        self
    }

    pub fn button(mut self, button: FrameButton) -> Self {
        self.buttons.push(button);
        self
    }

    pub fn state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    /// Renders the meta-tag document a frame host consumes.
    pub fn to_html(&self) -> String {
        let mut tags = String::new();
        tags.push_str("<meta property=\"fc:frame\" content=\"vNext\"/>\n");
        tags.push_str("<meta property=\"of:version\" content=\"vNext\"/>\n");
        tags.push_str("<meta property=\"of:accepts:xmtp\" content=\"2024-02-01\"/>\n");
        if let Some(image) = &self.image_url {
            tags.push_str(&meta("fc:frame:image", image));
            tags.push_str(&meta("of:image", image));
            tags.push_str(&meta("og:image", image));
        }
        if let Some(post_url) = &self.post_url {
            tags.push_str(&meta("fc:frame:post_url", post_url));
            tags.push_str(&meta("of:post_url", post_url));
        }
        if let Some(prompt) = &self.text_input {
            tags.push_str(&meta("fc:frame:input:text", prompt));
            tags.push_str(&meta("of:input:text", prompt));
        }
        for (i, button) in self.buttons.iter().enumerate().take(4) {
            let index = i + 1;
            tags.push_str(&meta(&format!("fc:frame:button:{index}"), &button.label));
            tags.push_str(&meta(
                &format!("fc:frame:button:{index}:action"),
                button.action.as_str(),
            ));
            if let Some(target) = &button.target {
                tags.push_str(&meta(&format!("fc:frame:button:{index}:target"), target));
            }
        }
        if let Some(state) = &self.state {
            tags.push_str(&meta("fc:frame:state", state));
        }
        format!("<!DOCTYPE html>\n<html>\n<head>\n{tags}</head>\n<body></body>\n</html>")
    }
}

fn meta(property: &str, content: &str) -> String {
    format!(
        "<meta property=\"{property}\" content=\"{}\"/>\n",
        escape_attribute(content)
    )
}

fn escape_attribute(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// A short user-visible message, for transports that can display text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameMessage {
    pub message: String,
}

impl FrameMessage {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Parameters of one transaction call the client wallet executes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameTransactionParams {
    /// Contract ABI fragment; empty for plain value transfers.
    pub abi: Vec<serde_json::Value>,
    pub to: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// The frame transaction envelope returned on the TX sub-path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameTransaction {
    /// CAIP-2 chain id, e.g. `eip155:8453`.
    pub chain_id: String,
    pub method: String,
    pub params: FrameTransactionParams,
}
