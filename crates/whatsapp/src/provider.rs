use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use aurum_core::channel::{ChannelError, MessageChannel, OutboundMessage};

use crate::inbound::with_channel_prefix;

const DEFAULT_API_BASE: &str = "https://api.twilio.com/2010-04-01";

/// REST channel: form-posts outbound messages to a Twilio-compatible
/// provider API. This is the only place aware of the provider wire format.
pub struct RestMessageChannel {
    client: reqwest::Client,
    base_url: String,
    account_sid: String,
    auth_token: SecretString,
    sender_number: String,
}

impl RestMessageChannel {
    pub fn new(
        account_sid: SecretString,
        auth_token: SecretString,
        sender_number: String,
        api_base_url: Option<String>,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url: api_base_url
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
                .trim_end_matches('/')
                .to_string(),
            account_sid: account_sid.expose_secret().to_string(),
            auth_token,
            sender_number,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/Accounts/{}/Messages.json", self.base_url, self.account_sid)
    }
}

#[async_trait::async_trait]
impl MessageChannel for RestMessageChannel {
    async fn send(&self, message: &OutboundMessage) -> Result<(), ChannelError> {
        let mut form: Vec<(&str, String)> = vec![
            ("From", with_channel_prefix(&self.sender_number)),
            ("To", with_channel_prefix(message.to.as_str())),
            ("Body", message.body.clone()),
        ];
        if let Some(media_url) = &message.media_url {
            form.push(("MediaUrl", media_url.clone()));
        }

        let response = self
            .client
            .post(self.endpoint())
            .basic_auth(&self.account_sid, Some(self.auth_token.expose_secret()))
            .form(&form)
            .send()
            .await
            .map_err(|error| ChannelError::Unreachable(error.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(ChannelError::Rejected(format!("status {status}: {detail}")));
        }

        Ok(())
    }
}
