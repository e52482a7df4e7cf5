//! Frame flow configuration and URL construction.
//!
//! Every URL a frame response carries (step endpoints, generated
//! images, app deeplinks) is built here, so handlers never format
//! paths inline. Values come from the server's environment loader.

/// Static configuration of the frame flow.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Base URL of the image generation service.
    pub api_url: String,
    /// Base URL of the user-facing app, for deeplinks.
    pub dapp_url: String,
    /// Public base URL of this frames service.
    pub frames_url: String,
    /// Whether free-text amounts accept `k`/`m` multiplier suffixes.
    /// Enabled for the command entry point only; jar contributions
    /// keep the strict (0, 10] dollar range.
    pub custom_amount_suffixes: bool,
}

impl FrameConfig {
    /// Step endpoint of the jar contribution flow.
    ///
    /// `step` is empty for the entry step, else one of `token`,
    /// `amount`, `confirm`, `comment`.
    pub fn jar_step_url(&self, jar_uuid: &uuid::Uuid, step: &str) -> String {
        if step.is_empty() {
            format!("{}/farcaster/frames/jar/{jar_uuid}/contribute", self.frames_url)
        } else {
            format!(
                "{}/farcaster/frames/jar/{jar_uuid}/contribute/{step}",
                self.frames_url
            )
        }
    }

    /// Step endpoint of a created payment's confirm/comment frames.
    pub fn pay_step_url(&self, reference_id: &str, step: &str) -> String {
        format!(
            "{}/farcaster/frames/pay/{reference_id}/frame/{step}",
            self.frames_url
        )
    }

    /// Generated image for a jar contribution step.
    pub fn jar_image_url(&self, jar_uuid: &uuid::Uuid, view: &str) -> String {
        format!("{}/images/jar/{jar_uuid}/{view}.png", self.api_url)
    }

    /// Generated image for a payment, keyed by reference id.
    pub fn payment_image_url(&self, reference_id: &str) -> String {
        format!("{}/images/payment/{reference_id}/image.png", self.api_url)
    }

    /// App deeplink for finishing or inspecting a payment.
    pub fn app_payment_url(&self, reference_id: &str) -> String {
        format!("{}/payment/{reference_id}", self.dapp_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> FrameConfig {
        FrameConfig {
            api_url: "https://api.framepay.dev".to_string(),
            dapp_url: "https://app.framepay.dev".to_string(),
            frames_url: "https://frames.framepay.dev".to_string(),
            custom_amount_suffixes: false,
        }
    }

    #[test]
    fn test_jar_step_urls() {
        let uuid = uuid::Uuid::nil();
        let config = config();
        assert_eq!(
            config.jar_step_url(&uuid, ""),
            format!("https://frames.framepay.dev/farcaster/frames/jar/{uuid}/contribute")
        );
        assert_eq!(
            config.jar_step_url(&uuid, "amount"),
            format!("https://frames.framepay.dev/farcaster/frames/jar/{uuid}/contribute/amount")
        );
    }

    #[test]
    fn test_pay_urls() {
        let config = config();
        assert_eq!(
            config.pay_step_url("a1B2c3D4", "confirm"),
            "https://frames.framepay.dev/farcaster/frames/pay/a1B2c3D4/frame/confirm"
        );
        assert_eq!(
            config.app_payment_url("a1B2c3D4"),
            "https://app.framepay.dev/payment/a1B2c3D4"
        );
        assert_eq!(
            config.payment_image_url("a1B2c3D4"),
            "https://api.framepay.dev/images/payment/a1B2c3D4/image.png"
        );
    }
}
