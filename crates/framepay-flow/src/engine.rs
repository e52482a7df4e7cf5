//! Step handlers of the frame payment flow.
//!
//! Every handler follows the same shape: verify-decode-act-render.
//! The validated action and the decoded carried state come in, the
//! ledger is consulted or transitioned, and a [`StepOutcome`] comes
//! out. Handlers are stateless between calls; the ledger row keyed by
//! the carried reference id is the only continuity that matters for
//! money movement.
//!
//! Anything that fails verification or re-validation renders the
//! fixed inert response with the ledger untouched. The command entry
//! point is the one place that answers with user-visible messages,
//! since its transport can display them.

use std::sync::Arc;

use uuid::Uuid;

use framepay_ledger::{LedgerError, NewPayment, PaymentLedger, ProvenanceBackfill};
use framepay_types::{
    COMMAND_EXPIRY_MINUTES, FrameButton, FrameMessage, FrameResponse, FrameTransaction, Jar,
    Network, Payment, PaymentFrameState, PaymentKind, PaymentStatus, Profile, UnixTimestamp,
    USDC_TOKEN, ValidatedAction, ZERO_ADDRESS, find_token,
};

use crate::amount::{
    AMOUNT_PROMPT, AMOUNT_PROMPT_AGAIN, parse_command, parse_custom_usd, preset_for_button,
    token_for_button,
};
use crate::calldata::build_transfer_calls;
use crate::collaborators::{FlowResolver, IdentityResolver, NotificationSink, PriceOracle};
use crate::config::FrameConfig;
use crate::receipt::{cast_link, completion_message, payment_receipt_url};

/// Input prompt of the comment step.
pub const COMMENT_PROMPT: &str = "Comment (64 max)";
/// Input prompt after a rejected comment.
pub const COMMENT_PROMPT_AGAIN: &str = "Enter your comment again";

/// What a step hands back to the transport layer.
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// The next frame document.
    Frame(FrameResponse),
    /// Wallet calls for the TX sub-path.
    Transactions(Vec<FrameTransaction>),
    /// A short text reply, command entry point only.
    Message(FrameMessage),
}

impl StepOutcome {
    /// The fixed response for anything invalid, malformed, or stale.
    pub fn inert() -> Self {
        StepOutcome::Frame(FrameResponse::inert())
    }

    fn message(text: impl Into<String>) -> Self {
        StepOutcome::Message(FrameMessage::new(text))
    }
}

/// The frame flow state machine.
pub struct FlowEngine {
    ledger: PaymentLedger,
    identity: Arc<dyn IdentityResolver>,
    flows: Arc<dyn FlowResolver>,
    prices: Arc<dyn PriceOracle>,
    notifications: Arc<dyn NotificationSink>,
    config: FrameConfig,
}

impl FlowEngine {
    pub fn new(
        ledger: PaymentLedger,
        identity: Arc<dyn IdentityResolver>,
        flows: Arc<dyn FlowResolver>,
        prices: Arc<dyn PriceOracle>,
        notifications: Arc<dyn NotificationSink>,
        config: FrameConfig,
    ) -> Self {
        Self {
            ledger,
            identity,
            flows,
            prices,
            notifications,
            config,
        }
    }

    /// Entry step of the jar contribution flow: seeds the carried
    /// state with the jar's receiving wallet and renders the token
    /// menu.
    pub async fn contribute(&self, jar_uuid: Uuid, action: &ValidatedAction) -> StepOutcome {
        if !action.valid {
            return StepOutcome::inert();
        }
        let Some(jar) = self.jar(jar_uuid).await else {
            return StepOutcome::inert();
        };
        let chain = Network::DEFAULT_FRAME_PAYMENTS;
        let Some(wallet) = jar.wallet_address(chain) else {
            tracing::warn!(%jar_uuid, %chain, "Jar has no wallet on the default chain");
            return StepOutcome::inert();
        };
        let state = PaymentFrameState::seed(wallet.to_string(), chain);
        StepOutcome::Frame(self.token_menu_frame(&jar_uuid, &state))
    }

    /// Token selection: button 1 is usdc, button 2 degen.
    pub async fn choose_token(&self, jar_uuid: Uuid, action: &ValidatedAction) -> StepOutcome {
        let Some((_, state)) = self.validated_jar_state(jar_uuid, action).await else {
            return StepOutcome::inert();
        };
        let Some(token) = action.button_index.and_then(token_for_button) else {
            return StepOutcome::inert();
        };
        let chain = state.chain_id.unwrap_or(Network::DEFAULT_FRAME_PAYMENTS);
        if find_token(token, chain).is_err() {
            return StepOutcome::inert();
        }
        let state = state.with_token(token);
        StepOutcome::Frame(self.amount_frame(&jar_uuid, &state, AMOUNT_PROMPT))
    }

    /// Amount selection. Preset buttons carry the choice in state and
    /// re-render; the final button resolves the amount (typed input
    /// beats the carried preset), creates the ledger row, and renders
    /// the confirmation step.
    pub async fn choose_amount(&self, jar_uuid: Uuid, action: &ValidatedAction) -> StepOutcome {
        let Some((jar, state)) = self.validated_jar_state(jar_uuid, action).await else {
            return StepOutcome::inert();
        };
        let Some(token) = state.token.clone() else {
            return StepOutcome::inert();
        };
        match action.button_index {
            Some(index @ 1..=3) => {
                let state = state.with_usd_amount(preset_for_button(index));
                StepOutcome::Frame(self.amount_frame(&jar_uuid, &state, AMOUNT_PROMPT))
            }
            Some(4) => {
                let typed = action.input().and_then(parse_custom_usd);
                let Some(amount) = typed.or(state.usd_amount) else {
                    return StepOutcome::Frame(self.amount_frame(
                        &jar_uuid,
                        &state,
                        AMOUNT_PROMPT_AGAIN,
                    ));
                };
                let chain = state.chain_id.unwrap_or(Network::DEFAULT_FRAME_PAYMENTS);
                let provenance = provenance_of(action);
                let new = NewPayment {
                    receiver: Some(jar.profile.clone()),
                    receiver_address: jar.wallet_address(chain).map(str::to_string),
                    receiver_flow: Some(jar.uuid),
                    usd_amount: Some(amount),
                    source_app: provenance.source_app.clone(),
                    source_ref: provenance.source_ref.clone(),
                    source_hash: provenance.source_hash.clone(),
                    ..NewPayment::default()
                };
                let payment = match self
                    .ledger
                    .create(PaymentKind::Frame, chain, &token, new)
                    .await
                {
                    Ok(payment) => payment,
                    Err(error) => {
                        tracing::error!(%jar_uuid, %error, "Payment creation failed");
                        return StepOutcome::inert();
                    }
                };
                let state = state
                    .with_usd_amount(Some(amount))
                    .with_ref_id(&payment.reference_id);
                let pay_later = self.actor_profile(action).await.is_some();
                StepOutcome::Frame(self.jar_confirm_frame(&jar_uuid, &payment, &state, pay_later))
            }
            _ => StepOutcome::inert(),
        }
    }

    /// Confirmation step of the jar flow.
    ///
    /// With a transaction hash attached, completes the payment; else
    /// button 1 answers with wallet calls and button 2 defers the
    /// payment to in-app execution.
    pub async fn confirm(&self, jar_uuid: Uuid, action: &ValidatedAction) -> StepOutcome {
        let Some((_, state)) = self.validated_jar_state(jar_uuid, action).await else {
            return StepOutcome::inert();
        };
        let Some(payment) = self.payable_row(&state).await else {
            return StepOutcome::inert();
        };
        if let Some(hash) = attached_hash(action) {
            return self
                .complete_payment(
                    &payment.reference_id,
                    hash,
                    action,
                    self.config.jar_step_url(&jar_uuid, "comment"),
                    &state,
                )
                .await;
        }
        match action.button_index {
            Some(1) => self.transfer_calls(&payment).await,
            Some(2) => self.defer(&payment, action).await,
            _ => StepOutcome::inert(),
        }
    }

    /// Comment step of the jar flow.
    pub async fn comment(&self, jar_uuid: Uuid, action: &ValidatedAction) -> StepOutcome {
        let Some((_, state)) = self.validated_jar_state(jar_uuid, action).await else {
            return StepOutcome::inert();
        };
        if !state.is_complete() {
            return StepOutcome::inert();
        }
        let Some(ref_id) = state.ref_id.as_deref() else {
            return StepOutcome::inert();
        };
        let Some(payment) = self.ledger.find_by_reference_id(ref_id).await else {
            return StepOutcome::inert();
        };
        self.attach_comment(
            payment,
            action,
            self.config.jar_step_url(&jar_uuid, "comment"),
            &state,
        )
        .await
    }

    /// One-shot command entry point: parses `<amount> [token] [chain]`
    /// and creates a short-lived payment addressed to `identity`.
    pub async fn pay_command(&self, identity: &str, action: &ValidatedAction) -> StepOutcome {
        if !action.valid {
            return StepOutcome::inert();
        }
        let Some(receiver) = self.identity.resolve_identity(identity).await else {
            return StepOutcome::message(format!("User {identity} not found"));
        };
        let Some(input) = action.input() else {
            return StepOutcome::message("Enter an amount, e.g. $5 or 100 degen");
        };
        let Some(parsed) = parse_command(input, self.config.custom_amount_suffixes) else {
            return StepOutcome::message(format!("Can't recognize amount: {input}"));
        };
        let chain = parsed.chain.unwrap_or(Network::DEFAULT_FRAME_PAYMENTS);
        let token = parsed.token.unwrap_or_else(|| USDC_TOKEN.to_string());
        if find_token(&token, chain).is_err() {
            return StepOutcome::message(format!("Token {token} not supported on chain {chain}"));
        }
        let Some(receiver_address) = receiver.receiving_address(chain).map(str::to_string) else {
            return StepOutcome::message(format!("User {identity} has no wallet on chain {chain}"));
        };
        let sender = self.actor_profile(action).await;
        let has_sender_profile = sender.is_some();
        let provenance = provenance_of(action);
        let new = NewPayment {
            receiver: Some(receiver),
            receiver_address: Some(receiver_address.clone()),
            sender,
            usd_amount: parsed.usd_amount,
            token_amount: parsed.token_amount,
            source_app: provenance.source_app.clone(),
            source_ref: provenance.source_ref.clone(),
            source_hash: provenance.source_hash.clone(),
            expires_at: Some(UnixTimestamp::now().plus_minutes(COMMAND_EXPIRY_MINUTES)),
            ..NewPayment::default()
        };
        let payment = match self.ledger.create(PaymentKind::Frame, chain, &token, new).await {
            Ok(payment) => payment,
            Err(error) => {
                tracing::error!(%identity, %error, "Command payment creation failed");
                return StepOutcome::message("Failed to create the payment, try again");
            }
        };
        let state = state_of(&payment);
        let confirm_url = self.config.pay_step_url(&payment.reference_id, "confirm");
        let mut frame = FrameResponse::new()
            .image_url(self.config.payment_image_url(&payment.reference_id))
            .post_url(confirm_url.clone())
            .button(FrameButton::tx("Quick", confirm_url))
            .state(state.encode());
        if has_sender_profile {
            frame = frame.button(FrameButton::link(
                "Advanced ⚡",
                self.config.app_payment_url(&payment.reference_id),
            ));
        }
        StepOutcome::Frame(frame)
    }

    /// Confirmation step of a command-created payment, addressed by
    /// reference id.
    pub async fn pay_confirm(&self, reference_id: &str, action: &ValidatedAction) -> StepOutcome {
        if !action.valid {
            return StepOutcome::inert();
        }
        let Some(payment) = self.ledger.find_by_reference_id(reference_id).await else {
            return StepOutcome::inert();
        };
        if payment.is_expired_at(UnixTimestamp::now()) {
            self.ledger.mark_expired(reference_id).await;
            return StepOutcome::inert();
        }
        if !payment.status.is_pre_execution() {
            return StepOutcome::inert();
        }
        if let Some(hash) = attached_hash(action) {
            let state = state_of(&payment);
            return self
                .complete_payment(
                    reference_id,
                    hash,
                    action,
                    self.config.pay_step_url(reference_id, "comment"),
                    &state,
                )
                .await;
        }
        match action.button_index {
            Some(1) => self.transfer_calls(&payment).await,
            _ => StepOutcome::inert(),
        }
    }

    /// Comment step of a command-created payment.
    pub async fn pay_comment(&self, reference_id: &str, action: &ValidatedAction) -> StepOutcome {
        if !action.valid {
            return StepOutcome::inert();
        }
        let Some(payment) = self.ledger.find_by_reference_id(reference_id).await else {
            return StepOutcome::inert();
        };
        let state = state_of(&payment);
        self.attach_comment(
            payment,
            action,
            self.config.pay_step_url(reference_id, "comment"),
            &state,
        )
        .await
    }

    // Shared transitions

    /// Records an executed transaction, notifies, and renders the
    /// comment prompt. A lost completion race renders inert so the
    /// receiver is never notified twice.
    ///
    /// `comment_state` is the carried state to echo into the comment
    /// frame. The jar flow passes its validated incoming state through
    /// unchanged, so the address the comment step re-checks is still
    /// the jar wallet and not the receiver profile's own.
    async fn complete_payment(
        &self,
        reference_id: &str,
        tx_hash: &str,
        action: &ValidatedAction,
        comment_post_url: String,
        comment_state: &PaymentFrameState,
    ) -> StepOutcome {
        let backfill = provenance_of(action);
        match self
            .ledger
            .mark_executed(
                reference_id,
                tx_hash,
                action.executing_address.as_deref(),
                Some(backfill),
            )
            .await
        {
            Ok(completed) => {
                if let Err(error) = self.notifications.payment_completed(&completed).await {
                    tracing::warn!(%reference_id, %error, "Completion notification failed");
                }
                tracing::info!(%reference_id, hash = %tx_hash, "Payment completed");
                StepOutcome::Frame(self.comment_prompt_frame(
                    &completed,
                    comment_post_url,
                    COMMENT_PROMPT,
                    comment_state,
                ))
            }
            Err(LedgerError::AlreadyCompleted(_)) => {
                tracing::debug!(%reference_id, "Duplicate completion attempt");
                StepOutcome::inert()
            }
            Err(error) => {
                tracing::warn!(%reference_id, %error, "Completion failed");
                StepOutcome::inert()
            }
        }
    }

    /// Answers the TX sub-path with the wallet calls settling the row.
    async fn transfer_calls(&self, payment: &Payment) -> StepOutcome {
        let Some(receiver) = payment.resolved_receiver_address().map(str::to_string) else {
            tracing::warn!(reference_id = %payment.reference_id, "No receiver address to pay");
            return StepOutcome::inert();
        };
        let price = if payment.token_amount.is_none() {
            match self.prices.usd_price(&payment.token).await {
                Ok(price) => Some(price),
                Err(error) => {
                    tracing::warn!(token = %payment.token, %error, "Price lookup failed");
                    return StepOutcome::inert();
                }
            }
        } else {
            None
        };
        match build_transfer_calls(payment, &receiver, price) {
            Ok(calls) => StepOutcome::Transactions(calls),
            Err(error) => {
                tracing::warn!(reference_id = %payment.reference_id, %error, "Call-data build failed");
                StepOutcome::inert()
            }
        }
    }

    /// Hands the payment over to in-app execution.
    async fn defer(&self, payment: &Payment, action: &ValidatedAction) -> StepOutcome {
        let Some(profile) = self.actor_profile(action).await else {
            return StepOutcome::inert();
        };
        match self
            .ledger
            .defer_to_intent(&payment.reference_id, profile)
            .await
        {
            Ok(deferred) => StepOutcome::Frame(
                FrameResponse::new()
                    .image_url(self.config.payment_image_url(&deferred.reference_id))
                    .button(FrameButton::link(
                        "Open in app ⚡",
                        self.config.app_payment_url(&deferred.reference_id),
                    )),
            ),
            Err(LedgerError::AlreadyCompleted(_)) => StepOutcome::inert(),
            Err(error) => {
                tracing::warn!(reference_id = %payment.reference_id, %error, "Deferral failed");
                StepOutcome::inert()
            }
        }
    }

    /// Attaches the one-shot comment and renders the receipt frame.
    ///
    /// Only the comment button with non-blank text writes; any other
    /// submission re-renders. Idempotent from the submitter's view: a
    /// comment that is already set renders the same receipt without a
    /// second message.
    async fn attach_comment(
        &self,
        payment: Payment,
        action: &ValidatedAction,
        post_url: String,
        state: &PaymentFrameState,
    ) -> StepOutcome {
        if payment.status != PaymentStatus::Completed {
            return StepOutcome::inert();
        }
        let text = match action.button_index {
            Some(1) => action.input(),
            _ => None,
        };
        let Some(text) = text else {
            if payment.comment.is_some() {
                return StepOutcome::Frame(self.receipt_frame(&payment));
            }
            return StepOutcome::Frame(self.comment_prompt_frame(
                &payment,
                post_url,
                COMMENT_PROMPT_AGAIN,
                state,
            ));
        };
        match self
            .ledger
            .set_comment_once(&payment.reference_id, text)
            .await
        {
            Ok(commented) => {
                if let Some(receiver) = commented.receiver.clone() {
                    let message = completion_message(&commented);
                    if let Err(error) = self.notifications.direct_message(&receiver, &message).await
                    {
                        tracing::warn!(
                            reference_id = %commented.reference_id,
                            %error,
                            "Comment message delivery failed"
                        );
                    }
                }
                StepOutcome::Frame(self.receipt_frame(&commented))
            }
            Err(LedgerError::CommentAlreadySet(_)) => {
                StepOutcome::Frame(self.receipt_frame(&payment))
            }
            Err(LedgerError::InvalidComment(reason)) => {
                tracing::debug!(reference_id = %payment.reference_id, %reason, "Comment rejected");
                StepOutcome::Frame(self.comment_prompt_frame(
                    &payment,
                    post_url,
                    COMMENT_PROMPT_AGAIN,
                    state,
                ))
            }
            Err(error) => {
                tracing::warn!(reference_id = %payment.reference_id, %error, "Comment failed");
                StepOutcome::inert()
            }
        }
    }

    // Lookups and guards

    async fn jar(&self, jar_uuid: Uuid) -> Option<Jar> {
        let jar = self.flows.find_jar_by_uuid(jar_uuid).await;
        if jar.is_none() {
            tracing::debug!(%jar_uuid, "Jar not found");
        }
        jar
    }

    /// Common guard of every post-entry jar step: valid action,
    /// existing jar, decodable state, and a state address that still
    /// matches the jar's registered wallet for the stated chain.
    async fn validated_jar_state(
        &self,
        jar_uuid: Uuid,
        action: &ValidatedAction,
    ) -> Option<(Jar, PaymentFrameState)> {
        if !action.valid {
            return None;
        }
        let jar = self.jar(jar_uuid).await?;
        let state = PaymentFrameState::decode_lenient(action.state.as_deref())?;
        let chain = state.chain_id?;
        let wallet = jar.wallet_address(chain)?;
        if state.address.as_deref() != Some(wallet) {
            tracing::warn!(%jar_uuid, "State address does not match the jar wallet");
            return None;
        }
        Some((jar, state))
    }

    /// Loads the row a complete state points at and requires it to
    /// still be payable, expiring it lazily when lapsed.
    async fn payable_row(&self, state: &PaymentFrameState) -> Option<Payment> {
        if !state.is_complete() {
            return None;
        }
        let ref_id = state.ref_id.as_deref()?;
        let payment = self.ledger.find_by_reference_id(ref_id).await?;
        if payment.is_expired_at(UnixTimestamp::now()) {
            self.ledger.mark_expired(ref_id).await;
            return None;
        }
        payment.status.is_pre_execution().then_some(payment)
    }

    async fn actor_profile(&self, action: &ValidatedAction) -> Option<Profile> {
        let actor = action.actor.as_ref()?;
        self.identity.resolve_addresses(&actor.addresses()).await
    }

    // Renderers

    fn token_menu_frame(&self, jar_uuid: &Uuid, state: &PaymentFrameState) -> FrameResponse {
        FrameResponse::new()
            .image_url(self.config.jar_image_url(jar_uuid, "token"))
            .post_url(self.config.jar_step_url(jar_uuid, "token"))
            .button(FrameButton::post("USDC"))
            .button(FrameButton::post("DEGEN"))
            .state(state.encode())
    }

    fn amount_frame(
        &self,
        jar_uuid: &Uuid,
        state: &PaymentFrameState,
        prompt: &str,
    ) -> FrameResponse {
        FrameResponse::new()
            .image_url(self.config.jar_image_url(jar_uuid, "amount"))
            .post_url(self.config.jar_step_url(jar_uuid, "amount"))
            .text_input(prompt)
            .button(FrameButton::post("$1"))
            .button(FrameButton::post("$3"))
            .button(FrameButton::post("$5"))
            .button(FrameButton::post("Next"))
            .state(state.encode())
    }

    fn jar_confirm_frame(
        &self,
        jar_uuid: &Uuid,
        payment: &Payment,
        state: &PaymentFrameState,
        pay_later: bool,
    ) -> FrameResponse {
        let confirm_url = self.config.jar_step_url(jar_uuid, "confirm");
        let mut frame = FrameResponse::new()
            .image_url(self.config.payment_image_url(&payment.reference_id))
            .post_url(confirm_url.clone())
            .button(FrameButton::tx("Pay now", confirm_url))
            .state(state.encode());
        if pay_later {
            frame = frame.button(FrameButton::post("Pay later 🕑"));
        }
        frame
    }

    fn comment_prompt_frame(
        &self,
        payment: &Payment,
        post_url: String,
        prompt: &str,
        state: &PaymentFrameState,
    ) -> FrameResponse {
        let mut frame = FrameResponse::new()
            .image_url(self.config.payment_image_url(&payment.reference_id))
            .post_url(post_url)
            .text_input(prompt)
            .button(FrameButton::post("Comment 💬"))
            .state(state.encode());
        if let Some(receipt) = payment_receipt_url(payment) {
            frame = frame.button(FrameButton::link("🧾 Receipt", receipt));
        }
        frame
    }

    fn receipt_frame(&self, payment: &Payment) -> FrameResponse {
        let mut frame = FrameResponse::new()
            .image_url(self.config.payment_image_url(&payment.reference_id));
        if let Some(receipt) = payment_receipt_url(payment) {
            frame = frame.button(FrameButton::link("🧾 Receipt", receipt));
        }
        frame
    }
}

/// A usable transaction hash, filtering blanks and the zero sentinel.
fn attached_hash(action: &ValidatedAction) -> Option<&str> {
    action
        .transaction_hash
        .as_deref()
        .map(str::trim)
        .filter(|h| !h.is_empty() && *h != ZERO_ADDRESS)
}

/// Provenance carried by the submission's cast, when any.
fn provenance_of(action: &ValidatedAction) -> ProvenanceBackfill {
    let mut backfill = ProvenanceBackfill {
        source_app: action.source_app.clone(),
        ..ProvenanceBackfill::default()
    };
    if let Some(cast) = &action.cast {
        if let Some(hash) = cast.hash.as_deref().filter(|h| !h.is_empty()) {
            backfill.source_hash = Some(hash.to_string());
            if let Some(author) = cast.author_username.as_deref() {
                backfill.source_ref = Some(cast_link(author, hash));
            }
        }
    }
    backfill
}

/// Carried state reconstructed from a stored row, for frames rendered
/// past the creation step.
fn state_of(payment: &Payment) -> PaymentFrameState {
    PaymentFrameState {
        address: payment.resolved_receiver_address().map(str::to_string),
        chain_id: Some(payment.network),
        token: Some(payment.token.clone()),
        usd_amount: payment.usd_amount,
        token_amount: payment.token_amount,
        ref_id: Some(payment.reference_id.clone()),
    }
}
