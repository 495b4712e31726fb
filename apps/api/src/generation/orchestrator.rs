//! Generation orchestrator — turns one request into one validated email.
//!
//! Flow: select model + narrative tier → build prompt → balance check →
//!       primary call (light validation) → fallback call (strict validation)
//!       → one rewrite-from-start retry → sanitize.
//!
//! Steps are strictly sequential. The fallback model is only called once the
//! primary has failed or been skipped, and the retry at most once per call.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::config::ModelConfig;
use crate::delivery::sanitize::{sanitize, sanitize_text};
use crate::generation::balance::BalanceGate;
use crate::generation::prompts::{build_generation_prompt, build_redraft_prompt, rewrite_from_start};
use crate::generation::seniority::{KeywordModelSelector, ModelChoice, ModelSelector, SeniorityTier};
use crate::generation::validation::{
    enforce_bold_headings, ensure_complete_email, ensure_non_empty, PRIMARY_MIN_LENGTH,
};
use crate::generation::{GeneratedEmail, GenerationError, GenerationOutcome, GenerationPath};
use crate::llm_client::{ChatMessage, CompletionApi, CompletionRequest};
use crate::models::email::{GenerationRequest, RedraftRequest};

#[derive(Debug, Clone, Copy, Default)]
pub struct GenerateOptions {
    /// Skip the balance lookup, e.g. when the caller already checked it for a batch.
    pub skip_balance_check: bool,
}

/// Shared, immutable pipeline. Cheap to clone behind an `Arc`.
pub struct Orchestrator {
    config: ModelConfig,
    completion: Arc<dyn CompletionApi>,
    balance: Arc<dyn BalanceGate>,
    selector: Arc<dyn ModelSelector>,
}

impl Orchestrator {
    pub fn new(
        config: ModelConfig,
        completion: Arc<dyn CompletionApi>,
        balance: Arc<dyn BalanceGate>,
    ) -> Self {
        let selector = Arc::new(KeywordModelSelector::new(&config));
        Self {
            config,
            completion,
            balance,
            selector,
        }
    }

    pub fn with_selector(mut self, selector: Arc<dyn ModelSelector>) -> Self {
        self.selector = selector;
        self
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub async fn generate(&self, request: &GenerationRequest) -> GenerationOutcome {
        self.generate_with(request, GenerateOptions::default()).await
    }

    pub async fn generate_with(
        &self,
        request: &GenerationRequest,
        options: GenerateOptions,
    ) -> GenerationOutcome {
        let tier = SeniorityTier::from_position(&request.position);
        let prompt = build_generation_prompt(request, tier);
        self.run("generate", &request.position, prompt, options).await
    }

    pub async fn redraft(&self, redraft: &RedraftRequest) -> GenerationOutcome {
        let tier = SeniorityTier::from_position(&redraft.request.position);
        let prompt = build_redraft_prompt(redraft, tier);
        self.run("redraft", &redraft.request.position, prompt, GenerateOptions::default())
            .await
    }

    /// Aborts the pending pipeline once `deadline` elapses. Nothing is kept from
    /// the abandoned call.
    pub async fn generate_within(
        &self,
        request: &GenerationRequest,
        deadline: Duration,
    ) -> GenerationOutcome {
        tokio::time::timeout(deadline, self.generate(request))
            .await
            .unwrap_or(Err(GenerationError::DeadlineExceeded(deadline)))
    }

    pub async fn redraft_within(
        &self,
        redraft: &RedraftRequest,
        deadline: Duration,
    ) -> GenerationOutcome {
        tokio::time::timeout(deadline, self.redraft(redraft))
            .await
            .unwrap_or(Err(GenerationError::DeadlineExceeded(deadline)))
    }

    async fn run(
        &self,
        operation: &str,
        position: &str,
        prompt: String,
        options: GenerateOptions,
    ) -> GenerationOutcome {
        let choice = self.selector.select_model(position);
        let messages = vec![ChatMessage::user(prompt)];

        let email = self.call_with_fallback(&choice, &messages, options).await?;

        info!(
            operation,
            model = %email.model,
            fallback = %choice.fallback,
            seniority = choice.tier.log_label(),
            path = ?email.path,
            prompt_length = messages[0].content.len(),
            response_length = email.content.len(),
            "Completion API call"
        );

        Ok(email)
    }

    async fn call_with_fallback(
        &self,
        choice: &ModelChoice,
        messages: &[ChatMessage],
        options: GenerateOptions,
    ) -> GenerationOutcome {
        if !options.skip_balance_check {
            if let Some(balance) = self.balance.check_balance().await {
                if balance <= 0.0 {
                    warn!(
                        "Upstream balance is {balance}, using fallback model {} directly",
                        choice.fallback
                    );
                    return self.fallback_with_retry(choice, messages).await;
                }
            }
        }

        match self.call_primary(choice, messages).await {
            Ok(body) => Ok(self.accept(body, choice, &choice.model, GenerationPath::Primary)),
            Err(e) if e.is_fatal() => Err(e),
            Err(e) if e.is_credit_error() => {
                warn!(
                    "Credit error detected, using fallback model {}: {e}",
                    choice.fallback
                );
                self.fallback_with_retry(choice, messages).await
            }
            Err(e) => {
                warn!(
                    "Primary model {} failed, falling back to {}: {e}",
                    choice.model, choice.fallback
                );
                self.fallback_with_retry(choice, messages).await
            }
        }
    }

    async fn call_primary(
        &self,
        choice: &ModelChoice,
        messages: &[ChatMessage],
    ) -> Result<String, GenerationError> {
        let request = CompletionRequest {
            model: choice.model.clone(),
            messages: messages.to_vec(),
            max_tokens: self.config.primary_max_tokens,
            temperature: self.config.temperature,
        };
        let content = self.completion.complete(&request).await?;
        let body = ensure_non_empty(&content, PRIMARY_MIN_LENGTH, &choice.model)?;
        // The bar applies to what is delivered, not what the model sent.
        ensure_non_empty(&sanitize_text(&body), PRIMARY_MIN_LENGTH, &choice.model)?;
        Ok(body)
    }

    async fn call_fallback(&self, model: &str, messages: &[ChatMessage]) -> Result<String, GenerationError> {
        let request = CompletionRequest {
            model: model.to_string(),
            messages: messages.to_vec(),
            max_tokens: self.config.fallback_max_tokens,
            temperature: self.config.temperature,
        };
        let content = self.completion.complete(&request).await?;
        let body = ensure_complete_email(&content, model)?;
        ensure_complete_email(&sanitize_text(&enforce_bold_headings(&body)), model)?;
        Ok(body)
    }

    async fn fallback_with_retry(&self, choice: &ModelChoice, messages: &[ChatMessage]) -> GenerationOutcome {
        let fallback = choice.fallback.as_str();

        let err = match self.call_fallback(fallback, messages).await {
            Ok(body) => return Ok(self.accept(body, choice, fallback, GenerationPath::Fallback)),
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => e,
        };

        let kind = if err.is_incomplete() { "incomplete email" } else { "API error" };
        warn!("Fallback model initial attempt failed ({kind}), retrying once: {err}");

        let retry_messages = rewrite_from_start(messages);
        let body = self.call_fallback(fallback, &retry_messages).await?;
        Ok(self.accept(body, choice, fallback, GenerationPath::FallbackRetry))
    }

    /// Heading enforcement runs on fallback output only; the primary model is trusted as-is.
    fn accept(&self, body: String, choice: &ModelChoice, model: &str, path: GenerationPath) -> GeneratedEmail {
        let body = match path {
            GenerationPath::Primary => body,
            GenerationPath::Fallback | GenerationPath::FallbackRetry => enforce_bold_headings(&body),
        };
        GeneratedEmail {
            content: sanitize_text(&body),
            html: sanitize(&body),
            model: model.to_string(),
            tier: choice.tier,
            path,
        }
    }
}


#[cfg(test)]
mod tests {
    use super::fakes::{api_error, CountingBalance, ScriptedCompletion};
    use super::*;
    use crate::generation::balance::{CreditsBalanceGate, StaticBalance};
    use crate::generation::seniority::ModelTier;
    use crate::generation::validation::complete_email_fixture;
    use crate::llm_client::{test_server, CompletionError, LlmClient};
    use crate::models::email::sample_request;

    const PLACEHOLDERS: [&str; 4] = [
        "[Your Name]",
        "[Your Job Title]",
        "[Your Company]",
        "[Your Contact Information]",
    ];

    fn orchestrator(
        completion: Arc<ScriptedCompletion>,
        balance: Arc<dyn BalanceGate>,
    ) -> Orchestrator {
        Orchestrator::new(ModelConfig::default(), completion, balance)
    }

    fn primary_body() -> String {
        format!(
            "Dear Jane Doe,\n\nThank you for taking the time to interview for the Senior Backend Engineer \
            position with us at Acme.\n\n**Leadership Abilities:** Lead a design review.\n\n{}\n\nBest Regards,",
            "We appreciated your time. ".repeat(4)
        )
    }

    #[tokio::test]
    async fn test_end_to_end_primary_success() {
        let completion = Arc::new(ScriptedCompletion::new(vec![Ok(primary_body())]));
        let orch = orchestrator(completion.clone(), Arc::new(StaticBalance(Some(10.0))));

        let email = orch.generate(&sample_request()).await.unwrap();

        assert!(email.content.starts_with("Dear Jane Doe,"));
        assert!(email.content.contains("Acme"));
        assert!(email.content.contains("**Leadership Abilities:**"));
        assert!(email.content.ends_with("Best Regards,"));
        assert!(!email.content.contains("Subject:"));
        assert!(!email.html.contains("Subject:"));
        for placeholder in PLACEHOLDERS {
            assert!(!email.content.contains(placeholder));
        }
        assert_eq!(email.path, GenerationPath::Primary);
        assert_eq!(email.tier, ModelTier::Senior);
        assert_eq!(email.model, ModelConfig::default().senior);

        let calls = completion.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].max_tokens, 800);
        assert!(calls[0].messages[0].content.contains("Dear Jane Doe,"));
    }

    #[tokio::test]
    async fn test_primary_output_is_sanitized() {
        let body = format!("Subject: Your application\n\n{}\n\n[Your Name]", primary_body());
        let completion = Arc::new(ScriptedCompletion::new(vec![Ok(body)]));
        let orch = orchestrator(completion, Arc::new(StaticBalance(None)));

        let email = orch.generate(&sample_request()).await.unwrap();
        assert!(email.content.starts_with("Dear Jane Doe,"));
        assert!(!email.content.contains("Subject:"));
        assert!(!email.content.contains("[Your Name]"));
        assert!(email.html.starts_with("<p>Dear Jane Doe,</p>"));
        assert!(email.html.contains("<strong>Leadership Abilities:</strong>"));
    }

    #[tokio::test]
    async fn test_primary_failure_then_fallback_success_skips_retry() {
        let fallback_body = complete_email_fixture("Jane Doe", "Acme");
        let completion = Arc::new(ScriptedCompletion::new(vec![
            Err(api_error(500, "upstream down")),
            Ok(fallback_body.clone()),
        ]));
        let orch = orchestrator(completion.clone(), Arc::new(StaticBalance(Some(5.0))));

        let email = orch.generate(&sample_request()).await.unwrap();

        assert_eq!(email.path, GenerationPath::Fallback);
        assert_eq!(email.model, ModelConfig::default().fallback);
        assert_eq!(email.html, sanitize(&fallback_body));

        let calls = completion.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].model, ModelConfig::default().fallback);
        assert_eq!(calls[1].max_tokens, 2000);
        assert_eq!(calls[1].messages, calls[0].messages);
    }

    #[tokio::test]
    async fn test_short_primary_output_falls_back() {
        let completion = Arc::new(ScriptedCompletion::new(vec![
            Ok("Dear Jane, sorry.".to_string()),
            Ok(complete_email_fixture("Jane Doe", "Acme")),
        ]));
        let orch = orchestrator(completion.clone(), Arc::new(StaticBalance(None)));

        let email = orch.generate(&sample_request()).await.unwrap();
        assert_eq!(email.path, GenerationPath::Fallback);
        assert_eq!(completion.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_primary_light_validation_accepts_short_email() {
        // 100+ chars passes the primary bar even though the strict check would reject it.
        let body = format!("Dear Jane Doe,\n\n{}\n\nBest Regards,", "Thanks for your time. ".repeat(6));
        let completion = Arc::new(ScriptedCompletion::new(vec![Ok(body)]));
        let orch = orchestrator(completion.clone(), Arc::new(StaticBalance(None)));

        let email = orch.generate(&sample_request()).await.unwrap();
        assert_eq!(email.path, GenerationPath::Primary);
        assert_eq!(completion.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_fallback_failure_then_retry_success() {
        let retry_body = complete_email_fixture("Jane Doe", "Acme");
        let completion = Arc::new(ScriptedCompletion::new(vec![
            Err(api_error(502, "bad gateway")),
            Ok("Dear Jane Doe, we regret to".to_string()),
            Ok(retry_body.clone()),
        ]));
        let orch = orchestrator(completion.clone(), Arc::new(StaticBalance(None)));

        let email = orch.generate(&sample_request()).await.unwrap();

        assert_eq!(email.path, GenerationPath::FallbackRetry);
        assert_eq!(email.html, sanitize(&retry_body));
        let calls = completion.calls();
        assert_eq!(calls.len(), 3);
        assert!(calls[2].messages[0]
            .content
            .starts_with("The previous email was cut off."));
        assert!(calls[2].messages[0].content.ends_with(&calls[1].messages[0].content));
    }

    #[tokio::test]
    async fn test_fallback_and_retry_incomplete_fails() {
        let truncated = "Dear Jane Doe, thank you for interviewing with us. We".to_string();
        let completion = Arc::new(ScriptedCompletion::new(vec![
            Err(api_error(500, "down")),
            Ok(truncated.clone()),
            Ok(truncated),
        ]));
        let orch = orchestrator(completion.clone(), Arc::new(StaticBalance(None)));

        let err = orch.generate(&sample_request()).await.unwrap_err();

        assert!(err.is_incomplete(), "unexpected error: {err}");
        assert_eq!(completion.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_retry_transport_error_propagates() {
        let completion = Arc::new(ScriptedCompletion::new(vec![
            Err(api_error(500, "down")),
            Err(api_error(500, "down")),
            Err(api_error(503, "still down")),
        ]));
        let orch = orchestrator(completion.clone(), Arc::new(StaticBalance(None)));

        let err = orch.generate(&sample_request()).await.unwrap_err();
        assert!(matches!(
            err,
            GenerationError::Upstream(CompletionError::Api { status: 503, .. })
        ));
        assert_eq!(completion.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_zero_balance_skips_primary() {
        let completion = Arc::new(ScriptedCompletion::new(vec![Ok(complete_email_fixture(
            "Jane Doe", "Acme",
        ))]));
        let balance = Arc::new(CountingBalance::new(Some(0.0)));
        let orch = orchestrator(completion.clone(), balance.clone());

        let email = orch.generate(&sample_request()).await.unwrap();

        assert_eq!(email.path, GenerationPath::Fallback);
        let calls = completion.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].model, ModelConfig::default().fallback);
        assert_eq!(balance.checks(), 1);
    }

    #[tokio::test]
    async fn test_unknown_balance_proceeds_to_primary() {
        let completion = Arc::new(ScriptedCompletion::new(vec![Ok(primary_body())]));
        let orch = orchestrator(completion.clone(), Arc::new(StaticBalance(None)));

        orch.generate(&sample_request()).await.unwrap();
        assert_eq!(completion.calls()[0].model, ModelConfig::default().senior);
    }

    #[tokio::test]
    async fn test_credits_endpoint_500_still_attempts_primary() {
        use axum::{http::StatusCode, routing::get, Router};

        let base = test_server::spawn(Router::new().route(
            "/credits",
            get(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
        ))
        .await;
        let gate = CreditsBalanceGate::new(LlmClient::new("key", base).unwrap());
        assert_eq!(gate.check_balance().await, None);

        let completion = Arc::new(ScriptedCompletion::new(vec![Ok(primary_body())]));
        let orch = orchestrator(completion.clone(), Arc::new(gate));

        let email = orch.generate(&sample_request()).await.unwrap();
        assert_eq!(email.path, GenerationPath::Primary);
        assert_eq!(completion.calls()[0].model, ModelConfig::default().senior);
    }

    #[tokio::test]
    async fn test_skip_balance_check_option() {
        let completion = Arc::new(ScriptedCompletion::new(vec![Ok(primary_body())]));
        let balance = Arc::new(CountingBalance::new(Some(0.0)));
        let orch = orchestrator(completion.clone(), balance.clone());

        let options = GenerateOptions {
            skip_balance_check: true,
        };
        let email = orch.generate_with(&sample_request(), options).await.unwrap();

        assert_eq!(email.path, GenerationPath::Primary);
        assert_eq!(balance.checks(), 0);
    }

    #[tokio::test]
    async fn test_credit_error_takes_same_fallback_path() {
        let completion = Arc::new(ScriptedCompletion::new(vec![
            Err(api_error(402, "Payment Required")),
            Ok(complete_email_fixture("Jane Doe", "Acme")),
        ]));
        let orch = orchestrator(completion.clone(), Arc::new(StaticBalance(None)));

        let email = orch.generate(&sample_request()).await.unwrap();
        assert_eq!(email.path, GenerationPath::Fallback);
    }

    #[tokio::test]
    async fn test_fallback_output_gets_bold_headings() {
        let body = complete_email_fixture("Jane Doe", "Acme")
            .replace("Best Regards,", "Team Collaboration: pair program weekly.\n\nBest Regards,");
        let completion = Arc::new(ScriptedCompletion::new(vec![
            Err(api_error(500, "down")),
            Ok(body),
        ]));
        let orch = orchestrator(completion, Arc::new(StaticBalance(None)));

        let email = orch.generate(&sample_request()).await.unwrap();
        assert!(email.content.contains("**Team Collaboration:** pair program weekly."));
    }

    #[tokio::test]
    async fn test_primary_output_headings_left_untouched() {
        let body = primary_body().replace(
            "Best Regards,",
            "Strategic Thinking: read more case studies.\n\nBest Regards,",
        );
        let completion = Arc::new(ScriptedCompletion::new(vec![Ok(body)]));
        let orch = orchestrator(completion, Arc::new(StaticBalance(None)));

        let email = orch.generate(&sample_request()).await.unwrap();
        assert!(email.content.contains("\nStrategic Thinking: read more"));
        assert!(!email.content.contains("**Strategic Thinking:**"));
    }

    #[tokio::test]
    async fn test_standard_title_uses_standard_model() {
        let completion = Arc::new(ScriptedCompletion::new(vec![Ok(primary_body())]));
        let orch = orchestrator(completion.clone(), Arc::new(StaticBalance(None)));
        let mut request = sample_request();
        request.position = "Backend Engineer".to_string();

        let email = orch.generate(&request).await.unwrap();
        assert_eq!(email.tier, ModelTier::Standard);
        assert_eq!(completion.calls()[0].model, ModelConfig::default().standard);
    }

    #[tokio::test]
    async fn test_custom_selector_is_used() {
        struct AlwaysStandard;
        impl ModelSelector for AlwaysStandard {
            fn select_model(&self, _position: &str) -> ModelChoice {
                ModelChoice {
                    model: "custom/model".to_string(),
                    tier: ModelTier::Standard,
                    fallback: "custom/fallback".to_string(),
                }
            }
        }

        let completion = Arc::new(ScriptedCompletion::new(vec![Ok(primary_body())]));
        let orch = orchestrator(completion.clone(), Arc::new(StaticBalance(None)))
            .with_selector(Arc::new(AlwaysStandard));

        orch.generate(&sample_request()).await.unwrap();
        assert_eq!(completion.calls()[0].model, "custom/model");
    }

    #[tokio::test]
    async fn test_redraft_uses_redraft_prompt() {
        let completion = Arc::new(ScriptedCompletion::new(vec![Ok(primary_body())]));
        let orch = orchestrator(completion.clone(), Arc::new(StaticBalance(None)));
        let redraft = RedraftRequest {
            request: sample_request(),
            original_content: "Dear Jane Doe, old draft".to_string(),
            instructions: "Be warmer".to_string(),
        };

        let email = orch.redraft(&redraft).await.unwrap();
        assert_eq!(email.path, GenerationPath::Primary);
        let prompt = &completion.calls()[0].messages[0].content;
        assert!(prompt.starts_with("Redraft this rejection email"));
        assert!(prompt.contains("Be warmer"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_aborts_pending_call() {
        struct Stalled;
        #[async_trait::async_trait]
        impl CompletionApi for Stalled {
            async fn complete(&self, _request: &CompletionRequest) -> Result<String, CompletionError> {
                tokio::time::sleep(Duration::from_secs(600)).await;
                Ok(String::new())
            }
        }

        let orch = Orchestrator::new(
            ModelConfig::default(),
            Arc::new(Stalled),
            Arc::new(StaticBalance(None)),
        );
        let err = orch
            .generate_within(&sample_request(), Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::DeadlineExceeded(d) if d == Duration::from_secs(5)));
    }

    #[tokio::test]
    async fn test_within_deadline_returns_email() {
        let completion = Arc::new(ScriptedCompletion::new(vec![Ok(primary_body())]));
        let orch = orchestrator(completion, Arc::new(StaticBalance(None)));
        let email = orch
            .generate_within(&sample_request(), Duration::from_secs(30))
            .await
            .unwrap();
        assert_eq!(email.path, GenerationPath::Primary);
    }

    #[tokio::test]
    async fn test_primary_short_after_sanitizing_falls_back() {
        // Long enough raw, but almost all of it is a subject line.
        let raw = format!("Subject: {}\nDear Jane Doe,", "x".repeat(120));
        let completion = Arc::new(ScriptedCompletion::new(vec![
            Ok(raw),
            Ok(complete_email_fixture("Jane Doe", "Acme")),
        ]));
        let orch = orchestrator(completion.clone(), Arc::new(StaticBalance(None)));

        let email = orch.generate(&sample_request()).await.unwrap();

        assert_eq!(email.path, GenerationPath::Fallback);
        assert!(email.content.chars().count() >= PRIMARY_MIN_LENGTH);
        assert_eq!(completion.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_blank_subject_line_keeps_greeting() {
        let body = format!("Subject:\n\n{}", primary_body());
        let completion = Arc::new(ScriptedCompletion::new(vec![Ok(body)]));
        let orch = orchestrator(completion, Arc::new(StaticBalance(None)));

        let email = orch.generate(&sample_request()).await.unwrap();
        assert_eq!(email.path, GenerationPath::Primary);
        assert!(email.content.starts_with("Dear Jane Doe,"));
    }

    #[tokio::test]
    async fn test_missing_api_key_is_not_retried() {
        let completion = Arc::new(ScriptedCompletion::new(vec![Err(CompletionError::MissingApiKey)]));
        let orch = orchestrator(completion.clone(), Arc::new(StaticBalance(None)));

        let err = orch.generate(&sample_request()).await.unwrap_err();

        assert!(matches!(err, GenerationError::Configuration(_)));
        assert_eq!(completion.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_api_key_on_fallback_skips_retry() {
        let completion = Arc::new(ScriptedCompletion::new(vec![Err(CompletionError::MissingApiKey)]));
        let orch = orchestrator(completion.clone(), Arc::new(StaticBalance(Some(0.0))));

        let err = orch.generate(&sample_request()).await.unwrap_err();

        assert!(err.is_fatal());
        assert_eq!(completion.calls().len(), 1);
    }
}
