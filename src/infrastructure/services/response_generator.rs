//! Chat-completion backed response generator

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::domain::guard::CONSERVATIVE_FALLBACK;
use crate::domain::llm::{LlmProvider, LlmRequest, PromptContext, ResponseGenerator};
use crate::domain::DomainError;

const SYSTEM_RULES: &str = "Eres un asistente de la UNC. RESPUESTAS ULTRA CORTAS.

REGLA CRÍTICA: copia la respuesta de la FAQ EXACTAMENTE como está. NO agregues saludos, NO expandas, NO reformules.

REGLAS ABSOLUTAS:
- NO agregues introducciones como \"¡Hola!\" o \"En la UNC...\"
- NO menciones el nombre completo de la universidad
- NO agregues información que no esté en el contexto
- MÁXIMO 40 palabras";

const COPY_INSTRUCTION: &str = "Copia la respuesta de la FAQ más relevante SIN MODIFICARLA.";

/// Sampling settings for generation
#[derive(Debug, Clone)]
pub struct GeneratorSettings {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl GeneratorSettings {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            temperature: 0.3,
            max_tokens: 500,
        }
    }
}

/// [`ResponseGenerator`] that prompts an [`LlmProvider`] to copy the best FAQ answer
#[derive(Debug)]
pub struct LlmResponseGenerator {
    provider: Arc<dyn LlmProvider>,
    settings: GeneratorSettings,
}

impl LlmResponseGenerator {
    pub fn new(provider: Arc<dyn LlmProvider>, settings: GeneratorSettings) -> Self {
        Self { provider, settings }
    }

    fn build_request(&self, prompt: &PromptContext) -> LlmRequest {
        let instruction = if prompt.has_candidates {
            COPY_INSTRUCTION.to_string()
        } else {
            format!("No encontré información. Di: \"{}\"", CONSERVATIVE_FALLBACK)
        };

        let user = if prompt.context.is_empty() {
            format!("Pregunta del usuario: {}", prompt.query)
        } else {
            format!("Contexto:\n{}\n\nPregunta del usuario: {}", prompt.context, prompt.query)
        };

        LlmRequest::builder()
            .system(format!("{}\n\n{}", SYSTEM_RULES, instruction))
            .user(user)
            .temperature(self.settings.temperature)
            .max_tokens(self.settings.max_tokens)
            .build()
    }
}

#[async_trait]
impl ResponseGenerator for LlmResponseGenerator {
    async fn generate(&self, prompt: &PromptContext) -> Result<String, DomainError> {
        let request = self.build_request(prompt);
        let response = self.provider.chat(&self.settings.model, request).await?;

        if response.is_filtered() {
            return Err(DomainError::provider(
                self.provider.provider_name(),
                "completion blocked by content filter",
            ));
        }

        let text = response.content().trim();

        if text.is_empty() {
            return Err(DomainError::provider(
                self.provider.provider_name(),
                "empty completion",
            ));
        }

        debug!(
            provider = self.provider.provider_name(),
            model = %self.settings.model,
            classification = %prompt.classification,
            "Generated answer"
        );

        Ok(text.to_string())
    }
}
