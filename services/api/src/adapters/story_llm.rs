//! services/api/src/adapters/story_llm.rs
//!
//! This module contains the adapter for the story-generating LLM and its
//! illustration model. It implements the `StoryGenerator` port from the
//! `core` crate.

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::{
        chat::{
            ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
            CreateChatCompletionRequestArgs,
        },
        images::{CreateImageRequestArgs, Image, ImageModel, ImageResponseFormat, ImageSize},
    },
    Client,
};
use async_trait::async_trait;
use storytime_core::domain::GeneratedStory;
use storytime_core::error::GenerationError;
use storytime_core::ports::StoryGenerator;
use tracing::warn;

const SYSTEM_INSTRUCTIONS: &str =
    "You are a creative assistant that writes engaging children's stories.";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `StoryGenerator` using an OpenAI-compatible
/// LLM for the prose and an image model for the illustration.
#[derive(Clone)]
pub struct OpenAiStoryAdapter {
    client: Client<OpenAIConfig>,
    story_model: String,
    image_model: ImageModel,
    image_size: ImageSize,
}

impl OpenAiStoryAdapter {
    /// Creates a new `OpenAiStoryAdapter`.
    pub fn new(
        client: Client<OpenAIConfig>,
        story_model: String,
        image_model: ImageModel,
        image_size: ImageSize,
    ) -> Self {
        Self {
            client,
            story_model,
            image_model,
            image_size,
        }
    }

    async fn generate_prose(
        &self,
        name: &str,
        character: &str,
        topic: &str,
    ) -> Result<String, GenerationError> {
        let prompt = format!(
            "Write a short children's story about {topic} starring a {character} named {name}."
        );

        let messages = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(SYSTEM_INSTRUCTIONS)
                .build()
                .map_err(|e| GenerationError::Service(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(prompt)
                .build()
                .map_err(|e| GenerationError::Service(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.story_model)
            .messages(messages)
            .max_tokens(500u32)
            .n(1)
            .build()
            .map_err(|e| GenerationError::Service(e.to_string()))?;

        // Call the API and manually map the error, which respects the orphan rule.
        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e: OpenAIError| GenerationError::Service(e.to_string()))?;

        // Extract the text content from the first choice in the response.
        if let Some(choice) = response.choices.into_iter().next() {
            if let Some(content) = choice.message.content {
                Ok(content.trim().to_string())
            } else {
                Err(GenerationError::Service(
                    "Story LLM response contained no text content.".to_string(),
                ))
            }
        } else {
            Err(GenerationError::Service(
                "Story LLM returned no choices in its response.".to_string(),
            ))
        }
    }

    async fn generate_illustration(
        &self,
        character: &str,
        topic: &str,
    ) -> Result<String, GenerationError> {
        let prompt = format!(
            "A cute and colorful illustration of a {character} in a {topic} setting, \
             in a children's book style."
        );

        let request = CreateImageRequestArgs::default()
            .model(self.image_model.clone())
            .prompt(prompt)
            .n(1)
            .size(self.image_size.clone())
            .response_format(ImageResponseFormat::Url)
            .build()
            .map_err(|e| GenerationError::Service(e.to_string()))?;

        let response = self
            .client
            .images()
            .generate(request)
            .await
            .map_err(|e: OpenAIError| GenerationError::Service(e.to_string()))?;

        match response.data.first().map(|image| image.as_ref()) {
            Some(Image::Url { url, .. }) => Ok(url.clone()),
            _ => Err(GenerationError::Service(
                "Image model returned no illustration URL.".to_string(),
            )),
        }
    }
}

//=========================================================================================
// `StoryGenerator` Trait Implementation
//=========================================================================================

#[async_trait]
impl StoryGenerator for OpenAiStoryAdapter {
    /// Generates the prose, then the illustration. A failed illustration is
    /// a partial success: the story comes back text-only.
    async fn generate(
        &self,
        name: &str,
        character: &str,
        topic: &str,
    ) -> Result<GeneratedStory, GenerationError> {
        let body = self.generate_prose(name, character, topic).await?;

        let image_url = match self.generate_illustration(character, topic).await {
            Ok(url) => Some(url),
            Err(e) => {
                warn!("Illustration generation failed, continuing text-only: {e}");
                None
            }
        };

        Ok(GeneratedStory { body, image_url })
    }
}
