use bytes::Bytes;
use color_eyre::{
    Result,
    eyre::{WrapErr as _, bail},
};
use log::{debug, info};
use nonempty::NonEmpty;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

pub mod open_ai_api;
pub use open_ai_api::OpenAIApiError;

use crate::{Prompt, config::Settings};
use open_ai_api::{GenerationRequest, GenerationResponse, ImageData};

pub const DEFAULT_API_URL: &str = "https://api.openai.com/v1/images/generations";

#[derive(
    Debug,
    Clone,
    Copy,
    Display,
    EnumString,
    IntoStaticStr,
    clap::ValueEnum,
    Serialize,
    Deserialize,
    Hash,
    PartialEq,
    Eq,
    EnumIter,
    Default,
)]
#[serde(into = "&'static str", try_from = "String")]
pub enum ImageSize {
    #[strum(serialize = "256x256")]
    #[value(name = "256x256")]
    Small,
    #[strum(serialize = "512x512")]
    #[value(name = "512x512")]
    Medium,
    #[default]
    #[strum(serialize = "1024x1024")]
    #[value(name = "1024x1024")]
    Large,
    #[strum(serialize = "1792x1024")]
    #[value(name = "1792x1024")]
    Wide,
    #[strum(serialize = "1024x1792")]
    #[value(name = "1024x1792")]
    Tall,
}

impl TryFrom<String> for ImageSize {
    type Error = strum::ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    Display,
    EnumString,
    IntoStaticStr,
    clap::ValueEnum,
    Serialize,
    Deserialize,
    Hash,
    PartialEq,
    Eq,
    EnumIter,
)]
#[serde(into = "&'static str", try_from = "String")]
pub enum Model {
    #[strum(serialize = "dall-e-2")]
    #[value(name = "dall-e-2")]
    DallE2,
    #[strum(serialize = "dall-e-3")]
    #[value(name = "dall-e-3")]
    DallE3,
}

impl TryFrom<String> for Model {
    type Error = strum::ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone)]
pub struct Image {
    pub url: String,
    pub revised_prompt: Option<String>,
    pub data: Bytes,
}

/// Client for the OpenAI image generation endpoint.
#[derive(Debug, Clone)]
pub struct OpenAIImages {
    api_key: String,
    api_url: String,
    model: Option<Model>,
    size: ImageSize,
    count: u8,
    client: Client,
}

impl OpenAIImages {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            api_url: DEFAULT_API_URL.into(),
            model: None,
            size: ImageSize::default(),
            count: 1,
            client: Client::new(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.api_key.clone())
            .with_api_url(settings.api_url.clone())
            .with_model(settings.model)
            .with_size(settings.size)
            .with_count(settings.count)
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    pub fn with_model(mut self, model: Option<Model>) -> Self {
        self.model = model;
        self
    }

    pub fn with_size(mut self, size: ImageSize) -> Self {
        self.size = size;
        self
    }

    pub fn with_count(mut self, count: u8) -> Self {
        self.count = count;
        self
    }

    /// Asks the API to generate images for `prompt` and returns where to fetch them.
    pub async fn generate(&self, prompt: &Prompt) -> Result<GenerationResponse> {
        let body = GenerationRequest {
            prompt: prompt.as_str(),
            n: self.count,
            size: self.size,
            model: self.model,
        };
        debug!("Json-data: {}", serde_json::to_string(&body)?);

        let resp = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("sending generation request")?;

        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            return Err(OpenAIApiError::from_response(status, &text).into());
        }

        let response: GenerationResponse = serde_json::from_str(&text)
            .with_context(|| format!("Unexpected generation response:\n{text}"))?;
        debug!("Generation response: {response:#?}");
        Ok(response)
    }

    pub async fn download(&self, url: &str) -> Result<Bytes> {
        let resp = self.client.get(url).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp
                .text()
                .await
                .unwrap_or_else(|e| format!("<unreadable body: {e}>"));
            bail!("Image download failed {status}: {body}");
        }

        let bytes = resp.bytes().await?;
        info!("Downloaded {} bytes from {url}", bytes.len());
        Ok(bytes)
    }

    /// Generates and downloads every image for `prompt`.
    pub async fn get_images(&self, prompt: &Prompt) -> Result<NonEmpty<Image>> {
        let NonEmpty { head, tail } = self.generate(prompt).await?.data;

        let mut images = NonEmpty::new(self.fetch(head).await?);
        for item in tail {
            images.push(self.fetch(item).await?);
        }
        Ok(images)
    }

    async fn fetch(&self, item: ImageData) -> Result<Image> {
        let data = self.download(&item.url).await?;
        Ok(Image {
            url: item.url,
            revised_prompt: item.revised_prompt,
            data,
        })
    }
}
